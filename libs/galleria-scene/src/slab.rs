use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::config::GalleriaConfig;
use crate::texture_cache::{TextureCache, TextureState};

pub const SLAB_TARGET_OPACITY: f32 = 0.85;
/// First-ever load of a URL fades in slower than a cache hit, so repeat
/// images visibly "pop in" faster.
pub const FIRST_LOAD_FADE_SECS: f32 = 1.0;
pub const CACHED_FADE_SECS: f32 = 0.5;

/// The four tunnel surfaces a slab can be mounted on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SurfaceKind {
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 4] = [
        SurfaceKind::Floor,
        SurfaceKind::Ceiling,
        SurfaceKind::LeftWall,
        SurfaceKind::RightWall,
    ];

    /// Rotation taking a +Z facing plane to the surface's outward normal.
    pub fn rotation(&self) -> Quat {
        match self {
            SurfaceKind::Floor => Quat::from_rotation_x(-FRAC_PI_2),
            SurfaceKind::Ceiling => Quat::from_rotation_x(FRAC_PI_2),
            SurfaceKind::LeftWall => Quat::from_rotation_y(FRAC_PI_2),
            SurfaceKind::RightWall => Quat::from_rotation_y(-FRAC_PI_2),
        }
    }

    /// The ceiling is kept sparser than the other surfaces.
    pub fn fill_probability(&self) -> f32 {
        match self {
            SurfaceKind::Ceiling => 0.12,
            _ => 0.20,
        }
    }

    pub fn slot_count(&self, config: &GalleriaConfig) -> usize {
        match self {
            SurfaceKind::Floor | SurfaceKind::Ceiling => config.floor_cols,
            SurfaceKind::LeftWall | SurfaceKind::RightWall => config.wall_rows,
        }
    }
}

/// Texture binding of one slab. Resolved exactly once, never re-queried.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlabBinding {
    Unloaded,
    Loaded,
    Unavailable,
}

/// One image plane mounted to a tunnel surface, owned by its segment.
#[derive(Component)]
pub struct Slab {
    pub url: String,
    pub surface: SurfaceKind,
    /// Nominal cell dimensions before aspect correction.
    pub slot_size: Vec2,
    pub binding: SlabBinding,
    /// Whether the texture was already decoded when this slab was spawned.
    pub from_cache: bool,
    pub material: Handle<StandardMaterial>,
}

/// Opacity tween toward a fixed target, removed once complete.
#[derive(Component)]
pub struct FadeIn {
    pub target: f32,
    pub duration: f32,
    pub elapsed: f32,
}

/// Final slab dimensions: preserve the source aspect ratio inside the
/// margin-reduced cell, falling back to the cell itself when the source
/// dimensions are unknown or degenerate.
pub fn fit_slab(slot: Vec2, source: Option<(u32, u32)>, margin: f32) -> Vec2 {
    let bounds = Vec2::new(slot.x - margin, slot.y - margin);
    let Some((width, height)) = source else {
        return bounds;
    };
    if width == 0 || height == 0 {
        return bounds;
    }
    let tex_aspect = width as f32 / height as f32;
    let cell_aspect = slot.x / slot.y;
    if tex_aspect > cell_aspect {
        // Source relatively wider than the cell: keep width, shrink height.
        Vec2::new(bounds.x, bounds.x / tex_aspect)
    } else {
        Vec2::new(bounds.y * tex_aspect, bounds.y)
    }
}

/// Spawns one pending slab as a child of `segment`. The plane mesh is
/// attached later, by `resolve_slabs`, once the texture outcome is known.
#[allow(clippy::too_many_arguments)]
pub fn spawn_slab(
    commands: &mut Commands,
    segment: Entity,
    cache: &mut TextureCache,
    assets: &AssetServer,
    materials: &mut Assets<StandardMaterial>,
    url: &str,
    surface: SurfaceKind,
    center: Vec3,
    slot_size: Vec2,
) {
    let from_cache = cache.is_ready(url);
    cache.acquire(assets, url);
    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.0),
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        cull_mode: None,
        double_sided: true,
        ..default()
    });
    commands.spawn((
        Slab {
            url: url.to_owned(),
            surface,
            slot_size,
            binding: SlabBinding::Unloaded,
            from_cache,
            material,
        },
        Transform::from_translation(center).with_rotation(surface.rotation()),
        Visibility::default(),
        ChildOf(segment),
    ));
}

/// Attaches geometry to unresolved slabs whose cache entry has settled.
///
/// A slab whose segment recycled in the meantime no longer exists, so a late
/// texture completion simply never finds it here; nothing is attached and the
/// handles it held are already gone with the entity.
pub fn resolve_slabs(
    mut commands: Commands,
    config: Res<GalleriaConfig>,
    cache: Res<TextureCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut slabs: Query<(Entity, &mut Slab)>,
) {
    for (entity, mut slab) in &mut slabs {
        if slab.binding != SlabBinding::Unloaded {
            continue;
        }
        let state = match cache.get(&slab.url) {
            Some(entry) => entry.state,
            // Cache already released; treat like a failed load.
            None => TextureState::Unavailable,
        };
        match state {
            TextureState::Pending => {}
            TextureState::Ready { width, height } => {
                let size = fit_slab(slab.slot_size, Some((width, height)), config.cell_margin);
                if let Some(material) = materials.get_mut(&slab.material)
                    && let Some(entry) = cache.get(&slab.url)
                {
                    material.base_color_texture = Some(entry.handle.clone());
                }
                let duration = if slab.from_cache {
                    CACHED_FADE_SECS
                } else {
                    FIRST_LOAD_FADE_SECS
                };
                commands.entity(entity).insert((
                    Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
                    MeshMaterial3d(slab.material.clone()),
                    FadeIn {
                        target: SLAB_TARGET_OPACITY,
                        duration,
                        elapsed: 0.0,
                    },
                ));
                slab.binding = SlabBinding::Loaded;
            }
            TextureState::Unavailable => {
                // Attach the plane with no image; it stays fully transparent.
                let size = fit_slab(slab.slot_size, None, config.cell_margin);
                commands.entity(entity).insert((
                    Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
                    MeshMaterial3d(slab.material.clone()),
                ));
                slab.binding = SlabBinding::Unavailable;
            }
        }
    }
}

pub fn fade_in_slabs(
    mut commands: Commands,
    time: Res<Time>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut fades: Query<(Entity, &Slab, &mut FadeIn)>,
) {
    for (entity, slab, mut fade) in &mut fades {
        fade.elapsed += time.delta_secs();
        let t = (fade.elapsed / fade.duration).min(1.0);
        if let Some(material) = materials.get_mut(&slab.material) {
            material.base_color.set_alpha(fade.target * t);
        }
        if t >= 1.0 {
            commands.entity(entity).remove::<FadeIn>();
        }
    }
}
