use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use smallvec::SmallVec;

use crate::SceneRng;
use crate::catalog::ImageCatalog;
use crate::config::GalleriaConfig;
use crate::slab::{SurfaceKind, spawn_slab};
use crate::texture_cache::TextureCache;

/// Everything a population pass needs; shared by startup and recycling.
#[derive(SystemParam)]
pub struct PopulateContext<'w> {
    pub config: Res<'w, GalleriaConfig>,
    pub catalog: Res<'w, ImageCatalog>,
    pub cache: ResMut<'w, TextureCache>,
    pub assets: Res<'w, AssetServer>,
    pub materials: ResMut<'w, Assets<StandardMaterial>>,
    pub rng: ResMut<'w, SceneRng>,
}

/// Far-below-zero sentinel so slot 0 is always eligible on a fresh surface.
const LAST_FILLED_SENTINEL: i64 = -999;

/// Chooses which slots of one surface to fill. Slot `i` is only eligible when
/// `i > last_filled + 1`, which keeps populated slots at least two indices
/// apart.
pub fn plan_surface(
    rng: &mut fastrand::Rng,
    slots: usize,
    fill_probability: f32,
) -> SmallVec<[usize; 8]> {
    let mut filled = SmallVec::new();
    let mut last_filled = LAST_FILLED_SENTINEL;
    for index in 0..slots {
        if index as i64 <= last_filled + 1 {
            continue;
        }
        if rng.f32() < fill_probability {
            filled.push(index);
            last_filled = index as i64;
        }
    }
    filled
}

/// World-space center of a slot, relative to its segment's origin. The
/// segment spans `z in [-depth, 0]`, so every slab sits halfway in at `-d/2`.
pub fn slot_center(config: &GalleriaConfig, surface: SurfaceKind, index: usize) -> Vec3 {
    let half_w = config.tunnel_width / 2.0;
    let half_h = config.tunnel_height / 2.0;
    let z = -config.segment_depth / 2.0;
    match surface {
        SurfaceKind::Floor => Vec3::new(
            -half_w + index as f32 * config.col_width() + config.col_width() / 2.0,
            -half_h,
            z,
        ),
        SurfaceKind::Ceiling => Vec3::new(
            -half_w + index as f32 * config.col_width() + config.col_width() / 2.0,
            half_h,
            z,
        ),
        SurfaceKind::LeftWall => Vec3::new(
            -half_w,
            -half_h + index as f32 * config.row_height() + config.row_height() / 2.0,
            z,
        ),
        SurfaceKind::RightWall => Vec3::new(
            half_w,
            -half_h + index as f32 * config.row_height() + config.row_height() / 2.0,
            z,
        ),
    }
}

/// Nominal cell size of a slot on the given surface: floor/ceiling cells are
/// a column wide and a segment deep, wall cells a segment deep and a row tall.
pub fn slot_size(config: &GalleriaConfig, surface: SurfaceKind) -> Vec2 {
    match surface {
        SurfaceKind::Floor | SurfaceKind::Ceiling => {
            Vec2::new(config.col_width(), config.segment_depth)
        }
        SurfaceKind::LeftWall | SurfaceKind::RightWall => {
            Vec2::new(config.segment_depth, config.row_height())
        }
    }
}

/// Seeds a segment with slabs, one independent pass per surface. Runs at
/// segment creation and again on every recycle.
#[allow(clippy::too_many_arguments)]
pub fn populate_segment(
    commands: &mut Commands,
    segment: Entity,
    config: &GalleriaConfig,
    catalog: &ImageCatalog,
    cache: &mut TextureCache,
    assets: &AssetServer,
    materials: &mut Assets<StandardMaterial>,
    rng: &mut fastrand::Rng,
) {
    if catalog.is_empty() {
        return;
    }
    for surface in SurfaceKind::ALL {
        let slots = surface.slot_count(config);
        for index in plan_surface(rng, slots, surface.fill_probability()) {
            let url = catalog.pick(rng).to_owned();
            spawn_slab(
                commands,
                segment,
                cache,
                assets,
                materials,
                &url,
                surface,
                slot_center(config, surface, index),
                slot_size(config, surface),
            );
        }
    }
}
