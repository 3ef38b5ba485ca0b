use std::path::Path;

use bevy::prelude::*;

pub mod camera;
pub mod catalog;
pub mod config;
pub mod pool;
pub mod populate;
pub mod scroll;
pub mod segment;
pub mod slab;
pub mod texture_cache;
pub mod theme;

pub use camera::CameraState;
pub use catalog::ImageCatalog;
pub use config::GalleriaConfig;
pub use scroll::ScrollState;
pub use texture_cache::TextureCache;
pub use theme::{Theme, ThemeChanged};

/// Seeded RNG driving slab placement; one instance per scene so runs are
/// reproducible for a given `GalleriaConfig::seed`.
#[derive(Resource)]
pub struct SceneRng(pub fastrand::Rng);

/// The image tunnel: a fixed pool of segments conveyor-belted along the depth
/// axis behind a scroll-driven camera.
///
/// If a `GalleriaConfig` resource is present it is used as-is (the binary
/// inserts one built from CLI flags); otherwise configuration is read from
/// `GALLERIA_*` environment variables. The scene's simulation systems only
/// need the ECS, assets and time, so the plugin also works in a headless app
/// producing no visual output.
pub struct GalleriaScenePlugin;

impl Plugin for GalleriaScenePlugin {
    fn build(&self, app: &mut App) {
        let config = match app.world().get_resource::<GalleriaConfig>() {
            Some(config) => config.clone(),
            None => {
                let config = GalleriaConfig::from_env();
                app.insert_resource(config.clone());
                config
            }
        };
        let catalog = match &config.image_dir {
            Some(dir) => match ImageCatalog::scan(Path::new("assets"), dir) {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!("image catalog scan failed ({err}); using builtin list");
                    ImageCatalog::builtin()
                }
            },
            None => ImageCatalog::builtin(),
        };
        if catalog.is_empty() {
            warn!("image catalog is empty; tunnel will render wireframe only");
        }
        let theme = config.start_theme;

        // Input event storage is registered here as well so the plugin is
        // self-contained when the host app runs without the input plugins.
        app.add_event::<bevy::input::mouse::MouseWheel>()
            .init_resource::<Touches>()
            .init_resource::<ButtonInput<KeyCode>>();

        app.insert_resource(theme)
            .insert_resource(catalog)
            .insert_resource(ClearColor(theme.palette().background))
            .insert_resource(SceneRng(fastrand::Rng::with_seed(config.seed)))
            .init_resource::<TextureCache>()
            .insert_resource(ScrollState::new(config.drift_step))
            .insert_resource(CameraState::new(
                config.camera_smoothing,
                config.scroll_scale,
            ))
            .add_event::<ThemeChanged>()
            .add_systems(Startup, (camera::setup_camera, segment::setup_tunnel).chain())
            // One cooperative tick: scroll -> camera -> recycle -> texture
            // settlement -> slab resolution, strictly in that order.
            .add_systems(
                Update,
                (
                    scroll::read_user_scroll,
                    scroll::apply_drift,
                    camera::ease_camera,
                    pool::recycle_segments,
                    texture_cache::track_texture_loads,
                    slab::resolve_slabs,
                    slab::fade_in_slabs,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (theme::toggle_theme_on_key, theme::apply_theme).chain(),
            )
            .add_systems(Last, teardown_on_exit);
    }
}

/// Releases scene resources when the app shuts down. Safe to run repeatedly:
/// the cache release is flag-guarded and the segment query only ever matches
/// live entities.
fn teardown_on_exit(
    mut exit: EventReader<AppExit>,
    mut commands: Commands,
    mut cache: ResMut<TextureCache>,
    segments: Query<Entity, With<segment::Segment>>,
) {
    if exit.read().next().is_none() {
        return;
    }
    let released = cache.release_all();
    if released > 0 {
        info!("released {released} cached textures");
    }
    for segment in &segments {
        commands.entity(segment).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Segment, SegmentLines};
    use crate::slab::Slab;

    fn scene_app(seed: u64) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .insert_resource(GalleriaConfig {
                seed,
                ..Default::default()
            })
            .add_plugins(GalleriaScenePlugin);
        app
    }

    fn segment_depths(app: &mut App) -> Vec<f32> {
        let mut query = app
            .world_mut()
            .query_filtered::<&Transform, With<Segment>>();
        let mut depths: Vec<f32> = query
            .iter(app.world())
            .map(|t| t.translation.z)
            .collect();
        depths.sort_by(|a, b| b.partial_cmp(a).unwrap());
        depths
    }

    #[test]
    fn test_pool_spawns_at_uniform_depths() {
        let mut app = scene_app(7);
        app.update();
        let depths = segment_depths(&mut app);
        let expected: Vec<f32> = (0..8).map(|i| -(i as f32) * 6.0).collect();
        assert_eq!(depths, expected);
    }

    #[test]
    fn test_segment_count_stable_over_frames() {
        let mut app = scene_app(11);
        for _ in 0..50 {
            app.update();
        }
        assert_eq!(segment_depths(&mut app).len(), 8);
    }

    #[test]
    fn test_recycle_relocates_only_trailing_segment() {
        let mut app = scene_app(3);
        app.update();

        // Drive the eased camera past the first segment boundary.
        app.world_mut().resource_mut::<ScrollState>().position = 130.0;
        app.world_mut().resource_mut::<CameraState>().current = -6.5;
        app.update();

        let depths = segment_depths(&mut app);
        assert_eq!(depths.len(), 8);
        // The segment that was at z = 0 is now the new far end; spacing stays
        // uniform.
        let expected: Vec<f32> = (1..9).map(|i| -(i as f32) * 6.0).collect();
        assert_eq!(depths, expected);
    }

    #[test]
    fn test_recycled_segment_gets_fresh_slabs() {
        let mut app = scene_app(9);
        app.update();
        let before = {
            let mut query = app.world_mut().query::<(&Slab, &ChildOf)>();
            query.iter(app.world()).count()
        };
        assert!(before > 0, "seeded scene should have slabs");

        app.world_mut().resource_mut::<ScrollState>().position = 130.0;
        app.world_mut().resource_mut::<CameraState>().current = -6.5;
        app.update();
        app.update();

        // Every slab must belong to a live segment.
        let mut segments = app.world_mut().query_filtered::<Entity, With<Segment>>();
        let live: Vec<Entity> = segments.iter(app.world()).collect();
        let mut slabs = app.world_mut().query::<(&Slab, &ChildOf)>();
        for (_, child_of) in slabs.iter(app.world()) {
            assert!(live.contains(&child_of.parent()));
        }
    }

    #[test]
    fn test_theme_toggle_recolors_wireframes_only() {
        let mut app = scene_app(2);
        app.update();

        let slab_positions = |app: &mut App| {
            let mut query = app.world_mut().query::<(Entity, &Slab, &Transform)>();
            let mut positions: Vec<(Entity, Vec3)> = query
                .iter(app.world())
                .map(|(entity, _, t)| (entity, t.translation))
                .collect();
            positions.sort_by_key(|(entity, _)| *entity);
            positions
        };
        let slab_positions_before = slab_positions(&mut app);

        app.world_mut().send_event(ThemeChanged(Theme::Light));
        app.update();

        assert_eq!(*app.world().resource::<Theme>(), Theme::Light);
        let palette = Theme::Light.palette();
        let expected = palette.line_color.with_alpha(palette.line_opacity);
        let handles: Vec<Handle<StandardMaterial>> = {
            let mut query = app.world_mut().query::<&SegmentLines>();
            query.iter(app.world()).map(|l| l.0.clone()).collect()
        };
        assert_eq!(handles.len(), 8);
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        for handle in &handles {
            assert_eq!(materials.get(handle).unwrap().base_color, expected);
        }

        assert_eq!(slab_positions_before, slab_positions(&mut app));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut app = scene_app(1);
        app.update();
        assert!(!app.world().resource::<TextureCache>().is_empty());

        app.world_mut().send_event(AppExit::Success);
        app.update();
        assert!(app.world().resource::<TextureCache>().is_empty());
        assert_eq!(segment_depths(&mut app).len(), 0);

        // A second shutdown signal must not double-free or panic.
        app.world_mut().send_event(AppExit::Success);
        app.update();
        assert!(app.world().resource::<TextureCache>().is_empty());
    }

    #[test]
    fn test_drift_advances_scene_headless() {
        let mut app = scene_app(5);
        app.update();
        for _ in 0..30 {
            app.update();
        }
        let scroll = app.world().resource::<ScrollState>();
        assert!(scroll.position > 0.0);
        let camera = app.world().resource::<CameraState>();
        assert!(camera.current <= 0.0);
    }
}
