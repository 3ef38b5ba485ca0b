use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use crate::config::GalleriaConfig;
use crate::scroll::ScrollState;
use crate::theme::Theme;

#[derive(Component)]
pub struct TunnelCamera;

/// Eased camera depth derived from the scroll scalar.
#[derive(Resource)]
pub struct CameraState {
    pub current: f32,
    pub smoothing: f32,
    pub scale: f32,
}

impl CameraState {
    pub fn new(smoothing: f32, scale: f32) -> Self {
        Self {
            current: 0.0,
            smoothing,
            scale,
        }
    }

    pub fn target(&self, scroll_position: f32) -> f32 {
        -scroll_position * self.scale
    }

    /// One easing step. Deliberately frame-coupled: a fixed fraction of the
    /// remaining distance per tick, not scaled by delta time, reproducing the
    /// original motion (perceived speed varies with frame rate).
    pub fn ease(&mut self, scroll_position: f32) -> f32 {
        let target = self.target(scroll_position);
        self.current += (target - self.current) * self.smoothing;
        self.current
    }
}

pub fn setup_camera(mut commands: Commands, config: Res<GalleriaConfig>, theme: Res<Theme>) {
    let palette = theme.palette();
    commands.spawn((
        TunnelCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 70.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_xyz(0.0, 0.0, 0.0),
        DistanceFog {
            color: palette.background,
            falloff: FogFalloff::Exponential {
                density: config.fog_density,
            },
            ..default()
        },
    ));
}

/// Advances the eased depth and mirrors it onto the camera transform. The
/// recycle pass that follows in the same tick reads the already-advanced
/// value from `CameraState`.
pub fn ease_camera(
    scroll: Res<ScrollState>,
    mut camera: ResMut<CameraState>,
    mut transforms: Query<&mut Transform, With<TunnelCamera>>,
) {
    let depth = camera.ease(scroll.position);
    if let Ok(mut transform) = transforms.single_mut() {
        transform.translation.z = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_converges_without_overshoot() {
        let mut camera = CameraState::new(0.1, 0.05);
        let target = camera.target(60.0);
        assert_eq!(target, -3.0);
        let mut previous = camera.current;
        for _ in 0..400 {
            let current = camera.ease(60.0);
            assert!(current <= previous + 1e-6, "camera moved away from target");
            assert!(current >= target - 1e-6, "camera overshot target");
            previous = current;
        }
        assert!((camera.current - target).abs() < 1e-3);
    }

    #[test]
    fn test_ease_is_frame_coupled() {
        // Two ticks cover more ground than one, but less than double the
        // distance: the fraction applies to the remainder, not to time.
        let mut one = CameraState::new(0.1, 0.05);
        one.ease(100.0);
        let mut two = CameraState::new(0.1, 0.05);
        two.ease(100.0);
        two.ease(100.0);
        assert!(two.current < one.current);
        assert!(two.current > 2.0 * one.current);
    }

    #[test]
    fn test_ease_tracks_reversals() {
        let mut camera = CameraState::new(0.1, 0.05);
        for _ in 0..200 {
            camera.ease(60.0);
        }
        // Scrolling back up raises the target; the camera follows.
        let before = camera.current;
        camera.ease(0.0);
        assert!(camera.current > before);
    }
}
