use std::str::FromStr;

use bevy::prelude::*;

use crate::theme::Theme;

/// Tunnel geometry and motion parameters.
///
/// Every field can be overridden through a `GALLERIA_*` environment variable;
/// the binary's CLI flags map onto the same struct before the plugin is added.
#[derive(Clone, Resource)]
pub struct GalleriaConfig {
    pub tunnel_width: f32,
    pub tunnel_height: f32,
    pub segment_depth: f32,
    pub segment_count: usize,
    pub floor_cols: usize,
    pub wall_rows: usize,
    pub cell_margin: f32,
    pub fog_density: f32,
    /// Scroll units added per frame while the user is idle.
    pub drift_step: f32,
    /// Scroll position to camera depth conversion factor.
    pub scroll_scale: f32,
    /// Fraction of the remaining distance the camera covers each frame.
    pub camera_smoothing: f32,
    pub seed: u64,
    /// Subdirectory of the asset root to scan for tunnel images.
    pub image_dir: Option<String>,
    pub start_theme: Theme,
}

impl Default for GalleriaConfig {
    fn default() -> Self {
        Self {
            tunnel_width: 37.5,
            tunnel_height: 25.0,
            segment_depth: 6.0,
            segment_count: 8,
            floor_cols: 6,
            wall_rows: 4,
            cell_margin: 0.4,
            fog_density: 0.02,
            drift_step: 0.1,
            scroll_scale: 0.05,
            camera_smoothing: 0.1,
            seed: 0,
            image_dir: None,
            start_theme: Theme::Dark,
        }
    }
}

impl GalleriaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let segment_count: usize =
            env_parse("GALLERIA_SEGMENTS").unwrap_or(defaults.segment_count);
        let segment_depth: f32 =
            env_parse("GALLERIA_SEGMENT_DEPTH").unwrap_or(defaults.segment_depth);
        let start_theme = if env_flag("GALLERIA_LIGHT", false) {
            Theme::Light
        } else {
            defaults.start_theme
        };
        Self {
            tunnel_width: env_parse("GALLERIA_TUNNEL_WIDTH").unwrap_or(defaults.tunnel_width),
            tunnel_height: env_parse("GALLERIA_TUNNEL_HEIGHT").unwrap_or(defaults.tunnel_height),
            segment_depth: segment_depth.max(1.0),
            segment_count: segment_count.max(2),
            floor_cols: env_parse("GALLERIA_FLOOR_COLS")
                .unwrap_or(defaults.floor_cols)
                .max(1),
            wall_rows: env_parse("GALLERIA_WALL_ROWS")
                .unwrap_or(defaults.wall_rows)
                .max(1),
            cell_margin: env_parse("GALLERIA_CELL_MARGIN").unwrap_or(defaults.cell_margin),
            fog_density: env_parse("GALLERIA_FOG_DENSITY").unwrap_or(defaults.fog_density),
            drift_step: env_parse("GALLERIA_DRIFT_STEP").unwrap_or(defaults.drift_step),
            scroll_scale: env_parse("GALLERIA_SCROLL_SCALE").unwrap_or(defaults.scroll_scale),
            camera_smoothing: env_parse("GALLERIA_CAMERA_SMOOTHING")
                .unwrap_or(defaults.camera_smoothing)
                .clamp(0.01, 1.0),
            seed: env_parse("GALLERIA_SEED").unwrap_or(defaults.seed),
            image_dir: std::env::var("GALLERIA_IMAGES").ok().filter(|s| !s.is_empty()),
            start_theme,
        }
    }

    pub fn col_width(&self) -> f32 {
        self.tunnel_width / self.floor_cols as f32
    }

    pub fn row_height(&self) -> f32 {
        self.tunnel_height / self.wall_rows as f32
    }

    pub fn tunnel_length(&self) -> f32 {
        self.segment_count as f32 * self.segment_depth
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_dimensions() {
        let config = GalleriaConfig::default();
        assert_eq!(config.col_width(), 6.25);
        assert_eq!(config.row_height(), 6.25);
        assert_eq!(config.tunnel_length(), 48.0);
    }
}
