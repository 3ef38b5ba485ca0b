use bevy::pbr::DistanceFog;
use bevy::prelude::*;

use crate::camera::TunnelCamera;
use crate::segment::{Segment, SegmentLines};

/// The host-pushed color scheme. The scene consumes this value, it never
/// computes it.
#[derive(Resource, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

pub struct ThemePalette {
    pub background: Color,
    pub line_color: Color,
    pub line_opacity: f32,
}

impl Theme {
    pub fn palette(&self) -> ThemePalette {
        match self {
            Theme::Dark => ThemePalette {
                background: Color::srgb_u8(0x05, 0x05, 0x05),
                line_color: Color::srgb_u8(0x93, 0x33, 0xEA),
                line_opacity: 0.4,
            },
            Theme::Light => ThemePalette {
                background: Color::WHITE,
                line_color: Color::srgb_u8(0x7C, 0x3A, 0xED),
                line_opacity: 0.5,
            },
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Event, Clone, Copy, Debug)]
pub struct ThemeChanged(pub Theme);

pub fn toggle_theme_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    theme: Res<Theme>,
    mut events: EventWriter<ThemeChanged>,
) {
    if keys.just_pressed(KeyCode::KeyT) {
        events.write(ThemeChanged(theme.toggled()));
    }
}

/// Recolors the scene in place: background, fog and every segment's wireframe
/// material. Slab materials are texture-driven and untouched; no geometry is
/// rebuilt.
pub fn apply_theme(
    mut events: EventReader<ThemeChanged>,
    mut theme: ResMut<Theme>,
    mut clear_color: ResMut<ClearColor>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    segments: Query<&SegmentLines, With<Segment>>,
    mut fog: Query<&mut DistanceFog, With<TunnelCamera>>,
) {
    let Some(ThemeChanged(next)) = events.read().last().copied() else {
        return;
    };
    *theme = next;
    let palette = next.palette();
    clear_color.0 = palette.background;
    if let Ok(mut fog) = fog.single_mut() {
        fog.color = palette.background;
    }
    let mut recolored = 0;
    for lines in &segments {
        if let Some(material) = materials.get_mut(&lines.0) {
            material.base_color = palette.line_color.with_alpha(palette.line_opacity);
            recolored += 1;
        }
    }
    debug!("theme switched to {next:?}, recolored {recolored} segment wireframes");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn test_palettes_differ() {
        let dark = Theme::Dark.palette();
        let light = Theme::Light.palette();
        assert_ne!(dark.background, light.background);
        assert_ne!(dark.line_color, light.line_color);
        assert!(dark.line_opacity < light.line_opacity);
    }
}
