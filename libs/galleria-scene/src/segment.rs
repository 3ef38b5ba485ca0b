use bevy::prelude::*;
use bevy::render::{render_asset::RenderAssetUsages, render_resource::PrimitiveTopology};

use crate::config::GalleriaConfig;
use crate::populate::{PopulateContext, populate_segment};
use crate::theme::{Theme, ThemePalette};

/// One repeatable length of tunnel. Segments are spawned once at startup and
/// never despawned; recycling only moves them and replaces their slabs.
#[derive(Component)]
pub struct Segment;

/// Handle to the segment's wireframe line material, recolored in place on
/// theme changes.
#[derive(Component)]
pub struct SegmentLines(pub Handle<StandardMaterial>);

/// Line-list vertices for one segment's wireframe: longitudinal floor and
/// ceiling traces per column boundary, one trace per interior row boundary on
/// each wall, and the four lateral lines closing the near-face ring.
pub fn wireframe_vertices(config: &GalleriaConfig) -> Vec<[f32; 3]> {
    let w = config.tunnel_width / 2.0;
    let h = config.tunnel_height / 2.0;
    let d = config.segment_depth;
    let mut vertices = Vec::with_capacity((config.floor_cols + config.wall_rows) * 4 + 12);

    for i in 0..=config.floor_cols {
        let x = -w + i as f32 * config.col_width();
        vertices.push([x, -h, 0.0]);
        vertices.push([x, -h, -d]);
        vertices.push([x, h, 0.0]);
        vertices.push([x, h, -d]);
    }
    for i in 1..config.wall_rows {
        let y = -h + i as f32 * config.row_height();
        vertices.push([-w, y, 0.0]);
        vertices.push([-w, y, -d]);
        vertices.push([w, y, 0.0]);
        vertices.push([w, y, -d]);
    }

    // Near-face ring at z = 0.
    vertices.push([-w, -h, 0.0]);
    vertices.push([w, -h, 0.0]);
    vertices.push([-w, h, 0.0]);
    vertices.push([w, h, 0.0]);
    vertices.push([-w, -h, 0.0]);
    vertices.push([-w, h, 0.0]);
    vertices.push([w, -h, 0.0]);
    vertices.push([w, h, 0.0]);

    vertices
}

pub fn build_wireframe_mesh(config: &GalleriaConfig) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::LineList,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, wireframe_vertices(config));
    mesh
}

/// Spawns one segment at `depth`: the root entity plus its wireframe child.
/// The wireframe mesh is built here once and never rebuilt.
pub fn spawn_segment(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    config: &GalleriaConfig,
    palette: &ThemePalette,
    depth: f32,
) -> Entity {
    let line_material = materials.add(StandardMaterial {
        base_color: palette.line_color.with_alpha(palette.line_opacity),
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        cull_mode: None,
        ..default()
    });
    let segment = commands
        .spawn((
            Segment,
            SegmentLines(line_material.clone()),
            Transform::from_xyz(0.0, 0.0, depth),
            Visibility::default(),
        ))
        .id();
    commands.spawn((
        Mesh3d(meshes.add(build_wireframe_mesh(config))),
        MeshMaterial3d(line_material),
        ChildOf(segment),
    ));
    segment
}

/// Startup: builds the whole pool at `0, -D, …, -(N-1)D` and seeds each
/// segment with its initial slabs.
pub fn setup_tunnel(
    mut commands: Commands,
    theme: Res<Theme>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut ctx: PopulateContext,
) {
    let palette = theme.palette();
    let config = ctx.config.clone();
    for i in 0..config.segment_count {
        let depth = -(i as f32) * config.segment_depth;
        let segment = spawn_segment(
            &mut commands,
            &mut meshes,
            &mut ctx.materials,
            &config,
            &palette,
            depth,
        );
        populate_segment(
            &mut commands,
            segment,
            &config,
            &ctx.catalog,
            &mut ctx.cache,
            &ctx.assets,
            &mut ctx.materials,
            &mut ctx.rng.0,
        );
    }
    info!(
        "tunnel ready: {} segments, {}m deep each, {} catalog images",
        config.segment_count,
        config.segment_depth,
        ctx.catalog.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wireframe_vertex_count() {
        let config = GalleriaConfig::default();
        // 7 column boundaries x 2 traces + 3 interior rows x 2 walls + 4 ring
        // lines = 24 lines, two vertices each.
        assert_eq!(wireframe_vertices(&config).len(), 48);
    }

    #[test]
    fn test_wireframe_spans_segment_depth() {
        let config = GalleriaConfig::default();
        let vertices = wireframe_vertices(&config);
        let near = vertices.iter().filter(|v| v[2] == 0.0).count();
        let far = vertices.iter().filter(|v| v[2] == -config.segment_depth).count();
        // Each longitudinal line has one near and one far endpoint; the ring
        // is entirely on the near face.
        assert_eq!(far, 20);
        assert_eq!(near, 28);
        assert!(vertices.iter().all(|v| v[0].abs() <= config.tunnel_width / 2.0));
        assert!(vertices.iter().all(|v| v[1].abs() <= config.tunnel_height / 2.0));
    }
}
