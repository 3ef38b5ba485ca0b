use bevy::prelude::*;

use crate::camera::CameraState;
use crate::populate::{PopulateContext, populate_segment};
use crate::segment::Segment;
use crate::slab::Slab;

/// Boundary check for one segment. Returns the depth it should move to, or
/// `None` if it is still inside the visible window. `min_z`/`max_z` are the
/// current extremes across the whole pool.
pub fn recycle_target(
    z: f32,
    cam_z: f32,
    min_z: f32,
    max_z: f32,
    segment_depth: f32,
    tunnel_length: f32,
) -> Option<f32> {
    if z > cam_z + segment_depth {
        // Passed behind the camera while travelling forward: extend the far end.
        return Some(min_z - segment_depth);
    }
    if z < cam_z - tunnel_length - segment_depth {
        // Fell off the far end while travelling backward: extend the near end.
        return Some(max_z + segment_depth);
    }
    None
}

/// Conveyor-belts out-of-window segments to the opposite end of the tunnel.
/// Segments are never destroyed; a recycled segment is repositioned, its
/// slabs despawned (their mesh and material assets die with them, the texture
/// cache entries do not) and repopulated for the new depth. The extremum scan
/// is O(N) per segment with N around 8.
pub fn recycle_segments(
    mut commands: Commands,
    camera: Res<CameraState>,
    mut segments: Query<(Entity, &mut Transform), With<Segment>>,
    slabs: Query<(Entity, &ChildOf), With<Slab>>,
    mut ctx: PopulateContext,
) {
    let cam_z = camera.current;
    let config = ctx.config.clone();
    let tunnel_length = config.tunnel_length();
    let entities: Vec<Entity> = segments.iter().map(|(entity, _)| entity).collect();

    for entity in entities {
        let mut min_z = f32::MAX;
        let mut max_z = f32::MIN;
        for (_, transform) in segments.iter() {
            min_z = min_z.min(transform.translation.z);
            max_z = max_z.max(transform.translation.z);
        }
        let Ok((_, mut transform)) = segments.get_mut(entity) else {
            continue;
        };
        let Some(new_z) = recycle_target(
            transform.translation.z,
            cam_z,
            min_z,
            max_z,
            config.segment_depth,
            tunnel_length,
        ) else {
            continue;
        };
        transform.translation.z = new_z;
        for (slab, child_of) in slabs.iter() {
            if child_of.parent() == entity {
                commands.entity(slab).despawn();
            }
        }
        populate_segment(
            &mut commands,
            entity,
            &config,
            &ctx.catalog,
            &mut ctx.cache,
            &ctx.assets,
            &mut ctx.materials,
            &mut ctx.rng.0,
        );
    }
}
