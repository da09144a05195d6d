//! Ball vs. segment and ball vs. item contact tests

use glam::Vec3;

use super::state::{Segment, SegmentId, Terrain};

/// Result of a landing query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub segment: SegmentId,
    /// Ball center height resting on the surface
    pub rest_y: f32,
}

/// Whether the segment's top face lies under `pos` in the XZ plane
#[inline]
pub fn over_footprint(pos: Vec3, segment: &Segment, half_width: f32) -> bool {
    (pos.x - segment.pos.x).abs() <= half_width
        && (pos.z - segment.pos.z).abs() <= segment.length / 2.0
}

/// Did a ball moving from `prev_y` to `pos.y` cross the segment's top face
/// from above this step?
pub fn ball_segment_landing(
    prev_y: f32,
    pos: Vec3,
    radius: f32,
    segment: &Segment,
    half_width: f32,
) -> bool {
    if !over_footprint(pos, segment, half_width) {
        return false;
    }
    let surface = segment.pos.y;
    let bottom_before = prev_y - radius;
    let bottom_now = pos.y - radius;
    bottom_now <= surface && bottom_before >= surface - 1e-4
}

/// First active segment the ball lands on this step
pub fn find_landing(
    terrain: &dyn Terrain,
    prev_y: f32,
    pos: Vec3,
    radius: f32,
    half_width: f32,
) -> Option<Landing> {
    terrain
        .active_segments()
        .find(|s| ball_segment_landing(prev_y, pos, radius, s, half_width))
        .map(|s| Landing {
            segment: s.id,
            rest_y: s.pos.y + radius,
        })
}

/// Sphere vs. sphere overlap
#[inline]
pub fn ball_item_overlap(
    ball_pos: Vec3,
    ball_radius: f32,
    item_pos: Vec3,
    item_radius: f32,
) -> bool {
    let reach = ball_radius + item_radius;
    ball_pos.distance_squared(item_pos) <= reach * reach
}
