//! Closed-form launch velocity for a hop between segments
//!
//! Forward motion comes from the path scrolling at constant speed, so only
//! the vertical component is solved: reach height offset `h` after
//! `t = d / s` seconds under gravity `g`.

use glam::Vec3;

use crate::error::TrajectoryError;

/// Flight time for a horizontal distance at a horizontal speed
#[inline]
pub fn flight_time(distance: f32, speed: f32) -> Result<f32, TrajectoryError> {
    if !(speed > 0.0) {
        return Err(TrajectoryError::NonPositiveSpeed(speed));
    }
    if !(distance > 0.0) {
        return Err(TrajectoryError::NonPositiveDistance(distance));
    }
    Ok(distance / speed)
}

/// Launch velocity that lands `height` above the source after covering
/// `distance` at `speed`, with gravity magnitude `gravity`.
///
/// Returns `(0, v_y, 0)` where `v_y = (h + g t^2 / 2) / t`.
pub fn launch_velocity(
    distance: f32,
    height: f32,
    speed: f32,
    gravity: f32,
) -> Result<Vec3, TrajectoryError> {
    if !height.is_finite() || !gravity.is_finite() {
        return Err(TrajectoryError::NonFinite);
    }
    let t = flight_time(distance, speed)?;
    let g = gravity.abs();
    let vy = (height + 0.5 * g * t * t) / t;
    if !vy.is_finite() {
        return Err(TrajectoryError::NonFinite);
    }
    Ok(Vec3::new(0.0, vy, 0.0))
}
