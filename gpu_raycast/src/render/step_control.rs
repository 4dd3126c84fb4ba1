//! Adaptive sample count
//!
//! After each frame the number of ray steps is scaled so the next frame
//! approaches the desired frame time.

use nalgebra::Vector3;

/// Lowest step count the controller settles on
pub const MIN_RAY_STEPS: f32 = 200.0;

/// Upper bound of steps relative to the largest volume dimension
pub const MAX_STEPS_PER_VOXEL: f32 = 1.8;

/// Time assumed for a frame that reported zero duration
pub const MIN_FRAME_TIME: f32 = 0.0001;

/// Largest useful step count for a texture of `dims`
pub fn max_ray_steps(dims: Vector3<usize>) -> f32 {
    dims.max() as f32 * MAX_STEPS_PER_VOXEL
}

/// New step count after a frame that took `last_frame_time` seconds.
///
/// Frame rates at or below 0.01 are treated as 1 fps. Inside a dead zone of
/// 10% around the target time the count is unchanged, otherwise it is scaled
/// and clamped to `[200, 1.8 * max(dims)]`, the lower bound winning.
pub fn adjust_step_count(
    ray_steps: f32,
    last_frame_time: f32,
    framerate: f32,
    dims: Vector3<usize>,
) -> f32 {
    let framerate = if framerate <= 0.01 { 1.0 } else { framerate };
    let last_frame_time = if last_frame_time == 0.0 {
        MIN_FRAME_TIME
    } else {
        last_frame_time
    };
    let target_time = 1.0 / framerate;

    if (target_time - last_frame_time).abs() < 0.1 * target_time {
        return ray_steps;
    }

    let steps = ray_steps * target_time / (last_frame_time * 1.5);
    steps.min(max_ray_steps(dims)).max(MIN_RAY_STEPS)
}
