pub use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

pub use gpu_raycast::{
    camera::PerspectiveCamera,
    test_helpers,
    transfer::{bake_lookup_table, TransferLookup, VolumeProperty},
    volumetric::{estimate_gradients, resample, Resampler, VoxelGrid},
    CpuRenderer, RenderOptions, Technique,
};
pub use nalgebra::{point, vector, Point3};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 256;

/// Edge of the benchmark sphere
pub const SIDE: usize = 128;

pub const POSITION: Point3<f32> = point![300.0, 250.0, 280.0];

pub fn get_grid() -> VoxelGrid {
    test_helpers::sphere_grid(SIDE)
}

pub fn get_camera() -> PerspectiveCamera {
    let center = (SIDE as f32 - 1.0) / 2.0;
    PerspectiveCamera::look_at(POSITION, point![center, center, center])
}
