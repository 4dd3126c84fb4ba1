mod gradient;
mod grid;
mod resample;
mod scalar;
mod vol_builder;

pub use gradient::{estimate_gradients, slice_range, worker_count};
pub use grid::VoxelGrid;
pub use resample::{
    is_texture_size_supported, resample, resampled_spacing, target_dims, voxel_budget,
    Quantization, ResampledVolume, Resampler, DEFAULT_INTERNAL_VOLUME_SIZE, RGBA_VOLUME_SIZE,
};
pub use scalar::{Scalar, ScalarData, ScalarType};
pub use vol_builder::{build_grid, from_data_source, from_file, DataSource, HeaderParser, VolumeMetadata};
