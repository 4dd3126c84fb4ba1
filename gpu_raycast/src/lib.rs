//! GPU volume ray casting
//!
//! Resamples a voxel grid into 8 bit textures, bakes the transfer functions
//! into a lookup table, generates the ray casting shaders and draws the
//! volume through a [`render::gl::GraphicsContext`].
//! [`render::CpuRenderer`] renders the same textures without a GPU.

pub mod camera;
pub mod clip;
pub mod common;
pub mod error;
pub mod premade;
pub mod render;
pub mod test_helpers;
pub mod transfer;
pub mod volumetric;

pub use error::{RaycastError, RaycastResult};
pub use render::{CpuRenderer, Frame, GpuRayCastMapper, MapperOptions, RenderOptions, Technique};
pub use transfer::VolumeProperty;
pub use volumetric::VoxelGrid;
