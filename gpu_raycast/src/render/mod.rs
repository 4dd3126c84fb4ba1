//! Ray casting: GPU mapper and CPU preview

mod cpu_renderer;
pub mod gl;
mod mapper;
mod options;
mod params;
mod renderable;
mod shader;
mod step_control;

pub use cpu_renderer::{CpuRenderer, RenderOptions, OPACITY_CUTOFF};
pub use mapper::{
    Frame, GpuRayCastMapper, MapperState, LOOKUP_UNIT, MIN_FRAGMENT_UNIFORM_COMPONENTS,
    MIN_TEXTURE_UNITS, VOLUME1_UNIT, VOLUME2_UNIT,
};
pub use options::{MapperOptions, MapperOptionsBuilder};
pub use params::{RayCastParameters, TextureSpace};
pub use renderable::{create_mapper, negotiate_mapper, MapperKind, Renderable};
pub use shader::{
    fragment_shader_source, vertex_shader_source, ColorLayout, ShaderProgram, Technique,
};
pub use step_control::{adjust_step_count, max_ray_steps, MIN_RAY_STEPS};
