//! Mapper selection
//!
//! Hosts hold mappers as `Box<dyn Renderable>` and pick one with
//! [`create_mapper`] or [`negotiate_mapper`].

use log::info;

use super::{gl::GraphicsContext, Frame, GpuRayCastMapper, MapperOptions};
use crate::{error::RaycastResult, volumetric::VoxelGrid};

/// Interface of anything drawing a volume through a graphics context
///
/// Inputs arrive as a [`Frame`] snapshot on every call, implementors decide
/// themselves what changed since the last frame.
pub trait Renderable {
    /// Whether `grid` can be drawn with `ctx`
    fn is_supported(&mut self, ctx: &mut dyn GraphicsContext, grid: Option<&VoxelGrid>) -> bool;

    /// Draw one frame
    fn render(&mut self, ctx: &mut dyn GraphicsContext, frame: &Frame) -> RaycastResult<()>;

    /// Delete all GPU objects, can be called any number of times
    fn release_resources(&mut self, ctx: &mut dyn GraphicsContext);
}

impl Renderable for GpuRayCastMapper {
    fn is_supported(&mut self, ctx: &mut dyn GraphicsContext, grid: Option<&VoxelGrid>) -> bool {
        self.is_render_supported(ctx, grid)
    }

    fn render(&mut self, ctx: &mut dyn GraphicsContext, frame: &Frame) -> RaycastResult<()> {
        GpuRayCastMapper::render(self, ctx, frame)
    }

    fn release_resources(&mut self, ctx: &mut dyn GraphicsContext) {
        GpuRayCastMapper::release_resources(self, ctx)
    }
}

/// Available mapper implementations, most capable first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    /// Single pass ray casting in a fragment shader
    GpuRayCast,
}

impl MapperKind {
    pub const ALL: [MapperKind; 1] = [MapperKind::GpuRayCast];
}

pub fn create_mapper(kind: MapperKind, options: MapperOptions) -> Box<dyn Renderable> {
    match kind {
        MapperKind::GpuRayCast => Box::new(GpuRayCastMapper::new(options)),
    }
}

/// First mapper kind able to draw `grid` with `ctx`.
pub fn negotiate_mapper(
    ctx: &mut dyn GraphicsContext,
    grid: &VoxelGrid,
    options: MapperOptions,
) -> Option<(MapperKind, Box<dyn Renderable>)> {
    for kind in MapperKind::ALL {
        let mut mapper = create_mapper(kind, options);
        if mapper.is_supported(ctx, Some(grid)) {
            info!("Using {:?} mapper", kind);
            return Some((kind, mapper));
        }
    }
    None
}
