//! GPU ray cast volume mapper
//!
//! Owns the resampled textures, the baked lookup table and the shader
//! program of one volume and draws it through a [`GraphicsContext`].

use std::time::Instant;

use crossbeam::channel::Sender;
use log::{debug, info};

use super::{
    adjust_step_count,
    gl::{GraphicsContext, Material, ProgramHandle, TextureFilter, TextureHandle},
    ColorLayout, MapperOptions, RayCastParameters, ShaderProgram, Technique,
};
use crate::{
    camera::FrameView,
    clip::{clip_box, ClipConsumer, ClipPlane},
    common::BoundBox,
    error::{RaycastError, RaycastResult},
    transfer::{Interpolation, TransferLookup, VolumeProperty, LOOKUP_SIZE},
    volumetric::{Resampler, VoxelGrid},
};

/// Texture unit of the quantized volume
pub const VOLUME1_UNIT: u32 = 7;
/// Texture unit of the normal volume
pub const VOLUME2_UNIT: u32 = 5;
/// Texture unit of the lookup table
pub const LOOKUP_UNIT: u32 = 6;

/// Minimum texture image units the fragment shader needs
pub const MIN_TEXTURE_UNITS: u32 = 8;
/// Two 4x4 matrices
pub const MIN_FRAGMENT_UNIFORM_COMPONENTS: u32 = 32;

/// Lifecycle of the mapper's GPU side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperState {
    Uninitialized,
    /// Context capabilities queried
    Initialized,
    /// Program built for the current technique and layout
    ShaderCompiled,
    /// At least one frame drawn with the current program
    Ready,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub grid: &'a VoxelGrid,
    pub property: &'a VolumeProperty,
    pub view: FrameView,
}

pub struct GpuRayCastMapper {
    options: MapperOptions,
    state: MapperState,
    supported: bool,
    reload_shader: bool,

    ray_steps: f32,
    last_frame_time: f32,

    resampler: Resampler,
    lookup: TransferLookup,
    volumes_stale: bool,
    lookup_stale: bool,
    progress: Option<Sender<f32>>,

    program: Option<ShaderProgram>,
    volume1: TextureHandle,
    volume2: TextureHandle,
    lookup_texture: TextureHandle,

    clip_planes: Vec<ClipPlane>,
    clipping: bool,
    parameters: Option<RayCastParameters>,
}

impl GpuRayCastMapper {
    pub fn new(options: MapperOptions) -> GpuRayCastMapper {
        GpuRayCastMapper {
            options,
            state: MapperState::Uninitialized,
            supported: false,
            reload_shader: false,
            ray_steps: options.ray_steps,
            last_frame_time: 0.0,
            resampler: Resampler::new(options.internal_volume_size),
            lookup: TransferLookup::new(),
            volumes_stale: true,
            lookup_stale: true,
            progress: None,
            program: None,
            volume1: TextureHandle::NONE,
            volume2: TextureHandle::NONE,
            lookup_texture: TextureHandle::NONE,
            clip_planes: Vec::new(),
            clipping: false,
            parameters: None,
        }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn state(&self) -> MapperState {
        self.state
    }

    pub fn technique(&self) -> Technique {
        self.options.technique
    }

    /// Switch technique, the program is rebuilt before the next frame
    pub fn set_technique(&mut self, technique: Technique) {
        self.options.technique = technique;
        self.reload_shader = true;
        if matches!(self.state, MapperState::ShaderCompiled | MapperState::Ready) {
            self.state = MapperState::Uninitialized;
        }
    }

    /// Change the resampling budget, the volume is resampled on the next frame
    pub fn set_internal_volume_size(&mut self, size: usize) {
        self.options.internal_volume_size = size;
        self.resampler.set_internal_volume_size(size);
    }

    pub fn set_options(&mut self, options: MapperOptions) {
        if options.technique != self.options.technique {
            self.set_technique(options.technique);
        }
        self.set_internal_volume_size(options.internal_volume_size);
        self.options = options;
    }

    /// Receive gradient estimation progress in `[0, 1]`
    pub fn set_progress_sender(&mut self, sender: Option<Sender<f32>>) {
        self.progress = sender;
    }

    pub fn ray_steps(&self) -> f32 {
        self.ray_steps
    }

    /// Duration of the last draw in seconds
    pub fn last_frame_time(&self) -> f32 {
        self.last_frame_time
    }

    /// Parameters of the last drawn frame
    pub fn parameters(&self) -> Option<&RayCastParameters> {
        self.parameters.as_ref()
    }

    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    pub fn lookup(&self) -> &TransferLookup {
        &self.lookup
    }

    pub fn is_clipping(&self) -> bool {
        self.clipping
    }

    /// Query the context for OpenGL 2.0, 2.1 or 3.0
    pub fn initialize(&mut self, ctx: &mut dyn GraphicsContext) {
        self.supported = [(2, 0), (2, 1), (3, 0)]
            .iter()
            .any(|&(major, minor)| ctx.supports_version(major, minor));
        self.state = MapperState::Initialized;
        info!("GPU ray casting supported: {}", self.supported);
    }

    /// Whether `grid` can be drawn with this context.
    ///
    /// Initializes the mapper on first use.
    pub fn is_render_supported(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        grid: Option<&VoxelGrid>,
    ) -> bool {
        if self.state == MapperState::Uninitialized {
            self.initialize(ctx);
        }
        if !self.supported {
            return false;
        }
        let grid = match grid {
            Some(g) => g,
            None => return false,
        };
        if grid.components() > 1 && grid.independent_components() {
            return false;
        }
        ctx.max_texture_image_units() >= MIN_TEXTURE_UNITS
            && ctx.max_fragment_uniform_components() >= MIN_FRAGMENT_UNIFORM_COMPONENTS
    }

    /// Draw one frame.
    ///
    /// Resampling and baking run before any GPU work, so a failing input
    /// leaves the previous textures untouched.
    pub fn render(&mut self, ctx: &mut dyn GraphicsContext, frame: &Frame) -> RaycastResult<()> {
        if self.state == MapperState::Uninitialized {
            self.initialize(ctx);
        }
        if !self.supported {
            return Err(RaycastError::Unsupported(
                "OpenGL 2.0 or newer is required".into(),
            ));
        }
        let grid = frame.grid;
        if grid.components() > 1 && grid.independent_components() {
            return Err(RaycastError::invalid(
                "independent components are not supported",
            ));
        }
        let layout = ColorLayout::from_components(grid.components())?;

        if self.resampler.update(grid, self.progress.as_ref())? {
            self.volumes_stale = true;
        }
        let (dims, quantization) = {
            let volume = self
                .resampler
                .volume()
                .ok_or_else(|| RaycastError::invalid("resampling produced no volume"))?;
            if self.lookup.update(grid, volume, frame.property) {
                self.lookup_stale = true;
            }
            (volume.dims, volume.quantization)
        };

        let needs_program = match &self.program {
            Some(program) => program.layout != layout,
            None => true,
        };
        if needs_program || self.reload_shader {
            self.initialize_ray_cast(ctx, layout)?;
        }

        self.ray_steps = adjust_step_count(
            self.ray_steps,
            self.last_frame_time,
            frame.view.desired_framerate,
            dims,
        );

        let parameters = RayCastParameters::compute(
            grid.bounds(),
            grid.transform(),
            self.clip_bounds(),
            &frame.view.world_to_view,
            self.ray_steps,
            &self.options,
            &quantization,
        )?;

        ctx.set_material(&Material::from_shading(&frame.property.shading));

        let program = self
            .program
            .as_ref()
            .map(ShaderProgram::program)
            .unwrap_or(ProgramHandle::NONE);
        ctx.use_program(program);

        self.setup_textures(ctx, frame.property.interpolation);
        self.setup_uniforms(ctx, program, &parameters);

        ctx.set_face_culling(true);
        let start = Instant::now();
        ctx.draw_box(&parameters.geometry);
        ctx.finish();
        self.last_frame_time = start.elapsed().as_secs_f32();

        ctx.use_program(ProgramHandle::NONE);

        self.parameters = Some(parameters);
        self.state = MapperState::Ready;
        Ok(())
    }

    /// Delete the old program and build one for the current technique
    fn initialize_ray_cast(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        layout: ColorLayout,
    ) -> RaycastResult<()> {
        if let Some(mut old) = self.program.take() {
            old.delete(ctx);
        }
        self.state = MapperState::Initialized;

        let program = ShaderProgram::build(ctx, self.options.technique, layout)?;
        self.program = Some(program);
        self.reload_shader = false;
        self.state = MapperState::ShaderCompiled;
        Ok(())
    }

    fn clip_bounds(&self) -> Option<BoundBox> {
        if self.clipping {
            clip_box(&self.clip_planes)
        } else {
            None
        }
    }

    fn setup_textures(&mut self, ctx: &mut dyn GraphicsContext, interpolation: Interpolation) {
        let filter = match interpolation {
            Interpolation::Nearest => TextureFilter::Nearest,
            Interpolation::Linear => TextureFilter::Linear,
        };

        if let Some(volume) = self.resampler.volume() {
            if self.volumes_stale || self.volume1.is_none() || self.volume2.is_none() {
                debug!("Uploading volume textures {:?}", volume.dims);

                ctx.active_texture_unit(VOLUME1_UNIT);
                ctx.delete_texture(self.volume1);
                self.volume1 = ctx.create_texture();
                ctx.upload_texture_3d(self.volume1, volume.dims, &volume.volume1);

                ctx.active_texture_unit(VOLUME2_UNIT);
                ctx.delete_texture(self.volume2);
                self.volume2 = ctx.create_texture();
                ctx.upload_texture_3d(self.volume2, volume.dims, &volume.volume2);

                self.volumes_stale = false;
            }
        }

        ctx.active_texture_unit(VOLUME1_UNIT);
        ctx.bind_texture_3d(self.volume1, filter);
        ctx.active_texture_unit(VOLUME2_UNIT);
        ctx.bind_texture_3d(self.volume2, filter);

        ctx.active_texture_unit(LOOKUP_UNIT);
        if self.lookup_stale || self.lookup_texture.is_none() {
            debug!("Uploading lookup table");
            ctx.delete_texture(self.lookup_texture);
            self.lookup_texture = ctx.create_texture();
            ctx.upload_texture_2d(
                self.lookup_texture,
                LOOKUP_SIZE,
                LOOKUP_SIZE,
                self.lookup.table(),
            );
            self.lookup_stale = false;
        }
        ctx.bind_texture_2d(self.lookup_texture, TextureFilter::Linear);
    }

    fn setup_uniforms(
        &self,
        ctx: &mut dyn GraphicsContext,
        program: ProgramHandle,
        parameters: &RayCastParameters,
    ) {
        let samplers = [
            ("TextureVol", VOLUME1_UNIT),
            ("TextureVol1", VOLUME2_UNIT),
            ("TextureColorLookup", LOOKUP_UNIT),
        ];
        for (name, unit) in samplers {
            if let Some(loc) = ctx.uniform_location(program, name) {
                ctx.set_uniform_i32(loc, unit as i32);
            }
        }

        if let Some(loc) = ctx.uniform_location(program, "ParaMatrix") {
            ctx.set_uniform_mat4(loc, &parameters.para_matrix);
        }
        if let Some(loc) = ctx.uniform_location(program, "VolumeMatrix") {
            ctx.set_uniform_mat4(loc, &parameters.volume_matrix);
        }
    }

    /// Delete every GPU object, can be called any number of times.
    pub fn release_resources(&mut self, ctx: &mut dyn GraphicsContext) {
        for texture in [self.volume1, self.volume2, self.lookup_texture] {
            if !texture.is_none() {
                ctx.delete_texture(texture);
            }
        }
        self.volume1 = TextureHandle::NONE;
        self.volume2 = TextureHandle::NONE;
        self.lookup_texture = TextureHandle::NONE;

        if let Some(mut program) = self.program.take() {
            program.delete(ctx);
        }
        self.state = MapperState::Uninitialized;
    }

    pub fn texture_handles(&self) -> [TextureHandle; 3] {
        [self.volume1, self.volume2, self.lookup_texture]
    }
}

impl Default for GpuRayCastMapper {
    fn default() -> Self {
        GpuRayCastMapper::new(MapperOptions::default())
    }
}

impl ClipConsumer for GpuRayCastMapper {
    fn set_clipping_planes(&mut self, planes: &[ClipPlane]) {
        self.clip_planes = planes.to_vec();
    }

    fn remove_all_clipping_planes(&mut self) {
        self.clip_planes.clear();
    }

    fn set_clipping(&mut self, enabled: bool) {
        self.clipping = enabled;
    }
}
