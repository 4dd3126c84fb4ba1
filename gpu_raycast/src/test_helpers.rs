//! Module with helper functions
//! Saves repetition in unit tests, integration tests and benchmarks

use std::collections::{HashMap, HashSet};

use nalgebra::{vector, Vector3};

use crate::{
    render::gl::{
        BoxGeometry, GraphicsContext, Material, ProgramHandle, ShaderHandle, ShaderStage,
        TextureFilter, TextureHandle, UniformLocation,
    },
    volumetric::VoxelGrid,
};

/// Calls observed by [`HeadlessContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    ActiveTexture(u32),
    Upload3d {
        texture: TextureHandle,
        dims: Vector3<usize>,
        bytes: usize,
    },
    Upload2d {
        texture: TextureHandle,
        width: usize,
        height: usize,
    },
    Bind3d(TextureHandle, TextureFilter),
    Bind2d(TextureHandle, TextureFilter),
    Compile(ShaderStage),
    Link(ProgramHandle),
    UseProgram(ProgramHandle),
    Material(Material),
    FaceCulling(bool),
    DrawBox { quads: usize },
    Finish,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Mat4([f32; 16]),
}

/// Graphics context without a GPU.
///
/// Hands out handles, tracks live objects and records every call,
/// so tests can check what the mapper asked for.
#[derive(Debug)]
pub struct HeadlessContext {
    /// `(major, minor)` versions reported as supported
    pub versions: Vec<(u32, u32)>,
    pub texture_units: u32,
    pub fragment_uniform_components: u32,
    /// Compilation of this stage fails
    pub fail_compile: Option<ShaderStage>,
    pub fail_link: bool,
    next_handle: u32,
    textures: HashSet<TextureHandle>,
    shaders: HashMap<ShaderHandle, String>,
    programs: HashMap<ProgramHandle, Vec<ShaderHandle>>,
    locations: Vec<String>,
    uniforms: HashMap<String, UniformValue>,
    calls: Vec<GlCall>,
}

impl HeadlessContext {
    /// OpenGL 2.1 context with generous limits
    pub fn new() -> HeadlessContext {
        HeadlessContext {
            versions: vec![(2, 0), (2, 1)],
            texture_units: 16,
            fragment_uniform_components: 1024,
            fail_compile: None,
            fail_link: false,
            next_handle: 0,
            textures: HashSet::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            locations: vec![],
            uniforms: HashMap::new(),
            calls: vec![],
        }
    }

    /// Context of an old driver, only OpenGL 1.5
    pub fn legacy() -> HeadlessContext {
        HeadlessContext {
            versions: vec![(1, 5)],
            ..HeadlessContext::new()
        }
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_calls(&self, pred: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Last value written to uniform `name`
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    /// Source of a live shader of `stage`
    pub fn shader_source(&self, stage: ShaderStage) -> Option<&str> {
        let marker = match stage {
            ShaderStage::Vertex => "gl_Position",
            ShaderStage::Fragment => "gl_FragColor",
        };
        self.shaders
            .values()
            .find(|s| s.contains(marker))
            .map(String::as_str)
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for HeadlessContext {
    fn supports_version(&self, major: u32, minor: u32) -> bool {
        self.versions.contains(&(major, minor))
    }

    fn max_texture_image_units(&self) -> u32 {
        self.texture_units
    }

    fn max_fragment_uniform_components(&self) -> u32 {
        self.fragment_uniform_components
    }

    fn create_texture(&mut self) -> TextureHandle {
        let texture = TextureHandle(self.next());
        self.textures.insert(texture);
        texture
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn active_texture_unit(&mut self, unit: u32) {
        self.calls.push(GlCall::ActiveTexture(unit));
    }

    fn upload_texture_3d(&mut self, texture: TextureHandle, dims: Vector3<usize>, texels: &[u8]) {
        assert_eq!(texels.len(), 4 * dims.x * dims.y * dims.z);
        self.calls.push(GlCall::Upload3d {
            texture,
            dims,
            bytes: texels.len(),
        });
    }

    fn upload_texture_2d(&mut self, texture: TextureHandle, width: usize, height: usize, texels: &[u8]) {
        assert_eq!(texels.len(), 4 * width * height);
        self.calls.push(GlCall::Upload2d {
            texture,
            width,
            height,
        });
    }

    fn bind_texture_3d(&mut self, texture: TextureHandle, filter: TextureFilter) {
        self.calls.push(GlCall::Bind3d(texture, filter));
    }

    fn bind_texture_2d(&mut self, texture: TextureHandle, filter: TextureFilter) {
        self.calls.push(GlCall::Bind2d(texture, filter));
    }

    fn create_shader(&mut self, _stage: ShaderStage) -> ShaderHandle {
        let shader = ShaderHandle(self.next());
        self.shaders.insert(shader, String::new());
        shader
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> Result<(), String> {
        let stage = if source.contains("gl_Position") {
            ShaderStage::Vertex
        } else {
            ShaderStage::Fragment
        };
        self.calls.push(GlCall::Compile(stage));
        if self.fail_compile == Some(stage) {
            return Err(format!("0:1: syntax error in {} shader", stage.name()));
        }
        if let Some(stored) = self.shaders.get_mut(&shader) {
            *stored = source.to_owned();
        }
        Ok(())
    }

    fn create_program(&mut self) -> ProgramHandle {
        let program = ProgramHandle(self.next());
        self.programs.insert(program, vec![]);
        program
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn link_program(&mut self, program: ProgramHandle, shaders: &[ShaderHandle]) -> Result<(), String> {
        self.calls.push(GlCall::Link(program));
        if self.fail_link {
            return Err("unresolved symbols".into());
        }
        if let Some(attached) = self.programs.get_mut(&program) {
            *attached = shaders.to_vec();
        }
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(GlCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let declared = self.programs.get(&program)?.iter().any(|sh| {
            self.shaders
                .get(sh)
                .map_or(false, |src| src.contains(&format!(" {};", name)))
        });
        if !declared {
            return None;
        }
        let index = match self.locations.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                self.locations.push(name.to_owned());
                self.locations.len() - 1
            }
        };
        Some(UniformLocation(index as i32))
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        if let Some(name) = self.locations.get(location.0 as usize) {
            self.uniforms.insert(name.clone(), UniformValue::Int(value));
        }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        if let Some(name) = self.locations.get(location.0 as usize) {
            self.uniforms.insert(name.clone(), UniformValue::Mat4(*value));
        }
    }

    fn set_material(&mut self, material: &Material) {
        self.calls.push(GlCall::Material(*material));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.calls.push(GlCall::FaceCulling(enabled));
    }

    fn draw_box(&mut self, geometry: &BoxGeometry) {
        self.calls.push(GlCall::DrawBox {
            quads: geometry.quads().count(),
        });
    }

    fn finish(&mut self) {
        self.calls.push(GlCall::Finish);
    }
}

/// `u8` ball of radius `0.4 * side` centered in a cube, 255 in the middle
/// falling linearly to 0 at the surface.
pub fn sphere_grid(side: usize) -> VoxelGrid {
    let center = (side as f32 - 1.0) / 2.0;
    let radius = 0.4 * side as f32;
    let mut data = Vec::with_capacity(side * side * side);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                let d = vector![x as f32 - center, y as f32 - center, z as f32 - center].norm();
                let v = (1.0 - d / radius).max(0.0) * 255.0;
                data.push(v as u8);
            }
        }
    }
    VoxelGrid::new(vector![side, side, side], 1, data).unwrap()
}

/// `u16` ramp along x, values `0..dims.x`
pub fn ramp_grid(dims: Vector3<usize>) -> VoxelGrid {
    let mut data = Vec::with_capacity(dims.x * dims.y * dims.z);
    for _z in 0..dims.z {
        for _y in 0..dims.y {
            data.extend((0..dims.x).map(|x| x as u16));
        }
    }
    VoxelGrid::new(dims, 1, data).unwrap()
}

/// Constant RGBA grid
pub fn rgba_grid(dims: Vector3<usize>, rgba: [u8; 4]) -> VoxelGrid {
    let count = dims.x * dims.y * dims.z;
    let data: Vec<u8> = rgba.iter().copied().cycle().take(4 * count).collect();
    VoxelGrid::new(dims, 4, data).unwrap()
}
