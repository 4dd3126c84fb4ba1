//! Graphics context abstraction
//!
//! The mapper issues every GPU operation through [`GraphicsContext`], so it
//! can be driven by a real OpenGL binding or by a recording context in tests.

use nalgebra::{Point3, Vector3};

use crate::transfer::Shading;

macro_rules! gl_handle {
    ($name:ident, $what:literal) => {
        #[doc = concat!("Handle of a ", $what, ", `0` means none")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);

            pub fn is_none(self) -> bool {
                self.0 == 0
            }
        }
    };
}

gl_handle!(TextureHandle, "texture");
gl_handle!(ShaderHandle, "shader object");
gl_handle!(ProgramHandle, "shader program");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Min and mag filter of a texture, wrapping is always clamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation(pub i32);

/// Front face material used by the fixed function lighting state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Material {
    /// Material for the shading coefficients of a volume property.
    /// Ambient and diffuse are boosted by 20%, shininess rescaled to `[0,128]`.
    pub fn from_shading(shading: &Shading) -> Material {
        let gray = |v: f32| [v, v, v, 1.0];
        Material {
            ambient: gray(shading.ambient * 1.2),
            diffuse: gray(shading.diffuse * 1.2),
            specular: gray(shading.specular),
            shininess: 0.75 * 128.0 * shading.specular_power / 50.0,
        }
    }
}

/// Proxy geometry rasterized to start the rays.
///
/// Vertices are in world space, texture coordinates in `[0,1]^3` texture
/// space. Corners follow [`BoundBox`](crate::common::BoundBox) corner order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub vertices: [Point3<f32>; 8],
    pub texcoords: [Point3<f32>; 8],
}

impl BoxGeometry {
    /// Corner indices of the drawn quads.
    /// Front faces first, then the same faces reversed for mirrored transforms.
    pub const QUADS: [[usize; 4]; 12] = [
        [4, 5, 6, 7],
        [3, 2, 1, 0],
        [5, 1, 2, 6],
        [7, 3, 0, 4],
        [7, 6, 2, 3],
        [5, 4, 0, 1],
        [2, 3, 0, 1],
        [6, 7, 3, 2],
        [7, 4, 0, 3],
        [5, 6, 2, 1],
        [6, 5, 4, 7],
        [5, 1, 0, 4],
    ];

    /// Quads as `(vertex, texcoord)` corner lists
    pub fn quads(&self) -> impl Iterator<Item = [(Point3<f32>, Point3<f32>); 4]> + '_ {
        Self::QUADS
            .iter()
            .map(move |quad| quad.map(|i| (self.vertices[i], self.texcoords[i])))
    }
}

/// Operations the ray caster needs from an OpenGL 2.0+ context.
pub trait GraphicsContext {
    /// Whether the context exposes core version `major.minor`
    fn supports_version(&self, major: u32, minor: u32) -> bool;

    fn max_texture_image_units(&self) -> u32;

    fn max_fragment_uniform_components(&self) -> u32;

    fn create_texture(&mut self) -> TextureHandle;

    /// Deleting [`TextureHandle::NONE`] is a no-op
    fn delete_texture(&mut self, texture: TextureHandle);

    fn active_texture_unit(&mut self, unit: u32);

    /// Bind `texture` to the active unit and upload RGBA8 texels
    fn upload_texture_3d(&mut self, texture: TextureHandle, dims: Vector3<usize>, texels: &[u8]);

    fn upload_texture_2d(
        &mut self,
        texture: TextureHandle,
        width: usize,
        height: usize,
        texels: &[u8],
    );

    /// Bind a 3D texture to the active unit and set its filtering
    fn bind_texture_3d(&mut self, texture: TextureHandle, filter: TextureFilter);

    /// Bind a 2D texture to the active unit and set its filtering
    fn bind_texture_2d(&mut self, texture: TextureHandle, filter: TextureFilter);

    fn create_shader(&mut self, stage: ShaderStage) -> ShaderHandle;

    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Compile `source`, on failure returns the info log
    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> Result<(), String>;

    fn create_program(&mut self) -> ProgramHandle;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Attach `shaders` and link, on failure returns the info log
    fn link_program(&mut self, program: ProgramHandle, shaders: &[ShaderHandle])
        -> Result<(), String>;

    /// Bind a program, [`ProgramHandle::NONE`] unbinds
    fn use_program(&mut self, program: ProgramHandle);

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Column major 4x4 matrix
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]);

    fn set_material(&mut self, material: &Material);

    fn set_face_culling(&mut self, enabled: bool);

    fn draw_box(&mut self, geometry: &BoxGeometry);

    /// Block until all issued commands complete
    fn finish(&mut self);
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::common::BoundBox;

    #[test]
    fn handles_default_to_none() {
        assert!(TextureHandle::default().is_none());
        assert!(!ProgramHandle(3).is_none());
        assert_eq!(ShaderHandle::NONE, ShaderHandle(0));
    }

    #[test]
    fn material_from_shading() {
        let shading = Shading {
            ambient: 0.5,
            diffuse: 0.5,
            specular: 0.25,
            specular_power: 50.0,
        };

        let material = Material::from_shading(&shading);

        assert_eq!(material.ambient, [0.6, 0.6, 0.6, 1.0]);
        assert_eq!(material.specular, [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(material.shininess, 96.0);
    }

    #[test]
    fn box_quads_use_all_corners() {
        let unit = BoundBox::unit();
        let corners: Vec<_> = unit.into_iter().collect();
        let mut vertices = [Point3::origin(); 8];
        vertices.copy_from_slice(&corners);
        let geometry = BoxGeometry {
            vertices,
            texcoords: vertices,
        };

        let quads: Vec<_> = geometry.quads().collect();

        assert_eq!(quads.len(), 12);
        for i in 0..8 {
            assert!(BoxGeometry::QUADS.iter().flatten().any(|&c| c == i));
        }
        // first quad is the z = 1 face
        assert!(quads[0].iter().all(|(v, _)| v.z == 1.0));
    }
}
