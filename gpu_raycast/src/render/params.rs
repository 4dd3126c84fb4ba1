//! Per frame parameter block of the ray casting shader
//!
//! `ParaMatrix` layout, column major, `P[c][r]` is element `4c + r`:
//!
//! | column | r0 | r1 | r2 | r3 |
//! |---|---|---|---|---|
//! | 0 | eye.x | eye.y | eye.z | step |
//! | 1 | box low.x | box low.y | box low.z | box high.x |
//! | 2 | box high.y | box high.z | min eye distance | depth peeling threshold |
//! | 3 | ICPE smoothness | distance color blending | max - min distance | ICPE scale |
//!
//! Positions are in texture space, `[0,1]^3` over the volume bounds.

use nalgebra::{point, Matrix4, Point3, Vector3};

use super::{gl::BoxGeometry, MapperOptions};
use crate::{
    common::BoundBox,
    error::{RaycastError, RaycastResult},
    volumetric::Quantization,
};

/// Uniform values and proxy geometry of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RayCastParameters {
    pub para_matrix: [f32; 16],
    /// Column major, rotates texture space normals into world space
    pub volume_matrix: [f32; 16],
    pub geometry: BoxGeometry,
}

/// Maps world positions into texture coordinates of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSpace {
    /// World to volume data coordinates
    pub inverse: Matrix4<f32>,
    pub lower: Point3<f32>,
    pub extent: Vector3<f32>,
}

impl TextureSpace {
    /// Fails on a singular volume matrix
    pub fn new(bounds: BoundBox, volume_matrix: &Matrix4<f32>) -> RaycastResult<TextureSpace> {
        let inverse = volume_matrix
            .try_inverse()
            .ok_or_else(|| RaycastError::invalid("volume matrix is not invertible"))?;
        Ok(TextureSpace {
            inverse,
            lower: bounds.lower,
            extent: bounds.dims(),
        })
    }

    pub fn from_world(&self, world: &Point3<f32>) -> Point3<f32> {
        let local = self.inverse.transform_point(world);
        let rel = local - self.lower;
        // flat axes map to 0
        point![
            ratio(rel.x, self.extent.x),
            ratio(rel.y, self.extent.y),
            ratio(rel.z, self.extent.z)
        ]
    }

    /// World direction into texture space, not normalized
    pub fn direction_from_world(&self, dir: &Vector3<f32>) -> Vector3<f32> {
        let local = self.inverse.transform_vector(dir);
        Vector3::new(
            ratio(local.x, self.extent.x),
            ratio(local.y, self.extent.y),
            ratio(local.z, self.extent.z),
        )
    }
}

fn ratio(v: f32, len: f32) -> f32 {
    if len > 0.0 {
        v / len
    } else {
        0.0
    }
}

fn to_array(m: &Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

impl RayCastParameters {
    /// Compute the parameter block.
    ///
    /// # Arguments
    ///
    /// * `bounds` - volume bounds in data coordinates
    /// * `volume_matrix` - data to world transform
    /// * `clip` - clip box in world space, from the region of interest
    /// * `world_to_view` - camera model view matrix
    /// * `ray_steps` - current adaptive step count
    pub fn compute(
        bounds: BoundBox,
        volume_matrix: &Matrix4<f32>,
        clip: Option<BoundBox>,
        world_to_view: &Matrix4<f32>,
        ray_steps: f32,
        options: &MapperOptions,
        quantization: &Quantization,
    ) -> RaycastResult<RayCastParameters> {
        let space = TextureSpace::new(bounds, volume_matrix)?;
        let view_to_world = world_to_view
            .try_inverse()
            .ok_or_else(|| RaycastError::invalid("view matrix is not invertible"))?;

        let mut vertices = [Point3::origin(); 8];
        for (v, corner) in vertices.iter_mut().zip(&bounds) {
            let world = volume_matrix.transform_point(&corner);
            *v = match clip {
                Some(clip) => point![
                    world.x.max(clip.lower.x).min(clip.upper.x),
                    world.y.max(clip.lower.y).min(clip.upper.y),
                    world.z.max(clip.lower.z).min(clip.upper.z)
                ],
                None => world,
            };
        }

        let texcoords = vertices.map(|v| space.from_world(&v));
        let tex_box = BoundBox::from_points(texcoords).clamp_unit();

        let eye = space.from_world(&view_to_world.transform_point(&Point3::origin()));

        let (min_dist, max_dist) = texcoords
            .iter()
            .map(|t| (t - eye).norm())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });

        let depth_peeling = ((options.depth_peeling_threshold as f64 + quantization.offset)
            * quantization.scale
            / 255.0) as f32;

        let para_matrix = [
            eye.x,
            eye.y,
            eye.z,
            1.0 / ray_steps,
            tex_box.lower.x,
            tex_box.lower.y,
            tex_box.lower.z,
            tex_box.upper.x,
            tex_box.upper.y,
            tex_box.upper.z,
            min_dist,
            depth_peeling,
            options.icpe_smoothness,
            options.distance_color_blending,
            max_dist - min_dist,
            options.icpe_scale,
        ];

        Ok(RayCastParameters {
            para_matrix,
            volume_matrix: to_array(&space.inverse.transpose()),
            geometry: BoxGeometry {
                vertices,
                texcoords,
            },
        })
    }

    pub fn eye(&self) -> Point3<f32> {
        let p = &self.para_matrix;
        point![p[0], p[1], p[2]]
    }

    /// Sample distance in texture space
    pub fn step(&self) -> f32 {
        self.para_matrix[3]
    }

    /// Clipped volume box in texture space
    pub fn texture_box(&self) -> BoundBox {
        let p = &self.para_matrix;
        BoundBox::new(point![p[4], p[5], p[6]], point![p[7], p[8], p[9]])
    }

    pub fn min_distance(&self) -> f32 {
        self.para_matrix[10]
    }

    /// Depth peeling threshold as a normalized texture value
    pub fn depth_peeling(&self) -> f32 {
        self.para_matrix[11]
    }

    pub fn distance_range(&self) -> f32 {
        self.para_matrix[14]
    }
}
