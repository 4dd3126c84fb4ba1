//! CPU preview ray caster
//!
//! Walks rays through the same textures and lookup table the GPU program
//! samples, used for previews without a graphics context and for checking
//! textures in tests. Rows are rendered in parallel.

use nalgebra::{vector, Point3, Vector3, Vector4};
use rayon::prelude::*;

use super::{gl::Material, params::TextureSpace, ColorLayout, Technique};
use crate::{
    camera::PerspectiveCamera,
    clip::{clip_box, ClipConsumer, ClipPlane},
    common::{BoundBox, Ray},
    error::{RaycastError, RaycastResult},
    transfer::{Shading, TransferLookup},
    volumetric::{ResampledVolume, VoxelGrid},
};

/// Opacity at which compositing stops
pub const OPACITY_CUTOFF: f32 = 0.985;

pub struct RenderOptions {
    pub resolution: (usize, usize),
    /// Stop compositing once the ray is nearly opaque
    pub ray_termination: bool,
    /// Samples along the texture space diagonal
    pub ray_steps: f32,
    pub technique: Technique,
}

impl RenderOptions {
    pub fn new(resolution: (usize, usize), technique: Technique) -> RenderOptions {
        RenderOptions {
            resolution,
            ray_termination: true,
            ray_steps: 500.0,
            technique,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::new((512, 512), Technique::Composite)
    }
}

/// Textures and lookup of one volume, as seen by a ray
struct Scene<'a> {
    volume: &'a ResampledVolume,
    lookup: &'a TransferLookup,
    layout: ColorLayout,
    material: Material,
}

impl<'a> Scene<'a> {
    /// Trilinear sample of an RGBA8 texture at texture coordinate `p`
    fn sample(&self, texels: &[u8], p: &Point3<f32>) -> Vector4<f32> {
        let dims = self.volume.dims;
        let axis = |v: f32, dim: usize| {
            let f = (v * dim as f32 - 0.5).clamp(0.0, (dim - 1) as f32);
            let lo = f.floor() as usize;
            let hi = (lo + 1).min(dim - 1);
            (lo, hi, f - lo as f32)
        };
        let (x0, x1, wx) = axis(p.x, dims.x);
        let (y0, y1, wy) = axis(p.y, dims.y);
        let (z0, z1, wz) = axis(p.z, dims.z);

        let texel = |x, y, z| {
            let o = self.volume.texel_offset(x, y, z);
            vector![
                texels[o] as f32,
                texels[o + 1] as f32,
                texels[o + 2] as f32,
                texels[o + 3] as f32
            ]
        };
        let lerp = |a: Vector4<f32>, b: Vector4<f32>, t: f32| a + (b - a) * t;

        let c00 = lerp(texel(x0, y0, z0), texel(x1, y0, z0), wx);
        let c10 = lerp(texel(x0, y1, z0), texel(x1, y1, z0), wx);
        let c01 = lerp(texel(x0, y0, z1), texel(x1, y0, z1), wx);
        let c11 = lerp(texel(x0, y1, z1), texel(x1, y1, z1), wx);
        let c0 = lerp(c00, c10, wy);
        let c1 = lerp(c01, c11, wy);
        lerp(c0, c1, wz) / 255.0
    }

    fn lookup(&self, scalar: f32, gradient: f32) -> Vector4<f32> {
        let to_index = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        let t = self.lookup.texel(to_index(scalar), to_index(gradient));
        vector![t[0] as f32, t[1] as f32, t[2] as f32, t[3] as f32] / 255.0
    }

    fn voxel_color(&self, p: &Point3<f32>) -> Vector4<f32> {
        let s = self.sample(&self.volume.volume1, p);
        match self.layout {
            ColorLayout::Scalar => self.lookup(s.x, s.w),
            ColorLayout::ScalarPair => {
                let mut color = self.lookup(s.x, s.w);
                color.w = self.lookup(s.y, s.w).w;
                color
            }
            ColorLayout::Rgba => {
                let gradient = self.gradient_magnitude(p);
                let mut color = s;
                color.w = self.lookup(s.w, gradient).w;
                color
            }
        }
    }

    fn voxel_scalar(&self, p: &Point3<f32>) -> f32 {
        let s = self.sample(&self.volume.volume1, p);
        match self.layout {
            ColorLayout::Scalar | ColorLayout::ScalarPair => s.x,
            ColorLayout::Rgba => s.w,
        }
    }

    /// Alpha of `volume1` holds a color component for 3 and 4 component data
    fn gradient_magnitude(&self, p: &Point3<f32>) -> f32 {
        match self.layout {
            ColorLayout::Scalar | ColorLayout::ScalarPair => self.sample(&self.volume.volume1, p).w,
            ColorLayout::Rgba => self.sample(&self.volume.volume2, p).w,
        }
    }

    /// Texture space normal, zero where the gradient vanished
    fn voxel_normal(&self, p: &Point3<f32>) -> Vector3<f32> {
        let n = self.sample(&self.volume.volume2, p);
        let n = vector![n.x, n.y, n.z] * 2.0 - vector![1.0, 1.0, 1.0];
        n.try_normalize(1e-3).unwrap_or_else(Vector3::zeros)
    }

    /// Blinn-Phong with a headlight
    fn directional_light(
        &self,
        p: &Point3<f32>,
        light: &Vector3<f32>,
        color: Vector4<f32>,
    ) -> Vector4<f32> {
        let normal = self.voxel_normal(p);
        let m = &self.material;
        let n_dot_l = normal.dot(light).abs();
        let specular = if n_dot_l > 0.0 {
            // light and eye coincide, the half vector is the light
            let n_dot_h = normal.dot(light).max(0.0);
            m.specular[0] * n_dot_h.powf(m.shininess)
        } else {
            0.0
        };
        color * (specular + m.ambient[0] + m.diffuse[0] * n_dot_l)
    }

    fn edge_coloring(
        &self,
        p: &Point3<f32>,
        view: &Vector3<f32>,
        color: Vector4<f32>,
    ) -> Vector4<f32> {
        let normal = self.voxel_normal(p);
        color * normal.dot(view).abs()
    }
}

/// Ray caster producing RGB images on the CPU.
pub struct CpuRenderer {
    render_options: RenderOptions,
    clip_planes: Vec<ClipPlane>,
    clipping: bool,
}

impl CpuRenderer {
    pub fn new(render_options: RenderOptions) -> CpuRenderer {
        CpuRenderer {
            render_options,
            clip_planes: Vec::new(),
            clipping: false,
        }
    }

    pub fn set_render_options(&mut self, opts: RenderOptions) {
        self.render_options = opts;
    }

    pub fn set_render_resolution(&mut self, res: (usize, usize)) {
        self.render_options.resolution = res;
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    /// Render into `buffer`, 3 bytes per pixel, row 0 at the top.
    ///
    /// Fails on a zero resolution or a `buffer` shorter than
    /// `3 * width * height` bytes.
    pub fn render_to_buffer(
        &self,
        camera: &PerspectiveCamera,
        grid: &VoxelGrid,
        volume: &ResampledVolume,
        lookup: &TransferLookup,
        shading: &Shading,
        buffer: &mut [u8],
    ) -> RaycastResult<()> {
        let (img_w, img_h) = self.render_options.resolution;
        if img_w == 0 || img_h == 0 {
            return Err(RaycastError::invalid(format!(
                "resolution {img_w}x{img_h} has no pixels"
            )));
        }
        if buffer.len() < 3 * img_w * img_h {
            return Err(RaycastError::invalid(format!(
                "buffer of {} bytes is too small for {img_w}x{img_h}",
                buffer.len()
            )));
        }
        let space = TextureSpace::new(grid.bounds(), grid.transform())?;

        let scene = Scene {
            volume,
            lookup,
            layout: ColorLayout::from_components(volume.components)?,
            material: Material::from_shading(shading),
        };

        let mut texture_box = BoundBox::unit();
        if self.clipping {
            if let Some(clip) = clip_box(&self.clip_planes) {
                texture_box =
                    BoundBox::from_points(clip.into_iter().map(|p| space.from_world(&p)))
                        .clamp_unit();
            }
        }

        // clipped away entirely
        if texture_box.is_degenerate() {
            buffer.iter_mut().for_each(|b| *b = 0);
            return Ok(());
        }

        let (step_x, step_y) = (1.0 / img_w as f32, 1.0 / img_h as f32);

        buffer
            .par_chunks_mut(img_w * 3)
            .take(img_h)
            .enumerate()
            .for_each(|(y, row)| {
                let y_norm = (y as f32 + 0.5) * step_y;
                for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                    let ray = camera.get_ray(((x as f32 + 0.5) * step_x, y_norm));
                    let color = self.collect_light(&scene, &space, &texture_box, &ray);

                    // expects black background, colors are premultiplied
                    for (out, c) in pixel.iter_mut().zip(color.iter()) {
                        *out = (c * 255.0).clamp(0.0, 255.0) as u8;
                    }
                }
            });
        Ok(())
    }

    fn collect_light(
        &self,
        scene: &Scene,
        space: &TextureSpace,
        texture_box: &BoundBox,
        ray: &Ray,
    ) -> Vector4<f32> {
        let origin = space.from_world(&ray.origin);
        let direction = match space.direction_from_world(&ray.direction).try_normalize(1e-9) {
            Some(d) => d,
            None => return Vector4::zeros(),
        };
        let tex_ray = Ray::new(origin, direction);

        let (t_start, t_end) = match texture_box.intersect(&tex_ray) {
            Some((t0, t1)) => (t0.max(0.0), t1),
            None => return Vector4::zeros(),
        };

        let step_size = 1.0 / self.render_options.ray_steps;
        let steps = ((t_end - t_start) / step_size).max(0.0) as usize;
        let step = direction * step_size;
        let begin = tex_ray.point_from_t(t_start);
        let positions = (0..steps).map(|i| begin + step * i as f32);

        let to_eye = -direction;

        match self.render_options.technique {
            Technique::Mip => {
                let best = positions.fold((f32::NEG_INFINITY, begin), |best, p| {
                    let s = scene.voxel_scalar(&p);
                    if s > best.0 {
                        (s, p)
                    } else {
                        best
                    }
                });
                if steps == 0 {
                    return Vector4::zeros();
                }
                premultiply(scene.voxel_color(&best.1))
            }
            Technique::MinIp => {
                let best = positions.fold((f32::INFINITY, begin), |best, p| {
                    let s = scene.voxel_scalar(&p);
                    if s < best.0 {
                        (s, p)
                    } else {
                        best
                    }
                });
                if steps == 0 {
                    return Vector4::zeros();
                }
                premultiply(scene.voxel_color(&best.1))
            }
            technique => {
                let mut accum = Vector4::zeros();
                for pos in positions {
                    let color = scene.voxel_color(&pos);
                    let mut opacity = color.w;
                    if opacity <= 0.0 {
                        continue;
                    }

                    let rgb = match technique {
                        Technique::EdgeColoring => scene.edge_coloring(&pos, &to_eye, color),
                        _ => scene.directional_light(&pos, &to_eye, color),
                    };
                    if technique == Technique::GradientModulated {
                        opacity *= scene.gradient_magnitude(&pos);
                    }

                    // front to back: sum += (1 - sum.alpha) * alpha * color
                    let weight = (1.0 - accum.w) * opacity;
                    accum += vector![rgb.x * weight, rgb.y * weight, rgb.z * weight, weight];

                    if self.render_options.ray_termination && accum.w >= OPACITY_CUTOFF {
                        break;
                    }
                }
                accum
            }
        }
    }
}

fn premultiply(color: Vector4<f32>) -> Vector4<f32> {
    vector![color.x * color.w, color.y * color.w, color.z * color.w, color.w]
}

impl ClipConsumer for CpuRenderer {
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

#[cfg(test)]
mod test {

    use nalgebra::point;

    use super::*;
    use crate::{
        clip::Roi,
        transfer::VolumeProperty,
        volumetric::Resampler,
    };

    fn constant_grid(value: u8) -> VoxelGrid {
        VoxelGrid::new(vector![8, 8, 8], 1, vec![value; 512]).unwrap()
    }

    fn prepare(grid: &VoxelGrid) -> (ResampledVolume, TransferLookup) {
        let mut resampler = Resampler::default();
        resampler.update(grid, None).unwrap();
        let volume = resampler.volume().unwrap().clone();
        let mut lookup = TransferLookup::new();
        lookup.update(grid, &volume, &VolumeProperty::default());
        (volume, lookup)
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::look_at(point![3.5, 3.5, -20.0], point![3.5, 3.5, 3.5])
    }

    fn center_pixel(buffer: &[u8], w: usize, h: usize) -> &[u8] {
        let o = 3 * ((h / 2) * w + w / 2);
        &buffer[o..o + 3]
    }

    #[test]
    fn miss_is_black() {
        let grid = constant_grid(255);
        let (volume, lookup) = prepare(&grid);
        let renderer = CpuRenderer::new(RenderOptions::new((16, 16), Technique::Mip));
        let away = PerspectiveCamera::look_at(point![3.5, 3.5, -20.0], point![3.5, 3.5, -40.0]);
        let mut buffer = vec![7; 16 * 16 * 3];

        renderer
            .render_to_buffer(&away, &grid, &volume, &lookup, &Shading::default(), &mut buffer)
            .unwrap();

        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn mip_of_bright_volume() {
        let grid = constant_grid(255);
        let (volume, lookup) = prepare(&grid);
        let renderer = CpuRenderer::new(RenderOptions::new((16, 16), Technique::Mip));
        let mut buffer = vec![0; 16 * 16 * 3];

        renderer
            .render_to_buffer(&camera(), &grid, &volume, &lookup, &Shading::default(), &mut buffer)
            .unwrap();

        // constant data quantizes to entry 0, baked from the middle of the range
        let center = center_pixel(&buffer, 16, 16);
        assert_eq!(center, &[255, 255, 255]);
    }

    #[test]
    fn composite_of_ramp_is_visible() {
        let data: Vec<u8> = (0..512).map(|i| ((i / 64) * 36) as u8).collect();
        let grid = VoxelGrid::new(vector![8, 8, 8], 1, data).unwrap();
        let (volume, lookup) = prepare(&grid);
        let renderer = CpuRenderer::new(RenderOptions::new((16, 16), Technique::Composite));
        let mut buffer = vec![0; 16 * 16 * 3];

        renderer
            .render_to_buffer(&camera(), &grid, &volume, &lookup, &Shading::default(), &mut buffer)
            .unwrap();

        assert!(center_pixel(&buffer, 16, 16).iter().any(|&b| b > 0));
    }

    #[test]
    fn clipping_everything_away() {
        let data: Vec<u8> = (0..512).map(|i| ((i / 64) * 36) as u8).collect();
        let grid = VoxelGrid::new(vector![8, 8, 8], 1, data).unwrap();
        let (volume, lookup) = prepare(&grid);
        let mut renderer = CpuRenderer::new(RenderOptions::new((16, 16), Technique::Mip));
        // box outside the volume
        let roi = Roi::from_box(BoundBox::new(point![20.0, 20.0, 20.0], point![30.0, 30.0, 30.0]));
        crate::clip::apply_roi(Some(&roi), &mut [&mut renderer]);
        let mut buffer = vec![0; 16 * 16 * 3];

        renderer
            .render_to_buffer(&camera(), &grid, &volume, &lookup, &Shading::default(), &mut buffer)
            .unwrap();

        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_resolution_is_rejected() {
        let grid = constant_grid(255);
        let (volume, lookup) = prepare(&grid);
        let mut renderer = CpuRenderer::new(RenderOptions::new((0, 16), Technique::Mip));
        let mut buffer = vec![0; 16 * 16 * 3];

        let res =
            renderer.render_to_buffer(&camera(), &grid, &volume, &lookup, &Shading::default(), &mut buffer);
        assert!(matches!(res, Err(RaycastError::InvalidInput(_))));

        renderer.set_render_resolution((16, 16));
        let mut short = vec![0; 16 * 16 * 3 - 1];
        let res =
            renderer.render_to_buffer(&camera(), &grid, &volume, &lookup, &Shading::default(), &mut short);
        assert!(matches!(res, Err(RaycastError::InvalidInput(_))));
    }

    #[test]
    fn gradient_magnitude_channel_per_layout() {
        let grid = crate::test_helpers::rgba_grid(vector![4, 4, 4], [10, 20, 30, 40]);
        let (mut volume, lookup) = prepare(&grid);
        volume.volume1.chunks_mut(4).for_each(|t| t[3] = 40);
        volume.volume2.chunks_mut(4).for_each(|t| t[3] = 255);
        let material = Material::from_shading(&Shading::default());
        let p = point![0.5, 0.5, 0.5];

        let rgba = Scene {
            volume: &volume,
            lookup: &lookup,
            layout: ColorLayout::Rgba,
            material,
        };
        assert_eq!(rgba.gradient_magnitude(&p), 1.0);
        assert!((rgba.voxel_scalar(&p) - 40.0 / 255.0).abs() < 1e-6);

        let scalar = Scene {
            layout: ColorLayout::Scalar,
            ..rgba
        };
        assert!((scalar.gradient_magnitude(&p) - 40.0 / 255.0).abs() < 1e-6);
    }
}
