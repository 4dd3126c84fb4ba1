//! Conversion of voxel grids into RGBA8 textures

use crossbeam::channel::Sender;
use nalgebra::{vector, Vector3};
use rayon::prelude::*;

use super::{
    gradient,
    scalar::{with_samples, Scalar},
    VoxelGrid,
};
use crate::{
    common::{Stamp, ValueRange},
    error::{RaycastError, RaycastResult},
};

/// Default edge length of the texture budget cube
pub const DEFAULT_INTERNAL_VOLUME_SIZE: usize = 256;

/// Edge length of the budget cube for 4 component data
pub const RGBA_VOLUME_SIZE: usize = 128;

/// Maximum number of voxels a resampled texture may hold.
pub fn voxel_budget(internal_volume_size: usize, components: usize) -> usize {
    if components < 4 {
        internal_volume_size.pow(3)
    } else {
        RGBA_VOLUME_SIZE.pow(3)
    }
}

pub fn is_texture_size_supported(
    dims: Vector3<usize>,
    components: usize,
    internal_volume_size: usize,
) -> bool {
    dims.x * dims.y * dims.z <= voxel_budget(internal_volume_size, components)
}

/// Texture dimensions for a grid of `dims`.
///
/// Shrinks the largest axis by one voxel until the budget is met.
/// Ties prefer x, then y.
pub fn target_dims(
    dims: Vector3<usize>,
    components: usize,
    internal_volume_size: usize,
) -> Vector3<usize> {
    let mut out = dims;
    while !is_texture_size_supported(out, components, internal_volume_size) {
        if out.x >= out.y && out.x >= out.z {
            out.x -= 1;
        } else if out.y >= out.x && out.y >= out.z {
            out.y -= 1;
        } else {
            out.z -= 1;
        }
    }
    out
}

/// Mapping of source values into bytes, `u8((v + offset) * scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    pub offset: f64,
    pub scale: f64,
    /// Number of meaningful transfer function entries
    pub table_size: usize,
    /// Scalar range of the last component
    pub range: ValueRange,
}

impl Quantization {
    pub fn from_grid(grid: &VoxelGrid) -> Quantization {
        let range = grid.opacity_range();
        let span = range.span();
        let offset = -range.low;

        if grid.scalar_type().is_floating() || span > 255.0 {
            let scale = if span > 0.0 { 255.0 / span } else { 1.0 };
            Quantization {
                offset,
                scale,
                table_size: 256,
                range,
            }
        } else {
            Quantization {
                offset,
                scale: 1.0,
                table_size: span as usize + 1,
                range,
            }
        }
    }

    pub fn apply(&self, value: f64) -> u8 {
        // float to int casts saturate
        ((value + self.offset) * self.scale) as u8
    }
}

/// Grid resampled into two RGBA8 textures of equal size.
///
/// `volume1` holds quantized components, `volume2` the encoded normals.
/// Gradient magnitude lives in the alpha channel of `volume1` for 1 and 2
/// component data and of `volume2` otherwise.
#[derive(Debug, Clone)]
pub struct ResampledVolume {
    pub dims: Vector3<usize>,
    /// Voxel spacing of the resampled texture
    pub spacing: Vector3<f64>,
    pub components: usize,
    pub quantization: Quantization,
    pub volume1: Vec<u8>,
    pub volume2: Vec<u8>,
}

impl ResampledVolume {
    pub fn voxel_count(&self) -> usize {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Byte offset of voxel `(x, y, z)` in either texture
    pub fn texel_offset(&self, x: usize, y: usize, z: usize) -> usize {
        4 * ((z * self.dims.y + y) * self.dims.x + x)
    }

    pub fn texel1(&self, x: usize, y: usize, z: usize) -> [u8; 4] {
        let o = self.texel_offset(x, y, z);
        [
            self.volume1[o],
            self.volume1[o + 1],
            self.volume1[o + 2],
            self.volume1[o + 3],
        ]
    }

    pub fn texel2(&self, x: usize, y: usize, z: usize) -> [u8; 4] {
        let o = self.texel_offset(x, y, z);
        [
            self.volume2[o],
            self.volume2[o + 1],
            self.volume2[o + 2],
            self.volume2[o + 3],
        ]
    }

    /// Gradient magnitude byte of a voxel
    pub fn gradient_magnitude(&self, x: usize, y: usize, z: usize) -> u8 {
        if self.components < 3 {
            self.texel1(x, y, z)[3]
        } else {
            self.texel2(x, y, z)[3]
        }
    }
}

/// Position of a destination voxel on one source axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisSample {
    pub lo: usize,
    pub hi: usize,
    pub w: f64,
}

impl AxisSample {
    pub fn new(index: usize, rate: f64, dim: usize) -> AxisSample {
        let mut f = index as f64 * rate;
        if f >= (dim - 1) as f64 {
            f = dim as f64 - 1.001;
        }
        let f = f.max(0.0);
        let lo = f.floor() as usize;
        AxisSample {
            lo,
            hi: usize::min(lo + 1, dim - 1),
            w: f - lo as f64,
        }
    }
}

/// Blend of 8 corner values.
/// Corner order: x fastest, then y, then z.
pub(crate) fn trilinear(c: [f64; 8], wx: f64, wy: f64, wz: f64) -> f64 {
    (1.0 - wx) * (1.0 - wy) * (1.0 - wz) * c[0]
        + wx * (1.0 - wy) * (1.0 - wz) * c[1]
        + (1.0 - wx) * wy * (1.0 - wz) * c[2]
        + wx * wy * (1.0 - wz) * c[3]
        + (1.0 - wx) * (1.0 - wy) * wz * c[4]
        + wx * (1.0 - wy) * wz * c[5]
        + (1.0 - wx) * wy * wz * c[6]
        + wx * wy * wz * c[7]
}

/// Spacing of the resampled grid.
pub fn resampled_spacing(grid: &VoxelGrid, out_dims: Vector3<usize>) -> Vector3<f64> {
    let dims = grid.dims();
    let spacing = grid.spacing().cast::<f64>();
    vector![
        axis_spacing(dims.x, out_dims.x, spacing.x),
        axis_spacing(dims.y, out_dims.y, spacing.y),
        axis_spacing(dims.z, out_dims.z, spacing.z)
    ]
}

fn axis_spacing(dim: usize, out_dim: usize, spacing: f64) -> f64 {
    if out_dim == dim || out_dim < 2 {
        spacing
    } else {
        (dim as f64 - 1.01) * spacing / (out_dim - 1) as f64
    }
}

/// Place quantized components into an RGBA texel.
fn pack(values: &[u8; 4], components: usize) -> [u8; 4] {
    match components {
        1 => [values[0], 0, 0, 0],
        2 => [values[0], values[1], 0, 0],
        3 => [values[0], values[1], values[2], values[2]],
        _ => *values,
    }
}

/// Resample `grid` into a texture fitting the budget.
///
/// Only `volume1` is filled, `volume2` is zeroed.
/// Grids that already fit are quantized without interpolation.
pub fn resample(grid: &VoxelGrid, internal_volume_size: usize) -> RaycastResult<ResampledVolume> {
    if grid.voxel_count() == 0 {
        return Err(RaycastError::invalid("cannot resample an empty grid"));
    }
    if internal_volume_size == 0 {
        return Err(RaycastError::invalid("internal volume size must be positive"));
    }

    let components = grid.components();
    let in_dims = grid.dims();
    let out_dims = target_dims(in_dims, components, internal_volume_size);
    let spacing = resampled_spacing(grid, out_dims);
    let quantization = Quantization::from_grid(grid);

    let texels = out_dims.x * out_dims.y * out_dims.z;
    let mut volume1 = vec![0u8; 4 * texels];

    if out_dims == in_dims {
        log::debug!("resampling {:?}: identity", in_dims);
        with_samples!(grid.data(), v => copy_scalars(v, components, &quantization, &mut volume1));
    } else {
        log::debug!("resampling {:?} -> {:?}", in_dims, out_dims);
        let rate = spacing.component_div(&grid.spacing().cast::<f64>());
        let layout = SourceLayout {
            dims: in_dims,
            components,
        };
        with_samples!(grid.data(), v => interpolate_scalars(
            v, &layout, out_dims, rate, &quantization, &mut volume1
        ));
    }

    Ok(ResampledVolume {
        dims: out_dims,
        spacing,
        components,
        quantization,
        volume1,
        volume2: vec![0u8; 4 * texels],
    })
}

pub(crate) struct SourceLayout {
    pub dims: Vector3<usize>,
    pub components: usize,
}

impl SourceLayout {
    pub fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        ((z * self.dims.y + y) * self.dims.x + x) * self.components
    }
}

fn copy_scalars<T: Scalar>(src: &[T], components: usize, q: &Quantization, out: &mut [u8]) {
    out.par_chunks_mut(4)
        .zip(src.par_chunks(components))
        .for_each(|(texel, voxel)| {
            let mut values = [0u8; 4];
            for (c, &v) in voxel.iter().enumerate() {
                values[c] = q.apply(v.to_f64());
            }
            texel.copy_from_slice(&pack(&values, components));
        });
}

fn interpolate_scalars<T: Scalar>(
    src: &[T],
    layout: &SourceLayout,
    out_dims: Vector3<usize>,
    rate: Vector3<f64>,
    q: &Quantization,
    out: &mut [u8],
) {
    let slab = 4 * out_dims.x * out_dims.y;
    let components = layout.components;

    out.par_chunks_mut(slab).enumerate().for_each(|(k, slab)| {
        let sz = AxisSample::new(k, rate.z, layout.dims.z);
        for j in 0..out_dims.y {
            let sy = AxisSample::new(j, rate.y, layout.dims.y);
            for i in 0..out_dims.x {
                let sx = AxisSample::new(i, rate.x, layout.dims.x);

                let corners = [
                    layout.offset(sx.lo, sy.lo, sz.lo),
                    layout.offset(sx.hi, sy.lo, sz.lo),
                    layout.offset(sx.lo, sy.hi, sz.lo),
                    layout.offset(sx.hi, sy.hi, sz.lo),
                    layout.offset(sx.lo, sy.lo, sz.hi),
                    layout.offset(sx.hi, sy.lo, sz.hi),
                    layout.offset(sx.lo, sy.hi, sz.hi),
                    layout.offset(sx.hi, sy.hi, sz.hi),
                ];

                let mut values = [0u8; 4];
                for (c, value) in values.iter_mut().enumerate().take(components) {
                    let samples = corners.map(|o| src[o + c].to_f64());
                    *value = q.apply(trilinear(samples, sx.w, sy.w, sz.w));
                }

                let o = 4 * (j * out_dims.x + i);
                slab[o..o + 4].copy_from_slice(&pack(&values, components));
            }
        }
    });
}

/// Memoized resampling and gradient estimation.
///
/// The textures are rebuilt only when the grid identity or modification
/// counter differs from the last run, or after the budget changed.
#[derive(Debug)]
pub struct Resampler {
    internal_volume_size: usize,
    saved_input: Option<Stamp>,
    volume: Option<ResampledVolume>,
}

impl Resampler {
    pub fn new(internal_volume_size: usize) -> Resampler {
        Resampler {
            internal_volume_size,
            saved_input: None,
            volume: None,
        }
    }

    pub fn internal_volume_size(&self) -> usize {
        self.internal_volume_size
    }

    /// Changing the budget forces the next update to rebuild.
    pub fn set_internal_volume_size(&mut self, size: usize) {
        if size != self.internal_volume_size {
            self.internal_volume_size = size;
            self.saved_input = None;
        }
    }

    pub fn is_texture_size_supported(&self, dims: Vector3<usize>, components: usize) -> bool {
        is_texture_size_supported(dims, components, self.internal_volume_size)
    }

    /// Bring textures up to date with `grid`.
    /// Returns `true` if they were rebuilt.
    pub fn update(&mut self, grid: &VoxelGrid, progress: Option<&Sender<f32>>) -> RaycastResult<bool> {
        if self.volume.is_some() && self.saved_input == Some(grid.stamp()) {
            return Ok(false);
        }

        let mut volume = resample(grid, self.internal_volume_size)?;
        gradient::estimate_gradients(grid, &mut volume, progress)?;

        self.volume = Some(volume);
        self.saved_input = Some(grid.stamp());
        Ok(true)
    }

    pub fn volume(&self) -> Option<&ResampledVolume> {
        self.volume.as_ref()
    }

    /// Drop cached textures.
    pub fn clear(&mut self) {
        self.saved_input = None;
        self.volume = None;
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Resampler::new(DEFAULT_INTERNAL_VOLUME_SIZE)
    }
}

#[cfg(test)]
mod test {

    use proptest::prelude::*;

    use super::*;
    use crate::volumetric::ScalarData;

    fn ramp_grid(dims: Vector3<usize>) -> VoxelGrid {
        let n = dims.x * dims.y * dims.z;
        let data: Vec<u8> = (0..n).map(|i| (i % 200) as u8).collect();
        VoxelGrid::new(dims, 1, data).unwrap()
    }

    #[test]
    fn shrink_largest_axis_first() {
        let out = target_dims(vector![20, 10, 10], 1, 10);

        assert_eq!(out, vector![10, 10, 10]);

        let out = target_dims(vector![12, 12, 10], 1, 10);
        assert!(out.x * out.y * out.z <= 1000);
        assert_eq!(out, vector![10, 10, 10]);
    }

    #[test]
    fn four_components_use_small_budget() {
        let out = target_dims(vector![200, 120, 100], 4, 256);

        assert!(out.x * out.y * out.z <= 128 * 128 * 128);
        assert!(!is_texture_size_supported(vector![200, 120, 100], 4, 256));
        assert!(is_texture_size_supported(vector![200, 120, 100], 1, 256));
    }

    #[test]
    fn integer_quantization_keeps_values() {
        let grid = VoxelGrid::new(vector![2, 1, 1], 1, vec![10u8, 50]).unwrap();

        let q = Quantization::from_grid(&grid);

        assert_eq!(q.table_size, 41);
        assert_eq!(q.scale, 1.0);
        assert_eq!(q.apply(10.0), 0);
        assert_eq!(q.apply(50.0), 40);
    }

    #[test]
    fn wide_range_is_scaled() {
        let grid = VoxelGrid::new(vector![2, 1, 1], 1, vec![-1000i16, 1000]).unwrap();

        let q = Quantization::from_grid(&grid);

        assert_eq!(q.table_size, 256);
        assert_eq!(q.apply(-1000.0), 0);
        assert!(q.apply(1000.0) >= 254);
        assert_eq!(q.apply(0.0), 127);
    }

    #[test]
    fn float_constant_grid() {
        let grid = VoxelGrid::new(vector![2, 1, 1], 1, vec![3.5f32, 3.5]).unwrap();

        let q = Quantization::from_grid(&grid);

        assert_eq!(q.table_size, 256);
        assert_eq!(q.apply(3.5), 0);
    }

    #[test]
    fn identity_packs_components() {
        let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let grid = VoxelGrid::new(vector![2, 1, 1], 4, data).unwrap();

        let vol = resample(&grid, 256).unwrap();

        // range of the last component is [4, 8]
        assert_eq!(vol.dims, vector![2, 1, 1]);
        assert_eq!(vol.texel1(0, 0, 0), [0, 0, 0, 0]);
        assert_eq!(vol.texel1(1, 0, 0), [1, 2, 3, 4]);
    }

    #[test]
    fn identity_two_components() {
        let data = vec![0u8, 0, 9, 100];
        let grid = VoxelGrid::new(vector![2, 1, 1], 2, data).unwrap();

        let vol = resample(&grid, 256).unwrap();

        assert_eq!(vol.texel1(1, 0, 0), [9, 100, 0, 0]);
    }

    #[test]
    fn interpolated_constant_stays_constant() {
        let grid = VoxelGrid::new(vector![20, 20, 20], 1, vec![77u8; 8000]).unwrap();

        let vol = resample(&grid, 10).unwrap();

        assert_eq!(vol.dims, vector![10, 10, 10]);
        // constant grid, span 0, offset -77
        assert!(vol.volume1.chunks(4).all(|t| t == [0, 0, 0, 0]));
    }

    #[test]
    fn interpolation_follows_ramp() {
        // value equals x coordinate
        let dims = vector![40, 4, 4];
        let data: Vec<u8> = (0..dims.x * dims.y * dims.z)
            .map(|i| (i % dims.x) as u8)
            .collect();
        let grid = VoxelGrid::new(dims, 1, data).unwrap();

        let vol = resample(&grid, 8).unwrap();

        assert!(vol.dims.x < 40);
        let mut last = 0;
        for x in 0..vol.dims.x {
            let v = vol.texel1(x, 1, 1)[0];
            assert!(v >= last);
            last = v;
        }
        assert!(last >= 37);
    }

    #[test]
    fn resampler_memoizes() {
        let mut grid = ramp_grid(vector![8, 8, 8]);
        let mut resampler = Resampler::new(256);

        assert!(resampler.update(&grid, None).unwrap());
        assert!(!resampler.update(&grid, None).unwrap());

        grid.modified();
        assert!(resampler.update(&grid, None).unwrap());

        resampler.set_internal_volume_size(4);
        assert!(resampler.update(&grid, None).unwrap());
        assert_eq!(resampler.volume().unwrap().dims, vector![4, 4, 4]);
    }

    #[test]
    fn other_grid_rebuilds() {
        let a = ramp_grid(vector![4, 4, 4]);
        let b = a.clone().with_spacing(vector![2.0, 1.0, 1.0]);
        let c = ramp_grid(vector![4, 4, 4]);
        let mut resampler = Resampler::default();

        assert!(resampler.update(&a, None).unwrap());
        assert!(resampler.update(&b, None).unwrap());
        assert!(resampler.update(&c, None).unwrap());
    }

    #[test]
    fn clones_are_resampled_separately() {
        let base = VoxelGrid::new(vector![4, 4, 4], 1, vec![0u8; 64]).unwrap();
        let mut a = base.clone();
        let mut b = base.clone();
        a.modified();
        if let ScalarData::U8(samples) = b.data_mut() {
            for (i, s) in samples.iter_mut().enumerate() {
                *s = i as u8;
            }
        }
        let mut resampler = Resampler::default();

        assert_ne!(a.stamp(), b.stamp());
        assert!(resampler.update(&a, None).unwrap());
        assert!(resampler.update(&b, None).unwrap());
        assert_eq!(resampler.volume().unwrap().texel1(3, 0, 0), [3, 0, 0, 0]);
    }

    #[test]
    fn identity_is_byte_exact() {
        let grid = ramp_grid(vector![16, 12, 10]);

        let vol = resample(&grid, 256).unwrap();

        assert_eq!(vol.dims, grid.dims());
        for (i, texel) in vol.volume1.chunks(4).enumerate() {
            assert_eq!(texel, [(i % 200) as u8, 0, 0, 0], "voxel {}", i);
        }
    }

    proptest! {
        #[test]
        fn smaller_budget_never_grows(
            x in 1usize..200,
            y in 1usize..200,
            z in 1usize..200,
            components in 1usize..4,
            small in 1usize..64,
            extra in 0usize..64,
        ) {
            let dims = vector![x, y, z];
            let large = target_dims(dims, components, small + extra);
            let shrunk = target_dims(dims, components, small);

            prop_assert!(shrunk.x <= large.x && shrunk.y <= large.y && shrunk.z <= large.z);
            prop_assert!(large.x <= x && large.y <= y && large.z <= z);
            prop_assert!(shrunk.x * shrunk.y * shrunk.z <= small.pow(3));
        }
    }
}
