//! Gradient estimation over resampled volumes
//!
//! Normals and gradient magnitudes are computed from the source grid at
//! the positions of resampled voxels and written into the RGBA textures.
//! Work is split by contiguous z ranges across worker threads.

use std::any::Any;

use crossbeam::channel::Sender;
use nalgebra::Vector3;

use super::{
    resample::{trilinear, AxisSample, ResampledVolume, SourceLayout},
    VoxelGrid,
};
use crate::error::{RaycastError, RaycastResult};

/// Number of slices between two progress reports.
const PROGRESS_SLICES: usize = 8;

/// Constants shared by all workers.
struct GradientSetup<'a> {
    data: &'a [f32],
    layout: SourceLayout,
    /// Component sampled for gradients (the last one)
    component: usize,
    out_dims: Vector3<usize>,
    rate: Vector3<f64>,
    aspect: Vector3<f64>,
    magnitude_scale: f64,
    zero_normal_threshold: f64,
    /// Magnitude goes to `volume1` alpha
    magnitude_in_volume1: bool,
}

/// z range `[start, limit)` of worker `id` out of `count`.
pub fn slice_range(id: usize, count: usize, depth: usize) -> (usize, usize) {
    (id * depth / count, (id + 1) * depth / count)
}

/// Number of workers for a volume `depth` slices deep.
pub fn worker_count(depth: usize) -> usize {
    let hw = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    hw.clamp(1, depth.max(1))
}

/// Fill normals and gradient magnitudes of `volume`.
///
/// Progress values in `(0, 1]` are sent by the first worker only, every
/// eighth slice, followed by a final `1.0`.
/// A panicking worker leaves `volume` partially written and fails the call.
pub fn estimate_gradients(
    grid: &VoxelGrid,
    volume: &mut ResampledVolume,
    progress: Option<&Sender<f32>>,
) -> RaycastResult<()> {
    let data = grid.data().to_f32_vec();
    let spacing = grid.spacing().cast::<f64>();
    let range = volume.quantization.range.span();

    let avg_spacing = (spacing.x + spacing.y + spacing.z) / 3.0;
    let aspect = spacing.map(|s| 1.0 / (s * 2.0 / avg_spacing));

    let setup = GradientSetup {
        data: &data,
        layout: SourceLayout {
            dims: grid.dims(),
            components: grid.components(),
        },
        component: grid.components() - 1,
        out_dims: volume.dims,
        rate: volume.spacing.component_div(&spacing),
        aspect,
        magnitude_scale: if range > 0.0 { 255.0 / (0.25 * range) } else { 0.0 },
        zero_normal_threshold: 0.001 * range,
        magnitude_in_volume1: volume.components < 3,
    };

    let depth = volume.dims.z;
    let workers = worker_count(depth);
    let slab = 4 * volume.dims.x * volume.dims.y;

    log::debug!("estimating gradients of {:?} with {} workers", volume.dims, workers);

    let setup = &setup;
    let scope_result = crossbeam::scope(|s| {
        let mut rest1 = volume.volume1.as_mut_slice();
        let mut rest2 = volume.volume2.as_mut_slice();

        for id in 0..workers {
            let (z_start, z_limit) = slice_range(id, workers, depth);
            let len = (z_limit - z_start) * slab;

            let (part1, tail1) = std::mem::take(&mut rest1).split_at_mut(len);
            let (part2, tail2) = std::mem::take(&mut rest2).split_at_mut(len);
            rest1 = tail1;
            rest2 = tail2;

            let reporter = if id == 0 { progress.cloned() } else { None };

            s.spawn(move |_| {
                gradient_worker(setup, z_start, z_limit, part1, part2, reporter.as_ref());
                if let Some(tx) = reporter {
                    let _ = tx.send(1.0);
                }
            });
        }
    });

    check_workers(scope_result)
}

fn check_workers(result: std::thread::Result<()>) -> RaycastResult<()> {
    result.map_err(|payload| {
        // crossbeam collects the payloads of all panicked workers
        let msg = match payload.downcast_ref::<Vec<Box<dyn Any + Send>>>() {
            Some(panics) => panics.first().and_then(|p| panic_message(p.as_ref())),
            None => panic_message(payload.as_ref()),
        }
        .unwrap_or_else(|| "worker panicked".to_string());
        log::error!("gradient worker panicked: {}", msg);
        RaycastError::Gradient(msg)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

fn gradient_worker(
    setup: &GradientSetup,
    z_start: usize,
    z_limit: usize,
    volume1: &mut [u8],
    volume2: &mut [u8],
    progress: Option<&Sender<f32>>,
) {
    let dims = setup.layout.dims;
    let out = setup.out_dims;

    for z in z_start..z_limit {
        let sz = AxisSample::new(z, setup.rate.z, dims.z);
        for y in 0..out.y {
            let sy = AxisSample::new(y, setup.rate.y, dims.y);
            for x in 0..out.x {
                let sx = AxisSample::new(x, setup.rate.x, dims.x);

                let (normal, magnitude) = gradient_at(setup, [sx, sy, sz]);

                let o = 4 * (((z - z_start) * out.y + y) * out.x + x);
                volume2[o] = normal[0];
                volume2[o + 1] = normal[1];
                volume2[o + 2] = normal[2];
                if setup.magnitude_in_volume1 {
                    volume2[o + 3] = 0;
                    volume1[o + 3] = magnitude;
                } else {
                    volume2[o + 3] = magnitude;
                }
            }
        }

        if z % PROGRESS_SLICES == PROGRESS_SLICES - 1 {
            if let Some(tx) = progress {
                let span = (z_limit - z_start).saturating_sub(1).max(1);
                let _ = tx.send((z - z_start) as f32 / span as f32);
            }
        }
    }
}

/// Encoded normal and gradient magnitude at one resampled voxel.
fn gradient_at(setup: &GradientSetup, axes: [AxisSample; 3]) -> ([u8; 3], u8) {
    let dims = setup.layout.dims;
    let loc = [axes[0].lo, axes[1].lo, axes[2].lo];
    let w = [axes[0].w, axes[1].w, axes[2].w];

    let mut n = [0.0f64; 3];
    for axis in 0..3 {
        let dim = dims[axis] as isize;
        let l = loc[axis] as isize;

        // one-sided difference on the border
        let minus = if l < 1 { 0 } else { -1 };
        let plus = if l >= dim - 2 { 0 } else { 1 };

        let s_minus = shifted_sample(setup, loc, axis, minus, w);
        let s_plus = shifted_sample(setup, loc, axis, plus, w);

        let factor = if minus == 0 || plus == 0 { 2.0 } else { 1.0 };
        n[axis] = factor * (s_minus - s_plus) * setup.aspect[axis];
    }

    let t = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();

    let g = (t * setup.magnitude_scale).clamp(0.0, 255.0);
    let magnitude = (g + 0.5) as u8;

    if t > setup.zero_normal_threshold {
        for v in n.iter_mut() {
            *v /= t;
        }
    } else {
        n = [0.0; 3];
    }

    let encode = |v: f64| ((v * 0.5 + 0.5) * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
    ([encode(n[0]), encode(n[1]), encode(n[2])], magnitude)
}

/// Trilinear sample of the gradient component, with the cell moved by
/// `shift` voxels along `axis`.
fn shifted_sample(setup: &GradientSetup, loc: [usize; 3], axis: usize, shift: isize, w: [f64; 3]) -> f64 {
    let dims = setup.layout.dims;
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    for i in 0..3 {
        let max = dims[i] as isize - 1;
        let base = loc[i] as isize + if i == axis { shift } else { 0 };
        lo[i] = base.clamp(0, max) as usize;
        hi[i] = (base + 1).clamp(0, max) as usize;
    }

    let at = |x: usize, y: usize, z: usize| {
        setup.data[setup.layout.offset(x, y, z) + setup.component] as f64
    };

    let corners = [
        at(lo[0], lo[1], lo[2]),
        at(hi[0], lo[1], lo[2]),
        at(lo[0], hi[1], lo[2]),
        at(hi[0], hi[1], lo[2]),
        at(lo[0], lo[1], hi[2]),
        at(hi[0], lo[1], hi[2]),
        at(lo[0], hi[1], hi[2]),
        at(hi[0], hi[1], hi[2]),
    ];
    trilinear(corners, w[0], w[1], w[2])
}

#[cfg(test)]
mod test {

    use nalgebra::vector;
    use proptest::prelude::*;

    use super::*;
    use crate::{test_helpers::sphere_grid, volumetric::resample};

    fn decode(b: u8) -> f64 {
        b as f64 / 255.0 * 2.0 - 1.0
    }

    /// Length of every nonzero decoded normal
    fn normal_lengths(vol: &ResampledVolume) -> Vec<f64> {
        vol.volume2
            .chunks(4)
            .filter(|t| t[..3] != [128, 128, 128])
            .map(|t| (decode(t[0]).powi(2) + decode(t[1]).powi(2) + decode(t[2]).powi(2)).sqrt())
            .collect()
    }

    #[test]
    fn slices_cover_depth() {
        let depth = 37;
        let count = 5;
        let mut next = 0;
        for id in 0..count {
            let (start, limit) = slice_range(id, count, depth);
            assert_eq!(start, next);
            next = limit;
        }
        assert_eq!(next, depth);
    }

    #[test]
    fn flat_grid_has_no_gradient() {
        let grid = VoxelGrid::new(vector![6, 6, 6], 1, vec![0u8; 216]).unwrap();
        let mut vol = resample(&grid, 256).unwrap();

        estimate_gradients(&grid, &mut vol, None).unwrap();

        assert!(vol.volume2.chunks(4).all(|t| t == [128, 128, 128, 0]));
        assert!(vol.volume1.chunks(4).all(|t| t[3] == 0));
    }

    #[test]
    fn ramp_along_x() {
        let dims = vector![8, 8, 8];
        let data: Vec<u8> = (0..512).map(|i| ((i % 8) * 30) as u8).collect();
        let grid = VoxelGrid::new(dims, 1, data).unwrap();
        let mut vol = resample(&grid, 256).unwrap();

        estimate_gradients(&grid, &mut vol, None).unwrap();

        let normal = vol.texel2(4, 4, 4);
        // values grow with x, normal points against the growth
        assert!(decode(normal[0]) < -0.99);
        assert!(decode(normal[1]).abs() < 0.01);
        assert!(decode(normal[2]).abs() < 0.01);
        // central difference 60 halved by the aspect, range 210: 30 * 255 / 52.5
        assert_eq!(vol.gradient_magnitude(4, 4, 4), 146);
    }

    #[test]
    fn four_components_keep_magnitude_in_volume2() {
        let dims = vector![4, 4, 4];
        let mut data = Vec::new();
        for i in 0..64 {
            let x = (i % 4) as u8;
            data.extend_from_slice(&[1, 2, 3, x * 20]);
        }
        let grid = VoxelGrid::new(dims, 4, data).unwrap();
        let mut vol = resample(&grid, 256).unwrap();

        estimate_gradients(&grid, &mut vol, None).unwrap();

        assert!(vol.texel2(1, 1, 1)[3] > 0);
        assert_eq!(vol.texel1(1, 1, 1), [1, 2, 3, 20]);
    }

    #[test]
    fn worker_panic_is_an_error() {
        let result = crossbeam::scope(|s| {
            s.spawn(|_| panic!("slab out of range"));
        });

        match check_workers(result) {
            Err(RaycastError::Gradient(msg)) => assert_eq!(msg, "slab out of range"),
            other => panic!("expected gradient error, got {:?}", other),
        }
        assert!(check_workers(Ok(())).is_ok());
    }

    #[test]
    fn progress_ends_with_one() {
        let grid = VoxelGrid::new(vector![4, 4, 32], 1, vec![1u8; 512]).unwrap();
        let mut vol = resample(&grid, 256).unwrap();
        let (tx, rx) = crossbeam::channel::unbounded();

        estimate_gradients(&grid, &mut vol, Some(&tx)).unwrap();
        drop(tx);

        let reports: Vec<f32> = rx.iter().collect();
        assert_eq!(reports.last(), Some(&1.0));
        assert!(reports.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn shrunk_sphere_normals_are_unit() {
        let grid = sphere_grid(32);
        let mut vol = resample(&grid, 16).unwrap();

        estimate_gradients(&grid, &mut vol, None).unwrap();

        let lengths = normal_lengths(&vol);
        assert!(!lengths.is_empty());
        assert!(lengths.iter().all(|l| (l - 1.0).abs() < 0.02));
    }

    proptest! {
        #[test]
        fn normals_decode_to_unit_length(
            data in proptest::collection::vec(any::<u8>(), 60),
            sx in 0.5f32..3.0,
            sz in 0.5f32..3.0,
        ) {
            let grid = VoxelGrid::new(vector![5, 4, 3], 1, data)
                .unwrap()
                .with_spacing(vector![sx, 1.0, sz]);
            let mut vol = resample(&grid, 256).unwrap();

            estimate_gradients(&grid, &mut vol, None).unwrap();

            for l in normal_lengths(&vol) {
                prop_assert!((l - 1.0).abs() < 0.02, "length {}", l);
            }
        }
    }
}
