use std::ops::RangeBounds;

use nalgebra::{vector, Vector3};

use super::SampleGenerator;

/// Generate volume with a number of randomly placed shapes
pub struct ShapesGenerator {
    shapes: Vec<ShapeInfo>,
}

impl ShapesGenerator {
    pub fn new(
        dims: Vector3<u32>,
        n_of_shapes: usize,
        sample: u8,
        obj_size: u32,
        seed: Option<u64>,
    ) -> ShapesGenerator {
        let size = dims.map(|d| obj_size.min(d));
        let variance = size.map(|s| s / 10);
        let random_shape_gen = ShapeInfoGenerator::new(dims, size, variance, sample, 10, seed);
        let shapes = random_shape_gen.get_shapes(n_of_shapes);
        ShapesGenerator { shapes }
    }
}

impl SampleGenerator for ShapesGenerator {
    fn sample_at(&self, coords: Vector3<u32>) -> u8 {
        self.shapes
            .iter()
            .find(|shape| shape.contains(coords))
            .map_or(0, |shape| shape.render_at(coords - shape.position_low))
    }
}

// # of enum ShapeType variants
const N_OF_SHAPE_KINDS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Cuboid,
    Sphere,
}

/// One shape in volume
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    pub position_low: Vector3<u32>,
    pub position_high: Vector3<u32>,
    pub shape_type: ShapeType,
    pub sample: u8,
}

impl ShapeInfo {
    fn contains(&self, coords: Vector3<u32>) -> bool {
        (0..3).all(|i| coords[i] >= self.position_low[i] && coords[i] <= self.position_high[i])
    }

    fn render_at(&self, offset: Vector3<u32>) -> u8 {
        match self.shape_type {
            ShapeType::Cuboid => self.sample,
            ShapeType::Sphere => self.render_sphere(offset),
        }
    }

    fn render_sphere(&self, offset: Vector3<u32>) -> u8 {
        let extent = (self.position_high - self.position_low).cast::<f32>();
        let center = extent / 2.0;
        let r = extent.min() / 2.0;

        if (offset.cast::<f32>() - center).norm() <= r {
            self.sample
        } else {
            0
        }
    }
}

/// Generate shapes
/// Helper type
struct ShapeInfoGenerator {
    rng: fastrand::Rng,
    vol_dims: Vector3<u32>,
    size: Vector3<u32>,
    size_variance: Vector3<u32>,
    sample: u8,
    sample_variance: u8,
}

impl ShapeInfoGenerator {
    fn new(
        vol_dims: Vector3<u32>,
        size: Vector3<u32>,
        size_variance: Vector3<u32>,
        sample: u8,
        sample_variance: u8,
        seed: Option<u64>,
    ) -> Self {
        let rng = fastrand::Rng::new();
        if let Some(seed) = seed {
            rng.seed(seed);
        }

        Self {
            rng,
            vol_dims,
            size,
            size_variance,
            sample,
            sample_variance,
        }
    }

    fn random_shape(&self) -> ShapeType {
        match self.rng.u8(0..N_OF_SHAPE_KINDS) {
            0 => ShapeType::Cuboid,
            _ => ShapeType::Sphere,
        }
    }

    fn random_vector<R>(&self, ranges: [R; 3]) -> Vector3<u32>
    where
        R: RangeBounds<u32>,
    {
        let [x, y, z] = ranges;
        vector![self.rng.u32(x), self.rng.u32(y), self.rng.u32(z)]
    }

    fn get_shapes(&self, n: usize) -> Vec<ShapeInfo> {
        (0..n).map(|_| self.get_shape()).collect()
    }

    fn get_shape(&self) -> ShapeInfo {
        let shape_type = self.random_shape();

        let size_min = self.size - self.size_variance;
        let size_max = (self.size + self.size_variance).zip_map(&self.vol_dims, |s, d| s.min(d));
        let size = self.random_vector([
            size_min.x..=size_max.x,
            size_min.y..=size_max.y,
            size_min.z..=size_max.z,
        ]);

        // Spawn shape in positions it fits
        let room = self.vol_dims - size;
        let position_low = self.random_vector([0..=room.x, 0..=room.y, 0..=room.z]);
        let position_high = (position_low + size).map(|c| c.saturating_sub(1));

        ShapeInfo {
            position_low,
            position_high,
            shape_type,
            sample: self.random_sample(),
        }
    }

    fn random_sample(&self) -> u8 {
        // Uses saturating intrinsics, so there is no overflow
        let low = self.sample.saturating_sub(self.sample_variance);
        let high = self.sample.saturating_add(self.sample_variance);
        self.rng.u8(low..=high)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn shapes_stay_inside() {
        let dims = vector![40, 30, 20];
        let gen = ShapesGenerator::new(dims, 20, 100, 12, Some(4));

        assert_eq!(gen.shapes.len(), 20);
        for shape in &gen.shapes {
            for i in 0..3 {
                assert!(shape.position_high[i] < dims[i]);
                assert!(shape.position_low[i] <= shape.position_high[i]);
            }
            assert!((90..=110).contains(&shape.sample));
        }
    }

    #[test]
    fn seed_replicates_volume() {
        let dims = vector![16, 16, 16];
        let a = ShapesGenerator::new(dims, 5, 50, 6, Some(11));
        let b = ShapesGenerator::new(dims, 5, 50, 6, Some(11));

        for z in 0..16 {
            let c = vector![8, 8, z];
            assert_eq!(a.sample_at(c), b.sample_at(c));
        }
    }

    #[test]
    fn oversized_objects_are_clamped() {
        let gen = ShapesGenerator::new(vector![8, 8, 8], 3, 10, 100, Some(1));

        assert_eq!(gen.shapes.len(), 3);
    }
}
