use nalgebra::Vector3;

use super::SampleGenerator;

/// Ball in the middle of the volume
/// Value falls linearly from `sample` in the center to 0 on the surface
pub struct SphereGenerator {
    center: Vector3<f32>,
    radius: f32,
    sample: u8,
}

impl SphereGenerator {
    pub fn new(dims: Vector3<u32>, sample: u8) -> SphereGenerator {
        let dims_f = dims.cast::<f32>();
        SphereGenerator {
            center: (dims_f - Vector3::repeat(1.0)) / 2.0,
            radius: 0.4 * dims_f.min(),
            sample,
        }
    }
}

impl SampleGenerator for SphereGenerator {
    fn sample_at(&self, coords: Vector3<u32>) -> u8 {
        let dist = (coords.cast::<f32>() - self.center).norm();
        let falloff = (1.0 - dist / self.radius).max(0.0);
        (falloff * self.sample as f32) as u8
    }
}
