use nalgebra::{vector, Vector3};

use super::SampleGenerator;

/// Generate solid volume
/// All samples inside the margin have the same value
pub struct SolidGenerator {
    /// The sample value
    sample: u8,
    pad: u32,
    dims: Vector3<u32>,
}

impl SolidGenerator {
    pub fn new(dims: Vector3<u32>, sample: u8) -> SolidGenerator {
        SolidGenerator {
            sample,
            pad: 5,
            dims,
        }
    }
}

impl SampleGenerator for SolidGenerator {
    fn sample_at(&self, coords: Vector3<u32>) -> u8 {
        let pad_end = self.dims.map(|d| d.saturating_sub(self.pad + 1));
        let pad = vector![self.pad, self.pad, self.pad];
        if coords.iter().zip(pad.iter()).any(|(c, p)| c < p)
            || coords.iter().zip(pad_end.iter()).any(|(c, e)| c > e)
        {
            0
        } else {
            self.sample
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn margin_is_empty() {
        let gen = SolidGenerator::new(vector![20, 20, 20], 9);

        assert_eq!(gen.sample_at(vector![0, 10, 10]), 0);
        assert_eq!(gen.sample_at(vector![4, 10, 10]), 0);
        assert_eq!(gen.sample_at(vector![5, 5, 5]), 9);
        assert_eq!(gen.sample_at(vector![14, 14, 14]), 9);
        assert_eq!(gen.sample_at(vector![15, 10, 10]), 0);
    }

    #[test]
    fn tiny_volume_is_empty() {
        let gen = SolidGenerator::new(vector![3, 3, 3], 9);

        assert_eq!(gen.sample_at(vector![1, 1, 1]), 0);
    }
}
