use crate::common::{Stamp, ValueRange};

/// Piecewise linear RGB function, channels in `[0, 1]`.
#[derive(Debug, Default)]
pub struct ColorTransferFunction {
    stamp: Stamp,
    points: Vec<(f64, [f64; 3])>,
}

impl Clone for ColorTransferFunction {
    fn clone(&self) -> Self {
        ColorTransferFunction {
            stamp: self.stamp.renewed(),
            points: self.points.clone(),
        }
    }
}

impl ColorTransferFunction {
    pub fn new() -> ColorTransferFunction {
        Self::default()
    }

    pub fn from_points(points: &[(f64, [f64; 3])]) -> ColorTransferFunction {
        let mut f = ColorTransferFunction::new();
        for &(x, rgb) in points {
            f.add_rgb_point(x, rgb[0], rgb[1], rgb[2]);
        }
        f
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn add_rgb_point(&mut self, x: f64, r: f64, g: f64, b: f64) {
        let rgb = [r, g, b];
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(i) => self.points[i].1 = rgb,
            Err(i) => self.points.insert(i, (x, rgb)),
        }
        self.stamp.modified();
    }

    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.stamp.modified();
    }

    pub fn color(&self, x: f64) -> [f64; 3] {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return [0.0; 3],
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        let i = self.points.partition_point(|p| p.0 <= x);
        let (x0, c0) = self.points[i - 1];
        let (x1, c1) = self.points[i];
        let t = (x - x0) / (x1 - x0);
        [
            c0[0] + t * (c1[0] - c0[0]),
            c0[1] + t * (c1[1] - c0[1]),
            c0[2] + t * (c1[2] - c0[2]),
        ]
    }

    /// `n` evenly spaced colors over `[min, max]`.
    pub fn sample_table(&self, min: f64, max: f64, n: usize) -> Vec<[f32; 3]> {
        let range = ValueRange::new(min, max);
        (0..n)
            .map(|i| self.color(range.sample_point(i, n)).map(|c| c as f32))
            .collect()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn ramp_colors() {
        let f = ColorTransferFunction::from_points(&[(0.0, [0.0, 0.0, 1.0]), (2.0, [1.0, 0.0, 0.0])]);

        assert_eq!(f.color(1.0), [0.5, 0.0, 0.5]);
        assert_eq!(f.color(-1.0), [0.0, 0.0, 1.0]);
        assert_eq!(f.color(3.0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn sampled_table() {
        let f = ColorTransferFunction::from_points(&[(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 1.0, 1.0])]);

        let table = f.sample_table(0.0, 1.0, 3);

        assert_eq!(table, vec![[0.0; 3], [0.5; 3], [1.0; 3]]);
    }
}
