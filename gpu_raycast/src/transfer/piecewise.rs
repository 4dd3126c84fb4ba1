use crate::common::{Stamp, ValueRange};

/// Piecewise linear function `f64 -> f64`, used for gray levels and
/// opacities.
///
/// Outside its points the function is clamped to the first or last value.
/// An empty function evaluates to zero.
#[derive(Debug, Default)]
pub struct PiecewiseFunction {
    stamp: Stamp,
    points: Vec<(f64, f64)>,
}

impl Clone for PiecewiseFunction {
    fn clone(&self) -> Self {
        PiecewiseFunction {
            stamp: self.stamp.renewed(),
            points: self.points.clone(),
        }
    }
}

impl PiecewiseFunction {
    pub fn new() -> PiecewiseFunction {
        Self::default()
    }

    /// Build from `(x, y)` pairs in any order.
    pub fn from_points(points: &[(f64, f64)]) -> PiecewiseFunction {
        let mut f = PiecewiseFunction::new();
        for &(x, y) in points {
            f.add_point(x, y);
        }
        f
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Insert a point, replacing one at the same `x`.
    pub fn add_point(&mut self, x: f64, y: f64) {
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(i) => self.points[i].1 = y,
            Err(i) => self.points.insert(i, (x, y)),
        }
        self.stamp.modified();
    }

    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.stamp.modified();
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn value(&self, x: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return 0.0,
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        // first point with p.x > x, never 0 here
        let i = self.points.partition_point(|p| p.0 <= x);
        let (x0, y0) = self.points[i - 1];
        let (x1, y1) = self.points[i];
        let t = (x - x0) / (x1 - x0);
        y0 + t * (y1 - y0)
    }

    /// `n` evenly spaced values over `[min, max]`.
    pub fn sample_table(&self, min: f64, max: f64, n: usize) -> Vec<f32> {
        let range = ValueRange::new(min, max);
        (0..n)
            .map(|i| self.value(range.sample_point(i, n)) as f32)
            .collect()
    }
}
