use std::ops::RangeInclusive;

/// Closed range of scalar values, `[low, high]`.
///
/// Used for scalar ranges of voxel grids and for the domains
/// transfer functions are sampled over.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ValueRange {
    /// Lower bound
    pub low: f64,
    /// Upper bound
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> ValueRange {
        ValueRange { low, high }
    }

    /// Constructs new, empty range.
    pub fn empty() -> ValueRange {
        ValueRange {
            low: f64::NAN,
            high: f64::NAN,
        }
    }

    /// Constructs new range with one element, `val`.
    pub fn seed(val: f64) -> ValueRange {
        ValueRange {
            low: val,
            high: val,
        }
    }

    /// Constructs minimal range containing all samples.
    pub fn from_samples(iter: impl IntoIterator<Item = f64>) -> ValueRange {
        let mut range = ValueRange::empty();
        for val in iter {
            range.extend(val);
        }
        range
    }

    /// Extend the range with new value.
    pub fn extend(&mut self, val: f64) {
        if self.is_empty() {
            self.low = val;
            self.high = val;
            return;
        }

        if val > self.high {
            self.high = val;
        }

        if val < self.low {
            self.low = val;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_nan() || self.high.is_nan()
    }

    /// `high - low`, zero for empty ranges.
    pub fn span(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.high - self.low
        }
    }

    /// Check if value is inside the range.
    pub fn contains(&self, val: f64) -> bool {
        self.low <= val && val <= self.high
    }

    /// Value of the `i`-th of `n` evenly spaced samples over the range.
    /// One sample sits in the middle of the range.
    pub fn sample_point(&self, i: usize, n: usize) -> f64 {
        if n <= 1 {
            return 0.5 * (self.low + self.high);
        }
        self.low + self.span() * (i as f64) / ((n - 1) as f64)
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::empty()
    }
}

/// Unlocks simple syntax:
/// ```
/// # use gpu_raycast::common::ValueRange;
/// let range: ValueRange = (0.0..=45.5).into();
/// assert_eq!(range.span(), 45.5);
/// ```
impl From<RangeInclusive<f64>> for ValueRange {
    fn from(range: RangeInclusive<f64>) -> Self {
        ValueRange {
            low: *range.start(),
            high: *range.end(),
        }
    }
}
