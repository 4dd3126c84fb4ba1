use nalgebra::{point, Matrix4, Point3, Vector3};

use super::Ray;

/// Axis aligned box.
///
/// Ray casting works with boxes in texture space, where the whole volume
/// spans `[0, 1]` on every axis and clipping shrinks the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    pub lower: Point3<f32>,
    pub upper: Point3<f32>,
}

impl BoundBox {
    pub fn new(lower: Point3<f32>, upper: Point3<f32>) -> BoundBox {
        BoundBox { lower, upper }
    }

    /// Whole texture, `[0,1]^3`
    pub fn unit() -> BoundBox {
        BoundBox {
            lower: point![0.0, 0.0, 0.0],
            upper: point![1.0, 1.0, 1.0],
        }
    }

    pub fn from_position_dims(position: Point3<f32>, dimensions: Vector3<f32>) -> BoundBox {
        BoundBox {
            lower: position,
            upper: position + dimensions,
        }
    }

    /// Smallest box containing all `points`.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> BoundBox {
        let mut lower = point![f32::INFINITY, f32::INFINITY, f32::INFINITY];
        let mut upper = point![f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
        for p in points {
            lower = lower.inf(&p);
            upper = upper.sup(&p);
        }
        BoundBox { lower, upper }
    }

    pub fn dims(&self) -> Vector3<f32> {
        self.upper - self.lower
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        self.dims().norm()
    }

    /// Both corners clamped into `[0,1]`.
    pub fn clamp_unit(&self) -> BoundBox {
        BoundBox {
            lower: self.lower.map(|v| v.clamp(0.0, 1.0)),
            upper: self.upper.map(|v| v.clamp(0.0, 1.0)),
        }
    }

    /// True if any side has zero or negative length.
    pub fn is_degenerate(&self) -> bool {
        self.dims().iter().any(|&d| !(d > 0.0))
    }

    /// Containment including the border.
    pub fn contains(&self, pos: &Point3<f32>) -> bool {
        (0..3).all(|i| pos[i] >= self.lower[i] && pos[i] <= self.upper[i])
    }

    /// Box containing all 8 transformed corners.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> BoundBox {
        BoundBox::from_points(self.into_iter().map(|p| matrix.transform_point(&p)))
    }

    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        // Source: An Efficient and Robust Ray–Box Intersection Algorithm. Amy Williams et al. 2004.
        // http://citeseerx.ist.psu.edu/viewdoc/summary?doi=10.1.1.64.7663

        // t value of intersection with the 6 planes of a bounding box
        let t0 = (self.lower - ray.origin).component_div(&ray.direction);
        let t1 = (self.upper - ray.origin).component_div(&ray.direction);

        // [ (min,max) , (min,max) , (min,max) ]
        let t_minmax = t0.zip_map(&t1, |t0, t1| if t0 < t1 { (t0, t1) } else { (t1, t0) });

        let tmin = f32::max(f32::max(t_minmax.x.0, t_minmax.y.0), t_minmax.z.0);
        let tmax = f32::min(f32::min(t_minmax.x.1, t_minmax.y.1), t_minmax.z.1);

        // whole box is behind the ray
        if tmax.is_sign_negative() {
            return None;
        }

        if tmin > tmax {
            return None;
        }

        Some((tmin, tmax))
    }
}

/// Corners of a box, in the order the proxy geometry uses them.
/// Bottom face (z low) counter-clockwise, then top face.
pub struct BoundBoxIterator {
    pub lower: Point3<f32>,
    pub upper: Point3<f32>,
    state: u8,
}

impl Iterator for BoundBoxIterator {
    type Item = Point3<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        let p = match self.state {
            0 => self.lower,
            1 => point![self.upper.x, self.lower.y, self.lower.z],
            2 => point![self.upper.x, self.upper.y, self.lower.z],
            3 => point![self.lower.x, self.upper.y, self.lower.z],
            4 => point![self.lower.x, self.lower.y, self.upper.z],
            5 => point![self.upper.x, self.lower.y, self.upper.z],
            6 => self.upper,
            7 => point![self.lower.x, self.upper.y, self.upper.z],
            _ => return None,
        };
        self.state += 1;
        Some(p)
    }
}

impl IntoIterator for BoundBox {
    type Item = Point3<f32>;

    type IntoIter = BoundBoxIterator;

    fn into_iter(self) -> Self::IntoIter {
        BoundBoxIterator {
            lower: self.lower,
            upper: self.upper,
            state: 0,
        }
    }
}

impl IntoIterator for &BoundBox {
    type Item = Point3<f32>;

    type IntoIter = BoundBoxIterator;

    fn into_iter(self) -> Self::IntoIter {
        (*self).into_iter()
    }
}
