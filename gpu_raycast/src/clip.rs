//! Region of interest clipping
//!
//! A region of interest is six planes, x low/high, y low/high, z low/high,
//! plus the transform of the widget that defines them. Every renderer
//! showing the volume implements [`ClipConsumer`] and receives the same
//! planes.

use log::warn;
use nalgebra::{point, Matrix4, Point3, Vector3};

use crate::common::BoundBox;

/// Number of planes a region of interest consists of
pub const ROI_PLANES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub origin: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl ClipPlane {
    pub fn new(origin: Point3<f32>, normal: Vector3<f32>) -> ClipPlane {
        ClipPlane { origin, normal }
    }

    fn is_valid(&self) -> bool {
        self.origin.iter().all(|v| v.is_finite())
            && self.normal.iter().all(|v| v.is_finite())
            && self.normal.norm_squared() > 0.0
    }
}

/// Oriented box restricting the rendered part of a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    pub planes: Vec<ClipPlane>,
    pub transform: Matrix4<f32>,
    pub enabled: bool,
}

impl Roi {
    /// Enabled region with inward facing planes on the sides of `bbox`
    pub fn from_box(bbox: BoundBox) -> Roi {
        let (l, u) = (bbox.lower, bbox.upper);
        let planes = vec![
            ClipPlane::new(l, Vector3::x()),
            ClipPlane::new(u, -Vector3::x()),
            ClipPlane::new(l, Vector3::y()),
            ClipPlane::new(u, -Vector3::y()),
            ClipPlane::new(l, Vector3::z()),
            ClipPlane::new(u, -Vector3::z()),
        ];
        Roi {
            planes,
            transform: Matrix4::identity(),
            enabled: true,
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Roi {
        self.transform = transform;
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.planes.len() < ROI_PLANES || self.planes.iter().any(|p| !p.is_valid())
    }

    /// Planes in the volume's space, translated by the inverse of the
    /// region transform's translation.
    ///
    /// `None` means no clipping.
    pub fn clip_planes(&self) -> Option<Vec<ClipPlane>> {
        if !self.enabled || self.is_degenerate() {
            return None;
        }

        let t = &self.transform;
        let translation = Vector3::new(t[(0, 3)], t[(1, 3)], t[(2, 3)]);
        let planes = self
            .planes
            .iter()
            .take(ROI_PLANES)
            .map(|p| ClipPlane::new(p.origin - translation, p.normal))
            .collect();
        Some(planes)
    }
}

/// Box spanned by the plane origins.
///
/// Planes 0, 2 and 4 give the lower x, y and z, planes 1, 3 and 5 the upper.
/// Holds only for axis aligned volumes.
pub fn clip_box(planes: &[ClipPlane]) -> Option<BoundBox> {
    if planes.len() < ROI_PLANES {
        return None;
    }
    let lower = point![planes[0].origin.x, planes[2].origin.y, planes[4].origin.z];
    let upper = point![planes[1].origin.x, planes[3].origin.y, planes[5].origin.z];
    Some(BoundBox::new(lower, upper))
}

/// Anything rendering the volume that must honor the region of interest
pub trait ClipConsumer {
    fn set_clipping_planes(&mut self, planes: &[ClipPlane]);

    fn remove_all_clipping_planes(&mut self);

    fn set_clipping(&mut self, enabled: bool);
}

/// Push the planes of `roi` to every consumer.
///
/// Absent, disabled or degenerate regions clear the planes and disable
/// clipping on all consumers. Returns whether clipping is active.
pub fn apply_roi(roi: Option<&Roi>, consumers: &mut [&mut dyn ClipConsumer]) -> bool {
    let planes = match roi {
        Some(roi) => {
            let planes = roi.clip_planes();
            if planes.is_none() && roi.enabled {
                warn!("Degenerate region of interest, clipping disabled");
            }
            planes
        }
        None => None,
    };

    match planes {
        Some(planes) => {
            for consumer in consumers.iter_mut() {
                consumer.set_clipping_planes(&planes);
                consumer.set_clipping(true);
            }
            true
        }
        None => {
            for consumer in consumers.iter_mut() {
                consumer.remove_all_clipping_planes();
                consumer.set_clipping(false);
            }
            false
        }
    }
}

#[cfg(test)]
mod test {

    use nalgebra::{vector, Translation3};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        planes: Vec<ClipPlane>,
        clipping: bool,
    }

    impl ClipConsumer for Recorder {
        fn set_clipping_planes(&mut self, planes: &[ClipPlane]) {
            self.planes = planes.to_vec();
        }

        fn remove_all_clipping_planes(&mut self) {
            self.planes.clear();
        }

        fn set_clipping(&mut self, enabled: bool) {
            self.clipping = enabled;
        }
    }

    fn roi() -> Roi {
        Roi::from_box(BoundBox::new(point![1.0, 2.0, 3.0], point![4.0, 5.0, 6.0]))
    }

    #[test]
    fn box_round_trip() {
        let planes = roi().clip_planes().unwrap();

        let bbox = clip_box(&planes).unwrap();

        assert_eq!(bbox.lower, point![1.0, 2.0, 3.0]);
        assert_eq!(bbox.upper, point![4.0, 5.0, 6.0]);
    }

    #[test]
    fn translation_is_subtracted() {
        let transform = Translation3::new(1.0, 1.0, 1.0).to_homogeneous();
        let planes = roi().with_transform(transform).clip_planes().unwrap();

        assert_eq!(planes[0].origin, point![0.0, 1.0, 2.0]);
        assert_eq!(planes[1].normal, vector![-1.0, 0.0, 0.0]);
    }

    #[test]
    fn all_consumers_receive_planes() {
        let mut a = Recorder::default();
        let mut b = Recorder::default();

        let active = apply_roi(Some(&roi()), &mut [&mut a, &mut b]);

        assert!(active);
        assert!(a.clipping && b.clipping);
        assert_eq!(a.planes.len(), 6);
        assert_eq!(a.planes, b.planes);
    }

    #[test]
    fn degenerate_roi_clears_everyone() {
        let mut a = Recorder::default();
        let mut b = Recorder::default();
        apply_roi(Some(&roi()), &mut [&mut a, &mut b]);

        let mut broken = roi();
        broken.planes.truncate(4);
        let active = apply_roi(Some(&broken), &mut [&mut a, &mut b]);

        assert!(!active);
        assert!(!a.clipping && !b.clipping);
        assert!(a.planes.is_empty() && b.planes.is_empty());
    }

    #[test]
    fn disabled_or_absent() {
        let mut a = Recorder::default();
        let mut disabled = roi();
        disabled.enabled = false;

        assert!(!apply_roi(Some(&disabled), &mut [&mut a]));
        assert!(!apply_roi(None, &mut [&mut a]));
        assert!(!a.clipping);
    }

    #[test]
    fn zero_normal_is_degenerate() {
        let mut r = roi();
        r.planes[3].normal = Vector3::zeros();

        assert!(r.is_degenerate());
        assert!(r.clip_planes().is_none());
    }
}
