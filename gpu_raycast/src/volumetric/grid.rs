use nalgebra::{vector, Matrix4, Point3, Vector3};

use super::scalar::{with_samples, Scalar, ScalarData, ScalarType};
use crate::{
    common::{BoundBox, Stamp, ValueRange},
    error::{RaycastError, RaycastResult},
};

/// 3D grid of scalar samples with 1 to 4 components.
///
/// Samples are interleaved, x fastest:
/// `((z * dy + y) * dx + x) * components + c`.
///
/// The grid is owned by the caller. The pipeline reads it and compares its
/// [`Stamp`] against cached state; callers mutating samples through
/// [`VoxelGrid::data_mut`] or [`VoxelGrid::modified`] invalidate every
/// derived texture.
#[derive(Debug)]
pub struct VoxelGrid {
    stamp: Stamp,
    dims: Vector3<usize>,
    components: usize,
    spacing: Vector3<f32>,
    origin: Point3<f32>,
    transform: Matrix4<f32>,
    independent_components: bool,
    data: ScalarData,
}

/// A clone is a separate input, caches never mistake it for its source.
impl Clone for VoxelGrid {
    fn clone(&self) -> Self {
        VoxelGrid {
            stamp: self.stamp.renewed(),
            dims: self.dims,
            components: self.components,
            spacing: self.spacing,
            origin: self.origin,
            transform: self.transform,
            independent_components: self.independent_components,
            data: self.data.clone(),
        }
    }
}

impl VoxelGrid {
    pub fn new(
        dims: Vector3<usize>,
        components: usize,
        data: impl Into<ScalarData>,
    ) -> RaycastResult<VoxelGrid> {
        let data = data.into();
        if !(1..=4).contains(&components) {
            return Err(RaycastError::invalid(format!(
                "unsupported number of components: {components}"
            )));
        }
        let voxels = dims.x * dims.y * dims.z;
        if voxels == 0 {
            return Err(RaycastError::invalid("grid has zero size"));
        }
        if data.len() != voxels * components {
            return Err(RaycastError::invalid(format!(
                "expected {} samples, got {}",
                voxels * components,
                data.len()
            )));
        }
        Ok(VoxelGrid {
            stamp: Stamp::new(),
            dims,
            components,
            spacing: vector![1.0, 1.0, 1.0],
            origin: Point3::origin(),
            transform: Matrix4::identity(),
            independent_components: false,
            data,
        })
    }

    pub fn with_spacing(mut self, spacing: Vector3<f32>) -> Self {
        self.spacing = spacing;
        self.stamp.modified();
        self
    }

    pub fn with_origin(mut self, origin: Point3<f32>) -> Self {
        self.origin = origin;
        self.stamp.modified();
        self
    }

    /// Placement of the grid in the world
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_independent_components(mut self, independent: bool) -> Self {
        self.independent_components = independent;
        self
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Marks samples as changed.
    pub fn modified(&mut self) {
        self.stamp.modified();
    }

    pub fn dims(&self) -> Vector3<usize> {
        self.dims
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn spacing(&self) -> Vector3<f32> {
        self.spacing
    }

    pub fn transform(&self) -> &Matrix4<f32> {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    pub fn independent_components(&self) -> bool {
        self.independent_components
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.data.scalar_type()
    }

    pub fn data(&self) -> &ScalarData {
        &self.data
    }

    /// Mutable access to samples, marks the grid as modified.
    pub fn data_mut(&mut self) -> &mut ScalarData {
        self.stamp.modified();
        &mut self.data
    }

    pub fn voxel_count(&self) -> usize {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Linear voxel index (without components)
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims.y + y) * self.dims.x + x
    }

    pub fn value(&self, x: usize, y: usize, z: usize, component: usize) -> f64 {
        self.data
            .get(self.index(x, y, z) * self.components + component)
    }

    /// Range of one component over the whole grid.
    pub fn scalar_range(&self, component: usize) -> ValueRange {
        let step = self.components;
        with_samples!(&self.data, v => ValueRange::from_samples(
            v.iter().skip(component).step_by(step).map(|s| s.to_f64())
        ))
    }

    /// Range of the last component, which drives opacity.
    pub fn opacity_range(&self) -> ValueRange {
        self.scalar_range(self.components - 1)
    }

    /// Extent of the grid in its own (untransformed) space.
    pub fn bounds(&self) -> BoundBox {
        let extent = (self.dims.map(|d| d as f32) - vector![1.0, 1.0, 1.0])
            .component_mul(&self.spacing);
        BoundBox::from_position_dims(self.origin, extent)
    }
}
