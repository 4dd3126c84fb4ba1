//! Baking of transfer functions into a 2D RGBA8 lookup texture
//!
//! The texture is indexed by quantized scalar (x) and quantized gradient
//! magnitude (y).

use log::debug;

use super::VolumeProperty;
use crate::{
    common::Stamp,
    volumetric::{Quantization, ResampledVolume, VoxelGrid},
};

/// Edge length of the lookup texture
pub const LOOKUP_SIZE: usize = 256;

fn to_byte(v: f32) -> u8 {
    (v * 255.0 + 0.5) as u8
}

/// Bake the lookup table of `property` for data with `components` components.
///
/// Returns `LOOKUP_SIZE * LOOKUP_SIZE` RGBA texels, row `g` holding entries
/// for gradient magnitude byte `g`. Scalar entries past the quantization's
/// table size stay zero.
///
/// 1 and 2 component data store color and opacity; 3 and 4 component data
/// carry their own color and store opacity only.
pub fn bake_lookup_table(
    property: &VolumeProperty,
    components: usize,
    quantization: &Quantization,
) -> Vec<u8> {
    let range = quantization.range;
    let table_size = quantization.table_size.min(LOOKUP_SIZE);

    let colors = property
        .color
        .sample_table(range.low, range.high, table_size);
    let opacity = property
        .scalar_opacity
        .sample_table(range.low, range.high, table_size);
    let gradient_opacity =
        property
            .gradient_opacity
            .sample_table(0.0, 0.25 * range.span(), LOOKUP_SIZE);

    let mut table = vec![0; LOOKUP_SIZE * LOOKUP_SIZE * 4];
    for (row, go) in table.chunks_exact_mut(LOOKUP_SIZE * 4).zip(gradient_opacity) {
        for (i, texel) in row.chunks_exact_mut(4).take(table_size).enumerate() {
            let alpha = to_byte(opacity[i] * go);
            if components < 3 {
                let [r, g, b] = colors[i];
                texel.copy_from_slice(&[to_byte(r), to_byte(g), to_byte(b), alpha]);
            } else {
                texel[3] = alpha;
            }
        }
    }
    table
}

/// Inputs the last table was baked from
#[derive(Debug, Clone, Copy, PartialEq)]
struct BakeParameters {
    input: Stamp,
    components: usize,
    color_channels: usize,
    color: Option<Stamp>,
    scalar_opacity: Stamp,
    gradient_opacity: Stamp,
    unit_distance: f64,
}

impl BakeParameters {
    fn new(grid: &VoxelGrid, components: usize, property: &VolumeProperty) -> BakeParameters {
        // color is carried by the texture itself for 3 and 4 components
        let color = (components < 3).then(|| property.color.stamp());
        BakeParameters {
            input: grid.stamp(),
            components,
            color_channels: property.color_channels(),
            color,
            scalar_opacity: property.scalar_opacity.stamp(),
            gradient_opacity: property.gradient_opacity.stamp(),
            unit_distance: property.scalar_opacity_unit_distance,
        }
    }
}

/// Lookup table cache, rebaked only when its inputs change.
#[derive(Debug, Default)]
pub struct TransferLookup {
    table: Vec<u8>,
    saved: Option<BakeParameters>,
}

impl TransferLookup {
    pub fn new() -> TransferLookup {
        Self::default()
    }

    /// Rebake if any input changed since the last call.
    ///
    /// Returns `true` when the table was rebuilt.
    pub fn update(
        &mut self,
        grid: &VoxelGrid,
        volume: &ResampledVolume,
        property: &VolumeProperty,
    ) -> bool {
        let params = BakeParameters::new(grid, volume.components, property);
        if self.saved == Some(params) {
            return false;
        }

        debug!(
            "Baking lookup table, {} components, {} entries",
            volume.components, volume.quantization.table_size
        );
        self.table = bake_lookup_table(property, volume.components, &volume.quantization);
        self.saved = Some(params);
        true
    }

    /// Baked RGBA texels, empty before the first update
    pub fn table(&self) -> &[u8] {
        &self.table
    }

    pub fn texel(&self, scalar: u8, gradient: u8) -> [u8; 4] {
        let o = 4 * (gradient as usize * LOOKUP_SIZE + scalar as usize);
        [
            self.table[o],
            self.table[o + 1],
            self.table[o + 2],
            self.table[o + 3],
        ]
    }

    /// Forget the cached table, next update rebakes
    pub fn clear(&mut self) {
        self.table.clear();
        self.saved = None;
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{
        common::ValueRange,
        transfer::{ColorSource, PiecewiseFunction},
        volumetric::resample,
    };
    use nalgebra::vector;

    fn ramp_property() -> VolumeProperty {
        VolumeProperty::new(
            ColorSource::Gray(PiecewiseFunction::from_points(&[(0.0, 0.0), (255.0, 1.0)])),
            PiecewiseFunction::from_points(&[(0.0, 0.0), (255.0, 1.0)]),
        )
    }

    fn full_range() -> Quantization {
        Quantization {
            offset: 0.0,
            scale: 1.0,
            table_size: 256,
            range: ValueRange::new(0.0, 255.0),
        }
    }

    fn texel(table: &[u8], scalar: usize, gradient: usize) -> &[u8] {
        let o = 4 * (gradient * LOOKUP_SIZE + scalar);
        &table[o..o + 4]
    }

    #[test]
    fn gray_ramp() {
        let table = bake_lookup_table(&ramp_property(), 1, &full_range());

        assert_eq!(table.len(), 256 * 256 * 4);
        assert_eq!(texel(&table, 0, 0), &[0, 0, 0, 0]);
        assert_eq!(texel(&table, 255, 0), &[255, 255, 255, 255]);
        assert_eq!(texel(&table, 255, 200), &[255, 255, 255, 255]);
    }

    #[test]
    fn gradient_opacity_scales_alpha() {
        let property = ramp_property().with_gradient_opacity(PiecewiseFunction::from_points(&[
            (0.0, 0.0),
            (0.25 * 255.0, 1.0),
        ]));

        let table = bake_lookup_table(&property, 1, &full_range());

        assert_eq!(texel(&table, 255, 0)[3], 0);
        assert_eq!(texel(&table, 255, 255)[3], 255);
        // color is not modulated
        assert_eq!(texel(&table, 255, 0)[0], 255);
    }

    #[test]
    fn short_table_is_zero_padded() {
        let quantization = Quantization {
            table_size: 11,
            range: ValueRange::new(0.0, 10.0),
            ..full_range()
        };
        let property = VolumeProperty::new(
            ColorSource::Gray(PiecewiseFunction::from_points(&[(0.0, 1.0)])),
            PiecewiseFunction::from_points(&[(0.0, 1.0)]),
        );

        let table = bake_lookup_table(&property, 1, &quantization);

        assert_eq!(texel(&table, 10, 0), &[255, 255, 255, 255]);
        assert_eq!(texel(&table, 11, 0), &[0, 0, 0, 0]);
        assert_eq!(texel(&table, 255, 7), &[0, 0, 0, 0]);
    }

    #[test]
    fn rgba_data_stores_opacity_only() {
        let table = bake_lookup_table(&ramp_property(), 4, &full_range());

        assert_eq!(texel(&table, 255, 0), &[0, 0, 0, 255]);
    }

    #[test]
    fn rebake_gating() {
        let grid = VoxelGrid::new(vector![4, 4, 4], 1, (0..64u8).collect::<Vec<_>>()).unwrap();
        let volume = resample(&grid, 256).unwrap();
        let mut property = ramp_property();
        let mut lookup = TransferLookup::new();

        assert!(lookup.update(&grid, &volume, &property));
        assert!(!lookup.update(&grid, &volume, &property));

        property.scalar_opacity.add_point(128.0, 0.0);
        assert!(lookup.update(&grid, &volume, &property));

        property.scalar_opacity_unit_distance = 2.0;
        assert!(lookup.update(&grid, &volume, &property));
        assert!(!lookup.update(&grid, &volume, &property));

        lookup.clear();
        assert!(lookup.table().is_empty());
        assert!(lookup.update(&grid, &volume, &property));
    }

    #[test]
    fn cloned_functions_are_separate_inputs() {
        let grid = VoxelGrid::new(vector![4, 4, 4], 1, (0..64u8).collect::<Vec<_>>()).unwrap();
        let volume = resample(&grid, 256).unwrap();
        let base = ramp_property();
        let mut dark = base.clone();
        let mut bright = base.clone();
        dark.scalar_opacity.add_point(128.0, 0.0);
        bright.scalar_opacity.add_point(128.0, 1.0);
        let mut lookup = TransferLookup::new();

        assert!(lookup.update(&grid, &volume, &dark));
        let dark_table = lookup.table().to_vec();
        assert!(lookup.update(&grid, &volume, &bright));

        assert_ne!(lookup.table(), &dark_table[..]);
        assert_eq!(texel(&dark_table, 63, 0)[3], 0);
        assert!(texel(lookup.table(), 63, 0)[3] > 0);
    }

    #[test]
    fn color_ignored_for_rgba_data() {
        let grid = VoxelGrid::new(vector![2, 2, 2], 4, vec![7u8; 32]).unwrap();
        let volume = resample(&grid, 256).unwrap();
        let mut property = ramp_property();
        let mut lookup = TransferLookup::new();
        lookup.update(&grid, &volume, &property);

        if let ColorSource::Gray(f) = &mut property.color {
            f.add_point(10.0, 0.5);
        }

        assert!(!lookup.update(&grid, &volume, &property));
    }
}
