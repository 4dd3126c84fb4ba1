use nalgebra::{vector, Vector3};
use nom::{
    bytes::complete::take,
    number::complete::{be_f32, be_u32, le_f32, le_u32, u8 as byte},
    sequence::tuple,
    IResult,
};

use crate::{
    error::{RaycastError, RaycastResult},
    volumetric::{ScalarType, VolumeMetadata},
};

/// Size of the header written by `vol_bake gen`.
pub const GENERATOR_HEADER_SIZE: usize = 27;

/// Size of the skull dataset header.
pub const SKULL_HEADER_SIZE: usize = 28;

struct ExtractedMeta {
    dims: Vector3<usize>,
    spacing: Vector3<f32>,
}

/// Header of the skull dataset.
/// Big endian sizes, 4 unused bytes, big endian spacing. Samples are `u8`.
pub fn skull_parser(slice: &[u8]) -> RaycastResult<VolumeMetadata> {
    let (_, meta) = skull_inner(slice).map_err(|_| RaycastError::Parse("skull header".into()))?;

    Ok(VolumeMetadata {
        dims: meta.dims,
        spacing: meta.spacing,
        scalar_type: ScalarType::U8,
        components: 1,
        data_offset: SKULL_HEADER_SIZE,
    })
}

fn skull_inner(s: &[u8]) -> IResult<&[u8], ExtractedMeta> {
    let mut skull_header = tuple((
        tuple((be_u32, be_u32, be_u32)),
        take(4_u8),
        tuple((be_f32, be_f32, be_f32)),
    ));

    let (s, (dims, _, spacing)) = skull_header(s)?;

    Ok((
        s,
        ExtractedMeta {
            dims: vector![dims.0 as usize, dims.1 as usize, dims.2 as usize],
            spacing: vector![spacing.0, spacing.1, spacing.2],
        },
    ))
}

/// Header written by the `vol_bake` generator.
///
/// | bytes  | content                       |
/// |--------|-------------------------------|
/// | 0..12  | sizes, 3x `u32` LE            |
/// | 12     | unused                        |
/// | 13..25 | spacing, 3x `f32` LE          |
/// | 25     | scalar type tag               |
/// | 26     | components per voxel          |
pub fn generator_parser(slice: &[u8]) -> RaycastResult<VolumeMetadata> {
    let (_, (meta, tag, components)) =
        generator_inner(slice).map_err(|_| RaycastError::Parse("generator header".into()))?;

    let scalar_type = ScalarType::from_tag(tag)
        .ok_or_else(|| RaycastError::Parse(format!("unknown scalar type tag {}", tag)))?;

    if !(1..=4).contains(&components) {
        return Err(RaycastError::Parse(format!(
            "unsupported component count {}",
            components
        )));
    }

    Ok(VolumeMetadata {
        dims: meta.dims,
        spacing: meta.spacing,
        scalar_type,
        components: components as usize,
        data_offset: GENERATOR_HEADER_SIZE,
    })
}

fn generator_inner(s: &[u8]) -> IResult<&[u8], (ExtractedMeta, u8, u8)> {
    let mut gen_header = tuple((
        tuple((le_u32, le_u32, le_u32)),
        take(1_u8),
        tuple((le_f32, le_f32, le_f32)),
        byte,
        byte,
    ));

    let (s, (dims, _, spacing, tag, components)) = gen_header(s)?;

    let meta = ExtractedMeta {
        dims: vector![dims.0 as usize, dims.1 as usize, dims.2 as usize],
        spacing: vector![spacing.0, spacing.1, spacing.2],
    };

    Ok((s, (meta, tag, components)))
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::volumetric::{from_data_source, DataSource};

    fn generator_header(dims: [u32; 3], spacing: [f32; 3], tag: u8, components: u8) -> Vec<u8> {
        let mut bytes = vec![];
        for d in dims {
            bytes.extend_from_slice(&d.to_le_bytes());
        }
        bytes.push(0);
        for s in spacing {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes.push(tag);
        bytes.push(components);
        bytes
    }

    #[test]
    fn generator_header_layout() {
        let bytes = generator_header([3, 4, 5], [1.0, 0.5, 2.0], ScalarType::I16.tag(), 2);
        assert_eq!(bytes.len(), GENERATOR_HEADER_SIZE);

        let meta = generator_parser(&bytes).unwrap();

        assert_eq!(meta.dims, vector![3, 4, 5]);
        assert_eq!(meta.spacing, vector![1.0, 0.5, 2.0]);
        assert_eq!(meta.scalar_type, ScalarType::I16);
        assert_eq!(meta.components, 2);
        assert_eq!(meta.data_offset, 27);
    }

    #[test]
    fn generator_rejects_bad_tags() {
        let bytes = generator_header([1, 1, 1], [1.0; 3], 42, 1);
        assert!(matches!(generator_parser(&bytes), Err(RaycastError::Parse(_))));

        let bytes = generator_header([1, 1, 1], [1.0; 3], 0, 5);
        assert!(generator_parser(&bytes).is_err());

        assert!(generator_parser(&[0; 10]).is_err());
    }

    #[test]
    fn generated_file_builds_grid() {
        let mut bytes = generator_header([2, 1, 1], [1.0; 3], ScalarType::U8.tag(), 1);
        bytes.extend_from_slice(&[10, 200]);

        let grid = from_data_source(&DataSource::from_vec(bytes), generator_parser).unwrap();

        assert_eq!(grid.dims(), vector![2, 1, 1]);
        assert_eq!(grid.value(1, 0, 0, 0), 200.0);
    }

    #[test]
    fn skull_header_layout() {
        let mut bytes = vec![];
        for d in [256u32, 256, 113] {
            bytes.extend_from_slice(&d.to_be_bytes());
        }
        bytes.extend_from_slice(&[0; 4]);
        for s in [1.0f32, 1.0, 2.0] {
            bytes.extend_from_slice(&s.to_be_bytes());
        }
        assert_eq!(bytes.len(), SKULL_HEADER_SIZE);

        let meta = skull_parser(&bytes).unwrap();

        assert_eq!(meta.dims, vector![256, 256, 113]);
        assert_eq!(meta.spacing, vector![1.0, 1.0, 2.0]);
        assert_eq!(meta.scalar_type, ScalarType::U8);
        assert_eq!(meta.data_offset, 28);
    }
}
