use byteorder::{ByteOrder, LittleEndian};
use gpu_raycast::{premade::parse::GENERATOR_HEADER_SIZE, volumetric::ScalarType};
use nalgebra::Vector3;

use crate::config::GenConfig;

/// Magic of baked texture files
pub const TEXTURE_MAGIC: &[u8; 4] = b"GRCT";
pub const TEXTURE_HEADER_LEN: usize = 4 + 3 * 4;

/// Generator header
/// little-endian, total length 27B
/// 1. resolution -- 3x 32bit ints (x,y,z)
/// 2. 1 byte padding
/// 3. cell shape -- 3x 32bit floats
/// 4. scalar type tag -- 1 byte
/// 5. components per voxel -- 1 byte
/// 6. data -- x*y*z 8bit values, x fastest
pub fn generate_header(cfg: &GenConfig) -> Vec<u8> {
    let mut vec = vec![0; GENERATOR_HEADER_SIZE];
    let slice = &mut vec[..];

    LittleEndian::write_u32(&mut slice[0..4], cfg.dims.x);
    LittleEndian::write_u32(&mut slice[4..8], cfg.dims.y);
    LittleEndian::write_u32(&mut slice[8..12], cfg.dims.z);
    // 1 byte gap
    LittleEndian::write_f32(&mut slice[13..17], cfg.cell_shape.x);
    LittleEndian::write_f32(&mut slice[17..21], cfg.cell_shape.y);
    LittleEndian::write_f32(&mut slice[21..25], cfg.cell_shape.z);

    slice[25] = ScalarType::U8.tag();
    slice[26] = 1;

    vec
}

/// Baked texture header
/// `GRCT`, then width, height and depth as 32bit LE ints.
/// RGBA8 texels follow.
pub fn texture_header(dims: Vector3<usize>) -> Vec<u8> {
    let mut vec = vec![0; TEXTURE_HEADER_LEN];
    vec[0..4].copy_from_slice(TEXTURE_MAGIC);
    LittleEndian::write_u32(&mut vec[4..8], dims.x as u32);
    LittleEndian::write_u32(&mut vec[8..12], dims.y as u32);
    LittleEndian::write_u32(&mut vec[12..16], dims.z as u32);
    vec
}

#[cfg(test)]
mod test {

    use std::ffi::OsString;

    use gpu_raycast::premade::parse::generator_parser;
    use nalgebra::vector;

    use super::*;
    use crate::config::GeneratorConfig;

    #[test]
    fn header_parses_back() {
        let cfg = GenConfig {
            dims: vector![4, 5, 6],
            cell_shape: vector![1.0, 2.0, 0.5],
            generator: GeneratorConfig::Solid { sample: 1 },
            file_name: OsString::from("x.vol"),
            seed: None,
        };

        let header = generate_header(&cfg);
        let meta = generator_parser(&header).unwrap();

        assert_eq!(meta.dims, vector![4, 5, 6]);
        assert_eq!(meta.spacing, vector![1.0, 2.0, 0.5]);
        assert_eq!(meta.scalar_type, ScalarType::U8);
        assert_eq!(meta.components, 1);
    }

    #[test]
    fn texture_header_layout() {
        let header = texture_header(vector![256, 256, 1]);

        assert_eq!(&header[0..4], b"GRCT");
        assert_eq!(LittleEndian::read_u32(&header[4..8]), 256);
        assert_eq!(LittleEndian::read_u32(&header[12..16]), 1);
    }
}
