use std::{fs::File, path::Path};

use memmap::{Mmap, MmapOptions};
use nalgebra::Vector3;

use super::{ScalarData, ScalarType, VoxelGrid};
use crate::error::{RaycastError, RaycastResult};

/// Header information extracted from a volume file.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMetadata {
    pub dims: Vector3<usize>,
    pub spacing: Vector3<f32>,
    pub scalar_type: ScalarType,
    pub components: usize,
    /// Offset of first sample, in bytes
    pub data_offset: usize,
}

/// Parser of a volume file header.
pub type HeaderParser = fn(&[u8]) -> RaycastResult<VolumeMetadata>;

/// Raw bytes of a volume, either owned or memory mapped.
pub enum DataSource {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl DataSource {
    pub fn get_slice(&self) -> &[u8] {
        match self {
            DataSource::Vec(v) => v.as_slice(),
            DataSource::Mmap(m) => &m[..],
        }
    }

    pub fn from_vec(vec: Vec<u8>) -> DataSource {
        DataSource::Vec(vec)
    }

    pub fn from_file<P>(path: P) -> RaycastResult<DataSource>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(RaycastError::invalid(format!(
                "path {} does not lead to a file",
                path.display()
            )));
        }

        let file = File::open(path)?;

        // Safety: the file is only read, callers must not truncate it while mapped
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(DataSource::Mmap(mmap))
    }
}

/// Decode samples after the header into a grid.
pub fn build_grid(metadata: &VolumeMetadata, ds: &DataSource) -> RaycastResult<VoxelGrid> {
    let slice = ds.get_slice();
    let count = metadata.dims.x * metadata.dims.y * metadata.dims.z * metadata.components;
    let byte_len = count * metadata.scalar_type.size();
    let end = metadata.data_offset + byte_len;
    if slice.len() < end {
        return Err(RaycastError::Parse(format!(
            "file holds {} bytes, header announces {}",
            slice.len(),
            end
        )));
    }

    let data = ScalarData::from_le_bytes(metadata.scalar_type, &slice[metadata.data_offset..end])?;
    let grid = VoxelGrid::new(metadata.dims, metadata.components, data)?;
    Ok(grid.with_spacing(metadata.spacing))
}

/// Common pattern, map a file, parse its header and decode the samples.
pub fn from_file<P>(path: P, parser: HeaderParser) -> RaycastResult<VoxelGrid>
where
    P: AsRef<Path>,
{
    let ds = DataSource::from_file(path)?;
    let metadata = parser(ds.get_slice())?;
    log::debug!("volume header {:?}", metadata);
    build_grid(&metadata, &ds)
}

/// Same as [`from_file`], for data already in memory.
pub fn from_data_source(ds: &DataSource, parser: HeaderParser) -> RaycastResult<VoxelGrid> {
    let metadata = parser(ds.get_slice())?;
    build_grid(&metadata, ds)
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use super::*;

    fn raw_parser(_: &[u8]) -> RaycastResult<VolumeMetadata> {
        Ok(VolumeMetadata {
            dims: vector![2, 2, 1],
            spacing: vector![1.0, 1.0, 2.0],
            scalar_type: ScalarType::U16,
            components: 1,
            data_offset: 2,
        })
    }

    #[test]
    fn build_from_memory() {
        let bytes = vec![9, 9, 1, 0, 2, 0, 3, 0, 4, 0];
        let ds = DataSource::from_vec(bytes);

        let grid = from_data_source(&ds, raw_parser).unwrap();

        assert_eq!(grid.dims(), vector![2, 2, 1]);
        assert_eq!(grid.value(1, 1, 0, 0), 4.0);
        assert_eq!(grid.spacing(), vector![1.0, 1.0, 2.0]);
    }

    #[test]
    fn truncated_data() {
        let ds = DataSource::from_vec(vec![0; 6]);

        assert!(matches!(
            from_data_source(&ds, raw_parser),
            Err(RaycastError::Parse(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(DataSource::from_file("surely/not/here.vol").is_err());
    }
}
