use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use nalgebra::Vector3;

use crate::header::texture_header;

pub fn open_create_file<P>(path: P) -> Result<File, std::io::Error>
where
    P: AsRef<Path>,
{
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Write RGBA8 texels with a texture header
pub fn write_texture<P>(path: P, dims: Vector3<usize>, texels: &[u8]) -> Result<(), std::io::Error>
where
    P: AsRef<Path>,
{
    let mut out = BufWriter::new(open_create_file(path)?);
    out.write_all(&texture_header(dims))?;
    out.write_all(texels)?;
    out.flush()
}
