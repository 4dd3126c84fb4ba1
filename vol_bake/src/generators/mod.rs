use std::{
    error::Error,
    io::{BufWriter, Write},
};

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use nalgebra::{vector, Vector3};
use rayon::prelude::*;

use crate::{
    config::{GenConfig, GeneratorConfig},
    file::open_create_file,
    header::generate_header,
};

mod shapes;
mod solid;
mod sphere;

pub use shapes::ShapesGenerator;
pub use solid::SolidGenerator;
pub use sphere::SphereGenerator;

// Generates one sample at a time, at any location
pub trait SampleGenerator: Sync {
    fn sample_at(&self, coords: Vector3<u32>) -> u8;
}

pub fn get_sample_generator(config: &GenConfig) -> Box<dyn SampleGenerator> {
    match config.generator {
        GeneratorConfig::Shapes {
            n_of_shapes,
            sample,
            obj_size,
        } => Box::new(ShapesGenerator::new(
            config.dims,
            n_of_shapes,
            sample,
            obj_size,
            config.seed,
        )),
        GeneratorConfig::Solid { sample } => Box::new(SolidGenerator::new(config.dims, sample)),
        GeneratorConfig::Sphere { sample } => Box::new(SphereGenerator::new(config.dims, sample)),
    }
}

/// One z slice, x fastest
pub fn generate_slice(sg: &dyn SampleGenerator, dims: Vector3<u32>, z: u32) -> Vec<u8> {
    let width = dims.x as usize;
    (0..width * dims.y as usize)
        .into_par_iter()
        .map(|i| sg.sample_at(vector![(i % width) as u32, (i / width) as u32, z]))
        .collect()
}

/// Write header and samples, slice by slice
pub fn generate_vol(config: &GenConfig) -> Result<(), Box<dyn Error>> {
    let sg = get_sample_generator(config);
    let mut file = BufWriter::new(open_create_file(&config.file_name)?);

    file.write_all(&generate_header(config))?;

    let bar = ProgressBar::new(config.dims.z as u64);
    bar.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} slices"));

    for z in 0..config.dims.z {
        let slice = generate_slice(sg.as_ref(), config.dims, z);
        file.write_all(&slice)?;
        bar.inc(1);
    }
    file.flush()?;
    bar.finish();

    info!("Generating finished, result in {:?}", config.file_name);
    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn slices_are_x_fastest() {
        let gen = SolidGenerator::new(vector![12, 12, 12], 3);

        let slice = generate_slice(&gen, vector![12, 12, 12], 6);

        assert_eq!(slice.len(), 144);
        assert_eq!(slice[0], 0);
        // (5, 6) is inside the margin, (4, 6) is not
        assert_eq!(slice[6 * 12 + 5], 3);
        assert_eq!(slice[6 * 12 + 4], 0);
    }
}
