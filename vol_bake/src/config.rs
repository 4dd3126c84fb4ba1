use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::ArgMatches;
use gpu_raycast::{
    premade::{
        parse::{generator_parser, skull_parser},
        transfer_functions::{ct_bone, gray_ramp, mri},
    },
    volumetric::{from_file, HeaderParser},
    RaycastResult, Technique, VolumeProperty, VoxelGrid,
};
use nalgebra::{vector, Vector3};

/// Parse a single value of `key`
fn value<T>(args: &ArgMatches, key: &str) -> Result<T, String>
where
    T: FromStr,
{
    let raw = args
        .value_of(key)
        .ok_or_else(|| format!("missing argument {key}"))?;
    raw.parse()
        .map_err(|_| format!("cannot parse {key} value {raw}"))
}

/// Parse all values of `key`
fn values<T>(args: &ArgMatches, key: &str) -> Result<Vec<T>, String>
where
    T: FromStr,
{
    let vals = args
        .values_of(key)
        .ok_or_else(|| format!("missing argument {key}"))?;
    vals.map(|v| v.parse().map_err(|_| format!("cannot parse {key} value {v}")))
        .collect()
}

/// Transform `Values` into `Vector`
fn values_to_vector3<T>(args: &ArgMatches, key: &str) -> Result<Vector3<T>, String>
where
    T: FromStr + Copy + nalgebra::Scalar,
{
    match values(args, key)?[..] {
        [x, y, z] => Ok(vector![x, y, z]),
        _ => Err(format!("{key} needs 3 values")),
    }
}

fn os_value(args: &ArgMatches, key: &str) -> Result<OsString, String> {
    args.value_of_os(key)
        .map(Into::into)
        .ok_or_else(|| format!("missing argument {key}"))
}

/// App configuration
/// Config is built from args parsed by `clap`
#[derive(Debug)]
pub enum Config {
    Gen(GenConfig),
    Bake(BakeConfig),
    Preview(PreviewConfig),
}

impl Config {
    pub fn from_args(args: ArgMatches) -> Result<Config, String> {
        match args.subcommand() {
            Some(("gen", sub)) => GenConfig::from_args(sub).map(Config::Gen),
            Some(("bake", sub)) => BakeConfig::from_args(sub).map(Config::Bake),
            Some(("preview", sub)) => PreviewConfig::from_args(sub).map(Config::Preview),
            _ => Err("unknown subcommand".into()),
        }
    }
}

/// Settings of `gen`
#[derive(Debug)]
pub struct GenConfig {
    /// Dimensions of volume
    pub dims: Vector3<u32>,
    /// Shape of cells
    pub cell_shape: Vector3<f32>,
    /// Type of generator to be used
    pub generator: GeneratorConfig,
    // Output file name
    pub file_name: OsString,
    /// Optional seed for RNG, to replicate results
    pub seed: Option<u64>,
}

impl GenConfig {
    pub fn from_args(args: &ArgMatches) -> Result<GenConfig, String> {
        let seed = match args.value_of("seed") {
            Some(_) => Some(value(args, "seed")?),
            None => None,
        };
        Ok(GenConfig {
            dims: values_to_vector3(args, "dims")?,
            cell_shape: values_to_vector3(args, "shape")?,
            generator: GeneratorConfig::from_args(args)?,
            file_name: os_value(args, "output-file")?,
            seed,
        })
    }
}

/// Settings specific to generator variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneratorConfig {
    /// Randomly placed cuboids and spheres
    Shapes {
        n_of_shapes: usize,
        sample: u8,
        obj_size: u32,
    },
    /// Box of one value with empty margin
    Solid { sample: u8 },
    /// Centered ball fading towards its surface
    Sphere { sample: u8 },
}

impl GeneratorConfig {
    pub fn from_args(args: &ArgMatches) -> Result<GeneratorConfig, String> {
        let sample = value(args, "sample")?;
        let name: String = value(args, "generator")?;
        match name.as_str() {
            "shapes" => Ok(GeneratorConfig::Shapes {
                n_of_shapes: value(args, "n-of-shapes")?,
                sample,
                obj_size: value(args, "object-size")?,
            }),
            "solid" => Ok(GeneratorConfig::Solid { sample }),
            "sphere" => Ok(GeneratorConfig::Sphere { sample }),
            other => Err(format!("unknown generator {other}")),
        }
    }
}

/// Header format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFormat {
    Generator,
    Skull,
}

impl FromStr for VolumeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generator" => Ok(VolumeFormat::Generator),
            "skull" => Ok(VolumeFormat::Skull),
            _ => Err(format!("unknown format {s}")),
        }
    }
}

impl VolumeFormat {
    pub fn parser(self) -> HeaderParser {
        match self {
            VolumeFormat::Generator => generator_parser,
            VolumeFormat::Skull => skull_parser,
        }
    }
}

/// Transfer function preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Ramp,
    Bone,
    Mri,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ramp" => Ok(Preset::Ramp),
            "bone" => Ok(Preset::Bone),
            "mri" => Ok(Preset::Mri),
            _ => Err(format!("unknown preset {s}")),
        }
    }
}

impl Preset {
    pub fn property(self, grid: &VoxelGrid) -> VolumeProperty {
        match self {
            Preset::Ramp => gray_ramp(grid.opacity_range()),
            Preset::Bone => ct_bone(),
            Preset::Mri => mri(),
        }
    }
}

pub fn parse_technique(name: &str) -> Result<Technique, String> {
    let technique = match name {
        "composite" => Technique::Composite,
        "edge" => Technique::EdgeColoring,
        "mip" => Technique::Mip,
        "minip" => Technique::MinIp,
        "gradient" => Technique::GradientModulated,
        "icpe" => Technique::Icpe,
        _ => return Err(format!("unknown technique {name}")),
    };
    Ok(technique)
}

/// Volume file plus everything needed to shade it
#[derive(Debug)]
pub struct Input {
    pub path: PathBuf,
    pub format: VolumeFormat,
    pub preset: Preset,
    pub internal_volume_size: usize,
}

impl Input {
    pub fn from_args(args: &ArgMatches) -> Result<Input, String> {
        Ok(Input {
            path: os_value(args, "input")?.into(),
            format: value(args, "format")?,
            preset: value(args, "preset")?,
            internal_volume_size: value(args, "internal-volume-size")?,
        })
    }

    pub fn load(&self) -> RaycastResult<VoxelGrid> {
        from_file(&self.path, self.format.parser())
    }
}

/// Settings of `bake`
#[derive(Debug)]
pub struct BakeConfig {
    pub input: Input,
    pub technique: Technique,
    pub output_dir: PathBuf,
}

impl BakeConfig {
    pub fn from_args(args: &ArgMatches) -> Result<BakeConfig, String> {
        let technique: String = value(args, "technique")?;
        Ok(BakeConfig {
            input: Input::from_args(args)?,
            technique: parse_technique(&technique)?,
            output_dir: os_value(args, "output-dir")?.into(),
        })
    }

    pub fn output(&self, name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(name)
    }
}

/// Settings of `preview`
#[derive(Debug)]
pub struct PreviewConfig {
    pub input: Input,
    pub technique: Technique,
    pub resolution: (usize, usize),
    pub file_name: PathBuf,
}

impl PreviewConfig {
    pub fn from_args(args: &ArgMatches) -> Result<PreviewConfig, String> {
        let technique: String = value(args, "technique")?;
        let resolution = match values::<usize>(args, "resolution")?[..] {
            [w, h] => (w, h),
            _ => return Err("resolution needs 2 values".into()),
        };
        Ok(PreviewConfig {
            input: Input::from_args(args)?,
            technique: parse_technique(&technique)?,
            resolution,
            file_name: os_value(args, "output-file")?.into(),
        })
    }
}
