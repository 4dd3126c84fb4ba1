//! Argument parsing and validation
//! Uses library `clap`

use std::ffi::OsStr;

use clap::{Arg, Command, ValueHint};

// up to 32bit value
pub fn is_positive_number(num: &str) -> Result<(), String> {
    match num.parse::<u32>() {
        Ok(n) if n > 0 => Ok(()),
        Ok(_) => Err("Number must be greater than 0".into()),
        Err(_) => Err("Number required".into()),
    }
}

pub fn can_fit_u8(num: &str) -> Result<(), String> {
    match num.parse::<u8>() {
        Ok(_) => Ok(()),
        Err(_) => Err("Number does not fit in range <0;255>".into()),
    }
}

pub fn is_float_number(num: &str) -> Result<(), String> {
    match num.parse::<f32>() {
        Ok(n) if n > 0.0 => Ok(()),
        Ok(_) => Err("Number must be greater than 0.0".into()),
        Err(_) => Err("Number required".into()),
    }
}

pub const GENERATOR_NAMES: &[&str] = &["shapes", "solid", "sphere"];
pub const FORMAT_NAMES: &[&str] = &["generator", "skull"];
pub const PRESET_NAMES: &[&str] = &["ramp", "bone", "mri"];
pub const TECHNIQUE_NAMES: &[&str] = &["composite", "edge", "mip", "minip", "gradient", "icpe"];

fn input_args<'a>() -> [Arg<'a>; 4] {
    [
        Arg::new("input")
            .help("Volume file to load")
            .required(true)
            .value_name("FILE")
            .allow_invalid_utf8(true)
            .value_hint(ValueHint::FilePath),
        Arg::new("format")
            .help("Header format of the input")
            .long("format")
            .short('f')
            .default_value("generator")
            .possible_values(FORMAT_NAMES),
        Arg::new("preset")
            .help("Transfer function preset")
            .long("preset")
            .short('p')
            .default_value("ramp")
            .possible_values(PRESET_NAMES),
        Arg::new("internal-volume-size")
            .help("Edge of the texture budget cube")
            .long("internal-volume-size")
            .short('i')
            .value_name("SIDE")
            .default_value("256")
            .validator(is_positive_number),
    ]
}

fn technique_arg<'a>() -> Arg<'a> {
    Arg::new("technique")
        .help("Ray casting technique")
        .long("technique")
        .short('t')
        .default_value("composite")
        .possible_values(TECHNIQUE_NAMES)
}

fn gen_command<'a>() -> Command<'a> {
    Command::new("gen")
        .about("Synthesize a volume file")
        .arg(
            Arg::new("dims")
                .help("Dimensions of volume")
                .long("dims")
                .short('d')
                .required(true)
                .number_of_values(3)
                .value_names(&["X", "Y", "Z"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("shape")
                .help("Shape of cell")
                .long("shape")
                .short('s')
                .number_of_values(3)
                .value_names(&["X", "Y", "Z"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .default_values(&["1", "1", "1"])
                .validator(is_float_number),
        )
        .arg(
            Arg::new("generator")
                .help("Type of generator")
                .long("generator")
                .short('g')
                .required(true)
                .requires_ifs(&[("shapes", "n-of-shapes"), ("shapes", "object-size")])
                .takes_value(true)
                .value_name("NAME")
                .possible_values(GENERATOR_NAMES),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for RNG, leave out for random seed")
                .long("seed")
                .value_name("SEED")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("sample")
                .help("Values of generated object")
                .long("sample")
                .value_name("BYTE")
                .default_value("200")
                .validator(|s| is_positive_number(s).and(can_fit_u8(s))),
        )
        .arg(
            Arg::new("object-size")
                .help("Size of individual generated objects")
                .long("object-size")
                .value_name("SIDE")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("n-of-shapes")
                .help("Number of shapes generated in volume")
                .long("n-of-shapes")
                .value_name("N")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("output-file")
                .help("File name to output")
                .long("output-file")
                .short('o')
                .value_name("FILE")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::FilePath)
                .default_value_os(OsStr::new("a.vol")),
        )
}

fn bake_command<'a>() -> Command<'a> {
    Command::new("bake")
        .about("Resample a volume, bake its lookup table and dump the shaders")
        .args(input_args())
        .arg(technique_arg().help("Technique whose shaders are dumped first"))
        .arg(
            Arg::new("output-dir")
                .help("Directory for textures and shader sources")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::DirPath)
                .default_value_os(OsStr::new("baked")),
        )
}

fn preview_command<'a>() -> Command<'a> {
    Command::new("preview")
        .about("Render a PPM image on the CPU")
        .args(input_args())
        .arg(technique_arg())
        .arg(
            Arg::new("resolution")
                .help("Resolution of the image")
                .long("resolution")
                .short('r')
                .number_of_values(2)
                .value_names(&["W", "H"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .default_values(&["512", "512"])
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("output-file")
                .help("Image to write")
                .long("output-file")
                .short('o')
                .value_name("FILE")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::FilePath)
                .default_value_os(OsStr::new("preview.ppm")),
        )
}

pub fn get_command<'a>() -> Command<'a> {
    Command::new("vol_bake")
        .version("0.2.0")
        .about("Volume generator and ray casting texture baker")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(gen_command())
        .subcommand(bake_command())
        .subcommand(preview_command())
}
