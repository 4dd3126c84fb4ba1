use config::Config;

mod args;
mod bake;
mod config;
mod file;
mod generators;
mod header;

use crate::{args::get_command, generators::generate_vol};

pub fn main() {
    env_logger::init();

    let args = get_command().get_matches();

    let cfg = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    log::debug!("{:?}", cfg);

    let res = match &cfg {
        Config::Gen(gen) => generate_vol(gen),
        Config::Bake(bake) => bake::bake(bake),
        Config::Preview(preview) => bake::preview(preview),
    };

    if let Err(e) = res {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
