//! `bake` and `preview` subcommands

use std::{
    error::Error,
    fs,
    io::{BufWriter, Write},
};

use crossbeam::channel;
use gpu_raycast::{
    camera::PerspectiveCamera,
    render::{fragment_shader_source, vertex_shader_source, ColorLayout},
    transfer::{TransferLookup, LOOKUP_SIZE},
    volumetric::{ResampledVolume, Resampler},
    CpuRenderer, RaycastError, RenderOptions, Technique, VoxelGrid,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use nalgebra::vector;

use crate::{
    config::{BakeConfig, Input, PreviewConfig},
    file::{open_create_file, write_texture},
};

/// Textures and lookup table of a loaded volume
struct Baked {
    grid: VoxelGrid,
    volume: ResampledVolume,
    lookup: TransferLookup,
}

/// Load the input and run resampling, gradients and baking.
/// Gradient progress is shown on a bar.
fn prepare(input: &Input) -> Result<Baked, Box<dyn Error>> {
    let grid = input.load()?;
    info!(
        "Loaded {:?}, {:?} with {} components",
        input.path,
        grid.dims(),
        grid.components()
    );

    let mut resampler = Resampler::new(input.internal_volume_size);
    let (tx, rx) = channel::unbounded();
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::default_bar().template("gradients {bar:40} {percent}%"));

    let resampler_ref = &mut resampler;
    let grid_ref = &grid;
    let joined = crossbeam::scope(|s| {
        // the worker owns the sender, the channel closes when it is done
        let worker = s.spawn(move |_| resampler_ref.update(grid_ref, Some(&tx)));
        for progress in rx.iter() {
            bar.set_position((progress * 100.0) as u64);
        }
        worker.join()
    });
    match joined {
        Ok(Ok(updated)) => {
            updated?;
        }
        _ => return Err("resampling thread panicked".into()),
    }
    bar.finish_and_clear();

    let volume = resampler
        .volume()
        .cloned()
        .ok_or_else(|| RaycastError::invalid("resampling produced no volume"))?;
    info!("Resampled to {:?}", volume.dims);

    let property = input.preset.property(&grid);
    let mut lookup = TransferLookup::new();
    lookup.update(&grid, &volume, &property);

    Ok(Baked {
        grid,
        volume,
        lookup,
    })
}

fn technique_name(technique: Technique) -> String {
    format!("{:?}", technique).to_lowercase()
}

pub fn bake(cfg: &BakeConfig) -> Result<(), Box<dyn Error>> {
    let baked = prepare(&cfg.input)?;
    fs::create_dir_all(&cfg.output_dir)?;

    write_texture(cfg.output("volume1.grct"), baked.volume.dims, &baked.volume.volume1)?;
    write_texture(cfg.output("volume2.grct"), baked.volume.dims, &baked.volume.volume2)?;
    write_texture(
        cfg.output("lookup.grct"),
        vector![LOOKUP_SIZE, LOOKUP_SIZE, 1],
        baked.lookup.table(),
    )?;

    let layout = ColorLayout::from_components(baked.grid.components())?;
    fs::write(cfg.output("raycast.vert"), vertex_shader_source())?;

    // selected technique first, the rest for reference
    let mut techniques = vec![cfg.technique];
    techniques.extend(Technique::ALL.iter().filter(|&&t| t != cfg.technique));
    for technique in techniques {
        let name = format!("raycast_{}.frag", technique_name(technique));
        fs::write(cfg.output(&name), fragment_shader_source(technique, layout))?;
    }

    info!("Baked textures written to {:?}", cfg.output_dir);
    Ok(())
}

/// Binary PPM
fn write_ppm(cfg: &PreviewConfig, buffer: &[u8]) -> Result<(), std::io::Error> {
    let (w, h) = cfg.resolution;
    let mut out = BufWriter::new(open_create_file(&cfg.file_name)?);
    write!(out, "P6\n{} {}\n255\n", w, h)?;
    out.write_all(buffer)?;
    out.flush()
}

pub fn preview(cfg: &PreviewConfig) -> Result<(), Box<dyn Error>> {
    let baked = prepare(&cfg.input)?;
    let (w, h) = cfg.resolution;

    // look at the volume center from a corner, far enough to see all of it
    let bounds = baked.grid.bounds().transform(baked.grid.transform());
    let center = bounds.lower + bounds.dims() / 2.0;
    let diagonal = bounds.diagonal().max(1.0);
    let position = center + vector![1.0, 0.8, 1.2].normalize() * 1.8 * diagonal;
    let mut camera = PerspectiveCamera::look_at(position, center);
    camera.change_aspect_from_resolution(w, h);

    let renderer = CpuRenderer::new(RenderOptions::new(cfg.resolution, cfg.technique));
    let mut buffer = vec![0; 3 * w * h];
    let property = cfg.input.preset.property(&baked.grid);
    renderer.render_to_buffer(
        &camera,
        &baked.grid,
        &baked.volume,
        &baked.lookup,
        &property.shading,
        &mut buffer,
    )?;

    write_ppm(cfg, &buffer)?;
    info!("Preview written to {:?}", cfg.file_name);
    Ok(())
}
