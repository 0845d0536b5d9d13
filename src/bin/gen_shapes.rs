//! Shapes parser generator
//!
//! Registers a `Shapes` schema (`Array(Object{sides: Int, radius: Float,
//! coord: Object{x: Float, y: Float}})`) and emits its C parser.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jipg::cli::Cli;
use jipg::codegen::sink::{resolve_paths, write_single_file, write_split};
use jipg::ir::Builder;
use jipg::{GeneratorConfig, Registry};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = GeneratorConfig::load_from(cli.config.as_deref().and_then(|p| p.to_str()))
        .context("loading generator configuration")?;

    let int_type = config.types.int_type.clone();
    let float_type = config.types.float_type.clone();
    let mut registry = Registry::new();
    registry
        .register("Shapes", move |arena| {
            let mut b = Builder::new(arena);
            let x = b.float(&float_type)?;
            let y = b.float(&float_type)?;
            let coord = b.object(vec![b.field("x", x), b.field("y", y)])?;
            let sides = b.int(&int_type)?;
            let radius = b.float(&float_type)?;
            let shape = b.object(vec![
                b.field("sides", sides),
                b.field("radius", radius),
                b.field("coord", coord),
            ])?;
            b.array(shape)
        })
        .context("registering Shapes schema")?;

    let header_basename = cli
        .header
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("jsonparser.h")
        .to_string();

    let output = jipg::generate(&registry, &config, &header_basename)?;

    let (header_path, source_path) = resolve_paths(&cli.header, &cli.source, cli.single_file);
    match source_path {
        Some(source_path) => write_split(&output, &header_path, &source_path)?,
        None => write_single_file(&output, &header_path, &header_basename)?,
    }

    Ok(())
}
