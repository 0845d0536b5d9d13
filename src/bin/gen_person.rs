//! Person parser generator
//!
//! Registers a `Person` schema (`name: String, age: Int, friends:
//! Array(String), parents: Array(String, 2)`) and emits its C parser.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jipg::codegen::sink::{resolve_paths, write_single_file, write_split};
use jipg::cli::Cli;
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
    let mut registry = Registry::new();
    registry
        .register("Person", move |arena| {
            let mut b = Builder::new(arena);
            let name = b.string()?;
            let age = b.int(&int_type)?;
            let friend = b.string()?;
            let friends = b.array(friend)?;
            let parent = b.string()?;
            let parents = b.array_cap(parent, 2)?;
            let fields = vec![
                b.field("name", name),
                b.field("age", age),
                b.field("friends", friends),
                b.field("parents", parents),
            ];
            b.object(fields)
        })
        .context("registering Person schema")?;

    let header_basename = cli
        .header
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("jsonparser.h")
        .to_string();

    let output = jipg::generate(&registry, &config, &header_basename)?;

    let (header_path, source_path) =
        resolve_paths(&cli.header, &cli.source, cli.single_file);
    match source_path {
        Some(source_path) => write_split(&output, &header_path, &source_path)?,
        None => write_single_file(&output, &header_path, &header_basename)?,
    }

    Ok(())
}
