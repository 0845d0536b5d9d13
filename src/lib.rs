//! jipg: schema-driven JSON parser generator
//!
//! A user declares one or more named top-level shapes through a small
//! embedded DSL ([`ir::Builder`] plus [`registry::Registry`]) and this
//! crate emits a self-contained C lexer and recursive-descent parser for
//! them: nominal struct declarations in a header, and a runtime plus
//! per-shape parsing functions in a source file (or both folded into one
//! file behind an `#ifdef` guard).
//!
//! ## Pipeline
//!
//! ```text
//! Registry::register(name, thunk)   — declare schemas
//!         |
//!         v
//! Registry::build_all(&mut arena)   — materialize each schema's IR tree
//!         |
//!         v
//! NamePass::run(&mut arena, &roots) — assign nominal names to aggregates
//!         |
//!         v
//! codegen::sbox::check_object_collisions  — reject ambiguous field hashes
//!         |
//!         v
//! codegen::sink::build + write_split/write_single_file — emit C
//! ```

pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod names;
pub mod registry;

pub use config::GeneratorConfig;
pub use error::{GeneratorError, Result};
pub use ir::{Arena, Builder, FieldEntry, Node, NodeId, NodeKind};
pub use names::NamePass;
pub use registry::{Registry, SchemaThunk};

use tracing::{debug, info};

/// Run the full pipeline — build, name, validate, emit — for every schema
/// registered in `registry`, returning the generated header/source bodies.
///
/// This is the library-level entry point both demo binaries
/// ([`crate` root `src/bin`]) and a caller's own `main` drive; it exists so
/// the four-stage pipeline above only has to be written once.
pub fn generate(
    registry: &Registry,
    config: &GeneratorConfig,
    header_basename: &str,
) -> Result<codegen::sink::GeneratedOutput> {
    if registry.len() > config.limits.parser_cap {
        return Err(GeneratorError::RegistryExhausted {
            registered: registry.len(),
            cap: config.limits.parser_cap,
        });
    }

    let mut arena = ir::Arena::with_capacity(config.limits.arena_cap);

    info!(schemas = registry.len(), "building registered schemas");
    let roots = registry.build_all(&mut arena)?;

    debug!("assigning nominal names");
    let mut pass = names::NamePass::new();
    pass.run(&mut arena, &roots);

    debug!("checking object field hashes for collisions");
    for id in 0..arena.len() as u32 {
        let node_id = ir::NodeId::from_raw(id);
        if let ir::NodeKind::Object { fields } = &arena.get(node_id).kind {
            let name = arena
                .get(node_id)
                .name
                .clone()
                .unwrap_or_else(|| "<anonymous>".to_string());
            codegen::sbox::check_object_collisions(&name, fields)?;
        }
    }

    info!("emitting header and source");
    Ok(codegen::sink::build(&arena, &roots, header_basename))
}
