//! Output sinks
//!
//! Builds the two pieces of emitted C — the header (type declarations plus
//! prototypes) and the source (runtime lexer, primitive parsers, per-shape
//! parser functions) — and writes them either as a split header/source pair
//! or folded into a single file guarded by
//! `#ifdef <BASENAME>_IMPLEMENTATION`, so a caller can get the
//! implementation by defining that macro before the one `#include`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::codegen::header::emit_header;
use crate::codegen::parser::{emit_parsers, emit_runtime_prelude};
use crate::error::{GeneratorError, Result};
use crate::ir::{Arena, NodeId};

/// The two emitted bodies, before they're written to disk.
pub struct GeneratedOutput {
    pub header: String,
    pub source: String,
}

/// Build the header and source bodies for every registered, named schema.
pub fn build(arena: &Arena, roots: &[(String, NodeId)], header_basename: &str) -> GeneratedOutput {
    let header = emit_header(arena, roots, header_basename);
    let mut source = String::new();
    source.push_str(&emit_runtime_prelude());
    source.push_str(&emit_parsers(arena, roots));
    GeneratedOutput { header, source }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| GeneratorError::OutputIo {
        path: path.to_path_buf(),
        source,
    })
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "jipg_parser.h".to_string())
}

/// Derive the `#ifdef` implementation guard from a header basename, e.g.
/// `"shapes_parser.h"` -> `"SHAPES_PARSER_IMPLEMENTATION"`.
pub fn implementation_guard(header_basename: &str) -> String {
    let stem = header_basename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(header_basename);
    let mut guard: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str("_IMPLEMENTATION");
    guard
}

/// Write `output` as a split header/source pair: `header_path` gets only
/// the header body, `source_path` gets an `#include` of the header's
/// basename followed by the runtime and parser bodies.
pub fn write_split(output: &GeneratedOutput, header_path: &Path, source_path: &Path) -> Result<()> {
    write_file(header_path, &output.header)?;

    let mut source = String::new();
    source.push_str(&format!("#include \"{}\"\n\n", basename(header_path)));
    source.push_str(&output.source);
    write_file(source_path, &source)?;

    info!(header = %header_path.display(), source = %source_path.display(), "wrote split output");
    Ok(())
}

/// Write `output` as a single self-contained file: the header body always
/// present, the source body wrapped in `#ifdef <BASENAME>_IMPLEMENTATION …
/// #endif` so including it twice in one translation unit (once plain, once
/// with the macro defined) never produces a duplicate `parse_T` symbol.
pub fn write_single_file(output: &GeneratedOutput, path: &Path, header_basename: &str) -> Result<()> {
    let guard = implementation_guard(header_basename);
    let mut combined = String::new();
    combined.push_str(&output.header);
    combined.push_str(&format!("\n#ifdef {guard}\n\n"));
    combined.push_str(&output.source);
    combined.push_str(&format!("\n#endif /* {guard} */\n"));
    write_file(path, &combined)?;

    info!(path = %path.display(), "wrote single-file output");
    Ok(())
}

/// Resolve the output path(s) a [`crate::cli::Cli`] invocation targets:
/// a single combined path in `--single-file` mode, or a header/source pair
/// otherwise.
pub fn resolve_paths(header: &Path, source: &Path, single_file: bool) -> (PathBuf, Option<PathBuf>) {
    if single_file {
        (header.to_path_buf(), None)
    } else {
        (header.to_path_buf(), Some(source.to_path_buf()))
    }
}
