//! Top-level schema registration
//!
//! The original C generator discovers top-level schemas through a
//! constructor-attribute trick (`JIPG_PARSER` registers a function pointer
//! that runs before `main`). That magic buys ordering and failure modes
//! nobody controls. Here registration is an explicit call the user makes
//! from their own `main`, or from a small generated "register everything"
//! shim — ordering is whatever order `register` is called in, and a bad
//! registration is a `Result`, not a silent no-op.

use tracing::debug;

use crate::error::{GeneratorError, Result};
use crate::ir::{Arena, NodeId};

/// A schema thunk builds one top-level schema tree inside the shared arena
/// and returns the root node it produced.
pub type SchemaThunk = Box<dyn Fn(&mut Arena) -> Result<NodeId>>;

struct Entry {
    name: String,
    thunk: SchemaThunk,
}

/// Ordered collection of named top-level schemas awaiting the name pass and
/// codegen. Registration order is emission order.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level schema under `name`. `thunk` is called once,
    /// later, when the schema tree is actually built (see
    /// [`Registry::build_all`]) — registration itself only reserves the
    /// name and checks for duplicates.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        thunk: impl Fn(&mut Arena) -> Result<NodeId> + 'static,
    ) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(GeneratorError::DuplicateTopLevelName(name));
        }
        debug!(schema = %name, "registered top-level schema");
        self.entries.push(Entry {
            name,
            thunk: Box::new(thunk),
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run every registered thunk against `arena`, in registration order,
    /// returning `(name, root)` pairs in that same order and marking each
    /// root node as a registered head.
    pub fn build_all(&self, arena: &mut Arena) -> Result<Vec<(String, NodeId)>> {
        let mut roots = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let root = (entry.thunk)(arena)?;
            arena.get_mut(root).head = Some(entry.name.clone());
            roots.push((entry.name.clone(), root));
        }
        Ok(roots)
    }
}
