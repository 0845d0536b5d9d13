//! Schema intermediate representation
//!
//! A schema is a tree of [`Node`]s allocated from a single fixed-capacity
//! [`Arena`]. Every node is exactly one of the six concrete shapes the DSL
//! can produce; there are no cycles and no shared ownership, so a flat
//! index-addressed arena is sufficient — no reference counting, no
//! `unsafe`, no raw pointers.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{GeneratorError, Result};

/// Handle to a node inside an [`Arena`]. Cheap to copy, meaningless outside
/// the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// One field of an `Object`: a literal key paired with the child node it
/// points at. Only ever appears inside `NodeKind::Object::fields`.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub key: String,
    pub value: NodeId,
}

/// The concrete shape of a single IR node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An ordered list of fields. Keys must be non-empty and unique within
    /// the object (enforced by [`Builder::object`]).
    Object { fields: Vec<FieldEntry> },
    /// A homogeneous list. `cap` is the optional bounded capacity N; when
    /// present, the emitted parser must reject the (N+1)-th element.
    Array { element: NodeId, cap: Option<u64> },
    String,
    /// `c_type` is the C integer type the emitted field/parser should use.
    Int { c_type: String },
    /// `c_type` is the C floating type the emitted field/parser should use.
    Float { c_type: String },
    Bool,
}

/// A single IR node: its shape, plus the name-pass bookkeeping assigned to
/// every aggregate (see [`crate::names`]).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Nominal name assigned by the name pass. `None` until then; `None`
    /// forever for non-aggregate (scalar) nodes, which have no name slot.
    pub name: Option<String>,
    /// `Some(top_level_name)` if this node is the root of a registered
    /// top-level schema.
    pub head: Option<String>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            head: None,
        }
    }

    /// Aggregate nodes (`Object`, `Array`) carry a nominal name; scalars do
    /// not participate in the name pass at all.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, NodeKind::Object { .. } | NodeKind::Array { .. })
    }
}

/// The schema arena: a flat, fixed-capacity store of [`Node`]s.
///
/// Mirrors the original C generator's `Jipg_Value arena[JIPG_VALUE_ARENA_CAP]`
/// — a single bump allocation region sized at generator start, exhausted by
/// returning an error rather than asserting/aborting.
pub struct Arena {
    nodes: Vec<Node>,
    cap: usize,
}

impl Arena {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(cap.min(4096)),
            cap,
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> Result<NodeId> {
        if self.nodes.len() >= self.cap {
            return Err(GeneratorError::ArenaExhausted { cap: self.cap });
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Check that `name` is safe to emit verbatim as a C identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_re().is_match(name)
}

/// Ergonomic wrapper around an [`Arena`] exposing the DSL's constructor
/// forms. A `Builder` borrows the arena for the duration of building one
/// schema tree; schema thunks (see [`crate::registry`]) receive one of
/// these rather than touching the arena directly.
pub struct Builder<'a> {
    arena: &'a mut Arena,
}

impl<'a> Builder<'a> {
    pub fn new(arena: &'a mut Arena) -> Self {
        Self { arena }
    }

    /// `Object(field…)` — an ordered set of fields with unique,
    /// non-empty, C-identifier-safe keys.
    pub fn object(&mut self, fields: Vec<FieldEntry>) -> Result<NodeId> {
        let mut seen = std::collections::HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.key.is_empty() {
                return Err(GeneratorError::EmptyFieldKey);
            }
            if !is_valid_identifier(&field.key) {
                return Err(GeneratorError::InvalidIdentifier(field.key.clone()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(GeneratorError::DuplicateFieldKey {
                    key: field.key.clone(),
                });
            }
        }
        self.arena.alloc(NodeKind::Object { fields })
    }

    /// `Field(key, value)` — convenience for building a [`FieldEntry`]
    /// without allocating a node of its own (fields are not independently
    /// addressable; they only exist inside an object's field list).
    pub fn field(&self, key: impl Into<String>, value: NodeId) -> FieldEntry {
        FieldEntry {
            key: key.into(),
            value,
        }
    }

    /// `Array(element)` — unbounded array.
    pub fn array(&mut self, element: NodeId) -> Result<NodeId> {
        self.arena.alloc(NodeKind::Array { element, cap: None })
    }

    /// `Array(element, cap)` — bounded array; `cap` must be >= 1.
    pub fn array_cap(&mut self, element: NodeId, cap: u64) -> Result<NodeId> {
        if cap == 0 {
            return Err(GeneratorError::InvalidArrayCapacity(cap));
        }
        self.arena.alloc(NodeKind::Array {
            element,
            cap: Some(cap),
        })
    }

    pub fn string(&mut self) -> Result<NodeId> {
        self.arena.alloc(NodeKind::String)
    }

    pub fn int(&mut self, default_c_type: &str) -> Result<NodeId> {
        self.int_t(default_c_type)
    }

    pub fn int_t(&mut self, c_type: impl Into<String>) -> Result<NodeId> {
        self.arena.alloc(NodeKind::Int {
            c_type: c_type.into(),
        })
    }

    pub fn float(&mut self, default_c_type: &str) -> Result<NodeId> {
        self.float_t(default_c_type)
    }

    pub fn float_t(&mut self, c_type: impl Into<String>) -> Result<NodeId> {
        self.arena.alloc(NodeKind::Float {
            c_type: c_type.into(),
        })
    }

    pub fn bool_(&mut self) -> Result<NodeId> {
        self.arena.alloc(NodeKind::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_rejects_duplicate_keys() {
        let mut arena = Arena::with_capacity(16);
        let mut b = Builder::new(&mut arena);
        let s1 = b.string().unwrap();
        let s2 = b.string().unwrap();
        let f1 = b.field("name", s1);
        let f2 = b.field("name", s2);
        let err = b.object(vec![f1, f2]).unwrap_err();
        assert!(matches!(err, GeneratorError::DuplicateFieldKey { .. }));
    }

    #[test]
    fn object_rejects_empty_key() {
        let mut arena = Arena::with_capacity(16);
        let mut b = Builder::new(&mut arena);
        let s1 = b.string().unwrap();
        let f1 = b.field("", s1);
        let err = b.object(vec![f1]).unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyFieldKey));
    }

    #[test]
    fn object_rejects_non_identifier_key() {
        let mut arena = Arena::with_capacity(16);
        let mut b = Builder::new(&mut arena);
        let s1 = b.string().unwrap();
        let f1 = b.field("not a key!", s1);
        let err = b.object(vec![f1]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidIdentifier(_)));
    }

    #[test]
    fn array_cap_rejects_zero() {
        let mut arena = Arena::with_capacity(16);
        let mut b = Builder::new(&mut arena);
        let s1 = b.string().unwrap();
        let err = b.array_cap(s1, 0).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidArrayCapacity(0)));
    }

    #[test]
    fn empty_object_and_array_are_legal() {
        let mut arena = Arena::with_capacity(16);
        let mut b = Builder::new(&mut arena);
        let empty_obj = b.object(vec![]);
        assert!(empty_obj.is_ok());
    }

    #[test]
    fn arena_exhaustion_fails_fast() {
        let mut arena = Arena::with_capacity(2);
        let mut b = Builder::new(&mut arena);
        assert!(b.string().is_ok());
        assert!(b.bool_().is_ok());
        let err = b.string().unwrap_err();
        assert!(matches!(err, GeneratorError::ArenaExhausted { cap: 2 }));
    }
}
