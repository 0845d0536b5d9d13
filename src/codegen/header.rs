//! Type-declaration emitter
//!
//! Walks every aggregate reachable from the registered roots in post-order
//! (a node's children are always declared before the node itself, since C
//! structs must be complete types at the point they're embedded by value)
//! and prints one `typedef struct { ... } Name;` per aggregate, followed by
//! a `parse_<Name>` / `parse_<Name>_cstr` prototype pair per registered
//! root.

use std::collections::HashSet;

use crate::ir::{Arena, NodeId, NodeKind};

pub(crate) fn type_name(arena: &Arena, id: NodeId) -> String {
    let node = arena.get(id);
    match &node.kind {
        NodeKind::Object { .. } | NodeKind::Array { .. } => node
            .name
            .clone()
            .expect("aggregate node has no name; name pass must run before codegen"),
        NodeKind::String => "char *".to_string(),
        NodeKind::Int { c_type } => c_type.clone(),
        NodeKind::Float { c_type } => c_type.clone(),
        NodeKind::Bool => "bool".to_string(),
    }
}

fn field_decl(ty: &str, decl: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}{decl};")
    } else {
        format!("{ty} {decl};")
    }
}

pub(crate) fn children_of(arena: &Arena, id: NodeId) -> Vec<NodeId> {
    match &arena.get(id).kind {
        NodeKind::Object { fields } => fields.iter().map(|f| f.value).collect(),
        NodeKind::Array { element, .. } => vec![*element],
        NodeKind::String | NodeKind::Int { .. } | NodeKind::Float { .. } | NodeKind::Bool => {
            Vec::new()
        }
    }
}

/// Post-order traversal shared by every emitter: a node's children always
/// appear before the node itself, since nested aggregates must be declared
/// (and parsed) before the aggregate that embeds them.
pub(crate) fn collect_post_order(
    arena: &Arena,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    out: &mut Vec<NodeId>,
) {
    if visited.contains(&id) {
        return;
    }
    visited.insert(id);
    for child in children_of(arena, id) {
        collect_post_order(arena, child, visited, out);
    }
    if arena.get(id).is_aggregate() {
        out.push(id);
    }
}

fn emit_object(arena: &Arena, id: NodeId, name: &str) -> String {
    let NodeKind::Object { fields } = &arena.get(id).kind else {
        unreachable!()
    };
    let mut s = String::from("typedef struct {\n");
    for field in fields {
        let ty = type_name(arena, field.value);
        s.push_str("    ");
        s.push_str(&field_decl(&ty, &field.key));
        s.push('\n');
    }
    s.push_str("} ");
    s.push_str(name);
    s.push_str(";\n\n");
    s
}

fn emit_array(arena: &Arena, id: NodeId, name: &str) -> String {
    let NodeKind::Array { element, cap } = &arena.get(id).kind else {
        unreachable!()
    };
    let elem_ty = type_name(arena, *element);
    let mut s = String::from("typedef struct {\n");
    match cap {
        Some(n) => {
            s.push_str("    ");
            s.push_str(&field_decl(&elem_ty, &format!("items[{n}]")));
            s.push('\n');
            s.push_str("    size_t count;\n");
        }
        None => {
            let items_line = if elem_ty.ends_with('*') {
                format!("{elem_ty}*items;")
            } else {
                format!("{elem_ty} *items;")
            };
            s.push_str("    ");
            s.push_str(&items_line);
            s.push('\n');
            s.push_str("    size_t count;\n");
            s.push_str("    size_t cap;\n");
        }
    }
    s.push_str("} ");
    s.push_str(name);
    s.push_str(";\n\n");
    s
}

fn emit_aggregate(arena: &Arena, id: NodeId) -> String {
    let name = arena
        .get(id)
        .name
        .clone()
        .expect("aggregate node has no name; name pass must run before codegen");
    match &arena.get(id).kind {
        NodeKind::Object { .. } => emit_object(arena, id, &name),
        NodeKind::Array { .. } => emit_array(arena, id, &name),
        _ => unreachable!("emit_aggregate called on non-aggregate"),
    }
}

/// Derive an `#ifndef` include guard from an output file's basename, e.g.
/// `"jsonparser.h"` -> `"JSONPARSER_H"`.
pub fn include_guard(basename: &str) -> String {
    let mut guard: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str("_H");
    guard
}

/// The C type a `parse_<name>` entry point populates: the aggregate's own
/// nominal name, or — for a primitive-rooted schema — the scalar's C type
/// directly, with no wrapping struct.
pub fn root_out_type(arena: &Arena, root: NodeId) -> String {
    type_name(arena, root)
}

/// Emit every struct declaration reachable from `roots`, in post-order,
/// followed by the `parse_<name>` / `parse_<name>_cstr` prototype pair for
/// each registered root, wrapped in an include guard derived from
/// `header_basename`.
pub fn emit_header(arena: &Arena, roots: &[(String, NodeId)], header_basename: &str) -> String {
    let guard = include_guard(header_basename);
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for (_, root) in roots {
        collect_post_order(arena, *root, &mut visited, &mut order);
    }

    let mut out = String::new();
    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    out.push_str(
        "#include <stdint.h>\n#include <stdbool.h>\n#include <stddef.h>\n#include <string.h>\n#include <stdlib.h>\n\n",
    );

    for id in &order {
        out.push_str(&emit_aggregate(arena, *id));
    }

    out.push_str("/* Entry points, one pair per registered schema. */\n");
    for (name, root) in roots {
        let out_ty = root_out_type(arena, *root);
        out.push_str(&format!(
            "bool parse_{name}(const char *json, size_t json_len, {out_ty} *out);\n"
        ));
        out.push_str(&format!(
            "bool parse_{name}_cstr(const char *json, {out_ty} *out);\n"
        ));
    }

    out.push_str(&format!("\n#endif /* {guard} */\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Arena, Builder};
    use crate::names::NamePass;

    fn build_person(arena: &mut Arena) -> NodeId {
        let mut b = Builder::new(arena);
        let name = b.string().unwrap();
        let age = b.int("int64_t").unwrap();
        let friend_elem = b.string().unwrap();
        let friends = b.array(friend_elem).unwrap();
        let parent_elem = b.string().unwrap();
        let parents = b.array_cap(parent_elem, 2).unwrap();
        let f1 = b.field("name", name);
        let f2 = b.field("age", age);
        let f3 = b.field("friends", friends);
        let f4 = b.field("parents", parents);
        b.object(vec![f1, f2, f3, f4]).unwrap()
    }

    #[test]
    fn emits_struct_and_prototypes_for_person() {
        let mut arena = Arena::with_capacity(64);
        let root = build_person(&mut arena);
        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Person".to_string(), root)]);

        let header = emit_header(&arena, &[("Person".to_string(), root)], "person_parser.h");

        assert!(header.contains("#ifndef PERSON_PARSER_H"));
        assert!(header.contains("typedef struct {"));
        assert!(header.contains("} Person;"));
        assert!(header.contains("char *name;"));
        assert!(header.contains("int64_t age;"));
        assert!(header.contains("bool parse_Person(const char *json, size_t json_len, Person *out);"));
        assert!(header.contains("bool parse_Person_cstr(const char *json, Person *out);"));
    }

    #[test]
    fn bounded_array_declares_fixed_size_member() {
        let mut arena = Arena::with_capacity(64);
        let root = build_person(&mut arena);
        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Person".to_string(), root)]);
        let header = emit_header(&arena, &[("Person".to_string(), root)], "p.h");
        assert!(header.contains("items[2];"));
    }

    #[test]
    fn nested_structs_come_before_containers_in_output() {
        let mut arena = Arena::with_capacity(64);
        let mut b = Builder::new(&mut arena);
        let x = b.float("double").unwrap();
        let y = b.float("double").unwrap();
        let fx = b.field("x", x);
        let fy = b.field("y", y);
        let coord = b.object(vec![fx, fy]).unwrap();
        let sides = b.int("int64_t").unwrap();
        let radius = b.float("double").unwrap();
        let fs = b.field("sides", sides);
        let fr = b.field("radius", radius);
        let fc = b.field("coord", coord);
        let shape = b.object(vec![fs, fr, fc]).unwrap();
        let shapes_root = b.array(shape).unwrap();

        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Shapes".to_string(), shapes_root)]);
        let header = emit_header(&arena, &[("Shapes".to_string(), shapes_root)], "shapes.h");

        let coord_struct_name = arena.get(coord).name.clone().unwrap();
        let coord_decl_pos = header.find(&format!("}} {coord_struct_name};")).unwrap();
        let shapes_decl_pos = header.find("} Shapes;").unwrap();
        assert!(coord_decl_pos < shapes_decl_pos);
    }
}
