//! Name-assignment pass
//!
//! Every aggregate (`Object`, `Array`) node needs a nominal C type name
//! before it can be declared. This pass walks each registered schema's tree
//! in pre-order, handing out names from a single monotonic counter shared
//! across every schema in the registry — so two schemas registered back to
//! back never collide on a generated name even though neither knows about
//! the other.
//!
//! The root of each registered tree is special: rather than drawing a
//! counter name, it is aliased directly to the name it was registered
//! under (`Registry::register("Person", ...)` makes the root node's
//! nominal name `"Person"`, not `"Person_object0"`).

use tracing::debug;

use crate::ir::{Arena, Node, NodeId, NodeKind};

/// Shared state for one name-assignment run. A fresh `NamePass` corresponds
/// to one generator invocation; its counter must be shared across every
/// root passed to [`NamePass::run`], not reset per root.
#[derive(Default)]
pub struct NamePass {
    counter: u64,
}

impl NamePass {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Assign names to every aggregate reachable from `roots`, in
    /// registration order. `roots` are `(registered_name, root_node)` pairs,
    /// typically the output of [`crate::registry::Registry::build_all`].
    pub fn run(&mut self, arena: &mut Arena, roots: &[(String, NodeId)]) {
        for (name, root) in roots {
            self.assign_tree(arena, name, *root);
        }
    }

    fn assign_tree(&mut self, arena: &mut Arena, root_name: &str, root: NodeId) {
        if arena.get(root).is_aggregate() {
            arena.get_mut(root).name = Some(root_name.to_string());
            debug!(name = %root_name, "root name aliased to registered name");
        } else {
            // A primitive-rooted schema is supported directly (see
            // DESIGN.md): the generated `parse_<name>` entry point reads
            // the scalar's C type without a wrapping struct, so no
            // nominal name is needed.
            debug!(name = %root_name, "primitive-rooted schema, no struct name needed");
        }

        // Pre-order walk of the rest of the tree, sharing self.counter.
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let children = Self::children_of(arena.get(id));
            for child in children.iter().rev() {
                if arena.get(*child).is_aggregate() && arena.get(*child).name.is_none() {
                    let name = self.next_name(root_name, arena.get(*child));
                    arena.get_mut(*child).name = Some(name);
                }
                stack.push(*child);
            }
        }
    }

    fn next_name(&mut self, root_name: &str, node: &Node) -> String {
        let kind_tag = match node.kind {
            NodeKind::Object { .. } => "object",
            NodeKind::Array { .. } => "array",
            _ => unreachable!("next_name only called on aggregate nodes"),
        };
        let n = self.counter;
        self.counter += 1;
        format!("{root_name}_{kind_tag}{n}")
    }

    fn children_of(node: &Node) -> Vec<NodeId> {
        match &node.kind {
            NodeKind::Object { fields } => fields.iter().map(|f| f.value).collect(),
            NodeKind::Array { element, .. } => vec![*element],
            NodeKind::String | NodeKind::Int { .. } | NodeKind::Float { .. } | NodeKind::Bool => {
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Arena, Builder};

    #[test]
    fn root_is_aliased_to_registered_name() {
        let mut arena = Arena::with_capacity(16);
        let root = {
            let mut b = Builder::new(&mut arena);
            let s = b.string().unwrap();
            let f = b.field("name", s);
            b.object(vec![f]).unwrap()
        };
        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Person".to_string(), root)]);
        assert_eq!(arena.get(root).name.as_deref(), Some("Person"));
    }

    #[test]
    fn nested_aggregates_get_unique_counter_names() {
        let mut arena = Arena::with_capacity(16);
        let root = {
            let mut b = Builder::new(&mut arena);
            let x = b.float("double").unwrap();
            let y = b.float("double").unwrap();
            let fx = b.field("x", x);
            let fy = b.field("y", y);
            let coord = b.object(vec![fx, fy]).unwrap();
            let sides = b.int("int64_t").unwrap();
            let fc = b.field("coord", coord);
            let fs = b.field("sides", sides);
            let shape = b.object(vec![fs, fc]).unwrap();
            b.array(shape).unwrap()
        };
        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Shapes".to_string(), root)]);

        assert_eq!(arena.get(root).name.as_deref(), Some("Shapes"));
        let element = match &arena.get(root).kind {
            NodeKind::Array { element, .. } => *element,
            _ => panic!("expected array"),
        };
        assert!(arena.get(element).name.as_deref().unwrap().starts_with("Shapes_object"));
    }

    #[test]
    fn counter_is_shared_across_roots() {
        let mut arena = Arena::with_capacity(32);
        let (root_a, root_b) = {
            let mut b = Builder::new(&mut arena);
            let s1 = b.string().unwrap();
            let fa = b.field("a", s1);
            let obj_a = b.object(vec![fa]).unwrap();
            let s2 = b.string().unwrap();
            let fb = b.field("b", s2);
            let obj_b = b.object(vec![fb]).unwrap();
            (b.array(obj_a).unwrap(), b.array(obj_b).unwrap())
        };
        let mut pass = NamePass::new();
        pass.run(
            &mut arena,
            &[("A".to_string(), root_a), ("B".to_string(), root_b)],
        );

        let child_a = match &arena.get(root_a).kind {
            NodeKind::Array { element, .. } => *element,
            _ => unreachable!(),
        };
        let child_b = match &arena.get(root_b).kind {
            NodeKind::Array { element, .. } => *element,
            _ => unreachable!(),
        };
        assert_ne!(
            arena.get(child_a).name.as_deref(),
            arena.get(child_b).name.as_deref()
        );
    }

    #[test]
    fn primitive_root_gets_no_name() {
        let mut arena = Arena::with_capacity(16);
        let root = Builder::new(&mut arena).string().unwrap();
        let mut pass = NamePass::new();
        pass.run(&mut arena, &[("Just".to_string(), root)]);
        assert_eq!(arena.get(root).name, None);
    }
}
