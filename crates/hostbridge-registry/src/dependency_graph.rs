//! Type dependency graph and cycle detection.
//!
//! Uses `petgraph::DiGraph` with one node per resolved type and an edge
//! from each type to every type its base, layout or member signatures
//! reference. Self references are not recorded. Strongly connected
//! components larger than one node are reference cycles; every type in a
//! cycle is forward-declared before any definition is emitted.

use hostbridge_core::{TypeDescriptor, TypeHash};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};

/// Directed graph of type references.
pub struct DependencyGraph {
    graph: DiGraph<TypeHash, ()>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph over `types`; references to types outside the set are ignored.
    pub fn build(types: &[TypeDescriptor]) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = FxHashMap::default();
        for ty in types {
            nodes.insert(ty.hash, graph.add_node(ty.hash));
        }
        for ty in types {
            let from = nodes[&ty.hash];
            let mut seen = FxHashSet::default();
            for referenced in ty.referenced_types() {
                if referenced != ty.hash
                    && let Some(&to) = nodes.get(&referenced)
                    && seen.insert(referenced)
                {
                    graph.add_edge(from, to, ());
                }
            }
        }
        Self { graph, nodes }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct dependencies of a type.
    pub fn dependencies(&self, hash: TypeHash) -> Vec<TypeHash> {
        let Some(&node) = self.nodes.get(&hash) else {
            return Vec::new();
        };
        let mut deps: Vec<TypeHash> = self.graph.neighbors(node).map(|n| self.graph[n]).collect();
        deps.sort();
        deps
    }

    /// Every reference cycle, each as the set of participating types.
    pub fn cycles(&self) -> Vec<Vec<TypeHash>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut hashes: Vec<TypeHash> = scc.into_iter().map(|n| self.graph[n]).collect();
                hashes.sort();
                hashes
            })
            .collect()
    }

    /// Types that take part in a cycle, in the order given by `order`.
    pub fn forward_declarations(&self, order: &[TypeDescriptor]) -> Vec<TypeHash> {
        let cyclic: FxHashSet<TypeHash> = self.cycles().into_iter().flatten().collect();
        order
            .iter()
            .map(|t| t.hash)
            .filter(|h| cyclic.contains(h))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{MemberDescriptor, TypeRef, TypeShape};

    fn class(name: &str, refs: &[&str]) -> TypeDescriptor {
        let mut t = TypeDescriptor::new(name, TypeShape::Class);
        for r in refs {
            t = t.with_member(MemberDescriptor::field(
                format!("f_{r}"),
                TypeRef::Named(TypeHash::from_name(r)),
            ));
        }
        t
    }

    #[test]
    fn acyclic_has_no_forward_declarations() {
        let types = vec![class("A", &["B"]), class("B", &[])];
        let graph = DependencyGraph::build(&types);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.cycles().is_empty());
        assert!(graph.forward_declarations(&types).is_empty());
        assert_eq!(graph.dependencies(TypeHash::from_name("A")), vec![TypeHash::from_name("B")]);
    }

    #[test]
    fn mutual_references_are_forward_declared() {
        let types = vec![class("Parent", &["Child"]), class("Child", &["Parent"]), class("Other", &[])];
        let graph = DependencyGraph::build(&types);
        assert_eq!(graph.cycles().len(), 1);
        assert_eq!(
            graph.forward_declarations(&types),
            vec![TypeHash::from_name("Parent"), TypeHash::from_name("Child")]
        );
    }

    #[test]
    fn self_reference_needs_no_forward_declaration() {
        let types = vec![class("Node", &["Node"])];
        let graph = DependencyGraph::build(&types);
        assert!(graph.forward_declarations(&types).is_empty());
        assert!(graph.dependencies(TypeHash::from_name("Node")).is_empty());
    }

    #[test]
    fn unknown_references_are_ignored() {
        let types = vec![class("A", &["Missing"])];
        let graph = DependencyGraph::build(&types);
        assert!(graph.dependencies(TypeHash::from_name("A")).is_empty());
    }
}
