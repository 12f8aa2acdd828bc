//! Dependency graph construction.
//!
//! Nodes are dependency coordinates: the manifest's declared dependencies
//! followed by the dependencies implied by its applied plugins. An edge
//! `a -> b` means `a` requires `b`. A built graph is always acyclic and
//! pins exactly one literal version per coordinate.

pub mod errors;

pub use errors::GraphError;

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::{DependencyKind, Manifest, PluginCatalog, VersionSpec};

/// A coordinate in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub coordinate: String,
    pub kind: DependencyKind,
    /// Literal pinned version
    pub version: String,
    /// Plugin that implied this dependency; `None` when declared
    pub implied_by: Option<String>,
}

/// The resolved "requires" graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    fn add_node(&mut self, node: DependencyNode) -> NodeIndex {
        let coordinate = node.coordinate.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(coordinate, idx);
        idx
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check if a coordinate is in the graph.
    pub fn contains(&self, coordinate: &str) -> bool {
        self.index.contains_key(coordinate)
    }

    /// Look up a node by coordinate.
    pub fn node(&self, coordinate: &str) -> Option<&DependencyNode> {
        self.index.get(coordinate).map(|&idx| &self.graph[idx])
    }

    /// All nodes, in insertion (declaration) order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.graph.node_weights()
    }

    /// Coordinates `coordinate` requires, sorted.
    pub fn requires(&self, coordinate: &str) -> Vec<&str> {
        self.neighbors(coordinate, Direction::Outgoing)
    }

    /// Coordinates that require `coordinate`, sorted.
    pub fn dependents(&self, coordinate: &str) -> Vec<&str> {
        self.neighbors(coordinate, Direction::Incoming)
    }

    fn neighbors(&self, coordinate: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(coordinate) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].coordinate.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Nodes nothing else requires, sorted by coordinate.
    pub fn roots(&self) -> Vec<&DependencyNode> {
        let mut roots: Vec<&DependencyNode> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect();
        roots.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        roots
    }

    /// Nodes with dependencies before dependents.
    ///
    /// Among nodes whose requirements are all satisfied, the lexically
    /// smallest coordinate comes first, so the order only depends on the
    /// graph's contents.
    pub fn topological_order(&self) -> Vec<&DependencyNode> {
        let mut pending: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let count = self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count();
                (idx, count)
            })
            .collect();

        let mut ready: BTreeSet<(&str, NodeIndex)> = pending
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&idx, _)| (self.graph[idx].coordinate.as_str(), idx))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some((_, idx)) = ready.pop_first() {
            order.push(&self.graph[idx]);

            for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert((self.graph[dependent].coordinate.as_str(), dependent));
                    }
                }
            }
        }

        order
    }

    /// Three-colour DFS over nodes and edges in insertion order.
    ///
    /// Returns the coordinates from the re-entered node to the node that
    /// closed the cycle. The walk keeps its own stack, so chain length is
    /// bounded by memory rather than by the call stack.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let successors = |idx: NodeIndex| {
            let mut next: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
            next.sort_unstable();
            next
        };

        let mut colors = vec![Color::White; self.graph.node_count()];
        // (node, its successors, next successor to visit)
        let mut frames: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

        for root in self.graph.node_indices() {
            if colors[root.index()] != Color::White {
                continue;
            }
            colors[root.index()] = Color::Gray;
            frames.push((root, successors(root), 0));

            while let Some((idx, next, pos)) = frames.last_mut() {
                let Some(&n) = next.get(*pos) else {
                    colors[idx.index()] = Color::Black;
                    frames.pop();
                    continue;
                };
                *pos += 1;

                match colors[n.index()] {
                    Color::Gray => {
                        let start = frames.iter().position(|f| f.0 == n).unwrap_or(0);
                        return Some(
                            frames[start..]
                                .iter()
                                .map(|f| self.graph[f.0].coordinate.clone())
                                .collect(),
                        );
                    }
                    Color::White => {
                        colors[n.index()] = Color::Gray;
                        frames.push((n, successors(n), 0));
                    }
                    Color::Black => {}
                }
            }
        }
        None
    }
}

/// A dependency waiting to become a node.
struct Candidate<'a> {
    coordinate: &'a str,
    kind: DependencyKind,
    version: &'a str,
    requires: &'a [String],
    implied_by: Option<&'a str>,
}

/// Build the graph for a resolved manifest.
///
/// Checks run in this order: unresolved versions, conflicting pins,
/// requirements on unknown coordinates, cycles.
pub fn build(manifest: &Manifest, catalog: &PluginCatalog) -> Result<DependencyGraph, GraphError> {
    let mut candidates = Vec::new();
    for dep in &manifest.dependencies {
        let version = match &dep.version {
            VersionSpec::Literal(v) => v.as_str(),
            VersionSpec::Symbolic(key) => {
                return Err(GraphError::UnresolvedVersion {
                    coordinate: dep.coordinate.clone(),
                    key: key.clone(),
                })
            }
        };
        candidates.push(Candidate {
            coordinate: &dep.coordinate,
            kind: dep.kind,
            version,
            requires: &dep.requires,
            implied_by: None,
        });
    }

    // Implied entries without a version only annotate an existing coordinate.
    let mut annotations = Vec::new();
    for (plugin, meta) in catalog.applied(manifest) {
        for implied in &meta.implies {
            match &implied.version {
                Some(version) => candidates.push(Candidate {
                    coordinate: &implied.coordinate,
                    kind: implied.kind,
                    version,
                    requires: &implied.requires,
                    implied_by: Some(&plugin.id),
                }),
                None => annotations.push(implied),
            }
        }
    }

    check_conflicts(&candidates)?;

    let mut graph = DependencyGraph::default();
    for candidate in &candidates {
        if graph.contains(candidate.coordinate) {
            continue;
        }
        graph.add_node(DependencyNode {
            coordinate: candidate.coordinate.to_string(),
            kind: candidate.kind,
            version: candidate.version.to_string(),
            implied_by: candidate.implied_by.map(str::to_string),
        });
    }

    let edges = candidates
        .iter()
        .map(|c| (c.coordinate, c.requires))
        .chain(annotations.iter().filter_map(|implied| {
            if graph.contains(&implied.coordinate) {
                Some((implied.coordinate.as_str(), implied.requires.as_slice()))
            } else {
                tracing::debug!(
                    "skipping requirements of `{}`: not a dependency",
                    implied.coordinate
                );
                None
            }
        }));

    let mut pairs = Vec::new();
    for (from, requires) in edges {
        for to in requires {
            let Some(&to_idx) = graph.index.get(to.as_str()) else {
                return Err(GraphError::UnknownRequirement {
                    from: from.to_string(),
                    to: to.clone(),
                });
            };
            pairs.push((graph.index[from], to_idx));
        }
    }
    for (from, to) in pairs {
        graph.add_edge(from, to);
    }

    if let Some(cycle) = graph.find_cycle() {
        return Err(GraphError::Cycle { cycle });
    }

    tracing::debug!(
        "built dependency graph: {} nodes, {} edges",
        graph.len(),
        graph.graph.edge_count()
    );
    Ok(graph)
}

/// Fail on the first coordinate (in declaration order) pinned at more
/// than one version.
fn check_conflicts(candidates: &[Candidate<'_>]) -> Result<(), GraphError> {
    let mut pins: Vec<(&str, Vec<&str>)> = Vec::new();

    for candidate in candidates {
        match pins.iter_mut().find(|(c, _)| *c == candidate.coordinate) {
            Some((_, versions)) => {
                if !versions.contains(&candidate.version) {
                    versions.push(candidate.version);
                }
            }
            None => pins.push((candidate.coordinate, vec![candidate.version])),
        }
    }

    match pins.into_iter().find(|(_, versions)| versions.len() > 1) {
        Some((coordinate, versions)) => Err(GraphError::VersionConflict {
            coordinate: coordinate.to_string(),
            versions: versions.into_iter().map(str::to_string).collect(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ImpliedDependency, PluginMetadata};
    use crate::test_support::{
        notifications_catalog, resolved, ManifestFixture, FLUTTER_APP_MANIFEST,
        NOTIFICATIONS_PLUGIN,
    };

    fn coordinates<'a>(nodes: &[&'a DependencyNode]) -> Vec<&'a str> {
        nodes.iter().map(|n| n.coordinate.as_str()).collect()
    }

    #[test]
    fn test_flutter_app_graph() {
        let manifest = resolved(FLUTTER_APP_MANIFEST);
        let graph = build(&manifest, &PluginCatalog::new()).unwrap();

        assert_eq!(graph.len(), 2);
        let desugar = graph.node("com.android.tools:desugar_jdk_libs").unwrap();
        assert_eq!(desugar.kind, DependencyKind::Desugaring);
        assert_eq!(desugar.version, "2.0.4");
        assert_eq!(desugar.implied_by, None);
    }

    #[test]
    fn test_version_conflict() {
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"org.jetbrains.kotlin:kotlin-stdlib:1.9.22\")")
                .dependency("implementation(\"org.jetbrains.kotlin:kotlin-stdlib:1.9.0\")")
                .render(),
        );

        let err = build(&manifest, &PluginCatalog::new()).unwrap_err();
        assert_eq!(
            err,
            GraphError::VersionConflict {
                coordinate: "org.jetbrains.kotlin:kotlin-stdlib".to_string(),
                versions: vec!["1.9.22".to_string(), "1.9.0".to_string()],
            }
        );
    }

    #[test]
    fn test_same_version_twice_is_one_node() {
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"a:a:1.0\")")
                .dependency("implementation(\"a:a:1.0\")")
                .render(),
        );

        let graph = build(&manifest, &PluginCatalog::new()).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_cycle_path() {
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"a:a:1.0\") { requires(\"b:b\") }")
                .dependency("implementation(\"b:b:1.0\") { requires(\"a:a\") }")
                .render(),
        );

        let err = build(&manifest, &PluginCatalog::new()).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                cycle: vec!["a:a".to_string(), "b:b".to_string()],
            }
        );
    }

    #[test]
    fn test_cycle_path_starts_at_reentered_node() {
        // root -> a -> b -> c -> a
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"root:root:1\") { requires(\"a:a\") }")
                .dependency("implementation(\"a:a:1\") { requires(\"b:b\") }")
                .dependency("implementation(\"b:b:1\") { requires(\"c:c\") }")
                .dependency("implementation(\"c:c:1\") { requires(\"a:a\") }")
                .render(),
        );

        match build(&manifest, &PluginCatalog::new()).unwrap_err() {
            GraphError::Cycle { cycle } => assert_eq!(cycle, vec!["a:a", "b:b", "c:c"]),
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    /// `d0 -> d1 -> ... -> d{len-1}`, optionally closed back to `d0`.
    fn chain(len: usize, close: bool) -> Manifest {
        let mut fixture = ManifestFixture::new();
        for i in 0..len {
            let next = match (i + 1 < len, close) {
                (true, _) => Some(i + 1),
                (false, true) => Some(0),
                (false, false) => None,
            };
            let line = match next {
                Some(n) => format!("implementation(\"d:d{}:1\") {{ requires(\"d:d{}\") }}", i, n),
                None => format!("implementation(\"d:d{}:1\")", i),
            };
            fixture = fixture.dependency(&line);
        }
        resolved(&fixture.render())
    }

    #[test]
    fn test_long_requires_chain() {
        let graph = build(&chain(20_000, false), &PluginCatalog::new()).unwrap();
        let order = graph.topological_order();
        assert_eq!(order.len(), 20_000);
        assert_eq!(order[0].coordinate, "d:d19999");
    }

    #[test]
    fn test_long_cycle() {
        match build(&chain(20_000, true), &PluginCatalog::new()).unwrap_err() {
            GraphError::Cycle { cycle } => {
                assert_eq!(cycle.len(), 20_000);
                assert_eq!(cycle[0], "d:d0");
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_conflict_reported_before_cycle() {
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"a:a:1.0\") { requires(\"b:b\") }")
                .dependency("implementation(\"b:b:1.0\") { requires(\"a:a\") }")
                .dependency("implementation(\"b:b:2.0\")")
                .render(),
        );

        assert!(matches!(
            build(&manifest, &PluginCatalog::new()).unwrap_err(),
            GraphError::VersionConflict { .. }
        ));
    }

    #[test]
    fn test_unknown_requirement() {
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"a:a:1.0\") { requires(\"missing:lib\") }")
                .render(),
        );

        assert_eq!(
            build(&manifest, &PluginCatalog::new()).unwrap_err(),
            GraphError::UnknownRequirement {
                from: "a:a".to_string(),
                to: "missing:lib".to_string(),
            }
        );
    }

    #[test]
    fn test_unresolved_version() {
        let raw = ManifestFixture::new()
            .dependency("implementation(\"a:a:$a_version\")")
            .render();
        let manifest = crate::parser::parse(&raw).unwrap();

        assert_eq!(
            build(&manifest, &PluginCatalog::new()).unwrap_err(),
            GraphError::UnresolvedVersion {
                coordinate: "a:a".to_string(),
                key: "a_version".to_string(),
            }
        );
    }

    #[test]
    fn test_topological_order_ties_lexical() {
        // app requires both; zeta and alpha have no requirements.
        let manifest = resolved(
            &ManifestFixture::new()
                .dependency("implementation(\"com.example:app:1\") { requires(\"z:zeta\"); requires(\"a:alpha\") }")
                .dependency("implementation(\"z:zeta:1\")")
                .dependency("implementation(\"m:mid:1\") { requires(\"z:zeta\") }")
                .dependency("implementation(\"a:alpha:1\")")
                .render(),
        );

        let graph = build(&manifest, &PluginCatalog::new()).unwrap();
        assert_eq!(
            coordinates(&graph.topological_order()),
            vec!["a:alpha", "z:zeta", "com.example:app", "m:mid"]
        );
        assert_eq!(graph.requires("com.example:app"), vec!["a:alpha", "z:zeta"]);
        assert_eq!(graph.dependents("z:zeta"), vec!["com.example:app", "m:mid"]);
        assert_eq!(
            coordinates(&graph.roots()),
            vec!["com.example:app", "m:mid"]
        );
    }

    #[test]
    fn test_plugin_implied_dependency() {
        let manifest = resolved(
            &ManifestFixture::new()
                .desugaring(true)
                .plugin(&format!("id(\"{}\")", NOTIFICATIONS_PLUGIN))
                .render(),
        );

        let graph = build(&manifest, &notifications_catalog()).unwrap();
        let node = graph.node("com.android.tools:desugar_jdk_libs").unwrap();
        assert_eq!(node.implied_by.as_deref(), Some(NOTIFICATIONS_PLUGIN));
        assert_eq!(node.kind, DependencyKind::Desugaring);
    }

    #[test]
    fn test_implied_pin_conflicts_with_declared() {
        let manifest = resolved(
            &ManifestFixture::new()
                .desugaring(true)
                .plugin(&format!("id(\"{}\")", NOTIFICATIONS_PLUGIN))
                .dependency("coreLibraryDesugaring(\"com.android.tools:desugar_jdk_libs:2.1.0\")")
                .render(),
        );

        match build(&manifest, &notifications_catalog()).unwrap_err() {
            GraphError::VersionConflict { versions, .. } => {
                assert_eq!(versions, vec!["2.1.0", "2.0.4"]);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_unversioned_implied_entry_adds_edges() {
        let catalog = PluginCatalog::new().with(
            "com.example.plugin",
            PluginMetadata {
                implies: vec![ImpliedDependency {
                    coordinate: "a:a".to_string(),
                    kind: DependencyKind::Implementation,
                    version: None,
                    requires: vec!["b:b".to_string()],
                }],
                ..Default::default()
            },
        );
        let manifest = resolved(
            &ManifestFixture::new()
                .plugin("id(\"com.example.plugin\")")
                .dependency("implementation(\"a:a:1\")")
                .dependency("implementation(\"b:b:1\")")
                .render(),
        );

        let graph = build(&manifest, &catalog).unwrap();
        assert_eq!(graph.requires("a:a"), vec!["b:b"]);
        assert_eq!(coordinates(&graph.topological_order()), vec!["b:b", "a:a"]);
    }
}
