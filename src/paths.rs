//! Enumeration of candidate assemblies over the overlap graph.
//!
//! Linear candidates are edge-simple paths between a set of start nodes and a
//! set of end nodes; circular candidates are node-simple cycles expanded over
//! every combination of parallel edges. Both are then filtered by
//! [`validate_assembly`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::overlap::{EdgeKey, Node, OverlapGraph};

/// One candidate assembly: the ordered edges joining its fragments.
///
/// Two candidates are equal exactly when their edge sequences are equal. A
/// candidate is circular when its first edge leaves the node its last edge
/// enters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyPath {
    edges: Vec<EdgeKey>,
}

impl AssemblyPath {
    pub fn new(edges: Vec<EdgeKey>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn is_circular(&self) -> bool {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => first.source == last.target,
            _ => false,
        }
    }

    /// Visited nodes in order; a circular path does not repeat its first node.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.edges.iter().map(|edge| edge.source).collect();
        if let Some(last) = self.edges.last() {
            if !self.is_circular() {
                nodes.push(last.target);
            }
        }
        nodes
    }

    /// Whether this path occurs as a contiguous run inside `other`.
    pub fn is_subassembly_of(&self, other: &AssemblyPath) -> bool {
        is_sublist(&self.edges, &other.edges)
    }
}

impl fmt::Display for AssemblyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, edge) in self.edges.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{edge}")?;
        }
        if self.edges.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Whether `sublist` appears as a contiguous run inside `list`.
pub fn is_sublist<T: PartialEq>(sublist: &[T], list: &[T]) -> bool {
    if sublist.is_empty() {
        return true;
    }
    list.windows(sublist.len()).any(|window| window == sublist)
}

/// Rotate a cycle so that its element of smallest absolute value comes first.
///
/// Ties keep the earliest occurrence.
pub fn canonical_rotation(cycle: &[Node]) -> Vec<Node> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, node)| node.unsigned_abs())
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[pivot..]);
    rotated.extend_from_slice(&cycle[..pivot]);
    rotated
}

/// All edge-simple paths that leave one of `starts` and stop at a member of `ends`.
///
/// Paths never revisit a node; parallel edges yield distinct paths. Output
/// order is depth-first: from each start in turn, every extension of a path
/// is reported before the path itself. A start node in `ends` reports the
/// empty path.
pub fn all_simple_edge_paths(
    graph: &OverlapGraph,
    starts: &[Node],
    ends: &HashSet<Node>,
) -> Vec<Vec<EdgeKey>> {
    fn extend(
        graph: &OverlapGraph,
        node: Node,
        ends: &HashSet<Node>,
        visited: &mut HashSet<Node>,
        path: &mut Vec<EdgeKey>,
        paths: &mut Vec<Vec<EdgeKey>>,
    ) {
        for edge in graph.out_edges(node) {
            if visited.contains(&edge.target) {
                continue;
            }
            visited.insert(edge.target);
            path.push(edge.edge_key());
            extend(graph, edge.target, ends, visited, path, paths);
            path.pop();
            visited.remove(&edge.target);
        }
        if ends.contains(&node) {
            paths.push(path.clone());
        }
    }

    let mut paths = Vec::new();
    for &start in starts {
        if !graph.contains_node(start) {
            continue;
        }
        let mut visited = HashSet::from([start]);
        let mut path = Vec::new();
        extend(graph, start, ends, &mut visited, &mut path, &mut paths);
    }
    paths
}

/// All elementary cycles of the graph as node lists.
///
/// Each cycle is reported once, rooted at its node that was inserted into
/// the graph first. Parallel edges do not multiply cycles here; see
/// [`cycle_to_circular_assemblies`].
pub fn simple_cycles(graph: &OverlapGraph) -> Vec<Vec<Node>> {
    fn search(
        graph: &OverlapGraph,
        root: Node,
        node: Node,
        rank: &HashMap<Node, usize>,
        on_path: &mut HashSet<Node>,
        path: &mut Vec<Node>,
        cycles: &mut Vec<Vec<Node>>,
    ) {
        for next in graph.successors(node) {
            if next == root {
                cycles.push(path.clone());
            } else if rank.get(&next).is_some_and(|r| *r > rank[&root])
                && !on_path.contains(&next)
            {
                on_path.insert(next);
                path.push(next);
                search(graph, root, next, rank, on_path, path, cycles);
                path.pop();
                on_path.remove(&next);
            }
        }
    }

    let rank: HashMap<Node, usize> = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, &node)| (node, idx))
        .collect();

    let mut cycles = Vec::new();
    for &root in graph.nodes() {
        let mut on_path = HashSet::from([root]);
        let mut path = vec![root];
        search(graph, root, root, &rank, &mut on_path, &mut path, &mut cycles);
    }
    cycles
}

/// Expand a node cycle into one candidate per choice of parallel edges.
///
/// The last pair of the cycle varies fastest. A pair with no edge yields no
/// candidates.
pub fn cycle_to_circular_assemblies(graph: &OverlapGraph, cycle: &[Node]) -> Vec<AssemblyPath> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let mut combinations: Vec<Vec<EdgeKey>> = vec![Vec::new()];
    for (idx, &source) in cycle.iter().enumerate() {
        let target = cycle[(idx + 1) % cycle.len()];
        let choices: Vec<EdgeKey> = graph
            .edges_between(source, target)
            .map(|edge| edge.edge_key())
            .collect();
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                choices.iter().map(move |choice| {
                    let mut extended = prefix.clone();
                    extended.push(choice.clone());
                    extended
                })
            })
            .collect();
    }
    combinations.into_iter().map(AssemblyPath::new).collect()
}

/// Check that a candidate describes a physically possible assembly.
///
/// Rejects the empty path, paths that do not use every fragment when
/// `use_all_fragments` is set, and paths where two consecutive joins on one
/// fragment are out of order or coincide. Unknown edges also reject.
pub fn validate_assembly(
    graph: &OverlapGraph,
    assembly: &AssemblyPath,
    fragment_count: usize,
    use_all_fragments: bool,
) -> bool {
    if assembly.is_empty() {
        return false;
    }
    let Some(edges) = assembly
        .edges()
        .iter()
        .map(|key| graph.edge(key))
        .collect::<Option<Vec<_>>>()
    else {
        log::debug!("rejecting {assembly}: unknown edge");
        return false;
    };

    let is_circular = assembly.is_circular();
    let joins = edges.len() - usize::from(is_circular);
    if use_all_fragments && joins + 1 != fragment_count {
        return false;
    }

    let pair_count = if is_circular {
        edges.len()
    } else {
        edges.len() - 1
    };
    for idx in 0..pair_count {
        let (left, right) = (edges[idx], edges[(idx + 1) % edges.len()]);
        let (Some(into), Some(out_of)) = (
            left.locations[1].last_part(),
            right.locations[0].first_part(),
        ) else {
            log::debug!("rejecting {assembly}: {} has an empty overlap", left.edge_key());
            return false;
        };
        // The join into the shared fragment must end before the join out of it.
        if into.end >= out_of.end {
            log::debug!(
                "rejecting {assembly}: {} and {} are out of order",
                left.edge_key(),
                right.edge_key()
            );
            return false;
        }
    }
    true
}

/// Drop every assembly contained in a longer (or earlier equal-length) one.
///
/// Output is sorted longest first; equal lengths keep their input order.
pub fn remove_subassemblies(mut assemblies: Vec<AssemblyPath>) -> Vec<AssemblyPath> {
    assemblies.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut filtered: Vec<AssemblyPath> = Vec::with_capacity(assemblies.len());
    for assembly in assemblies {
        if !filtered.iter().any(|kept| assembly.is_subassembly_of(kept)) {
            filtered.push(assembly);
        }
    }
    filtered
}

/// Constraints applied while enumerating assemblies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConstraints {
    /// Number of input fragments.
    pub fragment_count: usize,
    /// Linear assemblies start with the first fragment and end with the last.
    pub use_fragment_order: bool,
    /// Every fragment must be used.
    pub use_all_fragments: bool,
}

/// Valid linear assemblies with sub-assemblies removed.
///
/// Without fragment order, every path starts on a forward node so that each
/// assembly is not also reported as its reverse complement.
pub fn linear_assemblies(
    graph: &OverlapGraph,
    constraints: SearchConstraints,
) -> Vec<AssemblyPath> {
    let (starts, ends): (Vec<Node>, HashSet<Node>) = if constraints.use_fragment_order {
        let last = constraints.fragment_count as Node;
        (vec![1, -1], HashSet::from([last, -last]))
    } else {
        (
            graph.nodes().iter().copied().filter(|&node| node > 0).collect(),
            graph.nodes().iter().copied().collect(),
        )
    };

    let candidates = all_simple_edge_paths(graph, &starts, &ends);
    log::debug!("{} linear paths before validation", candidates.len());

    let valid: Vec<AssemblyPath> = candidates
        .into_iter()
        .map(AssemblyPath::new)
        .filter(|assembly| {
            validate_assembly(
                graph,
                assembly,
                constraints.fragment_count,
                constraints.use_all_fragments,
            )
        })
        .collect();

    let assemblies = remove_subassemblies(valid);
    log::info!("{} linear assemblies", assemblies.len());
    assemblies
}

/// Valid circular assemblies, one per distinct construct.
///
/// Each cycle is rotated to start at the fragment with the lowest index and
/// kept only when that fragment is forward, which removes rotations and the
/// reverse-complement twin of every construct.
pub fn circular_assemblies(
    graph: &OverlapGraph,
    constraints: SearchConstraints,
) -> Vec<AssemblyPath> {
    let cycles = simple_cycles(graph);
    log::debug!("{} simple cycles in overlap graph", cycles.len());

    let assemblies: Vec<AssemblyPath> = cycles
        .iter()
        .map(|cycle| canonical_rotation(cycle))
        .filter(|cycle| cycle.first().is_some_and(|&node| node > 0))
        .flat_map(|cycle| cycle_to_circular_assemblies(graph, &cycle))
        .filter(|assembly| {
            validate_assembly(
                graph,
                assembly,
                constraints.fragment_count,
                constraints.use_all_fragments,
            )
        })
        .collect();

    log::info!("{} circular assemblies", assemblies.len());
    assemblies
}
