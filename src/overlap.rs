//! Overlap graph construction.
//!
//! Nodes are signed fragment indices: `+i` is fragment `i` (1-based) as
//! given, `-i` is its reverse complement. Every shared substring found
//! between two fragments becomes four directed edges so that both join
//! directions are available in both orientations.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::common_substrings::{OverlapAlgorithm, SharedSubstring};
use crate::location::{shift_location, Location, Strand};
use crate::record::SeqRecord;

/// Signed fragment index; the sign is the orientation.
pub type Node = i32;

/// Default shortest homology considered a joint.
pub const DEFAULT_LIMIT: usize = 25;

/// Identity of one edge: `(source, target, key)`.
///
/// The key encodes both overlap locations as
/// `u[start:end](strand):v[start:end](strand)`, which keeps parallel edges
/// between the same pair of nodes apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: Node,
    pub target: Node,
    pub key: String,
}

impl EdgeKey {
    pub fn new(source: Node, target: Node, key: impl Into<String>) -> Self {
        Self {
            source,
            target,
            key: key.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, '{}')", self.source, self.target, self.key)
    }
}

/// A directed overlap between two oriented fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapEdge {
    pub source: Node,
    pub target: Node,
    pub key: String,
    /// Overlap span on the source sequence, then on the target sequence.
    pub locations: [Location; 2],
}

impl OverlapEdge {
    /// Length of the shared region.
    pub fn overlap_len(&self) -> usize {
        self.locations[1].len()
    }

    pub fn edge_key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target, self.key.clone())
    }
}

/// Format the key of an edge from `source` to `target` over `locations`.
pub fn edge_key_string(source: Node, target: Node, locations: &[Location; 2]) -> String {
    format!("{source}{}:{target}{}", locations[0], locations[1])
}

/// Directed multigraph of oriented fragments and their overlaps.
///
/// Nodes and edges keep insertion order, which fixes the order in which
/// assemblies are enumerated.
#[derive(Debug, Clone, Default)]
pub struct OverlapGraph {
    nodes: Vec<Node>,
    sequences: HashMap<Node, SeqRecord>,
    edges: Vec<OverlapEdge>,
    successors: HashMap<Node, Vec<usize>>,
    index: HashMap<EdgeKey, usize>,
}

impl OverlapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` carrying `sequence`; re-adding a node replaces its sequence.
    pub fn add_node(&mut self, node: Node, sequence: SeqRecord) {
        if self.sequences.insert(node, sequence).is_none() {
            self.nodes.push(node);
            self.successors.entry(node).or_default();
        }
    }

    /// Add an edge and return its identity.
    ///
    /// An edge with the same `(source, target, key)` is replaced in place,
    /// so reporting one overlap twice never creates a parallel edge.
    pub fn add_edge(&mut self, source: Node, target: Node, locations: [Location; 2]) -> EdgeKey {
        let key = edge_key_string(source, target, &locations);
        let edge_key = EdgeKey::new(source, target, key.clone());
        let edge = OverlapEdge {
            source,
            target,
            key,
            locations,
        };

        if let Some(&idx) = self.index.get(&edge_key) {
            self.edges[idx] = edge;
        } else {
            let idx = self.edges.len();
            self.edges.push(edge);
            self.successors.entry(source).or_default().push(idx);
            self.index.insert(edge_key.clone(), idx);
        }
        edge_key
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.sequences.contains_key(&node)
    }

    /// Sequence of a node in its orientation.
    pub fn sequence(&self, node: Node) -> Option<&SeqRecord> {
        self.sequences.get(&node)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &OverlapEdge> {
        self.edges.iter()
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&OverlapEdge> {
        self.index.get(key).map(|&idx| &self.edges[idx])
    }

    /// Outgoing edges of `node` in insertion order.
    pub fn out_edges(&self, node: Node) -> impl Iterator<Item = &OverlapEdge> {
        self.successors
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Parallel edges from `source` to `target` in insertion order.
    pub fn edges_between(&self, source: Node, target: Node) -> impl Iterator<Item = &OverlapEdge> {
        self.out_edges(source).filter(move |edge| edge.target == target)
    }

    /// Distinct successors of `node`, first-seen order.
    pub fn successors(&self, node: Node) -> Vec<Node> {
        let mut seen = Vec::new();
        for edge in self.out_edges(node) {
            if !seen.contains(&edge.target) {
                seen.push(edge.target);
            }
        }
        seen
    }
}

/// Options that govern overlap graph construction.
#[derive(Debug, Clone, Copy)]
pub struct OverlapConfig {
    /// Shortest shared substring recorded as an overlap.
    pub limit: usize,
    /// Match fragment pairs on a thread pool (requires the `parallel` feature).
    pub use_threads: bool,
    /// Worker count when threading is enabled.
    pub max_workers: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            use_threads: false,
            max_workers: 1,
        }
    }
}

/// Record one raw match as its four directed edges.
///
/// `index_first` is always forward; `index_secnd` carries the orientation of
/// the second sequence the match was found on. `first_len` and `secnd_len`
/// are the sequence lengths the match coordinates refer to.
pub fn add_edges_from_match(
    graph: &mut OverlapGraph,
    shared: SharedSubstring,
    index_first: Node,
    index_secnd: Node,
    first_len: usize,
    secnd_len: usize,
) {
    let SharedSubstring {
        start_a,
        start_b,
        length,
    } = shared;

    // A zero shift only normalises origin-spanning spans.
    let locs = [
        shift_location(
            &Location::simple(start_a, start_a + length, Strand::Forward),
            0,
            first_len,
        ),
        shift_location(
            &Location::simple(start_b, start_b + length, Strand::Forward),
            0,
            secnd_len,
        ),
    ];
    let rc_locs = [locs[0].flip(first_len), locs[1].flip(secnd_len)];

    let [loc_first, loc_secnd] = locs;
    let [rc_first, rc_secnd] = rc_locs;

    let combinations = [
        (index_first, index_secnd, [loc_first.clone(), loc_secnd.clone()]),
        (index_secnd, index_first, [loc_secnd, loc_first]),
        (-index_first, -index_secnd, [rc_first.clone(), rc_secnd.clone()]),
        (-index_secnd, -index_first, [rc_secnd, rc_first]),
    ];
    for (source, target, locations) in combinations {
        let edge = graph.add_edge(source, target, locations);
        log::trace!("added edge {edge}");
    }
}

/// Matches found for one unordered pair of fragments.
struct PairMatches {
    first: Node,
    secnd: Node,
    forward: Vec<SharedSubstring>,
    reverse: Vec<SharedSubstring>,
}

fn match_pair<A>(
    fragments: &[SeqRecord],
    upper: &[(Vec<u8>, Vec<u8>)],
    pair: (usize, usize),
    algorithm: &A,
    limit: usize,
) -> PairMatches
where
    A: OverlapAlgorithm + ?Sized,
{
    let (i, j) = pair;
    let (first_fwd, _) = &upper[i];
    let (secnd_fwd, secnd_rev) = &upper[j];
    log::debug!(
        "matching {} against {}",
        fragments[i].name(),
        fragments[j].name()
    );
    PairMatches {
        first: (i + 1) as Node,
        secnd: (j + 1) as Node,
        forward: algorithm.find_overlaps(first_fwd, secnd_fwd, limit),
        reverse: algorithm.find_overlaps(first_fwd, secnd_rev, limit),
    }
}

/// Build the overlap graph for `fragments`.
///
/// Every unordered pair `i < j` is matched twice: both forward, and the first
/// forward against the second reverse-complemented. Matching is
/// case-insensitive. Self-overlaps are never searched.
pub fn create_overlap_graph<A>(
    fragments: &[SeqRecord],
    algorithm: &A,
    config: OverlapConfig,
) -> OverlapGraph
where
    A: OverlapAlgorithm + ?Sized,
{
    let mut graph = OverlapGraph::new();
    for (idx, fragment) in fragments.iter().enumerate() {
        graph.add_node((idx + 1) as Node, fragment.clone());
    }
    for (idx, fragment) in fragments.iter().enumerate() {
        graph.add_node(-((idx + 1) as Node), fragment.reverse_complement());
    }

    if fragments.len() < 2 {
        return graph;
    }

    let upper: Vec<(Vec<u8>, Vec<u8>)> = fragments
        .iter()
        .map(|fragment| {
            let fwd = fragment.seq().to_ascii_uppercase();
            let rev = bio::alphabets::dna::revcomp(&fwd);
            (fwd, rev)
        })
        .collect();

    let pairs: Vec<(usize, usize)> = (0..fragments.len())
        .flat_map(|i| ((i + 1)..fragments.len()).map(move |j| (i, j)))
        .collect();

    log::info!(
        "Matching {} fragment pairs with {} (limit {} bp)...",
        pairs.len(),
        algorithm.name(),
        config.limit
    );

    let run =
        |pair: &(usize, usize)| match_pair(fragments, &upper, *pair, algorithm, config.limit);

    let results: Vec<PairMatches> = if config.use_threads {
        #[cfg(feature = "parallel")]
        {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_workers.max(1))
                .build()
            {
                Ok(pool) => pool.install(|| pairs.par_iter().map(run).collect()),
                Err(error) => {
                    log::warn!("Failed to build thread pool ({error}); matching sequentially");
                    pairs.iter().map(run).collect()
                }
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            log::warn!(
                "Threaded overlap construction requested, but the 'parallel' feature is not enabled; falling back to sequential mode"
            );
            pairs.iter().map(run).collect()
        }
    } else {
        pairs.iter().map(run).collect()
    };

    for matches in results {
        let first_len = fragments[(matches.first - 1) as usize].len();
        let secnd_len = fragments[(matches.secnd - 1) as usize].len();
        for shared in matches.forward {
            add_edges_from_match(
                &mut graph,
                shared,
                matches.first,
                matches.secnd,
                first_len,
                secnd_len,
            );
        }
        for shared in matches.reverse {
            add_edges_from_match(
                &mut graph,
                shared,
                matches.first,
                -matches.secnd,
                first_len,
                secnd_len,
            );
        }
    }

    log::info!(
        "Overlap graph created: {} nodes, {} edges.",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_substrings::common_sub_strings;

    fn example_pair() -> Vec<SeqRecord> {
        vec![
            SeqRecord::new("a", "AacgatCAtgctcc"),
            SeqRecord::new("b", "TtgctccTAAattctgc"),
        ]
    }

    fn keys(graph: &OverlapGraph) -> Vec<String> {
        graph.edges().map(|edge| edge.edge_key().to_string()).collect()
    }

    #[test]
    fn one_match_adds_four_edges() {
        let config = OverlapConfig {
            limit: 5,
            ..Default::default()
        };
        let graph = create_overlap_graph(&example_pair(), &common_sub_strings, config);

        assert_eq!(graph.nodes(), &[1, 2, -1, -2]);
        assert_eq!(
            keys(&graph),
            vec![
                "(1, 2, '1[8:14](+):2[1:7](+)')",
                "(2, 1, '2[1:7](+):1[8:14](+)')",
                "(-1, -2, '-1[0:6](-):-2[10:16](-)')",
                "(-2, -1, '-2[10:16](-):-1[0:6](-)')",
            ]
        );
        for edge in graph.edges() {
            assert_eq!(edge.locations[0].len(), 6);
            assert_eq!(edge.overlap_len(), 6);
        }
    }

    #[test]
    fn reverse_node_holds_reverse_complement() {
        let graph =
            create_overlap_graph(&example_pair(), &common_sub_strings, OverlapConfig::default());
        assert_eq!(
            graph.sequence(-1).map(|r| r.seq_str().into_owned()),
            Some("ggagcaTGatcgtT".to_string())
        );
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn reverse_matches_use_negative_second_node() {
        // Second fragment is the reverse complement of a region of the first.
        let fragments = vec![
            SeqRecord::new("x", "GGGGGACGTTAGCAT"),
            SeqRecord::new("y", "ATGCTAACGTCCTTT"),
        ];
        let config = OverlapConfig {
            limit: 8,
            ..Default::default()
        };
        let graph = create_overlap_graph(&fragments, &common_sub_strings, config);
        let edge_nodes: Vec<(Node, Node)> = graph.edges().map(|e| (e.source, e.target)).collect();
        assert_eq!(edge_nodes, vec![(1, -2), (-2, 1), (-1, 2), (2, -1)]);
    }

    #[test]
    fn duplicate_matches_do_not_create_parallel_edges() {
        let twice = |_: &[u8], _: &[u8], _: usize| {
            vec![SharedSubstring::new(8, 1, 6), SharedSubstring::new(8, 1, 6)]
        };
        let config = OverlapConfig {
            limit: 5,
            ..Default::default()
        };
        let graph = create_overlap_graph(&example_pair(), &twice, config);
        // Forward and reverse matching both report the same raw match.
        assert_eq!(graph.edge_count(), 8);
        assert_eq!(graph.edges_between(1, 2).count(), 1);
        assert_eq!(graph.edges_between(1, -2).count(), 1);
    }

    #[test]
    fn successors_are_distinct() {
        let mut graph = OverlapGraph::new();
        graph.add_node(1, SeqRecord::new("a", "ACGTACGT"));
        graph.add_node(2, SeqRecord::new("b", "ACGTACGT"));
        graph.add_edge(
            1,
            2,
            [
                Location::simple(0, 4, Strand::Forward),
                Location::simple(4, 8, Strand::Forward),
            ],
        );
        graph.add_edge(
            1,
            2,
            [
                Location::simple(4, 8, Strand::Forward),
                Location::simple(0, 4, Strand::Forward),
            ],
        );
        assert_eq!(graph.successors(1), vec![2]);
        assert_eq!(graph.edges_between(1, 2).count(), 2);
        assert!(graph.successors(2).is_empty());
    }
}
