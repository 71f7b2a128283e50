//! High level entry point: build the overlap graph once, then enumerate and
//! materialise assemblies from it.

use std::fmt;

use crate::common_substrings::{common_sub_strings, OverlapAlgorithm};
use crate::overlap::{create_overlap_graph, OverlapConfig, OverlapGraph, DEFAULT_LIMIT};
use crate::paths::{self, AssemblyPath, SearchConstraints};
use crate::reconstruct::{self, AssemblyError};
use crate::record::SeqRecord;

/// Options for an [`Assembly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Shortest shared substring that counts as an overlap.
    pub limit: usize,
    /// Linear assemblies must start with the first fragment and end with the last.
    pub use_fragment_order: bool,
    /// Every fragment must appear exactly once.
    pub use_all_fragments: bool,
    /// Match fragment pairs on a thread pool (requires the `parallel` feature).
    pub use_threads: bool,
    /// Worker count when threading is enabled.
    pub max_workers: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            use_fragment_order: true,
            use_all_fragments: false,
            use_threads: false,
            max_workers: 1,
        }
    }
}

impl AssemblyConfig {
    fn overlap_config(&self) -> OverlapConfig {
        OverlapConfig {
            limit: self.limit,
            use_threads: self.use_threads,
            max_workers: self.max_workers,
        }
    }
}

/// A set of fragments together with the overlap graph built from them.
///
/// The graph is built once in the constructor and only read afterwards, so
/// an `Assembly` can be queried from several threads at once.
#[derive(Debug, Clone)]
pub struct Assembly {
    fragments: Vec<SeqRecord>,
    config: AssemblyConfig,
    graph: OverlapGraph,
    algorithm: String,
}

impl Assembly {
    /// Build with the default [`common_sub_strings`] matcher.
    pub fn new(fragments: Vec<SeqRecord>, config: AssemblyConfig) -> Self {
        Self::with_algorithm(fragments, config, &common_sub_strings)
    }

    /// Build with a caller supplied matcher.
    pub fn with_algorithm<A>(
        fragments: Vec<SeqRecord>,
        config: AssemblyConfig,
        algorithm: &A,
    ) -> Self
    where
        A: OverlapAlgorithm + ?Sized,
    {
        let graph = create_overlap_graph(&fragments, algorithm, config.overlap_config());
        Self {
            fragments,
            config,
            graph,
            algorithm: algorithm.name().to_string(),
        }
    }

    pub fn graph(&self) -> &OverlapGraph {
        &self.graph
    }

    pub fn fragments(&self) -> &[SeqRecord] {
        &self.fragments
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    fn constraints(&self) -> SearchConstraints {
        SearchConstraints {
            fragment_count: self.fragments.len(),
            use_fragment_order: self.config.use_fragment_order,
            use_all_fragments: self.config.use_all_fragments,
        }
    }

    /// Whether `assembly` is a physically possible join under this configuration.
    pub fn validate_assembly(&self, assembly: &AssemblyPath) -> bool {
        paths::validate_assembly(
            &self.graph,
            assembly,
            self.fragments.len(),
            self.config.use_all_fragments,
        )
    }

    /// Drop assemblies contained in longer ones; see [`paths::remove_subassemblies`].
    pub fn remove_subassemblies(&self, assemblies: Vec<AssemblyPath>) -> Vec<AssemblyPath> {
        paths::remove_subassemblies(assemblies)
    }

    pub fn get_linear_assemblies(&self) -> Vec<AssemblyPath> {
        paths::linear_assemblies(&self.graph, self.constraints())
    }

    pub fn get_circular_assemblies(&self) -> Vec<AssemblyPath> {
        paths::circular_assemblies(&self.graph, self.constraints())
    }

    /// Materialise one previously enumerated assembly.
    pub fn assemble(&self, assembly: &AssemblyPath) -> Result<SeqRecord, AssemblyError> {
        reconstruct::assemble(&self.graph, assembly)
    }

    pub fn assemble_linear(&self) -> Result<Vec<SeqRecord>, AssemblyError> {
        self.get_linear_assemblies()
            .iter()
            .map(|assembly| self.assemble(assembly))
            .collect()
    }

    pub fn assemble_circular(&self) -> Result<Vec<SeqRecord>, AssemblyError> {
        self.get_circular_assemblies()
            .iter()
            .map(|assembly| self.assemble(assembly))
            .collect()
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths: Vec<String> = self
            .fragments
            .iter()
            .map(|fragment| format!("{}bp", fragment.len()))
            .collect();
        writeln!(f, "Assembly")?;
        writeln!(f, "fragments..: {}", lengths.join(" "))?;
        writeln!(f, "limit(bp)..: {}", self.config.limit)?;
        writeln!(f, "G.nodes....: {}", self.graph.node_count())?;
        write!(f, "algorithm..: {}", self.algorithm)
    }
}
