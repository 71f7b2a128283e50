//! fragment_assembly library
//!
//! Assembles DNA fragments that share homologous regions into linear and
//! circular constructs: an overlap graph over both orientations of every
//! fragment, enumeration and validation of candidate paths and cycles, and
//! reconstruction of the joined sequence with its features carried along.

pub mod assembly;
pub mod common_substrings;
pub mod location;
pub mod overlap;
pub mod paths;
pub mod reconstruct;
pub mod record;

pub use assembly::{Assembly, AssemblyConfig};
pub use common_substrings::{
    common_sub_strings, terminal_overlap, OverlapAlgorithm, SharedSubstring,
};
pub use location::{shift_location, Location, Span, Strand};
pub use overlap::{
    add_edges_from_match, create_overlap_graph, EdgeKey, Node, OverlapConfig, OverlapEdge,
    OverlapGraph, DEFAULT_LIMIT,
};
pub use paths::{remove_subassemblies, validate_assembly, AssemblyPath};
pub use reconstruct::{assemble, AssemblyError};
pub use record::{Feature, SeqRecord};
