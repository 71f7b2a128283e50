//! Materialisation of a validated assembly into one sequence record.

use crate::location::{shift_location, Location};
use crate::overlap::{EdgeKey, Node, OverlapEdge, OverlapGraph};
use crate::paths::AssemblyPath;
use crate::record::{Feature, SeqRecord};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Assembly has no edges")]
    EmptyAssembly,
    #[error("Edge not in overlap graph: {0}")]
    UnknownEdge(EdgeKey),
    #[error("Node not in overlap graph: {0}")]
    UnknownNode(Node),
    #[error("Overlap of {overlap} bp is longer than the {available} bp it joins")]
    OverlapTooLong { overlap: usize, available: usize },
}

/// The part one fragment contributes to an assembly.
///
/// `left` is the overlap joining it to its predecessor and `right` the one
/// joining it to its successor, both measured on this fragment. The free ends
/// of a linear assembly have no overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfragment {
    pub node: Node,
    pub left: Option<Location>,
    pub right: Option<Location>,
}

fn resolve_edges<'g>(
    graph: &'g OverlapGraph,
    assembly: &AssemblyPath,
) -> Result<Vec<&'g OverlapEdge>, AssemblyError> {
    if assembly.is_empty() {
        return Err(AssemblyError::EmptyAssembly);
    }
    assembly
        .edges()
        .iter()
        .map(|key| {
            graph
                .edge(key)
                .ok_or_else(|| AssemblyError::UnknownEdge(key.clone()))
        })
        .collect()
}

/// Per-fragment view of an assembly.
///
/// A linear assembly of `k` edges yields `k + 1` entries; a circular one
/// yields `k`, starting with the fragment its first edge leaves.
pub fn subfragment_representation(
    graph: &OverlapGraph,
    assembly: &AssemblyPath,
) -> Result<Vec<Subfragment>, AssemblyError> {
    let edges = resolve_edges(graph, assembly)?;
    let mut subfragments = Vec::with_capacity(edges.len() + 1);

    let joins = |left: &OverlapEdge, right: &OverlapEdge| Subfragment {
        node: left.target,
        left: Some(left.locations[1].clone()),
        right: Some(right.locations[0].clone()),
    };

    if assembly.is_circular() {
        let last = edges[edges.len() - 1];
        subfragments.push(joins(last, edges[0]));
    } else {
        subfragments.push(Subfragment {
            node: edges[0].source,
            left: None,
            right: Some(edges[0].locations[0].clone()),
        });
    }
    for pair in edges.windows(2) {
        subfragments.push(joins(pair[0], pair[1]));
    }
    if !assembly.is_circular() {
        let last = edges[edges.len() - 1];
        subfragments.push(Subfragment {
            node: last.target,
            left: Some(last.locations[1].clone()),
            right: None,
        });
    }
    Ok(subfragments)
}

/// Slice every fragment down to the region it contributes.
///
/// The slice starts where the left overlap starts and ends where the right
/// overlap ends, so both overlaps stay on the subfragment.
pub fn assembly_subfragments(
    graph: &OverlapGraph,
    subfragments: &[Subfragment],
) -> Result<Vec<SeqRecord>, AssemblyError> {
    subfragments
        .iter()
        .map(|sub| {
            let record = graph
                .sequence(sub.node)
                .ok_or(AssemblyError::UnknownNode(sub.node))?;
            let start = sub
                .left
                .as_ref()
                .and_then(Location::first_part)
                .map_or(0, |part| part.start);
            let end = sub.right.as_ref().and_then(Location::last_part).map(|part| part.end);
            Ok(record.slice(start, end))
        })
        .collect()
}

/// Join the fragments of `assembly` into one record.
///
/// The assembly must already have passed
/// [`validate_assembly`](crate::paths::validate_assembly); ordering is not
/// checked again here. Each subfragment is appended without its leading
/// overlap and its features are moved along with it. A circular assembly also
/// loses the closing overlap at the end, and features that run past the new
/// end are wrapped across the origin.
pub fn assemble(
    graph: &OverlapGraph,
    assembly: &AssemblyPath,
) -> Result<SeqRecord, AssemblyError> {
    let edges = resolve_edges(graph, assembly)?;
    let overlaps: Vec<usize> = edges.iter().map(|edge| edge.overlap_len()).collect();
    let representation = subfragment_representation(graph, assembly)?;
    let subfragments = assembly_subfragments(graph, &representation)?;

    let mut pieces = subfragments.into_iter();
    let Some(first) = pieces.next() else {
        return Err(AssemblyError::EmptyAssembly);
    };
    let (first_name, mut seq, mut features, _) = first.into_parts();
    let mut names = vec![first_name];

    for (fragment, &overlap) in pieces.zip(&overlaps) {
        let available = seq.len().min(fragment.len());
        if overlap > available {
            return Err(AssemblyError::OverlapTooLong { overlap, available });
        }
        let offset = seq.len() as isize - overlap as isize;
        features.extend(fragment.features().iter().map(|f| f.shifted(offset)));
        seq.extend_from_slice(&fragment.seq()[overlap..]);
        names.push(fragment.name().to_string());
    }

    let circular = assembly.is_circular();
    if circular {
        let closing = overlaps[overlaps.len() - 1];
        if closing > seq.len() {
            return Err(AssemblyError::OverlapTooLong {
                overlap: closing,
                available: seq.len(),
            });
        }
        seq.truncate(seq.len() - closing);
        features = wrap_features(features, seq.len());
    }

    let record = SeqRecord::from_parts(names.join("+"), seq, features, circular);
    log::debug!("assembled {record} from {assembly}");
    Ok(record)
}

fn wrap_features(features: Vec<Feature>, len: usize) -> Vec<Feature> {
    features
        .into_iter()
        .map(|mut feature| {
            let loc = &feature.location;
            let past_end = loc.first_part().is_some_and(|part| part.start >= len)
                || loc.last_part().is_some_and(|part| part.end > len);
            if past_end {
                feature.location = shift_location(loc, 0, len);
            }
            feature
        })
        .collect()
}
