//! Exact shared-substring detection between two sequences.
//!
//! The overlap graph builder is generic over [`OverlapAlgorithm`]; any closure
//! with the right signature qualifies, and [`common_sub_strings`] is the
//! default.

/// A run of `length` identical symbols starting at `start_a` in the first
/// sequence and at `start_b` in the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedSubstring {
    pub start_a: usize,
    pub start_b: usize,
    pub length: usize,
}

impl SharedSubstring {
    pub fn new(start_a: usize, start_b: usize, length: usize) -> Self {
        Self {
            start_a,
            start_b,
            length,
        }
    }
}

/// Finds homologous regions between two sequences.
///
/// Implementations must be pure: the same inputs always yield the same
/// matches. The order of the returned matches decides the order in which
/// parallel edges are inserted into the overlap graph.
pub trait OverlapAlgorithm: Send + Sync {
    fn find_overlaps(&self, seq_a: &[u8], seq_b: &[u8], limit: usize) -> Vec<SharedSubstring>;

    /// Short name used in summaries and logs.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

impl<F> OverlapAlgorithm for F
where
    F: Fn(&[u8], &[u8], usize) -> Vec<SharedSubstring> + Send + Sync,
{
    fn find_overlaps(&self, seq_a: &[u8], seq_b: &[u8], limit: usize) -> Vec<SharedSubstring> {
        self(seq_a, seq_b, limit)
    }
}

/// All maximal exact matches of at least `limit` symbols.
///
/// A match is maximal when it cannot be extended on either side without a
/// mismatch or running off a sequence. Results are ordered longest first,
/// ties broken by position in `seq_a` and then in `seq_b`.
pub fn common_sub_strings(seq_a: &[u8], seq_b: &[u8], limit: usize) -> Vec<SharedSubstring> {
    let min_len = limit.max(1);
    let (n, m) = (seq_a.len(), seq_b.len());
    let mut matches = Vec::new();
    if n < min_len || m < min_len {
        return matches;
    }

    // Walk every diagonal i - j = const once, tracking the current run.
    for offset in 0..(n + m - 1) {
        let (mut i, mut j) = if offset < m {
            (0, m - 1 - offset)
        } else {
            (offset - (m - 1), 0)
        };
        let mut run = 0usize;
        while i < n && j < m {
            if seq_a[i] == seq_b[j] {
                run += 1;
            } else {
                if run >= min_len {
                    matches.push(SharedSubstring::new(i - run, j - run, run));
                }
                run = 0;
            }
            i += 1;
            j += 1;
        }
        if run >= min_len {
            matches.push(SharedSubstring::new(i - run, j - run, run));
        }
    }

    matches.sort_by(|x, y| {
        y.length
            .cmp(&x.length)
            .then(x.start_a.cmp(&y.start_a))
            .then(x.start_b.cmp(&y.start_b))
    });
    matches
}

/// End-to-end overlaps only: a suffix of `seq_a` equal to a prefix of
/// `seq_b`, or a prefix of `seq_a` equal to a suffix of `seq_b`.
///
/// Every qualifying overlap length is reported, longest first; suffix/prefix
/// matches come before prefix/suffix matches of the same length.
pub fn terminal_overlap(seq_a: &[u8], seq_b: &[u8], limit: usize) -> Vec<SharedSubstring> {
    let min_len = limit.max(1);
    let max_span = seq_a.len().min(seq_b.len());
    let mut matches = Vec::new();

    for span in (min_len..=max_span).rev() {
        let suffix_a = &seq_a[seq_a.len() - span..];
        if suffix_a == &seq_b[..span] {
            matches.push(SharedSubstring::new(seq_a.len() - span, 0, span));
        }
        let suffix_b = &seq_b[seq_b.len() - span..];
        if &seq_a[..span] == suffix_b {
            matches.push(SharedSubstring::new(0, seq_b.len() - span, span));
        }
    }

    matches.dedup();
    matches
}
