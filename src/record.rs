//! Annotated sequence records used as assembly inputs and outputs.

use std::borrow::Cow;
use std::fmt;

use bio::alphabets::dna;

use crate::location::{Location, Strand};

/// An annotation anchored to a [`Location`] on its record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    /// Feature type, e.g. `CDS` or `misc_feature`.
    pub kind: String,
    /// Optional human readable label.
    pub label: Option<String>,
    pub location: Location,
}

impl Feature {
    pub fn new(kind: impl Into<String>, location: Location) -> Self {
        Self {
            kind: kind.into(),
            label: None,
            location,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Copy of this feature translated by `offset` (no wrapping).
    pub fn shifted(&self, offset: isize) -> Self {
        Self {
            location: self.location.shift(offset),
            ..self.clone()
        }
    }

    /// Copy of this feature placed on the reverse complement of a `total_len` sequence.
    pub fn flipped(&self, total_len: usize) -> Self {
        Self {
            location: self.location.flip(total_len),
            ..self.clone()
        }
    }
}

/// A named DNA sequence with features and a topology flag.
///
/// Records are values: every operation returns a new record and leaves the
/// receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    name: String,
    seq: Vec<u8>,
    features: Vec<Feature>,
    circular: bool,
}

impl SeqRecord {
    /// Linear record without features.
    pub fn new(name: impl Into<String>, seq: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            seq: seq.as_ref().to_vec(),
            features: Vec::new(),
            circular: false,
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Mark the record as circular (or linear).
    pub fn circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// Sequence as text; non-UTF-8 bytes are replaced.
    pub fn seq_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.seq)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Reverse complement of the sequence with every feature flipped onto the new strand.
    pub fn reverse_complement(&self) -> Self {
        let total_len = self.len();
        Self {
            name: self.name.clone(),
            seq: dna::revcomp(&self.seq),
            features: self
                .features
                .iter()
                .map(|feature| feature.flipped(total_len))
                .collect(),
            circular: self.circular,
        }
    }

    /// Linear sub-record covering `[start, end)`; `None` runs to the end.
    ///
    /// Only features lying completely inside the window are kept; they are
    /// re-based onto the slice.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(self.len()).min(self.len());
        let start = start.min(end);
        let features = self
            .features
            .iter()
            .filter(|f| start <= f.location.start() && f.location.end() <= end)
            .map(|f| f.shifted(-(start as isize)))
            .collect();

        Self {
            name: self.name.clone(),
            seq: self.seq[start..end].to_vec(),
            features,
            circular: false,
        }
    }

    /// Symbols covered by `feature`, read in the feature's own orientation.
    pub fn extract(&self, feature: &Feature) -> Vec<u8> {
        let mut out = Vec::with_capacity(feature.location.len());
        for part in feature.location.parts() {
            let end = part.end.min(self.len());
            let start = part.start.min(end);
            out.extend_from_slice(&self.seq[start..end]);
        }
        match feature.location.strand() {
            Strand::Forward => out,
            Strand::Reverse => dna::revcomp(&out),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        seq: Vec<u8>,
        features: Vec<Feature>,
        circular: bool,
    ) -> Self {
        Self {
            name,
            seq,
            features,
            circular,
        }
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>, Vec<Feature>, bool) {
        (self.name, self.seq, self.features, self.circular)
    }
}

impl fmt::Display for SeqRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topology = if self.circular { "circular" } else { "linear" };
        write!(f, "{} {}bp {}", self.name, self.len(), topology)
    }
}
