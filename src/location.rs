//! Strand-aware locations on linear and circular sequences.
//!
//! A [`Location`] is either one contiguous [`Span`] or an ordered list of
//! spans. Multi-part locations appear when a feature or an overlap crosses the
//! origin of a circular sequence: `join{[23:27](+), [0:5](+)}`.

use std::fmt;

/// Orientation of a span relative to the sequence it annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// The opposite orientation.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    #[inline]
    fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

/// Half-open interval `[start, end)` on one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
}

impl Span {
    pub fn new(start: usize, end: usize, strand: Strand) -> Self {
        Self { start, end, strand }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same interval measured on the reverse complement of a sequence of `total_len`.
    pub fn flip(&self, total_len: usize) -> Self {
        Self {
            start: total_len.saturating_sub(self.end),
            end: total_len.saturating_sub(self.start),
            strand: self.strand.flip(),
        }
    }

    fn shift(&self, offset: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(offset),
            end: self.end.saturating_add_signed(offset),
            strand: self.strand,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]({})", self.start, self.end, self.strand.symbol())
    }
}

/// A contiguous span, or several spans read in order as one region.
///
/// Prefer [`Location::from_parts`] over building `Compound` by hand: it
/// collapses a single part and rejects an empty list. Accessors still treat an
/// empty `Compound` as covering nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Simple(Span),
    Compound(Vec<Span>),
}

impl Location {
    /// Contiguous location `[start, end)` on `strand`.
    pub fn simple(start: usize, end: usize, strand: Strand) -> Self {
        Self::Simple(Span::new(start, end, strand))
    }

    /// Build a location from parts, collapsing a single part to [`Location::Simple`].
    ///
    /// Returns `None` when `parts` is empty.
    pub fn from_parts(mut parts: Vec<Span>) -> Option<Self> {
        match parts.len() {
            0 => None,
            1 => parts.pop().map(Self::Simple),
            _ => Some(Self::Compound(parts)),
        }
    }

    /// Parts in biological order.
    pub fn parts(&self) -> &[Span] {
        match self {
            Self::Simple(span) => std::slice::from_ref(span),
            Self::Compound(parts) => parts,
        }
    }

    /// First part in biological order, `None` for an empty compound.
    pub fn first_part(&self) -> Option<&Span> {
        self.parts().first()
    }

    /// Last part in biological order, `None` for an empty compound.
    pub fn last_part(&self) -> Option<&Span> {
        self.parts().last()
    }

    /// Strand of the first part; all parts share it. Forward when there are no parts.
    pub fn strand(&self) -> Strand {
        self.first_part().map_or(Strand::Forward, |part| part.strand)
    }

    /// Leftmost coordinate covered by any part.
    pub fn start(&self) -> usize {
        self.parts().iter().map(|p| p.start).min().unwrap_or(0)
    }

    /// Rightmost coordinate covered by any part.
    pub fn end(&self) -> usize {
        self.parts().iter().map(|p| p.end).max().unwrap_or(0)
    }

    /// Number of positions covered, summed over parts.
    pub fn len(&self) -> usize {
        self.parts().iter().map(Span::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate every part by `offset` without any wrapping.
    pub fn shift(&self, offset: isize) -> Self {
        match self {
            Self::Simple(span) => Self::Simple(span.shift(offset)),
            Self::Compound(parts) => {
                Self::Compound(parts.iter().map(|p| p.shift(offset)).collect())
            }
        }
    }

    /// Equivalent location on the reverse complement of a sequence of `total_len`.
    pub fn flip(&self, total_len: usize) -> Self {
        match self {
            Self::Simple(span) => Self::Simple(span.flip(total_len)),
            Self::Compound(parts) => {
                Self::Compound(parts.iter().map(|p| p.flip(total_len)).collect())
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(span) => write!(f, "{span}"),
            Self::Compound(parts) => {
                write!(f, "join{{")?;
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Move `location` by `shift` on a circular sequence of length `lim`.
///
/// Parts that end up crossing the origin are split in two, and parts that
/// become adjacent to the previous part are merged back into it. With a shift
/// of zero this normalises any part that runs past `lim` into its wrapped form.
pub fn shift_location(location: &Location, shift: isize, lim: usize) -> Location {
    if lim == 0 || location.parts().is_empty() {
        return location.clone();
    }
    let modulus = lim as isize;
    let wrap = |pos: usize| (pos as isize + shift).rem_euclid(modulus) as usize;

    let strand = location.strand();
    let mut new_parts: Vec<Span> = Vec::with_capacity(location.parts().len() + 1);

    for part in location.parts() {
        let mut new_start = wrap(part.start);
        let mut new_end = match wrap(part.end) {
            0 => lim,
            end => end,
        };

        if part.is_empty() {
            new_parts.push(Span::new(new_start, new_start, strand));
            continue;
        }

        if let Some(previous) = new_parts.last().copied() {
            if strand == Strand::Forward && previous.end == new_start {
                new_parts.pop();
                new_start = previous.start;
            } else if strand == Strand::Reverse && previous.start == new_end {
                new_parts.pop();
                new_end = previous.end;
            }
        }

        if new_start < new_end {
            new_parts.push(Span::new(new_start, new_end, strand));
        } else {
            let head = Span::new(new_start, lim, strand);
            let tail = Span::new(0, new_end, strand);
            match strand {
                Strand::Forward => new_parts.extend([head, tail]),
                Strand::Reverse => new_parts.extend([tail, head]),
            }
        }
    }

    Location::from_parts(new_parts).unwrap_or_else(|| location.clone())
}
