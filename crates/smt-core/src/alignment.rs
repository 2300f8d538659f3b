//! Word alignment between a source sentence and a target hypothesis.
//!
//! Each source position links to exactly one target position or to NULL.
//! A target position may be covered by any number of source positions
//! (its fertility). Structural edits on the target sentence (insert, delete,
//! swap) are mirrored here so every source word keeps pointing at the same
//! target word after the edit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Where a source word is aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Link {
    /// No counterpart in the target sentence.
    Null,
    /// Aligned to the target word at this index.
    Target(usize),
}

impl Link {
    pub fn target(self) -> Option<usize> {
        match self {
            Link::Null => None,
            Link::Target(t) => Some(t),
        }
    }

    pub fn is_null(self) -> bool {
        self == Link::Null
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Null => f.write_str("NULL"),
            Link::Target(t) => write!(f, "e{t}"),
        }
    }
}

/// Sure alignment links keyed by source position.
///
/// Keying by source makes "a source position appears in at most one pair"
/// structural. A source position with no entry reads as `Link::Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Alignment {
    links: BTreeMap<usize, Link>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align `source` to `link`, replacing any previous link of `source`.
    pub fn add_pair(&mut self, link: Link, source: usize) {
        self.links.insert(source, link);
    }

    /// Remove the pair `(link, source)`. Returns `false` if it was not present.
    pub fn remove_pair(&mut self, link: Link, source: usize) -> bool {
        if self.links.get(&source) == Some(&link) {
            self.links.remove(&source);
            true
        } else {
            false
        }
    }

    pub fn target_aligned_to(&self, source: usize) -> Link {
        self.links.get(&source).copied().unwrap_or(Link::Null)
    }

    /// Source positions aligned to `link` (the fertility set for a target word).
    pub fn sources_aligned_to(&self, link: Link) -> BTreeSet<usize> {
        self.links
            .iter()
            .filter(|&(_, &l)| l == link)
            .map(|(&s, _)| s)
            .collect()
    }

    pub fn fertility(&self, target: usize) -> usize {
        self.links
            .values()
            .filter(|&&l| l == Link::Target(target))
            .count()
    }

    /// `(source, link)` pairs in ascending source order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, Link)> + '_ {
        self.links.iter().map(|(&s, &l)| (s, l))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Highest target index referenced by any pair.
    pub fn max_target(&self) -> Option<usize> {
        self.links.values().filter_map(|l| l.target()).max()
    }

    /// True when no pair references a target index at or past `target_len`.
    pub fn fits_target_len(&self, target_len: usize) -> bool {
        self.max_target().map_or(true, |t| t < target_len)
    }

    /// A target word was inserted at `target`: every pair at or above it moves up.
    pub fn shift_on_insert_at(&mut self, target: usize) {
        self.remap(|t| if t >= target { Link::Target(t + 1) } else { Link::Target(t) });
    }

    /// The target word at `target` was deleted.
    ///
    /// Pairs on the deleted word move to `reassign_to`, which is expressed in
    /// post-deletion numbering. Pairs above it move down by one.
    pub fn shift_on_delete_at(&mut self, target: usize, reassign_to: Link) {
        self.remap(|t| {
            if t < target {
                Link::Target(t)
            } else if t == target {
                reassign_to
            } else {
                Link::Target(t - 1)
            }
        });
    }

    /// Reindex for the target rearrangement
    /// `[0,i1) [j1,j2] [i2+1,j1) [i1,i2] [j2+1,end)`.
    ///
    /// # Panics
    ///
    /// Panics unless `i1 <= i2 < j1 <= j2`.
    pub fn swap_ranges(&mut self, i1: usize, i2: usize, j1: usize, j2: usize) {
        assert!(
            i1 <= i2 && i2 < j1 && j1 <= j2,
            "malformed swap ranges [{i1},{i2}] <-> [{j1},{j2}]"
        );
        let i_len = i2 - i1 + 1;
        let j_len = j2 - j1 + 1;
        self.remap(|t| {
            let moved = if t < i1 || t > j2 {
                t
            } else if t <= i2 {
                t + (j2 - i2)
            } else if t < j1 {
                t + j_len - i_len
            } else {
                t - j1 + i1
            };
            Link::Target(moved)
        });
    }

    fn remap(&mut self, f: impl Fn(usize) -> Link) {
        for link in self.links.values_mut() {
            if let Link::Target(t) = *link {
                *link = f(t);
            }
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (source, link) in self.pairs() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "({link}, f{source})")?;
        }
        Ok(())
    }
}
