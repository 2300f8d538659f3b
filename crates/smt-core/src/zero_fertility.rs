//! Target words that may be inserted without any aligned source word.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read-only set of zero-fertility words, iterated in sorted order so the
/// search visits insertions deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZeroFertilityVocab {
    words: BTreeSet<String>,
}

impl ZeroFertilityVocab {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// One word per line; surrounding whitespace and blank lines are ignored.
    pub fn from_reader(reader: impl BufRead) -> io::Result<Self> {
        let mut words = BTreeSet::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }
        Ok(Self { words })
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
