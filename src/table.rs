//! Ordered word-frequency tables and the pairwise merge used by the reducer.

use std::cmp::Ordering;
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A word together with its occurrence count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordEntry {
    /// Raw word bytes; never contains a newline.
    pub word: Vec<u8>,
    /// Number of occurrences, always at least one.
    pub count: u64,
}

impl WordEntry {
    /// Creates an entry for `word` with the supplied count.
    #[must_use]
    pub fn new(word: impl Into<Vec<u8>>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

/// Outcome of merging one table into another.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Words present in both tables whose counts were summed.
    pub matched: usize,
    /// Entries moved from the consumed table into the surviving one.
    pub transferred: usize,
}

/// Ordered associative container mapping distinct words to their counts.
///
/// Iteration is always in ascending byte-lexicographic word order, whatever
/// the insertion order was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: BTreeMap<Vec<u8>, u64>,
}

impl FrequencyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `word`, inserting it with count 1 on a miss.
    ///
    /// Returns the updated count.  The owned copy of a new word is reserved
    /// fallibly so allocation failure surfaces as an error.
    pub fn record(&mut self, word: &[u8]) -> Result<u64> {
        if let Some(count) = self.entries.get_mut(word) {
            *count += 1;
            return Ok(*count);
        }
        let mut owned = Vec::new();
        owned.try_reserve_exact(word.len())?;
        owned.extend_from_slice(word);
        self.entries.insert(owned, 1);
        Ok(1)
    }

    /// Returns the count for `word`, if present.
    #[must_use]
    pub fn get(&self, word: &[u8]) -> Option<u64> {
        self.entries.get(word).copied()
    }

    /// Number of distinct words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table holds no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, i.e. the number of tokens recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.values().sum()
    }

    /// Ascending traversal yielding `(word, count)` pairs.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Removes `word` from the table and hands back its entry by value.
    pub fn detach(&mut self, word: &[u8]) -> Option<WordEntry> {
        self.entries
            .remove_entry(word)
            .map(|(word, count)| WordEntry { word, count })
    }

    /// Moves `entry` into the table, summing counts if the word already exists.
    pub fn attach(&mut self, entry: WordEntry) {
        match self.entries.entry(entry.word) {
            Entry::Vacant(slot) => {
                slot.insert(entry.count);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += entry.count;
            }
        }
    }

    /// Merges `other` into `self`, consuming `other`.
    ///
    /// Both tables are walked in ascending order at once.  Equal words have
    /// their counts summed in place; words only present in `other` are moved
    /// (not copied) into `self` at their sorted position.
    pub fn merge_from(&mut self, other: FrequencyTable) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        if self.entries.is_empty() {
            outcome.transferred = other.entries.len();
            self.entries = other.entries;
            return outcome;
        }

        let mut incoming = other.entries.into_iter().peekable();
        let mut transfers = Vec::new();
        for (word, count) in &mut self.entries {
            while let Some((next, _)) = incoming.peek() {
                match next.as_slice().cmp(word.as_slice()) {
                    Ordering::Less => {
                        if let Some(entry) = incoming.next() {
                            transfers.push(entry);
                        }
                    }
                    Ordering::Equal => {
                        if let Some((_, extra)) = incoming.next() {
                            *count += extra;
                            outcome.matched += 1;
                        }
                        break;
                    }
                    Ordering::Greater => break,
                }
            }
            if incoming.peek().is_none() {
                break;
            }
        }
        // Everything left in `other` sorts after the last word of `self`.
        transfers.extend(incoming);

        outcome.transferred = transfers.len();
        self.entries.extend(transfers);
        outcome
    }

    /// Consumes the table, yielding its entries in ascending order.
    #[must_use]
    pub fn into_entries(self) -> Vec<WordEntry> {
        self.into_iter().collect()
    }
}

/// Ascending iterator over `(word, count)` pairs of a [`FrequencyTable`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, u64>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(word, count)| (word.as_slice(), *count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(word, count)| (word.as_slice(), *count))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = (&'a [u8], u64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for FrequencyTable {
    type Item = WordEntry;
    type IntoIter = std::iter::Map<btree_map::IntoIter<Vec<u8>, u64>, EntryFromPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(entry_from_pair as EntryFromPair)
    }
}

type EntryFromPair = fn((Vec<u8>, u64)) -> WordEntry;

fn entry_from_pair((word, count): (Vec<u8>, u64)) -> WordEntry {
    WordEntry { word, count }
}

impl FromIterator<WordEntry> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = WordEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.attach(entry);
        }
        table
    }
}
