use crate::transaction::{OutPoint, Output};
use std::collections::HashMap;

/// Currently spendable outputs keyed by their reference.
///
/// `Clone` is a deep copy; the handler clones the caller's snapshot on
/// construction so the two never alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: HashMap<OutPoint, Output>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.entries.contains_key(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&Output> {
        self.entries.get(outpoint)
    }

    /// Inserts an entry, returning the output previously stored under the same reference.
    pub fn insert(&mut self, outpoint: OutPoint, output: Output) -> Option<Output> {
        self.entries.insert(outpoint, output)
    }

    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<Output> {
        self.entries.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &Output)> {
        self.entries.iter()
    }

    pub fn outpoints(&self) -> impl Iterator<Item = &OutPoint> {
        self.entries.keys()
    }
}

impl FromIterator<(OutPoint, Output)> for EntrySet {
    fn from_iter<T: IntoIterator<Item = (OutPoint, Output)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(OutPoint, Output)> for EntrySet {
    fn extend<T: IntoIterator<Item = (OutPoint, Output)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
