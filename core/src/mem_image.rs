//! Sparse initial memory image of a guest program.

use std::collections::BTreeMap;

use crate::WORD_SIZE;

/// Mapping from word-aligned 32-bit address to a 32-bit little-endian word.
///
/// Only the loader inserts entries; once a load completes the image is
/// returned by value and never mutated again.  The backing map is ordered so
/// iteration, and therefore any digest derived from it, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemImage {
    words: BTreeMap<u32, u32>,
}

impl MemImage {
    /// Creates an empty image.
    pub fn new() -> MemImage {
        MemImage { words: BTreeMap::new() }
    }

    /// Stores `word` at `addr`, returning the previous word if the address
    /// was already populated.  Restricted to the loader; a `Some` return is a
    /// segment overlap and must abort the load.
    pub(crate) fn insert(&mut self, addr: u32, word: u32) -> Option<u32> {
        self.words.insert(addr, word)
    }

    /// Returns the word at `addr`, or `None` if the address was never loaded.
    pub fn get(&self, addr: u32) -> Option<u32> {
        self.words.get(&addr).copied()
    }

    /// Returns true if the address was loaded.
    pub fn contains(&self, addr: u32) -> bool {
        self.words.contains_key(&addr)
    }

    /// Number of initialized words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if no word was loaded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterates over `(address, word)` pairs in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words.iter().map(|(&addr, &word)| (addr, word))
    }

    /// Returns the exclusive address range `[first, last + WORD_SIZE)`
    /// spanned by the initialized words, or `None` if the image is empty.
    pub fn addr_range(&self) -> Option<(u32, u32)> {
        let first = *self.words.keys().next()?;
        let last = *self.words.keys().next_back()?;
        Some((first, last + WORD_SIZE as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image() {
        let image = MemImage::new();
        assert!(image.is_empty());
        assert_eq!(image.len(), 0);
        assert_eq!(image.addr_range(), None);
        assert_eq!(image.get(0), None);
    }

    #[test]
    fn test_insert_reports_previous_word() {
        let mut image = MemImage::new();
        assert_eq!(image.insert(0x1000, 0x13), None);
        assert_eq!(image.insert(0x1000, 0x17), Some(0x13));
        assert!(image.contains(0x1000));
    }

    #[test]
    fn test_iteration_is_address_ordered() {
        let mut image = MemImage::new();
        image.insert(0x2000, 2);
        image.insert(0x0, 0);
        image.insert(0x1000, 1);

        let pairs: Vec<_> = image.iter().collect();
        assert_eq!(pairs, vec![(0x0, 0), (0x1000, 1), (0x2000, 2)]);
        assert_eq!(image.addr_range(), Some((0x0, 0x2004)));
    }
}
