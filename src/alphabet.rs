//! Dense alphabet mapping and cumulative tables.
//!
//! Maps each observed raw symbol to a dense index in `[0, sigma)`, assigned
//! in ascending raw-symbol order, and carries the two exclusive prefix-sum
//! tables the query layer needs:
//!
//! - `C[i]`: characters of all symbols with smaller index (the standard
//!   FM-index C array, LF's base-block term).
//! - `C_H[i]`: the same prefix idea over *runs*, consumed by the pointer
//!   oracle, which operates at run granularity.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Alphabet {
    /// Raw symbol value to dense index; unobserved symbols map to None.
    char_to_index: Vec<Option<usize>>,
    /// Dense index to raw symbol, ascending.
    symbols: Vec<u8>,
    /// Exclusive prefix sums of per-symbol character counts.
    c: Vec<u64>,
    /// Exclusive prefix sums of per-symbol run counts.
    c_h: Vec<u64>,
}

impl Alphabet {
    /// Build from per-raw-symbol tallies (256 entries each). Symbols with a
    /// zero character count are absent from the dense mapping.
    pub(crate) fn new(char_counts: &[u64], run_counts: &[u64]) -> Self {
        debug_assert_eq!(char_counts.len(), 256);
        debug_assert_eq!(run_counts.len(), 256);

        let mut char_to_index = vec![None; 256];
        let mut symbols = Vec::new();
        let mut c = Vec::new();
        let mut c_h = Vec::new();

        let mut chars_before = 0u64;
        let mut runs_before = 0u64;
        for sym in 0..256usize {
            if char_counts[sym] == 0 {
                continue;
            }
            char_to_index[sym] = Some(symbols.len());
            symbols.push(sym as u8);
            c.push(chars_before);
            c_h.push(runs_before);
            chars_before += char_counts[sym];
            runs_before += run_counts[sym];
        }

        Self {
            char_to_index,
            symbols,
            c,
            c_h,
        }
    }

    /// Rebuild from snapshot tables, revalidating the ascending-order and
    /// size invariants.
    pub(crate) fn from_tables(symbols: Vec<u8>, c: Vec<u64>, c_h: Vec<u64>) -> Result<Self> {
        if symbols.len() != c.len() || symbols.len() != c_h.len() {
            return Err(Error::InvalidSnapshot("alphabet table sizes disagree"));
        }
        if !symbols.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidSnapshot("alphabet symbols not ascending"));
        }
        if !c.windows(2).all(|w| w[0] <= w[1]) || !c_h.windows(2).all(|w| w[0] <= w[1]) {
            return Err(Error::InvalidSnapshot("cumulative tables not monotone"));
        }

        let mut char_to_index = vec![None; 256];
        for (i, &sym) in symbols.iter().enumerate() {
            char_to_index[sym as usize] = Some(i);
        }
        Ok(Self {
            char_to_index,
            symbols,
            c,
            c_h,
        })
    }

    /// Dense index of a raw symbol, or None if never observed.
    #[inline]
    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        self.char_to_index[symbol as usize]
    }

    /// Raw symbol for a dense index.
    #[inline]
    pub fn symbol(&self, index: usize) -> u8 {
        self.symbols[index]
    }

    /// Number of distinct observed symbols.
    #[inline]
    pub fn sigma(&self) -> usize {
        self.symbols.len()
    }

    /// C[i]: characters of all lexicographically smaller observed symbols.
    #[inline]
    pub fn c(&self, index: usize) -> u64 {
        self.c[index]
    }

    /// C_H[i]: runs of all lexicographically smaller observed symbols.
    #[inline]
    pub fn c_h(&self, index: usize) -> u64 {
        self.c_h[index]
    }

    pub(crate) fn symbols_table(&self) -> &[u8] {
        &self.symbols
    }

    pub(crate) fn c_table(&self) -> &[u64] {
        &self.c
    }

    pub(crate) fn c_h_table(&self) -> &[u64] {
        &self.c_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tallies(pairs: &[(u8, u64, u64)]) -> (Vec<u64>, Vec<u64>) {
        let mut chars = vec![0u64; 256];
        let mut runs = vec![0u64; 256];
        for &(sym, ch, rn) in pairs {
            chars[sym as usize] = ch;
            runs[sym as usize] = rn;
        }
        (chars, runs)
    }

    #[test]
    fn test_dense_mapping_ascending() {
        // banana$ tallies: terminator x1 (1 run), a x3 (2 runs), b x1, n x2
        let (chars, runs) = tallies(&[(1, 1, 1), (b'a', 3, 2), (b'b', 1, 1), (b'n', 2, 1)]);
        let a = Alphabet::new(&chars, &runs);

        assert_eq!(a.sigma(), 4);
        assert_eq!(a.index_of(1), Some(0));
        assert_eq!(a.index_of(b'a'), Some(1));
        assert_eq!(a.index_of(b'b'), Some(2));
        assert_eq!(a.index_of(b'n'), Some(3));
        assert_eq!(a.index_of(b'z'), None);
        assert_eq!(a.symbol(2), b'b');
    }

    #[test]
    fn test_cumulative_tables() {
        let (chars, runs) = tallies(&[(1, 1, 1), (b'a', 3, 2), (b'b', 1, 1), (b'n', 2, 1)]);
        let a = Alphabet::new(&chars, &runs);

        // Exclusive prefix sums in ascending symbol order.
        assert_eq!(a.c(0), 0);
        assert_eq!(a.c(1), 1);
        assert_eq!(a.c(2), 4);
        assert_eq!(a.c(3), 5);

        assert_eq!(a.c_h(0), 0);
        assert_eq!(a.c_h(1), 1);
        assert_eq!(a.c_h(2), 3);
        assert_eq!(a.c_h(3), 4);
    }

    #[test]
    fn test_single_symbol() {
        let (chars, runs) = tallies(&[(b'a', 9, 1)]);
        let a = Alphabet::new(&chars, &runs);
        assert_eq!(a.sigma(), 1);
        assert_eq!(a.c(0), 0);
        assert_eq!(a.c_h(0), 0);
    }

    #[test]
    fn test_from_tables_rejects_unsorted() {
        let err = Alphabet::from_tables(vec![b'b', b'a'], vec![0, 1], vec![0, 1]).unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
    }
}
