//! # movebwt
//!
//! **Run-length BWT move structure**
//!
//! > "Counting implies LF-stepping. Count(Pattern) -> O(Pattern_Length)
//! > select queries, in O(r) space."
//!
//! A compressed full-text index over a run-length-encoded Burrows-Wheeler
//! Transform: the space budget scales with the number of BWT runs `r`, not
//! the text length `n`, which is what makes it usable on highly repetitive
//! inputs such as genomic references.
//!
//! ## Architecture
//!
//! - **Run table**: one fixed-width record per run (head, length, offset)
//! - **Run-membership vectors**: per-symbol rank over run heads
//! - **Boundary vector**: the interleaved F/L run-start vector whose select
//!   queries replace an explicit per-run successor pointer
//! - **Backward search**: run/offset range narrowing, right to left
//!
//! | Operation | Time | Space |
//! |-----------|------|-------|
//! | Build | O(n·σ) | O(r) retained |
//! | LF | O(1) amortized + carry | O(1) |
//! | Count | O(M) LF steps | O(1) |
//!
//! ## Example
//!
//! ```
//! use movebwt::MoveIndex;
//!
//! // BWT of "banana" + terminator, text length 7.
//! let index = MoveIndex::from_bwt(b"annb\x01aa", 7).unwrap();
//!
//! assert_eq!(index.num_runs(), 5);
//! assert_eq!(index.count(b"ana"), 2);
//! assert_eq!(index.count(b"banana"), 1);
//! assert_eq!(index.count(b"xyz"), 0);
//! ```
//!
//! The BWT itself is supplied as input (raw stream or run-length records);
//! building it from text, and locating match positions, are out of scope.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod alphabet;
pub mod bitvec;
pub mod error;
pub mod index;
pub mod runs;
pub mod search;

pub use alphabet::Alphabet;
pub use error::{Error, Result};
pub use index::{MoveIndex, Snapshot, SNAPSHOT_VERSION};
pub use runs::{Position, Row, DEFAULT_TERMINATOR, MAX_OFFSET, MAX_RUN_LENGTH};

/// Version
pub const VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_counting() {
        let index = MoveIndex::from_bwt(b"annb\x01aa", 7).unwrap();

        assert_eq!(index.count(b"ana"), 2);
        assert_eq!(index.count(b"na"), 2);
        assert_eq!(index.count(b"a"), 3);
        assert_eq!(index.count(b"xyz"), 0);
    }

    #[test]
    fn test_sum_of_run_lengths_is_n() {
        let index = MoveIndex::from_bwt(b"ipssm\x01pissii", 12).unwrap();
        let total: u64 = (0..index.num_runs()).map(|i| index.row(i).len()).sum();
        assert_eq!(total, index.text_len());
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        // Declared n disagrees with the summed run lengths: no partial index.
        assert!(MoveIndex::from_runs(100, [(b'A', 50u64), (b'C', 40)]).is_err());
    }

    #[test]
    fn test_full_text_match() {
        let index = MoveIndex::from_bwt(b"annb\x01aa", 7).unwrap();
        assert_eq!(index.count(b"banana"), 1);
    }
}
