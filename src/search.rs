//! Backward search over the move structure.
//!
//! **Core Algorithm**: process the pattern from its last character to its
//! first, keeping an inclusive (run, offset) range over the run table. Each
//! step snaps both boundary cursors onto runs of the current character, then
//! replaces them with their LF-images via the pointer oracle plus the stored
//! cross-table offsets.
//!
//! Complexity per pattern character: cursor advance amortized over the range,
//! one select query per boundary, and the carry loop. The count comes
//! straight off the final range; no per-character rank over the text is ever
//! taken, which is what keeps the whole thing O(r) space.

use crate::index::MoveIndex;
use crate::runs::Position;

impl MoveIndex {
    /// Count the exact occurrences of `pattern` in the indexed text.
    ///
    /// Returns 0 for any pattern containing a symbol never observed during
    /// construction; "unknown symbol" and "pattern absent" are
    /// indistinguishable to a caller, and the check keeps the cursor-advance
    /// loops bounded.
    ///
    /// Convention: the empty pattern matches at every text position,
    /// terminator included, so `count(b"")` is the text length.
    pub fn count(&self, pattern: &[u8]) -> u64 {
        let r = self.num_runs();
        if r == 0 {
            return 0;
        }
        if pattern.is_empty() {
            return self.text_len();
        }

        // Inclusive full-table range.
        let mut start = Position { run: 0, offset: 0 };
        let mut end = Position {
            run: r - 1,
            offset: self.row(r - 1).len() - 1,
        };

        for &c in pattern.iter().rev() {
            if self.alphabet().index_of(c).is_none() {
                return 0;
            }

            // Snap the start cursor forward onto a run of c, resetting its
            // intra-run offset on every advance.
            while start.run <= end.run && self.row(start.run).head() != c {
                start.run += 1;
                start.offset = 0;
            }
            if start.run > end.run {
                return 0;
            }
            // Snap the end cursor backward likewise. start.run already heads
            // a c-run, so this cannot walk past it.
            while self.row(end.run).head() != c {
                end.run -= 1;
                end.offset = self.row(end.run).len() - 1;
            }

            // Capture the cross-table offsets before the runs change, then
            // step both boundaries through LF.
            let start_shift = self.row(start.run).offset();
            let end_shift = self.row(end.run).offset();
            start.run = self.pointer(start.run);
            start.offset += start_shift;
            end.run = self.pointer(end.run);
            end.offset += end_shift;

            // The boundary conversion can overshoot by several runs when run
            // lengths are small; normalization must loop.
            start = self.carry(start);
            end = self.carry(end);
        }

        if start.run == end.run {
            return end.offset - start.offset + 1;
        }

        let mut total = (self.row(start.run).len() - start.offset) + end.offset + 1;
        for run in start.run + 1..end.run {
            total += self.row(run).len();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BWT of "banana" + terminator: L = "annb\x01aa".
    fn banana() -> MoveIndex {
        MoveIndex::from_bwt(b"annb\x01aa", 7).unwrap()
    }

    // BWT of "mississippi" + terminator: L = "ipssm\x01pissii".
    fn mississippi() -> MoveIndex {
        MoveIndex::from_bwt(b"ipssm\x01pissii", 12).unwrap()
    }

    #[test]
    fn test_count_single_char() {
        let idx = banana();
        assert_eq!(idx.count(b"a"), 3);
        assert_eq!(idx.count(b"b"), 1);
        assert_eq!(idx.count(b"n"), 2);
    }

    #[test]
    fn test_count_substrings() {
        let idx = banana();
        assert_eq!(idx.count(b"ana"), 2); // overlapping occurrences
        assert_eq!(idx.count(b"na"), 2);
        assert_eq!(idx.count(b"nan"), 1);
        assert_eq!(idx.count(b"ban"), 1);
    }

    #[test]
    fn test_full_text_round_trip() {
        // A text with a unique rightmost terminator occurs exactly once.
        let idx = banana();
        assert_eq!(idx.count(b"banana"), 1);
    }

    #[test]
    fn test_absent_pattern() {
        let idx = banana();
        assert_eq!(idx.count(b"nn"), 0);
        assert_eq!(idx.count(b"ab"), 0);
        assert_eq!(idx.count(b"bananab"), 0);
    }

    #[test]
    fn test_unknown_symbol_is_zero_not_panic() {
        let idx = banana();
        assert_eq!(idx.count(b"xyz"), 0);
        assert_eq!(idx.count(b"bxn"), 0);
    }

    #[test]
    fn test_empty_pattern_convention() {
        // Chosen convention: the empty pattern matches at every position of
        // the terminated text, so the count is n.
        let idx = banana();
        assert_eq!(idx.count(b""), 7);
    }

    #[test]
    fn test_empty_index() {
        let idx = MoveIndex::from_bwt(b"", 0).unwrap();
        assert_eq!(idx.count(b""), 0);
        assert_eq!(idx.count(b"a"), 0);
    }

    #[test]
    fn test_mississippi_counts() {
        let idx = mississippi();
        assert_eq!(idx.count(b"issi"), 2);
        assert_eq!(idx.count(b"ssi"), 2);
        assert_eq!(idx.count(b"i"), 4);
        assert_eq!(idx.count(b"p"), 2);
        assert_eq!(idx.count(b"mississippi"), 1);
        assert_eq!(idx.count(b"sip"), 1);
        assert_eq!(idx.count(b"m"), 1);
        assert_eq!(idx.count(b"x"), 0);
    }

    #[test]
    fn test_single_symbol_alphabet() {
        // BWT of "aaaa" + terminator is "aaaa" + terminator (the terminator
        // row is first among sorted rotations, so the terminator itself lands
        // last in L). Two runs total.
        let idx = MoveIndex::from_bwt(b"aaaa\x01", 5).unwrap();
        assert_eq!(idx.count(b"a"), 4);
        assert_eq!(idx.count(b"aa"), 3);
        assert_eq!(idx.count(b"aaa"), 2);
        assert_eq!(idx.count(b"aaaa"), 1);
        assert_eq!(idx.count(b"aaaaa"), 0);
    }

    #[test]
    fn test_run_length_mode_counts_match_raw_mode() {
        let raw = banana();
        let rle = MoveIndex::from_runs(
            7,
            [(b'a', 1u64), (b'n', 2), (b'b', 1), (1u8, 1), (b'a', 2)],
        )
        .unwrap();

        for pat in [&b"a"[..], b"an", b"ana", b"banana", b"nan", b"zz"] {
            assert_eq!(raw.count(pat), rle.count(pat), "pattern {pat:?}");
        }
    }
}
