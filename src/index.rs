//! The move structure: run table plus succinct auxiliary indexes.
//!
//! **Core trick**: instead of storing an explicit successor pointer per run
//! (O(r log n) bits), the LF-image of every run head is derived on demand
//! from three small tables:
//!
//! - per-symbol run-membership bit vectors `B_x` (length r, rank),
//! - the cumulative run-count table `C_H`,
//! - one interleaved boundary vector `B_FL` (length 2r, select),
//!
//! `B_FL` merges the sorted F-run-start and L-run-start position sets: a
//! coincident pair emits `0,1`, an F-start alone emits `1`, an L-start alone
//! emits `0`. One select query then converts a run's rank among F-starts into
//! the count of L-starts preceding its LF-image, which *is* the destination
//! run index.
//!
//! Construction runs once, in dependency order, and the finished structure is
//! immutable: every query is a pure read and the index is safe to share
//! across threads.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use log::{debug, info};

use crate::alphabet::Alphabet;
use crate::bitvec::{BitVector, BitVectorParts};
use crate::error::{Error, Result};
use crate::runs::{Ingest, Position, Row, DEFAULT_TERMINATOR};

/// Version tag for [`Snapshot`]; bump on any layout change.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Run-length BWT move structure supporting LF-mapping and occurrence
/// counting in space proportional to the number of runs.
pub struct MoveIndex {
    /// Text length including the terminator.
    n: u64,
    /// The run table, insertion-ordered, never resized after construction.
    rows: Vec<Row>,
    alphabet: Alphabet,
    /// Per-symbol run-membership vectors, length r each.
    membership: Vec<BitVector>,
    /// Interleaved boundary vector B_FL, length 2r, select support.
    boundary: BitVector,
    /// Terminator byte raw-mode symbols were collapsed to.
    terminator: u8,
}

impl MoveIndex {
    /// Build from a raw BWT symbol stream.
    ///
    /// `n` is the total text length declared by the caller; it must match the
    /// stream (terminator collapsing makes inferring it from the stream alone
    /// unsafe in some configurations, so it is always explicit). Symbols at
    /// or below [`DEFAULT_TERMINATOR`] collapse to the terminator before run
    /// detection.
    pub fn from_bwt(bwt: &[u8], n: u64) -> Result<Self> {
        Self::from_bwt_with_terminator(bwt, n, DEFAULT_TERMINATOR)
    }

    /// [`Self::from_bwt`] with an explicit terminator threshold.
    pub fn from_bwt_with_terminator(bwt: &[u8], n: u64, terminator: u8) -> Result<Self> {
        Self::build(Ingest::from_bwt(bwt, n, terminator)?, terminator)
    }

    /// Build from pre-aggregated `(symbol, run_length)` records, bypassing
    /// run detection and terminator collapsing.
    pub fn from_runs<I>(n: u64, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u64)>,
    {
        Self::build(Ingest::from_runs(n, records)?, DEFAULT_TERMINATOR)
    }

    /// Build from the run-length text format: the first token is `n`,
    /// followed by one `<symbol> <length>` record per line.
    #[cfg(feature = "std")]
    pub fn from_rle_reader<R: std::io::BufRead>(reader: R) -> Result<Self> {
        let (n, records) = crate::runs::parse_rle(reader)?;
        Self::from_runs(n, records)
    }

    /// The single construction pass, in strict dependency order: alphabet,
    /// run-membership vectors, transient occurrence vectors, boundary vector,
    /// offset finalization. No partial structure ever escapes.
    fn build(ingest: Ingest, terminator: u8) -> Result<Self> {
        let Ingest {
            mut rows,
            n,
            char_counts,
            run_counts,
        } = ingest;
        let r = rows.len();

        let alphabet = Alphabet::new(&char_counts, &run_counts);
        let sigma = alphabet.sigma();
        debug!("building move structure: n={n} r={r} sigma={sigma}");

        // L-column start position of each run.
        let mut l_starts = Vec::with_capacity(r);
        let mut pos = 0u64;
        for row in &rows {
            l_starts.push(pos);
            pos += row.len();
        }

        // Runs grouped by head symbol, preserving L order within each group.
        // This is the F-order enumeration used twice below.
        let mut l_blocks: Vec<Vec<usize>> = vec![Vec::new(); sigma];
        for (j, row) in rows.iter().enumerate() {
            let k = alphabet
                .index_of(row.head())
                .expect("every run head was tallied");
            l_blocks[k].push(j);
        }

        // Run-membership vectors: bit j of B_x set iff head(run j) = x.
        let mut membership = Vec::with_capacity(sigma);
        for k in 0..sigma {
            let mut bv = BitVector::new();
            for row in &rows {
                bv.push(alphabet.index_of(row.head()) == Some(k));
            }
            bv.build_index();
            membership.push(bv);
        }

        // F-run-start positions, produced in sorted order by walking symbols
        // ascending and runs in L order. The occurrence vectors exist only
        // inside this block; they are construction scaffolding, not index
        // state.
        let f_starts = {
            let mut occurrence = Vec::with_capacity(sigma);
            for k in 0..sigma {
                let mut bv = BitVector::new();
                for row in &rows {
                    bv.push_run(alphabet.index_of(row.head()) == Some(k), row.len());
                }
                bv.build_index();
                occurrence.push(bv);
            }

            let mut f_starts = Vec::with_capacity(r);
            for (k, block) in l_blocks.iter().enumerate() {
                for &j in block {
                    let lf = alphabet.c(k) + occurrence[k].rank1(l_starts[j] as usize) as u64;
                    f_starts.push(lf);
                }
            }
            f_starts
        };

        // Interleave the two sorted r-element position sets into B_FL.
        // Coincidence emits 0,1; an F-start alone emits 1; an L-start alone
        // emits 0.
        let mut boundary = BitVector::new();
        {
            let mut fi = 0usize;
            let mut li = 0usize;
            while fi < r || li < r {
                match (f_starts.get(fi), l_starts.get(li)) {
                    (Some(&f), Some(&l)) if f == l => {
                        boundary.push(false);
                        boundary.push(true);
                        fi += 1;
                        li += 1;
                    }
                    (Some(&f), Some(&l)) if l < f => {
                        boundary.push(false);
                        li += 1;
                    }
                    (Some(_), _) => {
                        boundary.push(true);
                        fi += 1;
                    }
                    (None, Some(_)) => {
                        boundary.push(false);
                        li += 1;
                    }
                    (None, None) => unreachable!(),
                }
            }
        }
        boundary.build_index();
        debug_assert_eq!(boundary.len(), 2 * r);

        // Finalize each run's cross-table offset with one linear merge of the
        // F ordering against the L ordering. Pure local fold state; nothing
        // survives the pass.
        let mut f_seen = 0u64;
        let mut l_seen = 0u64;
        let mut curr_l = 0usize;
        for block in &l_blocks {
            for &j in block {
                rows[j].set_offset(f_seen - l_seen)?;
                f_seen += rows[j].len();

                while curr_l < r && f_seen >= l_seen + rows[curr_l].len() {
                    l_seen += rows[curr_l].len();
                    curr_l += 1;
                }
            }
        }

        info!("move structure built: n={n} r={r} sigma={sigma}");
        Ok(Self {
            n,
            rows,
            alphabet,
            membership,
            boundary,
            terminator,
        })
    }

    /// Text length including the terminator.
    #[inline]
    pub fn text_len(&self) -> u64 {
        self.n
    }

    /// Number of runs.
    #[inline]
    pub fn num_runs(&self) -> usize {
        self.rows.len()
    }

    /// The alphabet tables.
    #[inline]
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Row at a run index. Panics if `run >= num_runs()`.
    #[inline]
    pub fn row(&self, run: usize) -> Row {
        assert!(run < self.rows.len(), "run index out of range");
        self.rows[run]
    }

    /// Row under a position cursor. Panics if `pos.run >= num_runs()`.
    #[inline]
    pub fn row_at(&self, pos: Position) -> Row {
        self.row(pos.run)
    }

    /// Rank of `run`'s LF-image among all F-run-starts (0-based).
    #[inline]
    fn pi(&self, run: usize) -> usize {
        let k = self
            .alphabet
            .index_of(self.rows[run].head())
            .expect("run heads are always in the alphabet");
        self.alphabet.c_h(k) as usize + self.membership[k].rank1(run)
    }

    /// The pointer oracle: run index holding the LF-image of `run`'s head.
    ///
    /// `select1(pi)` locates this run's F-start in the interleaved stream;
    /// subtracting the ones before it (pi) and one for the bit itself leaves
    /// the count of strictly earlier L-run-starts, which is the destination
    /// run index. Pure function, O(1) amortized.
    pub fn pointer(&self, run: usize) -> usize {
        assert!(run < self.rows.len(), "run index out of range");
        let pi = self.pi(run);
        let sel = self
            .boundary
            .select1(pi)
            .expect("B_FL holds one set bit per run");
        sel - pi - 1
    }

    /// LF-mapping over (run, offset) positions.
    ///
    /// The carry loop is mandatory: an LF step can land past the destination
    /// run's end whenever run lengths are small, and the loop may advance
    /// across several runs.
    pub fn lf(&self, pos: Position) -> Position {
        assert!(pos.run < self.rows.len(), "run index out of range");
        let next = Position {
            run: self.pointer(pos.run),
            offset: self.rows[pos.run].offset() + pos.offset,
        };
        self.carry(next)
    }

    /// Normalize an overshot cursor: while the offset reaches past the
    /// current run, move it into the next one.
    #[inline]
    pub(crate) fn carry(&self, mut pos: Position) -> Position {
        while pos.offset >= self.rows[pos.run].len() {
            pos.offset -= self.rows[pos.run].len();
            pos.run += 1;
        }
        pos
    }

    /// Stable, versioned copy of every queryable table, sufficient for an
    /// external serializer to round-trip the index without the original BWT.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            n: self.n,
            terminator: self.terminator,
            rows: self.rows.clone(),
            symbols: self.alphabet.symbols_table().to_vec(),
            c: self.alphabet.c_table().to_vec(),
            c_h: self.alphabet.c_h_table().to_vec(),
            membership: self.membership.iter().map(BitVector::to_parts).collect(),
            boundary: self.boundary.to_parts(),
        }
    }

    /// Rebuild an index from a [`Snapshot`], revalidating the structural
    /// invariants instead of trusting the payload.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::InvalidSnapshot("unsupported snapshot version"));
        }

        let r = snapshot.rows.len();
        let total: u64 = snapshot.rows.iter().map(Row::len).sum();
        if total != snapshot.n {
            return Err(Error::InvalidSnapshot("run lengths do not sum to n"));
        }

        let alphabet = Alphabet::from_tables(snapshot.symbols, snapshot.c, snapshot.c_h)?;
        if snapshot.membership.len() != alphabet.sigma() {
            return Err(Error::InvalidSnapshot(
                "one membership vector per alphabet symbol required",
            ));
        }

        let mut membership = Vec::with_capacity(snapshot.membership.len());
        for parts in snapshot.membership {
            let bv = BitVector::from_parts(parts)?;
            if bv.len() != r {
                return Err(Error::InvalidSnapshot("membership vector length is not r"));
            }
            membership.push(bv);
        }

        let boundary = BitVector::from_parts(snapshot.boundary)?;
        if boundary.len() != 2 * r {
            return Err(Error::InvalidSnapshot("boundary vector length is not 2r"));
        }
        if boundary.count_ones() != r {
            return Err(Error::InvalidSnapshot("boundary vector must hold r ones"));
        }

        Ok(Self {
            n: snapshot.n,
            rows: snapshot.rows,
            alphabet,
            membership,
            boundary,
            terminator: snapshot.terminator,
        })
    }
}

/// Versioned snapshot of a built [`MoveIndex`]: the run table, alphabet
/// tables, membership vectors, and boundary vector, each with its rank/select
/// metadata. A persisted binary format is an external concern; this is the
/// surface it would serialize.
#[derive(Clone)]
pub struct Snapshot {
    pub version: u32,
    pub n: u64,
    pub terminator: u8,
    pub rows: Vec<Row>,
    pub symbols: Vec<u8>,
    pub c: Vec<u64>,
    pub c_h: Vec<u64>,
    pub membership: Vec<BitVectorParts>,
    pub boundary: BitVectorParts,
}

#[cfg(test)]
mod tests {
    use super::*;

    // BWT of "banana" + terminator: L = "annb\x01aa",
    // runs a1 n2 b1 #1 a2 (# = terminator).
    const BANANA_BWT: &[u8] = b"annb\x01aa";

    fn banana() -> MoveIndex {
        MoveIndex::from_bwt(BANANA_BWT, 7).unwrap()
    }

    #[test]
    fn test_build_scalars() {
        let idx = banana();
        assert_eq!(idx.text_len(), 7);
        assert_eq!(idx.num_runs(), 5);
        let total: u64 = (0..idx.num_runs()).map(|i| idx.row(i).len()).sum();
        assert_eq!(total, idx.text_len());
    }

    #[test]
    fn test_pointer_oracle() {
        // Destinations derived by hand from the F/L start sets of banana:
        // F-starts {0,1,2,4,5}, L-starts {0,1,3,4,5}.
        let idx = banana();
        assert_eq!(idx.pointer(0), 1);
        assert_eq!(idx.pointer(1), 4);
        assert_eq!(idx.pointer(2), 3);
        assert_eq!(idx.pointer(3), 0);
        assert_eq!(idx.pointer(4), 1);
    }

    #[test]
    fn test_pointer_is_pure() {
        let idx = banana();
        for run in 0..idx.num_runs() {
            assert_eq!(idx.pointer(run), idx.pointer(run));
        }
    }

    #[test]
    fn test_cross_table_offsets() {
        let idx = banana();
        let offsets: Vec<u64> = (0..5).map(|i| idx.row(i).offset()).collect();
        assert_eq!(offsets, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_lf_mapping() {
        let idx = banana();

        let p = idx.lf(Position { run: 0, offset: 0 });
        assert_eq!(p, Position { run: 1, offset: 0 });

        // Head of the second a-run lands mid-run: carry must fire.
        let p = idx.lf(Position { run: 4, offset: 1 });
        assert_eq!(p, Position { run: 2, offset: 0 });
    }

    #[test]
    fn test_lf_result_always_in_bounds() {
        let idx = banana();
        for run in 0..idx.num_runs() {
            for offset in 0..idx.row(run).len() {
                let p = idx.lf(Position { run, offset });
                assert!(p.run < idx.num_runs());
                assert!(p.offset < idx.row(p.run).len());
            }
        }
    }

    #[test]
    fn test_lf_monotone_within_symbol_blocks() {
        // Within one symbol's runs, LF images of the heads appear in
        // increasing text order.
        let idx = banana();
        let l_start = |run: usize| -> u64 { (0..run).map(|i| idx.row(i).len()).sum() };

        let mut last_image: Option<(u8, u64)> = None;
        for sym in 0u8..=255 {
            for run in 0..idx.num_runs() {
                if idx.row(run).head() != sym {
                    continue;
                }
                let p = idx.lf(Position { run, offset: 0 });
                let image = l_start(p.run) + p.offset;
                if let Some((prev_sym, prev)) = last_image {
                    if prev_sym == sym {
                        assert!(image > prev);
                    }
                }
                last_image = Some((sym, image));
            }
        }
    }

    #[test]
    fn test_run_length_mode_scenario() {
        let idx = MoveIndex::from_runs(14, [(b'A', 3u64), (b'C', 2), (b'G', 4), (b'A', 5)]).unwrap();
        assert_eq!(idx.num_runs(), 4);
        assert_eq!(idx.row(1).head(), b'C');
        assert_eq!(idx.text_len(), 14);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_row_out_of_range_panics() {
        let idx = banana();
        let result = std::panic::catch_unwind(|| idx.row(99));
        assert!(result.is_err());
    }

    #[test]
    fn test_offset_overflow_is_fatal() {
        // The first B run's head LF-steps to the far end of the 70000-long
        // A run, so its cross-table offset (69999) exceeds the 16-bit field
        // capacity: construction must fail, not truncate.
        let err = MoveIndex::from_runs(70002, [(b'B', 1u64), (b'A', 70000), (b'B', 1)])
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FieldOverflow {
                field: "run offset",
                value: 69999,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_index() {
        let idx = MoveIndex::from_bwt(b"", 0).unwrap();
        assert_eq!(idx.text_len(), 0);
        assert_eq!(idx.num_runs(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let idx = banana();
        let restored = MoveIndex::from_snapshot(idx.snapshot()).unwrap();

        assert_eq!(restored.text_len(), idx.text_len());
        assert_eq!(restored.num_runs(), idx.num_runs());
        for run in 0..idx.num_runs() {
            assert_eq!(restored.row(run), idx.row(run));
            assert_eq!(restored.pointer(run), idx.pointer(run));
        }
        assert_eq!(restored.count(b"ana"), idx.count(b"ana"));
    }

    #[test]
    fn test_snapshot_rejects_bad_version() {
        let idx = banana();
        let mut snap = idx.snapshot();
        snap.version = 999;
        assert!(matches!(
            MoveIndex::from_snapshot(snap),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_inconsistent_rows() {
        let idx = banana();
        let mut snap = idx.snapshot();
        snap.rows.pop();
        assert!(MoveIndex::from_snapshot(snap).is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_rle_reader() {
        let input = "14\nA 3\nC 2\nG 4\nA 5\n";
        let idx = MoveIndex::from_rle_reader(input.as_bytes()).unwrap();
        assert_eq!(idx.num_runs(), 4);
        assert_eq!(idx.row(1).head(), b'C');
    }
}
