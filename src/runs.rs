//! Run table primitives and BWT ingestion.
//!
//! A run is one maximal block of identical symbols in the BWT's L column.
//! Ingestion accepts either the raw symbol stream (run detection happens
//! here) or pre-aggregated `(symbol, length)` records, and tallies per-symbol
//! character and run counts for the alphabet tables.
//!
//! **Normalization rule (raw mode)**: every symbol at or below the terminator
//! threshold is collapsed to the canonical terminator byte *before* run
//! detection. Distinct small-valued symbols are indistinguishable for
//! run-splitting purposes. This is deliberate, not a side effect: multi-text
//! BWTs carry several separator values that must behave as one.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Capacity of the stored run-length field, in bits.
pub const LENGTH_BITS: u32 = 32;
/// Capacity of the stored cross-table offset field, in bits.
pub const OFFSET_BITS: u32 = 16;

/// Largest storable run length.
pub const MAX_RUN_LENGTH: u64 = (1u64 << LENGTH_BITS) - 1;
/// Largest storable cross-table offset.
pub const MAX_OFFSET: u64 = (1u64 << OFFSET_BITS) - 1;

/// Default terminator threshold for raw-mode ingestion.
pub const DEFAULT_TERMINATOR: u8 = 1;

/// One run of the L column: head symbol, run length, and the cross-table
/// offset finalized during boundary-vector construction.
///
/// Field widths are fixed at build time ([`LENGTH_BITS`], [`OFFSET_BITS`]);
/// exceeding a capacity is a construction-time error, never a silent
/// truncation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    pub(crate) head: u8,
    pub(crate) length: u32,
    pub(crate) offset: u32,
}

impl Row {
    pub(crate) fn new(head: u8, length: u64) -> Result<Self> {
        if length > MAX_RUN_LENGTH {
            return Err(Error::FieldOverflow {
                field: "run length",
                value: length,
                max: MAX_RUN_LENGTH,
            });
        }
        Ok(Self {
            head,
            length: length as u32,
            offset: 0,
        })
    }

    pub(crate) fn set_offset(&mut self, offset: u64) -> Result<()> {
        if offset > MAX_OFFSET {
            return Err(Error::FieldOverflow {
                field: "run offset",
                value: offset,
                max: MAX_OFFSET,
            });
        }
        self.offset = offset as u32;
        Ok(())
    }

    /// Head symbol of the run.
    #[inline]
    pub fn head(&self) -> u8 {
        self.head
    }

    /// Run length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.length as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Cross-table offset: intra-run displacement of this run's head after
    /// one LF step, within its destination run.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }
}

/// Query-time cursor: a run index plus a displacement within that run.
/// Produced and consumed by LF-mapping and backward search, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub run: usize,
    pub offset: u64,
}

/// Ingestion output: the run table plus per-symbol tallies.
#[derive(Debug)]
pub(crate) struct Ingest {
    pub rows: Vec<Row>,
    pub n: u64,
    /// Characters per raw symbol value.
    pub char_counts: Vec<u64>,
    /// Runs per raw symbol value.
    pub run_counts: Vec<u64>,
}

impl Ingest {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            n: 0,
            char_counts: alloc::vec![0u64; 256],
            run_counts: alloc::vec![0u64; 256],
        }
    }

    fn flush(&mut self, head: u8, length: u64) -> Result<()> {
        self.rows.push(Row::new(head, length)?);
        self.char_counts[head as usize] += length;
        self.run_counts[head as usize] += 1;
        self.n += length;
        Ok(())
    }

    fn check_declared(self, declared_n: u64) -> Result<Self> {
        if self.n != declared_n {
            return Err(Error::LengthMismatch {
                declared: declared_n,
                actual: self.n,
            });
        }
        Ok(self)
    }

    /// Raw mode: detect runs in a BWT symbol stream.
    ///
    /// `declared_n` is the total text length announced by the caller and must
    /// match the stream. An empty stream yields zero runs (and requires
    /// `declared_n == 0`); the final flush only fires for a non-empty stream.
    pub fn from_bwt(bwt: &[u8], declared_n: u64, terminator: u8) -> Result<Self> {
        let mut ingest = Ingest::empty();
        let mut last = 0u8;
        let mut length = 0u64;

        for &raw in bwt {
            let c = if raw <= terminator { terminator } else { raw };

            if length > 0 && c != last {
                ingest.flush(last, length)?;
                length = 0;
            }

            length += 1;
            last = c;
        }

        if length > 0 {
            ingest.flush(last, length)?;
        }

        log::debug!(
            "raw ingest: n={} r={} declared={}",
            ingest.n,
            ingest.rows.len(),
            declared_n
        );
        ingest.check_declared(declared_n)
    }

    /// Run-length mode: accept `(symbol, length)` records directly,
    /// bypassing run detection and terminator collapsing.
    ///
    /// A zero-length record is malformed. Records are trusted to describe
    /// maximal runs; adjacent records with equal symbols are kept as given.
    pub fn from_runs<I>(declared_n: u64, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u64)>,
    {
        let mut ingest = Ingest::empty();

        for (line, (symbol, length)) in records.into_iter().enumerate() {
            if length == 0 {
                return Err(Error::MalformedRecord { line: line + 1 });
            }
            ingest.flush(symbol, length)?;
        }

        log::debug!(
            "run-length ingest: n={} r={} declared={}",
            ingest.n,
            ingest.rows.len(),
            declared_n
        );
        ingest.check_declared(declared_n)
    }
}

/// Parse the run-length text format: the first token is the total length
/// `n`, followed by one `<symbol> <length>` record per line, where `symbol`
/// is a single ASCII character.
#[cfg(feature = "std")]
pub(crate) fn parse_rle<R: std::io::BufRead>(reader: R) -> Result<(u64, Vec<(u8, u64)>)> {
    let mut declared_n: Option<u64> = None;
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if declared_n.is_none() {
            let n = trimmed
                .parse::<u64>()
                .map_err(|_| Error::MalformedRecord { line: line_no })?;
            declared_n = Some(n);
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let symbol = fields
            .next()
            .filter(|tok| tok.len() == 1)
            .map(|tok| tok.as_bytes()[0])
            .ok_or(Error::MalformedRecord { line: line_no })?;
        let length = fields
            .next()
            .and_then(|tok| tok.parse::<u64>().ok())
            .ok_or(Error::MalformedRecord { line: line_no })?;
        if fields.next().is_some() {
            return Err(Error::MalformedRecord { line: line_no });
        }
        records.push((symbol, length));
    }

    let declared_n = declared_n.ok_or(Error::TruncatedInput)?;
    Ok((declared_n, records))
}
