//! Succinct bit vector with rank and select-on-ones support.
//!
//! **Interleaved Memory Layout**: [RankHeader(u64) | Body(8 x u64)]
//! Optimized for L1 cache locality. Single fetch rank execution.
//!
//! Select1 uses a coarse block index (one entry per 512 one-bits) plus a
//! binary search over the interleaved rank headers, so rank and select share
//! the same storage.

extern crate alloc;
use alloc::vec::Vec;

/// 512 bits of body + 64 bits of header = 576 bits per block
/// Fits reasonably well in cache lines (9 * u64 = 72 bytes)
const BLOCK_BITS: usize = 512;
const WORDS_PER_BLOCK: usize = 8;
const BLOCK_STRIDE: usize = WORDS_PER_BLOCK + 1; // 1 Header + 8 Body

/// Raw components of a finalized [`BitVector`], exposed for snapshotting.
#[derive(Clone, Debug)]
pub struct BitVectorParts {
    /// Interleaved words: [Rank0, Word0..7, Rank1, Word8..15, ...]
    pub data: Vec<u64>,
    /// Coarse select1 index: block hint for every 512th one-bit.
    pub select1_index: Vec<u32>,
    /// Total number of set bits.
    pub ones: u64,
    /// Length in bits.
    pub len: u64,
}

#[derive(Clone)]
pub struct BitVector {
    /// Interleaved data: [Rank0, Word0..7, Rank1, Word8..15, ...]
    data: Vec<u64>,
    /// Coarse index for select1: block hint for every 512th one-bit
    select1_index: Vec<u32>,
    /// Total set bits, finalized by build_index()
    ones: usize,
    len: usize,
}

impl BitVector {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            select1_index: Vec::new(),
            ones: 0,
            len: 0,
        }
    }

    /// Push a bit to the vector.
    /// Header placeholders are written during push, finalized by build_index().
    #[inline]
    pub fn push(&mut self, bit: bool) {
        let bit_idx = self.len % BLOCK_BITS;

        // New block start? Push header placeholder.
        if bit_idx == 0 {
            self.data.push(0);
        }

        let word_offset = bit_idx / 64;
        let bit_offset = bit_idx % 64;

        // Calculate target index in interleaved layout
        let block_base = (self.len / BLOCK_BITS) * BLOCK_STRIDE;
        let target_idx = block_base + 1 + word_offset;

        // Ensure space for the word
        if target_idx >= self.data.len() {
            self.data.push(0);
        }

        if bit {
            self.data[target_idx] |= 1 << bit_offset;
        }

        self.len += 1;
    }

    /// Push `count` copies of `bit`.
    pub fn push_run(&mut self, bit: bool, count: u64) {
        for _ in 0..count {
            self.push(bit);
        }
    }

    /// Finalize the index. Must be called after all pushes.
    /// Calculates the rank headers in-place and the coarse select1 index.
    pub fn build_index(&mut self) {
        let num_blocks = self.num_blocks();
        let mut sum = 0usize;
        let mut next_select1_threshold = 0usize;
        self.select1_index.clear();

        for b in 0..num_blocks {
            let base = b * BLOCK_STRIDE;

            // 1. Write current cumulative rank to header
            self.data[base] = sum as u64;

            while sum >= next_select1_threshold {
                self.select1_index.push(b as u32);
                next_select1_threshold += BLOCK_BITS;
            }

            // 2. Sum up popcounts in this block for the next header
            let bits_in_block = if b == num_blocks - 1 {
                self.len - b * BLOCK_BITS
            } else {
                BLOCK_BITS
            };
            let words_in_block = (bits_in_block + 63) / 64;

            for w in 0..words_in_block {
                sum += self.data[base + 1 + w].count_ones() as usize;
            }
        }

        // Sentinel hint so every k < ones has a covering coarse entry.
        while sum >= next_select1_threshold {
            self.select1_index.push(num_blocks as u32);
            next_select1_threshold += BLOCK_BITS;
        }

        self.ones = sum;
    }

    #[inline]
    fn num_blocks(&self) -> usize {
        (self.len + BLOCK_BITS - 1) / BLOCK_BITS
    }

    /// Cumulative ones before block `b`; blocks past the end count all ones.
    #[inline]
    fn block_header(&self, b: usize) -> usize {
        if b >= self.num_blocks() {
            self.ones
        } else {
            self.data[b * BLOCK_STRIDE] as usize
        }
    }

    /// Access bit at index
    #[inline(always)]
    pub fn get(&self, i: usize) -> bool {
        let block = i / BLOCK_BITS;
        let offset = i % BLOCK_BITS;
        let word = offset / 64;
        let bit = offset % 64;

        let idx = block * BLOCK_STRIDE + 1 + word;
        (self.data[idx] >> bit) & 1 != 0
    }

    /// Rank1(i): Count 1s in [0..i)
    /// **Cache Optimized**: Fetches header and body from contiguous memory.
    #[inline(always)]
    pub fn rank1(&self, i: usize) -> usize {
        let i = i.min(self.len);
        if i == 0 {
            return 0;
        }

        let block = i / BLOCK_BITS;
        let offset = i % BLOCK_BITS;

        // Exact block boundary: the next header already holds the answer.
        if offset == 0 {
            return self.block_header(block);
        }

        let base = block * BLOCK_STRIDE;

        // 1. Header Load (Base Rank) - Single cache line with body
        let mut r = self.data[base] as usize;

        // 2. Body Sum (Popcount)
        let word_idx = offset / 64;
        let bit_idx = offset % 64;

        for w in 0..word_idx {
            r += self.data[base + 1 + w].count_ones() as usize;
        }

        // 3. Partial Word
        if bit_idx > 0 {
            let mask = (1u64 << bit_idx) - 1;
            r += (self.data[base + 1 + word_idx] & mask).count_ones() as usize;
        }

        r
    }

    /// Rank0(i): Count 0s in [0..i)
    #[inline(always)]
    pub fn rank0(&self, i: usize) -> usize {
        i.min(self.len) - self.rank1(i)
    }

    /// Select1(k): position of the k-th set bit (0-indexed).
    ///
    /// The coarse hint narrows the block range, a binary search over the rank
    /// headers pins the block, then a word scan finishes inside it.
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.ones {
            return None;
        }

        let target = k + 1;
        let num_blocks = self.num_blocks();

        let hint = k / BLOCK_BITS;
        let mut lo = self.select1_index[hint] as usize;
        let mut hi = if hint + 1 < self.select1_index.len() {
            (self.select1_index[hint + 1] as usize + 1).min(num_blocks + 1)
        } else {
            num_blocks
        };

        // First block whose header reaches the target; the block we want is
        // the one just before it.
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.block_header(mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let block = lo - 1;

        let base = block * BLOCK_STRIDE;
        let mut remaining = target - self.data[base] as usize;

        for w in 0..WORDS_PER_BLOCK {
            let idx = base + 1 + w;
            if idx >= self.data.len() {
                break;
            }
            let word = self.data[idx];
            let pc = word.count_ones() as usize;
            if pc >= remaining {
                return Some(block * BLOCK_BITS + w * 64 + select_in_word(word, remaining - 1));
            }
            remaining -= pc;
        }

        None
    }

    /// Total number of set bits. Valid after build_index().
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decompose into raw parts for snapshotting.
    pub fn into_parts(self) -> BitVectorParts {
        BitVectorParts {
            data: self.data,
            select1_index: self.select1_index,
            ones: self.ones as u64,
            len: self.len as u64,
        }
    }

    /// Copy out raw parts for snapshotting without consuming the vector.
    pub fn to_parts(&self) -> BitVectorParts {
        self.clone().into_parts()
    }

    /// Reconstruct a finalized `BitVector` from its raw parts.
    ///
    /// Performs structural validation; the rank headers and select index are
    /// recomputed rather than trusted, so only the `data` words and `len`
    /// need to be intact.
    pub fn from_parts(parts: BitVectorParts) -> crate::error::Result<Self> {
        let len = parts.len as usize;
        let num_blocks = (len + BLOCK_BITS - 1) / BLOCK_BITS;
        let expected_words = if num_blocks == 0 {
            0
        } else {
            let last_bits = len - (num_blocks - 1) * BLOCK_BITS;
            (num_blocks - 1) * BLOCK_STRIDE + 1 + (last_bits + 63) / 64
        };
        if parts.data.len() != expected_words {
            return Err(crate::error::Error::InvalidSnapshot(
                "bit vector word count does not match its length",
            ));
        }

        let mut bv = Self {
            data: parts.data,
            select1_index: Vec::new(),
            ones: 0,
            len,
        };
        bv.build_index();

        if bv.ones as u64 != parts.ones {
            return Err(crate::error::Error::InvalidSnapshot(
                "bit vector popcount does not match recorded ones",
            ));
        }
        if bv.select1_index.len() != parts.select1_index.len() {
            return Err(crate::error::Error::InvalidSnapshot(
                "bit vector select index has unexpected size",
            ));
        }
        Ok(bv)
    }
}

impl Default for BitVector {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the k-th set bit (0-indexed) inside a single word.
/// Caller guarantees the word has more than k set bits.
#[inline]
fn select_in_word(word: u64, k: usize) -> usize {
    let mut count = 0;
    for i in 0..64 {
        if (word >> i) & 1 == 1 {
            if count == k {
                return i;
            }
            count += 1;
        }
    }
    63
}
