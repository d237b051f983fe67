//! Virtual reels and the builder used to assemble them
//!
//! A [`VirtualReel`] is an immutable sequence of symbol codes addressed with
//! wraparound, so an unbounded spin counter maps onto a finite reel.
//! [`ReelBuilder`] is the single-use accumulator a generation task fills
//! before freezing it into a reel.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use rf_core::{RfError, RfResult};

use crate::codec;
use crate::symbols::{BLANK, Symbol};

/// Symbols written per unrolled step of [`ReelBuilder::add_symbol`]
const FILL_BATCH: usize = 8;

/// Demo machine reel: 3550 symbols, RTP 0.98 under the standard paytable
pub const DEMO_REEL: &str =
    "H4sIAAAAAAAA/+3BSw4AEAxAwfrT+x/Yzo6km0p4MyIAAAC4L8Aofiq9JzsrjqpBO+obY1HVCdYmCgzeDQAA";

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable accumulator for a reel under construction
///
/// Runs of a symbol are written at a cursor. Pre-size with
/// [`ReelBuilder::with_len`] when the final length is known so the fill
/// never reallocates.
#[derive(Debug, Clone, Default)]
pub struct ReelBuilder {
    buf: Vec<Symbol>,
    cursor: usize,
}

impl ReelBuilder {
    /// Empty builder that grows as symbols are added
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-sized to `len` blank positions
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: vec![BLANK; len],
            cursor: 0,
        }
    }

    /// Write `count` copies of `symbol` at the cursor and advance it
    pub fn add_symbol(&mut self, symbol: Symbol, count: usize) -> &mut Self {
        let end = self.cursor + count;
        if end > self.buf.len() {
            self.buf.resize(end, BLANK);
        }

        let batch = [symbol; FILL_BATCH];
        let mut chunks = self.buf[self.cursor..end].chunks_exact_mut(FILL_BATCH);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&batch);
        }
        for slot in chunks.into_remainder() {
            *slot = symbol;
        }

        self.cursor = end;
        self
    }

    /// Sort the contents ascending by symbol code
    pub fn sort(&mut self) -> &mut Self {
        self.buf.sort_unstable();
        self
    }

    /// Shuffle the contents
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.buf.shuffle(rng);
        self
    }

    /// Current length (pre-sized positions included)
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write position of the next run
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Symbol at a position (wraps around), `None` while empty
    pub fn get(&self, position: usize) -> Option<Symbol> {
        if self.buf.is_empty() {
            return None;
        }
        Some(self.buf[position % self.buf.len()])
    }

    /// Contents written so far
    pub fn as_slice(&self) -> &[Symbol] {
        &self.buf
    }

    /// Give up the raw buffer without the non-empty check of [`Self::build`]
    pub fn into_bytes(self) -> Vec<Symbol> {
        self.buf
    }

    /// Freeze into an immutable reel
    pub fn build(self) -> RfResult<VirtualReel> {
        VirtualReel::from_bytes(self.buf)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL REEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable, non-empty sequence of symbol codes
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VirtualReel {
    data: Box<[Symbol]>,
}

impl VirtualReel {
    /// Wrap raw symbol bytes; an empty sequence is rejected
    pub fn from_bytes(bytes: Vec<Symbol>) -> RfResult<Self> {
        if bytes.is_empty() {
            return Err(RfError::invalid_param("reel must contain at least one symbol"));
        }
        Ok(Self {
            data: bytes.into_boxed_slice(),
        })
    }

    /// Symbol at any position, taken modulo the reel size
    #[inline]
    pub fn get(&self, position: i64) -> Symbol {
        let index = position.rem_euclid(self.data.len() as i64) as usize;
        self.data[index]
    }

    /// Number of symbols
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[Symbol] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<Symbol> {
        self.data.into_vec()
    }

    /// Compact string form (gzip + base64)
    pub fn encode(&self) -> RfResult<String> {
        codec::encode_gzip_base64(&self.data)
    }

    /// Parse the string form produced by [`Self::encode`]
    pub fn decode(encoded: &str) -> RfResult<Self> {
        let bytes = codec::decode_gzip_base64(encoded)?;
        if bytes.is_empty() {
            return Err(RfError::Codec("encoded reel holds no symbols".into()));
        }
        Self::from_bytes(bytes)
    }

    /// Decode, then shuffle the symbol order
    ///
    /// Stored reels are sorted; a playable reel wants the symbols spread out.
    pub fn decode_shuffled<R: Rng + ?Sized>(encoded: &str, rng: &mut R) -> RfResult<Self> {
        let mut bytes = codec::decode_gzip_base64(encoded)?;
        if bytes.is_empty() {
            return Err(RfError::Codec("encoded reel holds no symbols".into()));
        }
        bytes.shuffle(rng);
        Self::from_bytes(bytes)
    }

    /// Occurrences of each symbol code, indexed by code up to the highest present
    pub fn symbol_counts(&self) -> Vec<usize> {
        let max = self.data.iter().copied().max().unwrap_or(BLANK) as usize;
        let mut counts = vec![0usize; max + 1];
        for &symbol in self.data.iter() {
            counts[symbol as usize] += 1;
        }
        counts
    }
}

impl fmt::Debug for VirtualReel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualReel")
            .field("size", &self.data.len())
            .field("counts", &self.symbol_counts())
            .finish()
    }
}

impl fmt::Display for VirtualReel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode().map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl TryFrom<Vec<Symbol>> for VirtualReel {
    type Error = RfError;

    fn try_from(bytes: Vec<Symbol>) -> RfResult<Self> {
        Self::from_bytes(bytes)
    }
}
