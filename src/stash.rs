//! Sliding byte window for frame metadata.
//!
//! Every raw byte of header and framing metadata enters the decoder through
//! the stash; block payloads bypass it. The window keeps its bytes until the
//! next flush, which lets the header checksum hash exactly the fields it
//! covers without re-reading them from the source.

use crate::checksum::Checksum;

/// Window capacity. The longest span stashed between flushes is a full
/// frame header of 19 bytes.
pub const STASH_SIZE: usize = 32;

/// Fixed window over recently stashed metadata bytes.
#[derive(Debug, Clone)]
pub struct Stash {
    buf: [u8; STASH_SIZE],
    head: usize,
}

impl Stash {
    pub fn new() -> Self {
        Self {
            buf: [0; STASH_SIZE],
            head: 0,
        }
    }

    /// Number of bytes stashed since the last flush.
    pub fn len(&self) -> usize {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head == 0
    }

    /// Discards the window. Digests taken afterwards cover only bytes
    /// stashed from this point on.
    pub fn flush(&mut self) {
        self.head = 0;
    }

    /// Writable region extending the window to `target` stashed bytes.
    pub fn window_to(&mut self, target: usize) -> &mut [u8] {
        debug_assert!(target >= self.head && target <= STASH_SIZE);
        &mut self.buf[self.head..target]
    }

    /// Marks `n` bytes of the window region as stashed.
    pub fn commit(&mut self, n: usize) {
        debug_assert!(self.head + n <= STASH_SIZE);
        self.head += n;
    }

    /// The last `n` stashed bytes, oldest first.
    pub fn last_n(&self, n: usize) -> &[u8] {
        &self.buf[self.head - n..self.head]
    }

    /// The last stashed byte.
    pub fn last_u8(&self) -> u8 {
        self.buf[self.head - 1]
    }

    /// The last two stashed bytes as a little-endian integer.
    pub fn last_u16(&self) -> u16 {
        let b = self.last_n(2);
        u16::from_le_bytes([b[0], b[1]])
    }

    /// The last four stashed bytes as a little-endian integer.
    pub fn last_u32(&self) -> u32 {
        let b = self.last_n(4);
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// The last eight stashed bytes as a little-endian integer.
    pub fn last_u64(&self) -> u64 {
        let b = self.last_n(8);
        u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    /// Hashes the stashed bytes from `offset` up to the head.
    pub fn digest<H: Checksum>(&self, offset: usize) -> u32 {
        H::oneshot(&self.buf[offset..self.head])
    }
}

impl Default for Stash {
    fn default() -> Self {
        Self::new()
    }
}
