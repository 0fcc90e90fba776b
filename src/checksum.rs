//! Checksum provider seam and the XXH32 default.
//!
//! The frame format specifies XXH32 with seed 0 for its header, block, and
//! content checksums. The decoder itself only ever talks to the
//! [`Checksum`] trait, so tests can substitute trivial hashes.

/// Streaming XXH32 state from the `xxhash-rust` crate.
pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// 32-bit checksum algorithm with one-shot and streaming forms.
pub trait Checksum {
    /// Streaming state, fed incrementally as blocks decode.
    type State;

    /// Hashes one complete buffer.
    fn oneshot(data: &[u8]) -> u32;

    /// Opens a fresh streaming state.
    fn begin() -> Self::State;

    /// Folds more bytes into a streaming state.
    fn update(state: &mut Self::State, data: &[u8]);

    /// Reads the digest of a streaming state without consuming it.
    fn digest(state: &Self::State) -> u32;
}

/// XXH32 with seed 0, the checksum the frame format specifies.
pub struct Xxh32;

impl Checksum for Xxh32 {
    type State = Xxh32State;

    fn oneshot(data: &[u8]) -> u32 {
        xxhash_rust::xxh32::xxh32(data, 0)
    }

    fn begin() -> Self::State {
        Xxh32State::new(0)
    }

    fn update(state: &mut Self::State, data: &[u8]) {
        state.update(data);
    }

    fn digest(state: &Self::State) -> u32 {
        state.digest()
    }
}
