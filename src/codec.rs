//! Block codec seam.
//!
//! The frame layer treats block payloads as opaque. A [`BlockCodec`] turns
//! compressed payloads back into bytes and observes stored ones, so codecs
//! for chained frames can keep their history window current either way.

use thiserror::Error;

use crate::types::FrameDescriptor;

/// Failure inside a block codec. Always fatal to the frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The compressed payload is malformed.
    #[error("malformed compressed block: {0}")]
    Malformed(&'static str),

    /// The decoded block would not fit the output buffer.
    #[error("decoded block needs {needed} bytes, buffer holds {capacity}")]
    Overflow { needed: usize, capacity: usize },
}

/// Per-frame block decoder.
///
/// One instance is built for each frame right after its header has been
/// validated, and dropped when the frame closes.
pub trait BlockCodec: Sized {
    /// Builds the codec for one frame from its parsed descriptor.
    fn for_frame(descriptor: &FrameDescriptor) -> Self;

    /// Decodes one compressed payload into `output` and returns the decoded
    /// length. `output` is sized to the frame's block maximum size.
    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError>;

    /// Observes a block that was stored uncompressed on the wire.
    fn inject(&mut self, block: &[u8]);
}
