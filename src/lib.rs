// lz4-frame: streaming decoder for the LZ4 frame format.

pub mod async_reader;
pub mod checksum;
pub mod codec;
pub mod engine;
pub mod error;
pub mod reader;
pub(crate) mod stash;
pub mod types;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use async_reader::AsyncFrameReader;
pub use checksum::{Checksum, Xxh32};
pub use codec::{BlockCodec, CodecError};
pub use engine::{DecodeOptions, FrameEngine, Step};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use types::{FrameDescriptor, BLOCK_UNCOMPRESSED_FLAG, FRAME_MAGIC};
