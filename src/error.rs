//! Decoder error kinds.
//!
//! Every protocol violation is fatal: the session that raised it refuses
//! further work with [`FrameError::AlreadyFailed`]. Clean end of input
//! before any frame byte is not an error and surfaces as an empty read.

use std::io;

use thiserror::Error;

use crate::codec::CodecError;

/// Shorthand for results carrying [`FrameError`].
pub type Result<T> = std::result::Result<T, FrameError>;

/// Fatal failure of a decode session.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The input does not open with the frame magic number.
    #[error("expected frame magic 0x184d2204, found {found:#010x}")]
    BadMagic { found: u32 },

    /// The FLG version bits name a revision this decoder does not speak.
    #[error("unsupported frame version {version}")]
    UnsupportedVersion { version: u8 },

    /// The stored header checksum byte does not match the header fields.
    #[error("header checksum mismatch: stored {expected:#04x}, computed {actual:#04x}")]
    InvalidHeaderChecksum { expected: u8, actual: u8 },

    /// The frame requires a predefined dictionary.
    #[error("frame requires dictionary {0:#010x}; dictionaries are not supported")]
    UnsupportedDictionary(u32),

    /// The input ended in the middle of a frame.
    #[error("input ended inside a frame")]
    Truncated,

    /// A block checksum does not match the block payload.
    #[error("block checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    InvalidBlockChecksum { expected: u32, actual: u32 },

    /// The content checksum does not match the decoded output.
    #[error("content checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    InvalidContentChecksum { expected: u32, actual: u32 },

    /// A block length field exceeds the frame's block maximum size.
    #[error("block of {length} bytes exceeds the frame limit of {max}")]
    BlockTooLarge { length: usize, max: usize },

    /// The block codec rejected a payload.
    #[error("block codec failed: {0}")]
    Codec(#[from] CodecError),

    /// The raw byte source failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The session already failed and refuses further work.
    #[error("decode session already failed")]
    AlreadyFailed,
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(inner) => inner,
            FrameError::Truncated => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            _ => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}
