//! Blocking frame reader over any `std::io::Read` source.
//!
//! A thin pump around [`FrameEngine`]: whenever the engine asks for input
//! the reader blocks on the source, then resumes the engine. All protocol
//! logic lives in the engine; this file only moves bytes.

use std::io::{self, Read};

use crate::checksum::{Checksum, Xxh32};
use crate::codec::BlockCodec;
use crate::engine::{DecodeOptions, FrameEngine, Step};
use crate::error::FrameError;
use crate::types::FrameDescriptor;

/// Decodes one frame from a blocking byte source.
///
/// `C` is the block codec, built per frame from the parsed descriptor.
/// The reader also implements [`std::io::Read`], delivering decoded bytes
/// in interactive mode: a `read` returns as soon as any bytes are
/// available rather than filling the whole buffer.
pub struct FrameReader<S, C, H = Xxh32>
where
    S: Read,
    C: BlockCodec,
    H: Checksum,
{
    source: S,
    engine: FrameEngine<C, H>,
}

impl<S, C, H> FrameReader<S, C, H>
where
    S: Read,
    C: BlockCodec,
    H: Checksum,
{
    pub fn new(source: S) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: S, options: DecodeOptions) -> Self {
        Self {
            source,
            engine: FrameEngine::with_options(options),
        }
    }

    /// Decodes up to `dst.len()` bytes into `dst`.
    ///
    /// Non-interactive calls return short only at end of frame or when no
    /// frame is present. Interactive calls return as soon as any decoded
    /// bytes are available, which keeps latency low on trickling sources.
    pub fn read_bytes(&mut self, dst: &mut [u8], interactive: bool) -> Result<usize, FrameError> {
        let mut filled = 0;
        loop {
            match self.engine.read_step(dst, &mut filled, interactive)? {
                Step::Done => return Ok(filled),
                Step::NeedInput { .. } => self.pump()?,
            }
        }
    }

    /// Decodes the next byte, or `None` at the end of the stream.
    pub fn read_one_byte(&mut self) -> Result<Option<u8>, FrameError> {
        let mut one = [0u8; 1];
        Ok(match self.read_bytes(&mut one, false)? {
            0 => None,
            _ => Some(one[0]),
        })
    }

    /// Content length declared by the frame header, if the producer wrote
    /// one. Reads the header from the source when necessary.
    pub fn frame_length(&mut self) -> Result<Option<u64>, FrameError> {
        self.ensure_header()?;
        Ok(self.engine.frame_length())
    }

    /// Full parsed frame descriptor, or `None` when the source holds no
    /// frame. Reads the header from the source when necessary.
    pub fn frame_descriptor(&mut self) -> Result<Option<&FrameDescriptor>, FrameError> {
        self.ensure_header()?;
        Ok(self.engine.descriptor())
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn ensure_header(&mut self) -> Result<(), FrameError> {
        loop {
            match self.engine.header_step()? {
                Step::Done => return Ok(()),
                Step::NeedInput { .. } => self.pump()?,
            }
        }
    }

    /// One source read into the engine. Zero read bytes reach the engine
    /// as its end-of-input signal.
    fn pump(&mut self) -> Result<(), FrameError> {
        let n = loop {
            match self.source.read(self.engine.fill_target()) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        };
        self.engine.commit(n)
    }
}

impl<S, C, H> Read for FrameReader<S, C, H>
where
    S: Read,
    C: BlockCodec,
    H: Checksum,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_bytes(buf, true)?)
    }
}
