//! Asynchronous frame reader over any `tokio::io::AsyncRead` source.
//!
//! The same [`FrameEngine`] the blocking reader pumps, awaited instead of
//! blocked on: the engine's input requests are the only suspension points,
//! so a task switch can only happen at a source read boundary and the
//! parse state stays consistent across it.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::checksum::{Checksum, Xxh32};
use crate::codec::BlockCodec;
use crate::engine::{DecodeOptions, FrameEngine, Step};
use crate::error::FrameError;
use crate::types::FrameDescriptor;

/// Decodes one frame from an asynchronous byte source.
///
/// Dropping an in-flight call leaves the reader resumable: no parse state
/// is lost at a suspension point. Bytes already copied into the caller's
/// destination by the dropped call are gone, however, so `read_bytes` is
/// not cancellation safe in the byte-exact sense. The [`AsyncRead`]
/// implementation delivers bytes in interactive mode, returning as soon
/// as any are available.
pub struct AsyncFrameReader<S, C, H = Xxh32>
where
    S: AsyncRead + Unpin,
    C: BlockCodec,
    H: Checksum,
{
    source: S,
    engine: FrameEngine<C, H>,
}

impl<S, C, H> AsyncFrameReader<S, C, H>
where
    S: AsyncRead + Unpin,
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
    /// bytes are available.
    pub async fn read_bytes(
        &mut self,
        dst: &mut [u8],
        interactive: bool,
    ) -> Result<usize, FrameError> {
        let mut filled = 0;
        loop {
            match self.engine.read_step(dst, &mut filled, interactive)? {
                Step::Done => return Ok(filled),
                Step::NeedInput { .. } => self.pump().await?,
            }
        }
    }

    /// Decodes the next byte, or `None` at the end of the stream.
    pub async fn read_one_byte(&mut self) -> Result<Option<u8>, FrameError> {
        let mut one = [0u8; 1];
        Ok(match self.read_bytes(&mut one, false).await? {
            0 => None,
            _ => Some(one[0]),
        })
    }

    /// Content length declared by the frame header, if the producer wrote
    /// one. Reads the header from the source when necessary.
    pub async fn frame_length(&mut self) -> Result<Option<u64>, FrameError> {
        self.ensure_header().await?;
        Ok(self.engine.frame_length())
    }

    /// Full parsed frame descriptor, or `None` when the source holds no
    /// frame. Reads the header from the source when necessary.
    pub async fn frame_descriptor(&mut self) -> Result<Option<&FrameDescriptor>, FrameError> {
        self.ensure_header().await?;
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

    async fn ensure_header(&mut self) -> Result<(), FrameError> {
        loop {
            match self.engine.header_step()? {
                Step::Done => return Ok(()),
                Step::NeedInput { .. } => self.pump().await?,
            }
        }
    }

    /// One source read into the engine. Zero read bytes reach the engine
    /// as its end-of-input signal.
    async fn pump(&mut self) -> Result<(), FrameError> {
        let n = self.source.read(self.engine.fill_target()).await?;
        self.engine.commit(n)
    }
}

impl<S, C, H> AsyncRead for AsyncFrameReader<S, C, H>
where
    S: AsyncRead + Unpin,
    C: BlockCodec + Unpin,
    H: Checksum,
    H::State: Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let dst = buf.initialize_unfilled();
        let mut filled = 0;
        let result = loop {
            match this.engine.read_step(dst, &mut filled, true) {
                Ok(Step::Done) => break Ok(()),
                Ok(Step::NeedInput { .. }) => {
                    let mut target = ReadBuf::new(this.engine.fill_target());
                    match Pin::new(&mut this.source).poll_read(cx, &mut target) {
                        Poll::Pending => {
                            // Interactive stepping returns Done as soon as
                            // bytes are drained, so nothing is in flight here.
                            debug_assert_eq!(filled, 0);
                            return Poll::Pending;
                        }
                        Poll::Ready(Ok(())) => {
                            let n = target.filled().len();
                            if let Err(err) = this.engine.commit(n) {
                                break Err(err);
                            }
                        }
                        Poll::Ready(Err(err)) => break Err(FrameError::Io(err)),
                    }
                }
                Err(err) => break Err(err),
            }
        };
        match result {
            Ok(()) => {
                buf.advance(filled);
                Poll::Ready(Ok(()))
            }
            Err(err) => Poll::Ready(Err(err.into())),
        }
    }
}
