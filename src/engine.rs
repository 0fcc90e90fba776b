//! Sans-io decode engine.
//!
//! One state machine parses the whole frame and never touches a byte
//! source. When it runs out of raw bytes it returns [`Step::NeedInput`];
//! the caller copies input into [`FrameEngine::fill_target`] and reports
//! the count through [`FrameEngine::commit`]. The blocking and
//! asynchronous readers are thin pumps around this surface, so both
//! execute the same algorithm.
//!
//! Covers:
//! - `Stage`: the suspension points of the parse
//! - header parsing and validation
//! - block framing, checksum verification, and codec dispatch
//! - the destination drain loop with interactive mode

use tracing::{debug, trace};

use crate::checksum::{Checksum, Xxh32};
use crate::codec::BlockCodec;
use crate::error::FrameError;
use crate::stash::Stash;
use crate::types::{
    FrameDescriptor, FrameFlags, BLOCK_LENGTH_SIZE, BLOCK_UNCOMPRESSED_FLAG, CHECKSUM_SIZE,
    FRAME_MAGIC, FRAME_VERSION, MAGIC_SIZE,
};

/// Tuning knobs for a decode session.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Consume block and content checksum fields without verifying them.
    /// The header checksum is always verified.
    pub skip_checksums: bool,
}

/// Outcome of driving the engine one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The engine needs at least `min` more raw bytes. Fill
    /// [`FrameEngine::fill_target`] and report through
    /// [`FrameEngine::commit`].
    NeedInput { min: usize },
    /// The current operation is complete.
    Done,
}

/// Suspension points of the parse. Stages that span a suspension carry the
/// header fields already decoded before it.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Magic,
    Flags,
    ContentLength {
        flags: FrameFlags,
    },
    DictionaryId {
        flags: FrameFlags,
        content_length: Option<u64>,
    },
    HeaderChecksum {
        flags: FrameFlags,
        content_length: Option<u64>,
        dictionary_id: Option<u32>,
        actual: u8,
    },
    BlockLength,
    Payload {
        length: usize,
        stored: bool,
    },
    BlockChecksum {
        length: usize,
        stored: bool,
    },
    Trailer,
    Closed,
    NoFrame,
    Failed,
}

/// Buffers and codec of one open frame, allocated when the header completes
/// and released when the frame closes.
struct FrameState<C, H: Checksum> {
    codec: C,
    buffer: Vec<u8>,
    staged: usize,
    drained: usize,
    payload: Vec<u8>,
    payload_len: usize,
    content_hash: Option<H::State>,
}

impl<C: BlockCodec, H: Checksum> FrameState<C, H> {
    fn open(descriptor: &FrameDescriptor, verify_content: bool) -> Self {
        let max = descriptor.max_block_size();
        Self {
            codec: C::for_frame(descriptor),
            buffer: vec![0; max],
            staged: 0,
            drained: 0,
            payload: vec![0; max],
            payload_len: 0,
            content_hash: (descriptor.content_checksum() && verify_content).then(H::begin),
        }
    }

    /// Copies staged bytes into `dst` at `*filled`, returning the count.
    fn drain_into(&mut self, dst: &mut [u8], filled: &mut usize) -> usize {
        let n = (self.staged - self.drained).min(dst.len() - *filled);
        dst[*filled..*filled + n].copy_from_slice(&self.buffer[self.drained..self.drained + n]);
        self.drained += n;
        *filled += n;
        n
    }

    /// Runs the codec over the completed payload and stages its output.
    fn finish_block(&mut self, length: usize, stored: bool) -> Result<usize, FrameError> {
        let decoded = if stored {
            self.buffer[..length].copy_from_slice(&self.payload[..length]);
            self.codec.inject(&self.payload[..length]);
            length
        } else {
            self.codec
                .decode(&self.payload[..length], &mut self.buffer[..])?
        };
        debug_assert!(decoded <= self.buffer.len());
        if let Some(state) = self.content_hash.as_mut() {
            H::update(state, &self.buffer[..decoded]);
        }
        self.staged = decoded;
        self.drained = 0;
        self.payload_len = 0;
        Ok(decoded)
    }
}

/// Streaming frame decoder, independent of any byte source.
///
/// `C` supplies the block codec, built per frame from the parsed
/// descriptor. `H` supplies the checksum algorithm and defaults to the
/// XXH32 the format specifies.
pub struct FrameEngine<C: BlockCodec, H: Checksum = Xxh32> {
    options: DecodeOptions,
    stage: Stage,
    stash: Stash,
    descriptor: Option<FrameDescriptor>,
    frame: Option<FrameState<C, H>>,
}

impl<C: BlockCodec, H: Checksum> FrameEngine<C, H> {
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            stage: Stage::Magic,
            stash: Stash::new(),
            descriptor: None,
            frame: None,
        }
    }

    /// Parameters of the current frame, once the header has been parsed.
    pub fn descriptor(&self) -> Option<&FrameDescriptor> {
        self.descriptor.as_ref()
    }

    /// Advisory content length declared by the frame header.
    pub fn frame_length(&self) -> Option<u64> {
        self.descriptor
            .as_ref()
            .and_then(FrameDescriptor::content_length)
    }

    // ── Suspension surface ────────────────────────────────────────────────────

    /// Destination for the next raw input bytes. Empty when the engine is
    /// not asking for input.
    pub fn fill_target(&mut self) -> &mut [u8] {
        let target = self.stash_target();
        match self.stage {
            Stage::Payload { length, .. } => match self.frame.as_mut() {
                Some(frame) => &mut frame.payload[frame.payload_len..length],
                None => &mut [],
            },
            Stage::Closed | Stage::NoFrame | Stage::Failed => &mut [],
            _ => self.stash.window_to(target),
        }
    }

    /// Reports `n` bytes copied into [`FrameEngine::fill_target`].
    ///
    /// Zero means the source is exhausted: before any frame byte that is
    /// the clean no-frame outcome, anywhere else the input is truncated.
    pub fn commit(&mut self, n: usize) -> Result<(), FrameError> {
        if matches!(self.stage, Stage::Failed) {
            return Err(FrameError::AlreadyFailed);
        }
        if n == 0 {
            if matches!(self.stage, Stage::Magic) && self.stash.is_empty() {
                self.stage = Stage::NoFrame;
                return Ok(());
            }
            return self.fail(FrameError::Truncated);
        }
        match self.stage {
            Stage::Payload { length, .. } => {
                if let Some(frame) = self.frame.as_mut() {
                    frame.payload_len += n;
                    debug_assert!(frame.payload_len <= length);
                }
            }
            _ => self.stash.commit(n),
        }
        Ok(())
    }

    // ── Header parsing ────────────────────────────────────────────────────────

    /// Drives header parsing until the descriptor exists, input runs short,
    /// or the input turns out to hold no frame at all.
    pub fn header_step(&mut self) -> Result<Step, FrameError> {
        loop {
            let target = self.stash_target();
            match self.stage {
                Stage::Failed => return Err(FrameError::AlreadyFailed),
                Stage::Magic
                | Stage::Flags
                | Stage::ContentLength { .. }
                | Stage::DictionaryId { .. }
                | Stage::HeaderChecksum { .. }
                    if self.stash.len() < target =>
                {
                    return Ok(Step::NeedInput {
                        min: target - self.stash.len(),
                    });
                }
                Stage::Magic => {
                    let found = self.stash.last_u32();
                    if found != FRAME_MAGIC {
                        return self.fail(FrameError::BadMagic { found });
                    }
                    self.stage = Stage::Flags;
                }
                Stage::Flags => {
                    let pair = self.stash.last_u16();
                    let flags = FrameFlags::decode((pair & 0xFF) as u8, (pair >> 8) as u8);
                    if flags.version != FRAME_VERSION {
                        return self.fail(FrameError::UnsupportedVersion {
                            version: flags.version,
                        });
                    }
                    self.stage = if flags.has_content_length {
                        Stage::ContentLength { flags }
                    } else if flags.has_dictionary_id {
                        Stage::DictionaryId {
                            flags,
                            content_length: None,
                        }
                    } else {
                        self.header_checksum_stage(flags, None, None)
                    };
                }
                Stage::ContentLength { flags } => {
                    let content_length = Some(self.stash.last_u64());
                    self.stage = if flags.has_dictionary_id {
                        Stage::DictionaryId {
                            flags,
                            content_length,
                        }
                    } else {
                        self.header_checksum_stage(flags, content_length, None)
                    };
                }
                Stage::DictionaryId {
                    flags,
                    content_length,
                } => {
                    let dictionary_id = Some(self.stash.last_u32());
                    self.stage = self.header_checksum_stage(flags, content_length, dictionary_id);
                }
                Stage::HeaderChecksum {
                    flags,
                    content_length,
                    dictionary_id,
                    actual,
                } => {
                    let expected = self.stash.last_u8();
                    if expected != actual {
                        return self.fail(FrameError::InvalidHeaderChecksum { expected, actual });
                    }
                    if let Some(id) = dictionary_id {
                        return self.fail(FrameError::UnsupportedDictionary(id));
                    }
                    let descriptor = FrameDescriptor::new(flags, content_length, None);
                    debug!(
                        max_block_size = descriptor.max_block_size(),
                        block_checksum = descriptor.block_checksum(),
                        content_checksum = descriptor.content_checksum(),
                        content_length = ?descriptor.content_length(),
                        "frame header parsed"
                    );
                    self.frame = Some(FrameState::open(&descriptor, !self.options.skip_checksums));
                    self.descriptor = Some(descriptor);
                    self.begin_block();
                }
                _ => return Ok(Step::Done),
            }
        }
    }

    // ── Byte-pull interface ───────────────────────────────────────────────────

    /// Drives one call of the byte-pull interface.
    ///
    /// Decoded bytes land in `dst` starting at `*filled`. Returns `Done`
    /// when the call is over: destination full, frame finished, no frame
    /// present, or, in interactive mode, once any bytes were drained.
    pub fn read_step(
        &mut self,
        dst: &mut [u8],
        filled: &mut usize,
        interactive: bool,
    ) -> Result<Step, FrameError> {
        loop {
            match self.stage {
                Stage::Failed => return Err(FrameError::AlreadyFailed),
                Stage::NoFrame | Stage::Closed => return Ok(Step::Done),
                Stage::Magic
                | Stage::Flags
                | Stage::ContentLength { .. }
                | Stage::DictionaryId { .. }
                | Stage::HeaderChecksum { .. } => match self.header_step()? {
                    Step::Done => continue,
                    need => return Ok(need),
                },
                _ => {}
            }

            if *filled == dst.len() {
                return Ok(Step::Done);
            }

            let target = self.stash_target();
            let Some(frame) = self.frame.as_mut() else {
                return Ok(Step::Done);
            };

            if frame.drained < frame.staged {
                frame.drain_into(dst, filled);
                if interactive || *filled == dst.len() {
                    return Ok(Step::Done);
                }
                continue;
            }

            match self.stage {
                Stage::BlockLength => {
                    if self.stash.len() < target {
                        return Ok(Step::NeedInput {
                            min: target - self.stash.len(),
                        });
                    }
                    let raw = self.stash.last_u32();
                    if raw == 0 {
                        if self.content_checksum_present() {
                            self.stage = Stage::Trailer;
                        } else {
                            self.close_frame();
                        }
                        continue;
                    }
                    let stored = raw & BLOCK_UNCOMPRESSED_FLAG != 0;
                    let length = (raw & !BLOCK_UNCOMPRESSED_FLAG) as usize;
                    let max = self.max_block_size();
                    if length > max {
                        return self.fail(FrameError::BlockTooLarge { length, max });
                    }
                    self.stage = Stage::Payload { length, stored };
                }
                Stage::Payload { length, stored } => {
                    if frame.payload_len < length {
                        return Ok(Step::NeedInput {
                            min: length - frame.payload_len,
                        });
                    }
                    if self.block_checksum_present() {
                        self.stage = Stage::BlockChecksum { length, stored };
                    } else {
                        self.complete_block(length, stored)?;
                    }
                }
                Stage::BlockChecksum { length, stored } => {
                    if self.stash.len() < target {
                        return Ok(Step::NeedInput {
                            min: target - self.stash.len(),
                        });
                    }
                    let expected = self.stash.last_u32();
                    if !self.options.skip_checksums {
                        let actual = H::oneshot(&frame.payload[..length]);
                        if actual != expected {
                            return self.fail(FrameError::InvalidBlockChecksum { expected, actual });
                        }
                    }
                    self.complete_block(length, stored)?;
                }
                Stage::Trailer => {
                    if self.stash.len() < target {
                        return Ok(Step::NeedInput {
                            min: target - self.stash.len(),
                        });
                    }
                    let expected = self.stash.last_u32();
                    if let Some(state) = frame.content_hash.take() {
                        let actual = H::digest(&state);
                        if actual != expected {
                            return self
                                .fail(FrameError::InvalidContentChecksum { expected, actual });
                        }
                    }
                    self.close_frame();
                }
                _ => return Ok(Step::Done),
            }
        }
    }

    // ── Internal transitions ──────────────────────────────────────────────────

    /// Absolute stash fill level the current stage decodes at.
    fn stash_target(&self) -> usize {
        const FLAGS_END: usize = MAGIC_SIZE + 2;
        match &self.stage {
            Stage::Magic => MAGIC_SIZE,
            Stage::Flags => FLAGS_END,
            Stage::ContentLength { .. } => FLAGS_END + 8,
            Stage::DictionaryId { flags, .. } => {
                FLAGS_END + if flags.has_content_length { 8 } else { 0 } + 4
            }
            Stage::HeaderChecksum { flags, .. } => {
                FLAGS_END
                    + if flags.has_content_length { 8 } else { 0 }
                    + if flags.has_dictionary_id { 4 } else { 0 }
                    + 1
            }
            Stage::BlockLength => BLOCK_LENGTH_SIZE,
            Stage::Trailer | Stage::BlockChecksum { .. } => BLOCK_LENGTH_SIZE + CHECKSUM_SIZE,
            Stage::Payload { .. } | Stage::Closed | Stage::NoFrame | Stage::Failed => 0,
        }
    }

    /// Builds the checksum stage, folding the digest over the header fields
    /// while the stash still holds exactly those bytes.
    fn header_checksum_stage(
        &self,
        flags: FrameFlags,
        content_length: Option<u64>,
        dictionary_id: Option<u32>,
    ) -> Stage {
        let actual = ((self.stash.digest::<H>(MAGIC_SIZE) >> 8) & 0xFF) as u8;
        Stage::HeaderChecksum {
            flags,
            content_length,
            dictionary_id,
            actual,
        }
    }

    fn begin_block(&mut self) {
        self.stash.flush();
        self.stage = Stage::BlockLength;
    }

    fn complete_block(&mut self, length: usize, stored: bool) -> Result<(), FrameError> {
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };
        let decoded = match frame.finish_block(length, stored) {
            Ok(decoded) => decoded,
            Err(err) => return self.fail(err),
        };
        trace!(length, stored, decoded, "block decoded");
        self.begin_block();
        Ok(())
    }

    fn close_frame(&mut self) {
        debug_assert!(self
            .frame
            .as_ref()
            .map_or(true, |frame| frame.staged == frame.drained));
        self.frame = None;
        self.stage = Stage::Closed;
        debug!("frame closed");
    }

    fn fail<T>(&mut self, err: FrameError) -> Result<T, FrameError> {
        self.stage = Stage::Failed;
        self.frame = None;
        Err(err)
    }

    fn content_checksum_present(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(FrameDescriptor::content_checksum)
    }

    fn block_checksum_present(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(FrameDescriptor::block_checksum)
    }

    fn max_block_size(&self) -> usize {
        self.descriptor
            .as_ref()
            .map_or(0, FrameDescriptor::max_block_size)
    }
}

impl<C: BlockCodec, H: Checksum> Default for FrameEngine<C, H> {
    fn default() -> Self {
        Self::new()
    }
}
