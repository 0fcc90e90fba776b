//! Frame format constants, flag decoding, and the parsed frame descriptor.
//!
//! Covers:
//! - Wire constants (`FRAME_MAGIC`, `BLOCK_UNCOMPRESSED_FLAG`, field sizes)
//! - `FrameFlags`: the decoded FLG/BD byte pair
//! - `FrameDescriptor`: the immutable parameters of one frame
//! - `max_block_size_for_code`: the BD block-size table

/// Magic number opening every frame, little-endian on the wire.
pub const FRAME_MAGIC: u32 = 0x184D_2204;

/// High bit of a block length marking the payload as stored uncompressed.
pub const BLOCK_UNCOMPRESSED_FLAG: u32 = 0x8000_0000;

/// Size of the magic number field.
pub(crate) const MAGIC_SIZE: usize = 4;

/// Size of a block length field.
pub(crate) const BLOCK_LENGTH_SIZE: usize = 4;

/// Size of a block or content checksum field.
pub(crate) const CHECKSUM_SIZE: usize = 4;

/// Format revision expected in bits 6-7 of the FLG byte.
pub(crate) const FRAME_VERSION: u8 = 1;

const KB64: usize = 64 * 1024;

// Block maximum sizes indexed by the 3-bit BD code. Codes 0-3 are reserved
// and resolve to 64 KiB.
const BLOCK_SIZES: [usize; 8] = [
    KB64,
    KB64,
    KB64,
    KB64,
    KB64,
    256 * 1024,
    1024 * 1024,
    4 * 1024 * 1024,
];

/// Returns the block maximum size selected by a BD block-size code.
pub fn max_block_size_for_code(code: u8) -> usize {
    BLOCK_SIZES[(code & 0x07) as usize]
}

// ── Flag decoding ─────────────────────────────────────────────────────────────

/// Flags decoded from the FLG/BD byte pair of a frame header.
///
/// Decoding is a plain bit extraction and never fails; the header parser
/// validates the version and rejects dictionary frames once the surrounding
/// fields have been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameFlags {
    pub version: u8,
    pub block_chaining: bool,
    pub block_checksum: bool,
    pub has_content_length: bool,
    pub content_checksum: bool,
    pub has_dictionary_id: bool,
    pub block_size_code: u8,
}

impl FrameFlags {
    /// Decodes the FLG byte and the BD byte. Reserved bits are ignored.
    pub fn decode(flg: u8, bd: u8) -> Self {
        Self {
            version: (flg >> 6) & 0x03,
            block_chaining: (flg >> 5) & 0x01 == 0,
            block_checksum: (flg >> 4) & 0x01 != 0,
            has_content_length: (flg >> 3) & 0x01 != 0,
            content_checksum: (flg >> 2) & 0x01 != 0,
            has_dictionary_id: flg & 0x01 != 0,
            block_size_code: (bd >> 4) & 0x07,
        }
    }
}

// ── Frame descriptor ──────────────────────────────────────────────────────────

/// Parameters of one frame, fixed once the header has been parsed and
/// validated. Constructed only by the header parser; read everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    content_length: Option<u64>,
    content_checksum: bool,
    block_chaining: bool,
    block_checksum: bool,
    dictionary_id: Option<u32>,
    max_block_size: usize,
}

impl FrameDescriptor {
    pub(crate) fn new(
        flags: FrameFlags,
        content_length: Option<u64>,
        dictionary_id: Option<u32>,
    ) -> Self {
        Self {
            content_length,
            content_checksum: flags.content_checksum,
            block_chaining: flags.block_chaining,
            block_checksum: flags.block_checksum,
            dictionary_id,
            max_block_size: max_block_size_for_code(flags.block_size_code),
        }
    }

    /// Uncompressed length declared by the producer, when present. Advisory
    /// only; never validated against the decoded output.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Whether the frame ends with a checksum over the whole decoded content.
    pub fn content_checksum(&self) -> bool {
        self.content_checksum
    }

    /// Whether blocks may reference data from earlier blocks.
    pub fn block_chaining(&self) -> bool {
        self.block_chaining
    }

    /// Whether each block carries its own checksum.
    pub fn block_checksum(&self) -> bool {
        self.block_checksum
    }

    /// Dictionary id field, when present.
    pub fn dictionary_id(&self) -> Option<u32> {
        self.dictionary_id
    }

    /// Upper bound on the decoded size of any single block in this frame.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}
