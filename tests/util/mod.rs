//! Shared wire builders and test codecs for the integration suites.

#![allow(dead_code)]

use lz4_frame::{
    BlockCodec, Checksum, CodecError, DecodeOptions, FrameDescriptor, FrameError, FrameReader,
    Xxh32, BLOCK_UNCOMPRESSED_FLAG, FRAME_MAGIC,
};

// ─────────────────────────────────────────────────────────────────────────────
// Frame builder
// ─────────────────────────────────────────────────────────────────────────────

enum TestBlock {
    Stored(Vec<u8>),
    Compressed(Vec<u8>),
    Raw { word: u32, payload: Vec<u8> },
}

/// Assembles frame wire bytes for the decoder under test. Compressed
/// blocks use the toy run-length codec below.
pub struct FrameBuilder {
    independent: bool,
    block_checksum: bool,
    content_checksum: bool,
    content_length: Option<u64>,
    dictionary_id: Option<u32>,
    block_size_code: u8,
    blocks: Vec<TestBlock>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            independent: true,
            block_checksum: false,
            content_checksum: false,
            content_length: None,
            dictionary_id: None,
            block_size_code: 4,
            blocks: Vec::new(),
        }
    }

    pub fn block_checksum(mut self) -> Self {
        self.block_checksum = true;
        self
    }

    pub fn content_checksum(mut self) -> Self {
        self.content_checksum = true;
        self
    }

    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn dictionary_id(mut self, id: u32) -> Self {
        self.dictionary_id = Some(id);
        self
    }

    pub fn block_size_code(mut self, code: u8) -> Self {
        self.block_size_code = code;
        self
    }

    pub fn chained(mut self) -> Self {
        self.independent = false;
        self
    }

    pub fn stored_block(mut self, payload: &[u8]) -> Self {
        self.blocks.push(TestBlock::Stored(payload.to_vec()));
        self
    }

    pub fn compressed_block(mut self, decoded: &[u8]) -> Self {
        self.blocks.push(TestBlock::Compressed(decoded.to_vec()));
        self
    }

    /// Emits a block with an arbitrary length word, for malformed frames.
    pub fn raw_block(mut self, word: u32, payload: &[u8]) -> Self {
        self.blocks.push(TestBlock::Raw {
            word,
            payload: payload.to_vec(),
        });
        self
    }

    /// The content a correct decode of this frame must produce.
    pub fn decoded(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                TestBlock::Stored(payload) => out.extend_from_slice(payload),
                TestBlock::Compressed(decoded) => out.extend_from_slice(decoded),
                TestBlock::Raw { .. } => {}
            }
        }
        out
    }

    /// Serializes the frame to wire bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&FRAME_MAGIC.to_le_bytes());

        let mut flg = 0x40u8;
        if self.independent {
            flg |= 0x20;
        }
        if self.block_checksum {
            flg |= 0x10;
        }
        if self.content_length.is_some() {
            flg |= 0x08;
        }
        if self.content_checksum {
            flg |= 0x04;
        }
        if self.dictionary_id.is_some() {
            flg |= 0x01;
        }
        let bd = (self.block_size_code & 0x07) << 4;

        let fields_start = out.len();
        out.push(flg);
        out.push(bd);
        if let Some(length) = self.content_length {
            out.extend_from_slice(&length.to_le_bytes());
        }
        if let Some(id) = self.dictionary_id {
            out.extend_from_slice(&id.to_le_bytes());
        }
        let digest = Xxh32::oneshot(&out[fields_start..]);
        out.push(((digest >> 8) & 0xFF) as u8);

        let mut content = Xxh32::begin();
        for block in &self.blocks {
            let (word, wire): (u32, Vec<u8>) = match block {
                TestBlock::Stored(payload) => {
                    Xxh32::update(&mut content, payload);
                    (
                        payload.len() as u32 | BLOCK_UNCOMPRESSED_FLAG,
                        payload.clone(),
                    )
                }
                TestBlock::Compressed(decoded) => {
                    Xxh32::update(&mut content, decoded);
                    let wire = rle_encode(decoded);
                    (wire.len() as u32, wire)
                }
                TestBlock::Raw { word, payload } => (*word, payload.clone()),
            };
            out.extend_from_slice(&word.to_le_bytes());
            out.extend_from_slice(&wire);
            if self.block_checksum {
                out.extend_from_slice(&Xxh32::oneshot(&wire).to_le_bytes());
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        if self.content_checksum {
            out.extend_from_slice(&Xxh32::digest(&content).to_le_bytes());
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toy run-length codec
// ─────────────────────────────────────────────────────────────────────────────

/// Encodes runs as (count, byte) pairs, counts capped at 255.
pub fn rle_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut at = 0;
    while at < data.len() {
        let byte = data[at];
        let mut run = 1usize;
        while at + run < data.len() && data[at + run] == byte && run < 255 {
            run += 1;
        }
        out.push(run as u8);
        out.push(byte);
        at += run;
    }
    out
}

/// Run-length block codec standing in for the real compressor.
pub struct RleCodec;

impl BlockCodec for RleCodec {
    fn for_frame(_descriptor: &FrameDescriptor) -> Self {
        RleCodec
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        if input.len() % 2 != 0 {
            return Err(CodecError::Malformed("dangling run length"));
        }
        let mut at = 0;
        for pair in input.chunks_exact(2) {
            let run = pair[0] as usize;
            if run == 0 {
                return Err(CodecError::Malformed("zero run length"));
            }
            if at + run > output.len() {
                return Err(CodecError::Overflow {
                    needed: at + run,
                    capacity: output.len(),
                });
            }
            output[at..at + run].fill(pair[1]);
            at += run;
        }
        Ok(at)
    }

    fn inject(&mut self, _block: &[u8]) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// Sources and helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking source that yields at most `chunk` bytes per read call.
pub struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> ChunkedReader<'a> {
    pub fn new(data: &'a [u8], chunk: usize) -> Self {
        Self { data, chunk }
    }
}

impl std::io::Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.len().min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Copy of `bytes` with bit `bit` of byte `index` flipped.
pub fn flip_bit(bytes: &[u8], index: usize, bit: u8) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out[index] ^= 1 << bit;
    out
}

/// Decodes a whole frame through the blocking reader and the RLE codec.
pub fn decode_frame(bytes: &[u8]) -> Result<Vec<u8>, FrameError> {
    decode_frame_with(bytes, DecodeOptions::default())
}

pub fn decode_frame_with(bytes: &[u8], options: DecodeOptions) -> Result<Vec<u8>, FrameError> {
    let mut reader: FrameReader<_, RleCodec> = FrameReader::with_options(bytes, options);
    let mut out = Vec::new();
    let mut chunk = [0u8; 64];
    loop {
        let n = reader.read_bytes(&mut chunk, false)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&chunk[..n]);
    }
}
