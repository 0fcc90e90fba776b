#![no_main]
use libfuzzer_sys::fuzz_target;

use lz4_frame::{
    BlockCodec, CodecError, DecodeOptions, FrameDescriptor, FrameEngine, FrameReader, Step,
};

/// Codec that copies payloads straight through, so any input that passes
/// the frame layer decodes without codec-level rejections.
struct Passthrough;

impl BlockCodec for Passthrough {
    fn for_frame(_descriptor: &FrameDescriptor) -> Self {
        Passthrough
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn inject(&mut self, _block: &[u8]) {}
}

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the frame decoder.
    // Err results are expected and fine; what we verify is no panics or UB.

    // The blocking reader exercises header parsing, block framing, and the
    // checksum verification paths end to end.
    let mut reader: FrameReader<&[u8], Passthrough> = FrameReader::new(data);
    let mut out = Vec::new();
    let _ = std::io::Read::read_to_end(&mut reader, &mut out);

    // Also drive the engine directly in interactive mode with dribbled
    // input, covering the suspension points the one-shot pass skips.
    let mut engine: FrameEngine<Passthrough> =
        FrameEngine::with_options(DecodeOptions { skip_checksums: true });
    let mut dst = [0u8; 4096];
    let mut rest = data;
    loop {
        let mut filled = 0;
        match engine.read_step(&mut dst, &mut filled, true) {
            Ok(Step::Done) => {
                if filled == 0 {
                    break;
                }
            }
            Ok(Step::NeedInput { .. }) => {
                let target = engine.fill_target();
                let n = target.len().min(rest.len()).min(17);
                target[..n].copy_from_slice(&rest[..n]);
                rest = &rest[n..];
                if engine.commit(n).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
});
