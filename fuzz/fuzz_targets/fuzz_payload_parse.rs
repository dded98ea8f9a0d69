#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the payload framing parser with arbitrary bytes.
///
/// The declared length comes straight from attacker-controlled pixels, so
/// truncated frames and absurd lengths must come back as `Err`, never panic.
fuzz_target!(|data: &[u8]| {
    let _ = pixelcrypt::container::deserialize(data);
    let _ = pixelcrypt::container::read_declared_len(data);

    for authenticated in [false, true] {
        if let Ok(payload) = pixelcrypt::Payload::from_bytes(data, authenticated) {
            // Whatever parses must serialize back to a prefix of the input.
            if let Ok(bytes) = payload.to_bytes() {
                assert!(data.starts_with(&bytes));
            }
        }
    }
});
