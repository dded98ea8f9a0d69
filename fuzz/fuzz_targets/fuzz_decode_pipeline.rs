#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the full decode path: LSB extraction, header parse, key derivation
/// and decryption, on arbitrary pixel data.
///
/// Uses the minimum KDF work factor so the fuzzer can reach decryption.
fuzz_target!(|data: &[u8]| {
    let width = 16u32;
    let row = width as usize * 3;
    let height = (data.len() / row) as u32;
    let used = row * height as usize;

    let opts = pixelcrypt::CodecOptions {
        kdf: pixelcrypt::crypto::KdfParams {
            iterations: pixelcrypt::crypto::MIN_ITERATIONS,
        },
        authenticate: data.first().map(|b| b & 1 == 1).unwrap_or(false),
    };

    if let Ok(pixels) = pixelcrypt::PixelBuffer::from_rgb(width, height, data[..used].to_vec()) {
        let _ = pixelcrypt::decode_with_options(&pixels, "fuzz-password", &opts);
    }
});
