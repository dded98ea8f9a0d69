#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz LSB extraction with arbitrary geometry, offsets and lengths.
fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let width = (data[0] % 32) as u32;
    let channels = 3 + data[1] % 2;
    let offset = u16::from_be_bytes([data[2], data[3]]) as usize;
    let len = u16::from_be_bytes([data[4], data[5]]) as usize;
    let samples = &data[6..];

    let row = width as usize * channels as usize;
    if row == 0 {
        return;
    }
    let height = (samples.len() / row) as u32;
    let used = row * height as usize;

    if let Ok(pixels) =
        pixelcrypt::PixelBuffer::new(width, height, channels, samples[..used].to_vec())
    {
        let _ = pixelcrypt::stego::lsb::extract_at(&pixels, offset, len);
    }
});
