//! Least-significant-bit embedding over the R, G, B samples of a pixel buffer.
//!
//! Scan model (fixed, so every implementation produces identical output):
//! - pixels in row-major order
//! - within a pixel: R, then G, then B (alpha and any further channel skipped)
//! - within a payload byte: most-significant bit first
//!
//! Only bit 0 of the first `len * 8` color samples is ever written. Every
//! other bit and every later sample is left exactly as it was, so the reader
//! needs the payload header to know where the signal stops.

use log::debug;

use crate::error::{Result, StegoError};
use crate::pixels::PixelBuffer;

use super::{bits_to_bytes, bytes_to_bits};

/// Number of payload bits the buffer can carry: one per color sample.
pub fn capacity_bits(pixels: &PixelBuffer) -> usize {
    pixels.color_sample_count()
}

/// Whole payload bytes the buffer can carry.
pub fn capacity_bytes(pixels: &PixelBuffer) -> usize {
    capacity_bits(pixels) / 8
}

fn check_capacity(pixels: &PixelBuffer, payload_len: usize) -> Result<()> {
    let available = capacity_bytes(pixels);
    let fits = payload_len
        .checked_mul(8)
        .map(|bits| bits <= capacity_bits(pixels))
        .unwrap_or(false);
    if !fits {
        return Err(StegoError::CapacityExceeded {
            needed: payload_len,
            available,
        });
    }
    Ok(())
}

/// Embed `payload` into a copy of `pixels`. The input buffer is not touched.
pub fn embed(pixels: &PixelBuffer, payload: &[u8]) -> Result<PixelBuffer> {
    check_capacity(pixels, payload.len())?;
    let mut out = pixels.clone();
    embed_in_place(&mut out, payload)?;
    Ok(out)
}

/// Embed `payload` directly into a caller-owned buffer.
pub fn embed_in_place(pixels: &mut PixelBuffer, payload: &[u8]) -> Result<()> {
    check_capacity(pixels, payload.len())?;

    debug!(
        "lsb embed: {} bytes into {}x{}x{} buffer ({} bits available)",
        payload.len(),
        pixels.width(),
        pixels.height(),
        pixels.channels(),
        capacity_bits(pixels)
    );

    let indices = pixels.color_sample_indices();
    let samples = pixels.as_bytes_mut();
    for (idx, bit) in indices.zip(bytes_to_bits(payload)) {
        samples[idx] = (samples[idx] & 0xFE) | bit as u8;
    }
    Ok(())
}

/// Read `num_bytes` bytes from the start of the scan.
pub fn extract(pixels: &PixelBuffer, num_bytes: usize) -> Result<Vec<u8>> {
    extract_at(pixels, 0, num_bytes)
}

/// Read `num_bytes` bytes starting at color sample `bit_offset`.
///
/// Decoding calls this twice: once for the fixed header, then again at the
/// header's end once the declared length is known.
pub fn extract_at(pixels: &PixelBuffer, bit_offset: usize, num_bytes: usize) -> Result<Vec<u8>> {
    let end = num_bytes
        .checked_mul(8)
        .and_then(|bits| bits.checked_add(bit_offset))
        .ok_or_else(|| StegoError::MalformedPayload("declared length overflows".into()))?;

    let available = capacity_bits(pixels);
    if end > available {
        return Err(StegoError::MalformedPayload(format!(
            "need {} bits from offset {}, image only holds {}",
            end - bit_offset,
            bit_offset,
            available
        )));
    }

    let samples = pixels.as_bytes();
    let bits: Vec<bool> = pixels
        .color_sample_indices()
        .skip(bit_offset)
        .take(end - bit_offset)
        .map(|idx| samples[idx] & 1 == 1)
        .collect();

    debug!("lsb extract: {} bytes at bit offset {}", num_bytes, bit_offset);
    Ok(bits_to_bytes(&bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, channels: u8) -> PixelBuffer {
        let len = width as usize * height as usize * channels as usize;
        let data = (0..len).map(|i| (i * 37 % 256) as u8).collect();
        PixelBuffer::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn roundtrip_rgb() {
        let cover = gradient(10, 10, 3);
        let payload = b"lsb roundtrip";
        let stego = embed(&cover, payload).unwrap();
        assert_eq!(extract(&stego, payload.len()).unwrap(), payload);
    }

    #[test]
    fn input_buffer_untouched() {
        let cover = gradient(10, 10, 3);
        let before = cover.clone();
        let _ = embed(&cover, &[0xFF; 20]).unwrap();
        assert_eq!(cover, before);
    }

    #[test]
    fn only_lsb_of_first_k_samples_changes() {
        let cover = gradient(8, 8, 3);
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        let stego = embed(&cover, &payload).unwrap();

        let k = payload.len() * 8;
        for (i, (a, b)) in cover.as_bytes().iter().zip(stego.as_bytes()).enumerate() {
            assert_eq!(a & 0xFE, b & 0xFE, "high bits changed at sample {i}");
            if i >= k {
                assert_eq!(a, b, "sample {i} beyond payload changed");
            }
        }
    }

    #[test]
    fn alpha_never_modified() {
        let cover = gradient(6, 6, 4);
        let stego = embed(&cover, &[0xFF; 13]).unwrap();
        for (a, b) in cover.as_bytes().chunks(4).zip(stego.as_bytes().chunks(4)) {
            assert_eq!(a[3], b[3]);
        }
        assert_eq!(extract(&stego, 13).unwrap(), vec![0xFF; 13]);
    }

    #[test]
    fn bits_land_on_color_sample_indices() {
        let cover = gradient(5, 3, 4);
        let payload = [0b1010_0110, 0x5A];
        let stego = embed(&cover, &payload).unwrap();

        let bits = bytes_to_bits(&payload);
        let written: Vec<usize> = cover.color_sample_indices().take(bits.len()).collect();
        for (&idx, &bit) in written.iter().zip(&bits) {
            assert_eq!(stego.as_bytes()[idx] & 1 == 1, bit, "sample {idx}");
        }
        for i in 0..cover.as_bytes().len() {
            if !written.contains(&i) {
                assert_eq!(stego.as_bytes()[i], cover.as_bytes()[i], "sample {i}");
            }
        }
    }

    #[test]
    fn exact_capacity_fits_one_more_fails() {
        // 3x3 RGB = 27 samples = 3 whole bytes
        let cover = gradient(3, 3, 3);
        assert_eq!(capacity_bytes(&cover), 3);
        embed(&cover, &[1, 2, 3]).unwrap();
        let err = embed(&cover, &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::CapacityExceeded { needed: 4, available: 3 }
        ));
    }

    #[test]
    fn empty_payload_is_noop() {
        let cover = PixelBuffer::from_rgb(0, 0, Vec::new()).unwrap();
        let stego = embed(&cover, &[]).unwrap();
        assert_eq!(stego, cover);
        assert!(extract(&stego, 0).unwrap().is_empty());
    }

    #[test]
    fn extract_at_continues_cursor() {
        let cover = gradient(10, 10, 3);
        let stego = embed(&cover, b"headbody").unwrap();
        assert_eq!(extract_at(&stego, 4 * 8, 4).unwrap(), b"body");
    }

    #[test]
    fn extract_past_end_is_malformed() {
        let cover = gradient(2, 2, 3);
        let err = extract(&cover, 2).unwrap_err();
        assert!(matches!(err, StegoError::MalformedPayload(_)));
        let err = extract_at(&cover, 1, usize::MAX).unwrap_err();
        assert!(matches!(err, StegoError::MalformedPayload(_)));
    }
}
