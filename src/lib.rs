//! pixelcrypt core library.
//!
//! Hides a password-encrypted text message in the least-significant bits of
//! a lossless image's color channels:
//! - PBKDF2-HMAC-SHA256 key derivation (100,000 iterations by default)
//! - AES-256-CBC with PKCS7 padding, fresh random salt and IV per call
//! - Fixed 36-byte header (length, salt, IV) ahead of the ciphertext
//! - One payload bit per R/G/B sample, row-major, MSB-first
//! - Optional HMAC-SHA256 tag for wrong-password/tamper detection
//!
//! Every call is a self-contained pipeline with no state carried between
//! calls. `encode` never mutates its input; `encode_in_place` does, under an
//! exclusive borrow.

pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
#[cfg(feature = "image-io")]
pub mod image_io;
pub mod pixels;
pub mod secure_fs;
pub mod stego;

use log::debug;

pub use config::CodecOptions;
pub use container::{Payload, HEADER_LEN};
pub use error::{Result, StegoError};
pub use pixels::PixelBuffer;

/// Usable message-ciphertext bytes: raw LSB capacity minus the 36-byte
/// header, clamped at zero. Depends only on the buffer's dimensions.
pub fn capacity(pixels: &PixelBuffer) -> usize {
    stego::lsb::capacity_bytes(pixels).saturating_sub(HEADER_LEN)
}

/// Bytes that encoding a message of `message_len` UTF-8 bytes will hide.
pub fn payload_len_for(message_len: usize, opts: &CodecOptions) -> usize {
    let padded = (message_len / crypto::BLOCK_LEN + 1) * crypto::BLOCK_LEN;
    container::wire_len(padded, opts.authenticate)
}

/// Longest message (in UTF-8 bytes) that still fits, or `None` if the image
/// cannot hold even an empty one.
pub fn max_message_len(pixels: &PixelBuffer, opts: &CodecOptions) -> Option<usize> {
    let overhead = container::wire_len(0, opts.authenticate);
    let room = stego::lsb::capacity_bytes(pixels).checked_sub(overhead)?;
    let blocks = room / crypto::BLOCK_LEN;
    if blocks == 0 {
        return None;
    }
    // PKCS7 always adds at least one byte of padding.
    Some(blocks * crypto::BLOCK_LEN - 1)
}

/// Encrypt `message` and hide it in a copy of `pixels` with default options.
pub fn encode(pixels: &PixelBuffer, message: &str, password: &str) -> Result<PixelBuffer> {
    encode_with_options(pixels, message, password, &CodecOptions::default())
}

/// Encrypt `message` and hide it in a copy of `pixels`.
///
/// This function:
/// 1) Checks inputs and capacity up front (before the slow KDF)
/// 2) Seals the message (fresh salt + IV, PBKDF2, AES-256-CBC)
/// 3) Frames it as `[len][salt][iv][ciphertext]`
/// 4) Writes the frame into the LSB plane of a new buffer
pub fn encode_with_options(
    pixels: &PixelBuffer,
    message: &str,
    password: &str,
    opts: &CodecOptions,
) -> Result<PixelBuffer> {
    let frame = seal_for(pixels, message, password, opts)?;
    stego::lsb::embed(pixels, &frame)
}

/// Like [`encode_with_options`], but writes into the caller's buffer.
///
/// On error the buffer is left unmodified.
pub fn encode_in_place(
    pixels: &mut PixelBuffer,
    message: &str,
    password: &str,
    opts: &CodecOptions,
) -> Result<()> {
    let frame = seal_for(pixels, message, password, opts)?;
    stego::lsb::embed_in_place(pixels, &frame)
}

fn seal_for(
    pixels: &PixelBuffer,
    message: &str,
    password: &str,
    opts: &CodecOptions,
) -> Result<Vec<u8>> {
    // Step 1: validate + capacity pre-check
    if password.is_empty() {
        return Err(StegoError::InvalidInput("password must not be empty".into()));
    }
    opts.validate()?;

    let needed = payload_len_for(message.len(), opts);
    let available = stego::lsb::capacity_bytes(pixels);
    if needed > available {
        return Err(StegoError::CapacityExceeded { needed, available });
    }

    // Step 2: seal
    let payload = Payload::seal(message, password, opts)?;

    // Step 3: frame
    let frame = payload.to_bytes()?;
    debug_assert_eq!(frame.len(), needed);

    debug!(
        "encode: {} byte frame into {}x{} image ({} bytes available)",
        frame.len(),
        pixels.width(),
        pixels.height(),
        available
    );
    Ok(frame)
}

/// Recover a message hidden by [`encode`].
pub fn decode(pixels: &PixelBuffer, password: &str) -> Result<String> {
    decode_with_options(pixels, password, &CodecOptions::default())
}

/// Recover a message hidden by [`encode_with_options`] using the same options.
///
/// This function:
/// 1) Extracts the fixed 36-byte header
/// 2) Reads the declared ciphertext length from it
/// 3) Extracts the ciphertext (and tag) from where the header ended
/// 4) Re-derives the key from the header's salt and decrypts
///
/// `MalformedPayload`, `DecryptionError` and `AuthenticationFailed` all mean
/// "wrong password, or not an intact stego image".
pub fn decode_with_options(
    pixels: &PixelBuffer,
    password: &str,
    opts: &CodecOptions,
) -> Result<String> {
    // Checked up front so a missing password is never reported as a
    // damaged image.
    if password.is_empty() {
        return Err(StegoError::InvalidInput("password must not be empty".into()));
    }
    opts.validate()?;

    // Step 1: header
    let mut frame = stego::lsb::extract(pixels, HEADER_LEN)?;

    // Step 2: declared length
    let declared = container::read_declared_len(&frame)?;
    let tag_len = if opts.authenticate { crypto::TAG_LEN } else { 0 };
    let body_len = declared
        .checked_add(tag_len)
        .ok_or_else(|| StegoError::MalformedPayload("declared length overflows".into()))?;
    debug!(
        "decode: header declares {} ciphertext bytes, {} bits available",
        declared,
        stego::lsb::capacity_bits(pixels)
    );

    // Step 3: body, continuing from the header's bit offset
    let body = stego::lsb::extract_at(pixels, HEADER_LEN * 8, body_len)?;
    frame.extend_from_slice(&body);

    // Step 4: parse + open
    let payload = Payload::from_bytes(&frame, opts.authenticate)?;
    payload.open(password, opts)
}
