//! Error types for the payload codec.
//!
//! Every failure is an ordinary return value for the caller to display.
//! The core never retries: all operations are deterministic given their
//! inputs, so a retry would fail the same way.

use thiserror::Error;

/// Errors produced while encoding or decoding a hidden message.
#[derive(Debug, Error)]
pub enum StegoError {
    /// Malformed caller arguments (empty password, wrong key/IV length,
    /// out-of-range KDF parameters, inconsistent pixel buffer geometry).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The payload does not fit into the cover image.
    #[error("message too large for cover image: need {needed} bytes, image holds {available}")]
    CapacityExceeded { needed: usize, available: usize },

    /// The extracted header is inconsistent or the buffer is too small to
    /// hold what it declares. Usually a non-stego or re-compressed image.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Ciphertext length, PKCS7 padding or UTF-8 validation failed after
    /// decryption. Usually a wrong password.
    #[error("decryption failed (wrong password?): {0}")]
    DecryptionError(String),

    /// The authentication tag did not verify. Only produced when the
    /// optional tag is enabled.
    #[error("authentication failed (wrong password or modified image)")]
    AuthenticationFailed,

    /// The image container could not be decoded or encoded.
    #[cfg(feature = "image-io")]
    #[error("image error: {0}")]
    Image(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "image-io")]
impl From<image::ImageError> for StegoError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StegoError>;
