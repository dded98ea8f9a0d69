//! Key derivation and symmetric encryption.
//!
//! - PBKDF2-HMAC-SHA256 turns (password, salt) into a 256-bit key.
//! - AES-256-CBC with PKCS7 padding encrypts the message bytes.
//! - HMAC-SHA256 produces the optional authentication tag.
//!
//! Key material is held in `Zeroizing` buffers and wiped on drop. Nothing in
//! this module logs keys, salts, IVs or plaintext.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, StegoError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;
/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// AES block length; every ciphertext is a positive multiple of this.
pub const BLOCK_LEN: usize = 16;
/// HMAC-SHA256 tag length in bytes.
pub const TAG_LEN: usize = 32;

/// Lower bound accepted for PBKDF2 iterations.
pub const MIN_ITERATIONS: u32 = 1_000;
/// Upper bound accepted for PBKDF2 iterations.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// PBKDF2 parameters. Not stored in the payload, so encoder and decoder
/// must agree on them out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// PBKDF2 iteration count.
    pub iterations: u32,
}

impl KdfParams {
    /// Default PBKDF2 work factor (100,000 iterations).
    pub fn recommended() -> Self {
        Self {
            iterations: 100_000,
        }
    }

    /// Reject parameters outside the supported range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(StegoError::InvalidInput(format!(
                "PBKDF2 iterations {} out of range ({}..={})",
                self.iterations, MIN_ITERATIONS, MAX_ITERATIONS
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::recommended()
    }
}

fn rng_error(e: getrandom::Error) -> StegoError {
    StegoError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("getrandom failed: {e}"),
    ))
}

/// Secure random bytes from the OS RNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len];
    getrandom::getrandom(&mut out).map_err(rng_error)?;
    Ok(out)
}

/// Fixed-size variant of [`random_bytes`] for salts and IVs.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    getrandom::getrandom(&mut out).map_err(rng_error)?;
    Ok(out)
}

fn pbkdf2_into(password: &str, salt: &[u8; SALT_LEN], params: &KdfParams, out: &mut [u8]) -> Result<()> {
    if password.is_empty() {
        return Err(StegoError::InvalidInput("password must not be empty".into()));
    }
    params.validate()?;
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, out);
    Ok(())
}

/// Derive the AES-256 key from a password and salt.
///
/// Deterministic: the decoder reproduces the encoder's key from the salt
/// carried in the payload header.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_into(password, salt, params, &mut key[..])?;
    Ok(key)
}

/// Cipher key plus an independent MAC key.
pub struct SplitKeys {
    pub cipher: Zeroizing<[u8; KEY_LEN]>,
    pub mac: Zeroizing<[u8; KEY_LEN]>,
}

/// Derive 64 bytes of PBKDF2 output and split them into cipher and MAC keys.
///
/// PBKDF2 computes each output block independently, so `cipher` is
/// byte-identical to what [`derive_key`] returns for the same inputs.
pub fn derive_split_keys(password: &str, salt: &[u8; SALT_LEN], params: &KdfParams) -> Result<SplitKeys> {
    let mut okm = Zeroizing::new([0u8; 2 * KEY_LEN]);
    pbkdf2_into(password, salt, params, &mut okm[..])?;

    let mut cipher = Zeroizing::new([0u8; KEY_LEN]);
    let mut mac = Zeroizing::new([0u8; KEY_LEN]);
    cipher.copy_from_slice(&okm[..KEY_LEN]);
    mac.copy_from_slice(&okm[KEY_LEN..]);
    Ok(SplitKeys { cipher, mac })
}

fn check_key_iv(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != KEY_LEN {
        return Err(StegoError::InvalidInput(format!(
            "invalid key length: {} (expected {KEY_LEN})",
            key.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(StegoError::InvalidInput(format!(
            "invalid IV length: {} (expected {IV_LEN})",
            iv.len()
        )));
    }
    Ok(())
}

/// Encrypt with AES-256-CBC/PKCS7 under a fresh random IV.
///
/// Returns `(iv, ciphertext)`. The ciphertext is always a non-zero multiple
/// of 16 bytes; an empty plaintext still produces one full padding block.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<([u8; IV_LEN], Vec<u8>)> {
    let iv = random_array::<IV_LEN>()?;
    let ciphertext = encrypt_with_iv(plaintext, key, &iv)?;
    Ok((iv, ciphertext))
}

/// Encrypt with AES-256-CBC/PKCS7 under a caller-supplied IV.
pub fn encrypt_with_iv(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    check_key_iv(key, iv)?;
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| StegoError::InvalidInput("invalid AES key/IV length".into()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt AES-256-CBC/PKCS7 ciphertext and validate the result as UTF-8.
///
/// A bad length, bad padding or non-UTF-8 plaintext all surface as
/// [`StegoError::DecryptionError`]; without the optional tag these are the
/// only wrong-password signals available.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<String> {
    check_key_iv(key, iv)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(StegoError::DecryptionError(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
            ciphertext.len()
        )));
    }

    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| StegoError::InvalidInput("invalid AES key/IV length".into()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| StegoError::DecryptionError("invalid PKCS7 padding".into()))?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        zeroize::Zeroize::zeroize(&mut bytes);
        StegoError::DecryptionError("plaintext is not valid UTF-8".into())
    })
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn compute_tag(mac_key: &[u8; KEY_LEN], parts: &[&[u8]]) -> Result<[u8; TAG_LEN]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|_| StegoError::InvalidInput("invalid MAC key length".into()))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// Constant-time verification of a tag produced by [`compute_tag`].
pub fn verify_tag(mac_key: &[u8; KEY_LEN], parts: &[&[u8]], tag: &[u8]) -> Result<()> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|_| StegoError::InvalidInput("invalid MAC key length".into()))?;
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(tag)
        .map_err(|_| StegoError::AuthenticationFailed)
}
