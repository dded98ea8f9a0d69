//! Payload framing.
//!
//! The structure hidden in the image has fixed-offset fields and no
//! delimiters, so it can be parsed straight out of a recovered bitstream:
//!
//! ```text
//! offset  size  field
//!  0       4    message_length (u32 BE) = ciphertext length
//!  4      16    salt            (PBKDF2)
//! 20      16    iv              (AES-CBC)
//! 36       N    ciphertext      (AES-256-CBC, PKCS7)
//! 36+N    32    tag             (HMAC-SHA256, only with `authenticate`)
//! ```

use log::debug;

use crate::config::CodecOptions;
use crate::crypto::{self, IV_LEN, SALT_LEN, TAG_LEN};
use crate::error::{Result, StegoError};

/// Size of the big-endian length field.
pub const LEN_FIELD_LEN: usize = 4;
/// Fixed header: length + salt + IV.
pub const HEADER_LEN: usize = LEN_FIELD_LEN + SALT_LEN + IV_LEN;

/// Write `[len][salt][iv][ciphertext]`.
pub fn serialize(ciphertext: &[u8], salt: &[u8; SALT_LEN], iv: &[u8; IV_LEN]) -> Result<Vec<u8>> {
    let len: u32 = ciphertext.len().try_into().map_err(|_| {
        StegoError::InvalidInput(format!(
            "ciphertext too large for payload framing (max {} bytes)",
            u32::MAX
        ))
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(salt);
    out.extend_from_slice(iv);
    out.extend_from_slice(ciphertext);
    Ok(out)
}

/// Read the `message_length` field from the first bytes of a payload.
pub fn read_declared_len(input: &[u8]) -> Result<usize> {
    if input.len() < HEADER_LEN {
        return Err(StegoError::MalformedPayload(format!(
            "payload too short for header: {} bytes (need {HEADER_LEN})",
            input.len()
        )));
    }
    let mut len = [0u8; LEN_FIELD_LEN];
    len.copy_from_slice(&input[..LEN_FIELD_LEN]);
    Ok(u32::from_be_bytes(len) as usize)
}

/// Parse `[len][salt][iv][ciphertext]`, returning `(ciphertext, salt, iv)`.
///
/// Bytes past the declared ciphertext are ignored.
pub fn deserialize(input: &[u8]) -> Result<(Vec<u8>, [u8; SALT_LEN], [u8; IV_LEN])> {
    let declared = read_declared_len(input)?;
    let end = HEADER_LEN
        .checked_add(declared)
        .ok_or_else(|| StegoError::MalformedPayload("declared length overflows".into()))?;
    if end > input.len() {
        return Err(StegoError::MalformedPayload(format!(
            "declared ciphertext length {} exceeds the {} bytes available",
            declared,
            input.len() - HEADER_LEN
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    salt.copy_from_slice(&input[LEN_FIELD_LEN..LEN_FIELD_LEN + SALT_LEN]);
    iv.copy_from_slice(&input[LEN_FIELD_LEN + SALT_LEN..HEADER_LEN]);
    let ciphertext = input[HEADER_LEN..end].to_vec();

    Ok((ciphertext, salt, iv))
}

/// Total bytes hidden in the image for a ciphertext of `ciphertext_len`.
pub fn wire_len(ciphertext_len: usize, authenticate: bool) -> usize {
    HEADER_LEN + ciphertext_len + if authenticate { TAG_LEN } else { 0 }
}

/// An encrypted message together with the parameters needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
    tag: Option<[u8; TAG_LEN]>,
}

impl Payload {
    /// Encrypt `message` under a fresh random salt and IV.
    pub fn seal(message: &str, password: &str, opts: &CodecOptions) -> Result<Self> {
        let salt = crypto::random_array::<SALT_LEN>()?;
        let iv = crypto::random_array::<IV_LEN>()?;
        Self::seal_with(message, password, &salt, &iv, opts)
    }

    /// Encrypt `message` under a caller-chosen salt and IV.
    ///
    /// Reusing a salt/IV pair across messages leaks plaintext relationships;
    /// this exists so tests can pin the output bytes.
    pub fn seal_with(
        message: &str,
        password: &str,
        salt: &[u8; SALT_LEN],
        iv: &[u8; IV_LEN],
        opts: &CodecOptions,
    ) -> Result<Self> {
        opts.validate()?;

        let payload = if opts.authenticate {
            let keys = crypto::derive_split_keys(password, salt, &opts.kdf)?;
            let mut payload = Self::unsealed(salt, iv, &keys.cipher[..], message)?;
            let header = payload.header_bytes()?;
            payload.tag = Some(crypto::compute_tag(
                &keys.mac,
                &[header.as_slice(), payload.ciphertext.as_slice()],
            )?);
            payload
        } else {
            let key = crypto::derive_key(password, salt, &opts.kdf)?;
            Self::unsealed(salt, iv, &key[..], message)?
        };

        debug!(
            "sealed {} message bytes into {} ciphertext bytes (tag: {})",
            message.len(),
            payload.ciphertext.len(),
            payload.tag.is_some()
        );
        Ok(payload)
    }

    fn unsealed(salt: &[u8; SALT_LEN], iv: &[u8; IV_LEN], key: &[u8], message: &str) -> Result<Self> {
        Ok(Self {
            salt: *salt,
            iv: *iv,
            ciphertext: crypto::encrypt_with_iv(message.as_bytes(), key, iv)?,
            tag: None,
        })
    }

    /// Verify (if tagged) and decrypt.
    pub fn open(&self, password: &str, opts: &CodecOptions) -> Result<String> {
        opts.validate()?;

        if opts.authenticate {
            let tag = self.tag.ok_or_else(|| {
                StegoError::MalformedPayload("authentication tag missing".into())
            })?;
            let keys = crypto::derive_split_keys(password, &self.salt, &opts.kdf)?;
            let header = self.header_bytes()?;
            crypto::verify_tag(
                &keys.mac,
                &[header.as_slice(), self.ciphertext.as_slice()],
                &tag,
            )?;
            crypto::decrypt(&self.ciphertext, &keys.cipher[..], &self.iv)
        } else {
            let key = crypto::derive_key(password, &self.salt, &opts.kdf)?;
            crypto::decrypt(&self.ciphertext, &key[..], &self.iv)
        }
    }

    fn header_bytes(&self) -> Result<Vec<u8>> {
        let mut header = serialize(&[], &self.salt, &self.iv)?;
        let len: u32 = self.ciphertext.len().try_into().map_err(|_| {
            StegoError::InvalidInput("ciphertext too large for payload framing".into())
        })?;
        header[..LEN_FIELD_LEN].copy_from_slice(&len.to_be_bytes());
        Ok(header)
    }

    /// Serialize for embedding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = serialize(&self.ciphertext, &self.salt, &self.iv)?;
        if let Some(tag) = &self.tag {
            out.extend_from_slice(tag);
        }
        Ok(out)
    }

    /// Parse a payload recovered from an image. With `authenticated`, a
    /// 32-byte tag must follow the ciphertext.
    pub fn from_bytes(input: &[u8], authenticated: bool) -> Result<Self> {
        let (ciphertext, salt, iv) = deserialize(input)?;

        let tag = if authenticated {
            let start = HEADER_LEN + ciphertext.len();
            let tag_bytes = input.get(start..start + TAG_LEN).ok_or_else(|| {
                StegoError::MalformedPayload("truncated authentication tag".into())
            })?;
            let mut tag = [0u8; TAG_LEN];
            tag.copy_from_slice(tag_bytes);
            Some(tag)
        } else {
            None
        };

        Ok(Self {
            salt,
            iv,
            ciphertext,
            tag,
        })
    }

    /// Bytes this payload occupies once embedded.
    pub fn encoded_len(&self) -> usize {
        wire_len(self.ciphertext.len(), self.tag.is_some())
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> Option<&[u8; TAG_LEN]> {
        self.tag.as_ref()
    }
}
