use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::crypto::KdfParams;
use crate::error::{Result, StegoError};

/// Options that control how a payload is sealed and opened.
///
/// None of these are written into the image, so `decode` must be given the
/// same options `encode` used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// PBKDF2 parameters.
    pub kdf: KdfParams,

    /// If true, append an HMAC-SHA256 tag after the ciphertext and verify it
    /// before decrypting.
    pub authenticate: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            kdf: KdfParams::recommended(),
            authenticate: false,
        }
    }
}

impl CodecOptions {
    pub fn validate(&self) -> Result<()> {
        self.kdf.validate()
    }

    /// Parse options from TOML text. Missing keys take their defaults.
    ///
    /// ```toml
    /// authenticate = true
    ///
    /// [kdf]
    /// iterations = 200000
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let opts: Self = toml::from_str(s)
            .map_err(|e| StegoError::InvalidInput(format!("parse config: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Load options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
