//! Encryption port for stock payloads
//!
//! PIN numbers and ICCIDs are encrypted before they are persisted and
//! only ever surfaced masked. The scheme is pluggable: production
//! deployments must provide an authenticated symmetric cipher with
//! externally managed keys behind this trait.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{AppError, AppResult};

/// Reversible payload protection for stock items
pub trait EncryptionPort: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> AppResult<String>;
    fn decrypt(&self, ciphertext: &str) -> AppResult<String>;
}

/// Base64 codec for development and tests. This is an encoding, not
/// encryption; do not deploy it against real inventory.
#[derive(Debug, Clone, Default)]
pub struct Base64Codec;

impl EncryptionPort for Base64Codec {
    fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        Ok(BASE64.encode(plaintext.as_bytes()))
    }

    fn decrypt(&self, ciphertext: &str) -> AppResult<String> {
        let bytes = BASE64
            .decode(ciphertext)
            .map_err(|e| AppError::Encryption(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Encryption(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_round_trip() {
        let codec = Base64Codec;
        let cipher = codec.encrypt("1234567890123456").unwrap();
        assert_ne!(cipher, "1234567890123456");
        assert_eq!(codec.decrypt(&cipher).unwrap(), "1234567890123456");
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let codec = Base64Codec;
        let err = codec.decrypt("%%%not-base64%%%").unwrap_err();
        assert_eq!(err.code(), "ENCRYPTION_ERROR");
    }
}
