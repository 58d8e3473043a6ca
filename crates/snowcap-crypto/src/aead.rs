//! XChaCha20-Poly1305 authenticated encryption with associated data.
//!
//! All symmetric encryption in the vault uses XChaCha20-Poly1305 with
//! 192-bit (24-byte) nonces generated from OS entropy. A nonce must
//! never be reused with the same key; the encryptor generates a fresh
//! one per blob.

use rand::rngs::OsRng;
use rand::RngCore;
use snowcap_types::{CryptoError, DecryptionError};

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

/// Byte length of an XChaCha20-Poly1305 nonce.
pub const NONCE_LEN: usize = 24;

/// Byte length of the Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;

/// Generates a fresh 192-bit random nonce from OS entropy.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
    let mut bytes = [0u8; NONCE_LEN];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| CryptoError {
        reason: format!("failed to generate random nonce: {e}"),
    })?;
    Ok(bytes)
}

/// Encrypts `plaintext` under `key`/`nonce`, binding `aad`.
///
/// Returns the ciphertext with the 16-byte Poly1305 tag appended
/// (length = plaintext length + [`TAG_LEN`]).
pub fn seal(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(XNonce::from_slice(nonce), payload)
        .map_err(|e| CryptoError {
            reason: format!("XChaCha20-Poly1305 encryption failed: {e}"),
        })
}

/// Decrypts `ciphertext` (tag appended) under `key`/`nonce`/`aad`.
///
/// # Errors
///
/// [`DecryptionError::Invalid`] if tag verification fails — wrong key,
/// wrong nonce, tampered ciphertext, or wrong AAD. The four causes are
/// cryptographically indistinguishable, so a single failure mode is
/// all this function reports. No partial plaintext is ever returned.
pub fn open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(XNonce::from_slice(nonce), payload)
        .map_err(|_| DecryptionError::Invalid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let key = [0x42u8; 32];
        let nonce = generate_nonce()?;
        let plaintext = b"hello snowcap";
        let aad = b"metadata";

        let sealed = seal(&key, &nonce, plaintext, aad)?;
        assert_ne!(sealed.as_slice(), plaintext.as_slice());
        assert_eq!(sealed.len(), plaintext.len() + TAG_LEN);

        let opened = open(&key, &nonce, &sealed, aad)?;
        assert_eq!(opened.as_slice(), plaintext.as_slice());
        Ok(())
    }

    #[test]
    fn empty_plaintext_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let key = [0x01u8; 32];
        let nonce = generate_nonce()?;

        let sealed = seal(&key, &nonce, b"", b"")?;
        assert_eq!(sealed.len(), TAG_LEN); // tag only

        let opened = open(&key, &nonce, &sealed, b"")?;
        assert!(opened.is_empty());
        Ok(())
    }

    #[test]
    fn wrong_key_fails_open() -> Result<(), Box<dyn std::error::Error>> {
        let nonce = generate_nonce()?;
        let sealed = seal(&[0x42u8; 32], &nonce, b"secret", b"")?;
        let result = open(&[0x43u8; 32], &nonce, &sealed, b"");
        assert!(matches!(result, Err(DecryptionError::Invalid)));
        Ok(())
    }

    #[test]
    fn wrong_nonce_fails_open() -> Result<(), Box<dyn std::error::Error>> {
        let key = [0x42u8; 32];
        let sealed = seal(&key, &generate_nonce()?, b"secret", b"")?;
        let result = open(&key, &generate_nonce()?, &sealed, b"");
        assert!(matches!(result, Err(DecryptionError::Invalid)));
        Ok(())
    }

    #[test]
    fn wrong_aad_fails_open() -> Result<(), Box<dyn std::error::Error>> {
        let key = [0x42u8; 32];
        let nonce = generate_nonce()?;
        let sealed = seal(&key, &nonce, b"secret", b"correct aad")?;
        let result = open(&key, &nonce, &sealed, b"wrong aad");
        assert!(matches!(result, Err(DecryptionError::Invalid)));
        Ok(())
    }

    #[test]
    fn tampered_ciphertext_fails_open() -> Result<(), Box<dyn std::error::Error>> {
        let key = [0x42u8; 32];
        let nonce = generate_nonce()?;
        let mut sealed = seal(&key, &nonce, b"secret", b"")?;
        sealed[0] ^= 0x01;
        let result = open(&key, &nonce, &sealed, b"");
        assert!(matches!(result, Err(DecryptionError::Invalid)));
        Ok(())
    }

    #[test]
    fn generated_nonces_are_unique() -> Result<(), Box<dyn std::error::Error>> {
        assert_ne!(generate_nonce()?, generate_nonce()?);
        Ok(())
    }
}
