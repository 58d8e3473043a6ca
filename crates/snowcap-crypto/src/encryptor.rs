//! Password-based encryption of opaque payloads into self-describing blobs.
//!
//! The encryptor is the only component that ever sees both a password
//! and plaintext secret material. Every encryption generates a fresh
//! random salt and nonce, derives a key via Argon2id, and seals the
//! payload with XChaCha20-Poly1305. The resulting [`EncryptedBlob`]
//! carries everything a future decrypt needs — salt, nonce, tag, and
//! KDF parameters — so no external version negotiation is required.
//!
//! # Wire format (v1)
//!
//! Blobs cross the secure-storage boundary as JSON with hex-encoded
//! byte fields:
//!
//! ```json
//! {
//!   "version": 1,
//!   "ciphertext": "<hex, variable>",
//!   "tag": "<hex, 16 bytes>",
//!   "salt": "<hex, 32 bytes>",
//!   "nonce": "<hex, 24 bytes>",
//!   "kdf": { "algorithm": "argon2id", "m_cost": 65536, "t_cost": 3, "p_cost": 1 }
//! }
//! ```
//!
//! Any malformed, truncated, or wrong-version blob decodes to
//! [`DecryptionError::Invalid`] — the same failure mode as a wrong
//! password, since a corrupted blob and a tampered one look alike.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use snowcap_types::{CryptoError, DecryptionError};
use zeroize::Zeroizing;

use crate::aead;
use crate::kdf::{self, Argon2Params};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current blob wire-format version.
pub const BLOB_VERSION: u32 = 1;

/// Byte length of the random Argon2id salt.
pub const SALT_LEN: usize = 32;

/// Additional authenticated data binding ciphertexts to this format.
/// A blob produced by another application (or format version) fails
/// authentication even under the correct password.
const VAULT_AAD: &[u8] = b"snowcap-vault-v1";

// ---------------------------------------------------------------------------
// KdfParams
// ---------------------------------------------------------------------------

/// KDF algorithm identifier stored inside a blob.
///
/// Only Argon2id exists today; the tag is stored so a future algorithm
/// migration can dispatch on it instead of guessing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    /// Argon2id, version 0x13.
    Argon2id,
}

/// Self-describing KDF parameters embedded in every blob.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Which KDF produced the key for this blob.
    pub algorithm: KdfAlgorithm,
    /// Argon2id tuning parameters.
    #[serde(flatten)]
    pub argon2: Argon2Params,
}

impl From<Argon2Params> for KdfParams {
    fn from(argon2: Argon2Params) -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            argon2,
        }
    }
}

// ---------------------------------------------------------------------------
// EncryptedBlob
// ---------------------------------------------------------------------------

/// An encrypted payload plus everything needed to decrypt it again.
///
/// Opaque to every component except this module. Produced fresh (new
/// random salt and nonce) on every encryption — two encryptions of the
/// same plaintext under the same password never match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedBlob {
    /// XChaCha20 ciphertext, tag detached.
    pub ciphertext: Vec<u8>,
    /// Poly1305 authentication tag.
    pub tag: [u8; aead::TAG_LEN],
    /// Random Argon2id salt.
    pub salt: [u8; SALT_LEN],
    /// Random XChaCha20-Poly1305 nonce.
    pub nonce: [u8; aead::NONCE_LEN],
    /// Parameters of the KDF that produced this blob's key.
    pub kdf: KdfParams,
}

/// Hex-encoded wire form of [`EncryptedBlob`].
#[derive(Serialize, Deserialize)]
struct BlobWire {
    version: u32,
    ciphertext: String,
    tag: String,
    salt: String,
    nonce: String,
    kdf: KdfParams,
}

impl EncryptedBlob {
    /// Serializes the blob to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        let wire = BlobWire {
            version: BLOB_VERSION,
            ciphertext: hex::encode(&self.ciphertext),
            tag: hex::encode(self.tag),
            salt: hex::encode(self.salt),
            nonce: hex::encode(self.nonce),
            kdf: self.kdf,
        };
        serde_json::to_string(&wire).map_err(|e| CryptoError {
            reason: format!("failed to serialize encrypted blob: {e}"),
        })
    }

    /// Parses a blob from its JSON wire form.
    ///
    /// # Errors
    ///
    /// [`DecryptionError::Invalid`] for malformed JSON, bad hex, wrong
    /// field lengths, or an unknown version. A blob that cannot be
    /// parsed is indistinguishable from a tampered one, so the failure
    /// mode is the same.
    pub fn from_json(json: &str) -> Result<Self, DecryptionError> {
        let wire: BlobWire = serde_json::from_str(json).map_err(|_| DecryptionError::Invalid)?;
        if wire.version != BLOB_VERSION {
            return Err(DecryptionError::Invalid);
        }

        Ok(Self {
            ciphertext: hex::decode(&wire.ciphertext).map_err(|_| DecryptionError::Invalid)?,
            tag: decode_fixed(&wire.tag)?,
            salt: decode_fixed(&wire.salt)?,
            nonce: decode_fixed(&wire.nonce)?,
            kdf: wire.kdf,
        })
    }
}

/// Decodes a hex string into a fixed-length array, rejecting any
/// length mismatch.
fn decode_fixed<const N: usize>(hex_str: &str) -> Result<[u8; N], DecryptionError> {
    let bytes = hex::decode(hex_str).map_err(|_| DecryptionError::Invalid)?;
    bytes.try_into().map_err(|_| DecryptionError::Invalid)
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` under `password`.
///
/// # Process
///
/// 1. Generate a fresh 32-byte random salt and 24-byte random nonce.
/// 2. Derive a 256-bit key via Argon2id(password, salt, `params`).
/// 3. Seal the plaintext with XChaCha20-Poly1305, AAD-bound to the
///    vault format.
/// 4. Detach the 16-byte tag and return the assembled blob.
///
/// The derived key is zeroized before returning. Neither the password
/// nor the plaintext is logged or retained.
///
/// # Errors
///
/// Returns [`CryptoError`] if entropy generation, key derivation, or
/// sealing fails.
pub fn encrypt(
    plaintext: &[u8],
    password: &str,
    params: &Argon2Params,
) -> Result<EncryptedBlob, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt).map_err(|e| CryptoError {
        reason: format!("failed to generate random salt: {e}"),
    })?;
    let nonce = aead::generate_nonce()?;

    let key = kdf::derive_key(password.as_bytes(), &salt, params)?;
    let mut sealed = aead::seal(key.as_bytes(), &nonce, plaintext, VAULT_AAD)?;

    // Detach the trailing tag so the blob matches the stored shape.
    let split_at = sealed.len() - aead::TAG_LEN;
    let tag_bytes = sealed.split_off(split_at);
    let mut tag = [0u8; aead::TAG_LEN];
    tag.copy_from_slice(&tag_bytes);

    Ok(EncryptedBlob {
        ciphertext: sealed,
        tag,
        salt,
        nonce,
        kdf: (*params).into(),
    })
}

/// Decrypts a blob under `password`, verifying the authentication tag.
///
/// The key is re-derived from `blob.salt` and `blob.kdf`; no state
/// outside the blob is consulted. The returned plaintext is wrapped in
/// [`Zeroizing`] so it is scrubbed when the caller drops it.
///
/// # Errors
///
/// [`DecryptionError::Invalid`] covers every failure: wrong password,
/// tampered ciphertext or tag, corrupted salt/nonce/KDF parameters.
/// These are cryptographically indistinguishable and no attempt is
/// made to tell them apart. No partial plaintext is ever returned.
pub fn decrypt(blob: &EncryptedBlob, password: &str) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    let KdfAlgorithm::Argon2id = blob.kdf.algorithm;

    // A corrupted parameter block fails derivation; same failure mode.
    let key = kdf::derive_key(password.as_bytes(), &blob.salt, &blob.kdf.argon2)
        .map_err(|_| DecryptionError::Invalid)?;

    let mut sealed = Vec::with_capacity(blob.ciphertext.len() + aead::TAG_LEN);
    sealed.extend_from_slice(&blob.ciphertext);
    sealed.extend_from_slice(&blob.tag);

    aead::open(key.as_bytes(), &blob.nonce, &sealed, VAULT_AAD).map(Zeroizing::new)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
