//! Cryptographic primitives for the Snowcap wallet vault.
//!
//! This crate is the **sole** location for cryptographic operations in
//! the workspace. No other crate may perform raw crypto directly.
//!
//! # Modules
//!
//! - [`kdf`] — Argon2id key derivation from the user's password
//! - [`aead`] — XChaCha20-Poly1305 authenticated encryption/decryption
//! - [`encryptor`] — password-based encryption of opaque payloads into
//!   self-describing [`encryptor::EncryptedBlob`]s
//!
//! All functions here are synchronous and CPU-bound. Callers that run
//! under an async executor are expected to move the slow KDF pass onto
//! a blocking thread; see the vault crate.

pub mod aead;
pub mod encryptor;
pub mod kdf;
