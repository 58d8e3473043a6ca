//! Core shared types for the Snowcap wallet vault.
//!
//! This crate defines the types that cross crate boundaries in the
//! workspace: the account descriptor, the authentication lifecycle
//! state, and the complete error taxonomy. No other crate should
//! define shared types — everything lives here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Descriptor of a single wallet account.
///
/// Accounts are stored as an ordered list; the position of an account
/// in the list maps to its derivation path index, so order is
/// significant and must be preserved across encrypt/decrypt cycles.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Checksummed account address (e.g. `0x`-prefixed hex).
    pub address: String,
}

impl Account {
    /// Creates an account descriptor from an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Coarse authentication lifecycle state of the device's single vault.
///
/// Only the `NotSignedUp` / "vault exists" distinction is derivable
/// from persistent storage. `Unlocked` is in-memory only; after a
/// process restart a device with a vault always resolves to `Locked`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AuthState {
    /// No vault has ever been created on this device.
    NotSignedUp,
    /// A vault exists but its secrets are not decrypted in memory.
    Locked,
    /// A wallet session is live; secrets are decrypted in memory.
    Unlocked,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedUp => write!(f, "not-signed-up"),
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
        }
    }
}

// ---------------------------------------------------------------------------
// DecryptionError
// ---------------------------------------------------------------------------

/// Failure of an authenticated decryption.
///
/// A single variant by design: an AEAD tag-check failure cannot
/// distinguish a wrong password from a corrupted or tampered blob, so
/// the encryptor does not pretend to.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// Authentication/integrity check failed — wrong password or
    /// corrupted blob. No partial plaintext is ever returned.
    #[error("decryption failed: wrong password or corrupted blob")]
    Invalid,
}

// ---------------------------------------------------------------------------
// CryptoError
// ---------------------------------------------------------------------------

/// Failure on the encryption side: invalid KDF parameters, entropy
/// source failure, or serialization of a blob.
#[derive(Debug, Error)]
#[error("crypto failure: {reason}")]
pub struct CryptoError {
    /// Human-readable description of the failure.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Failure propagated from the platform secure-storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading a key failed (distinct from the key being absent).
    #[error("storage read failed for key `{key}`: {reason}")]
    ReadFailed {
        /// The storage key being read.
        key: String,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// Writing or removing a key failed.
    #[error("storage write failed for key `{key}`: {reason}")]
    WriteFailed {
        /// The storage key being written or removed.
        key: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl StorageError {
    /// The storage key the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Self::ReadFailed { key, .. } | Self::WriteFailed { key, .. } => key,
        }
    }
}

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Failure of a vault lifecycle operation (unlock, lock, sign-up,
/// biometric unlock).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The password failed to decrypt a stored blob. Surfaces
    /// [`DecryptionError::Invalid`] during unlock.
    #[error("invalid password")]
    InvalidPassword,

    /// No vault exists on this device, or the requested transition is
    /// illegal from the `NotSignedUp` state.
    #[error("no vault exists on this device")]
    NotSignedUp,

    /// A vault already exists; sign-up must not overwrite it.
    #[error("a vault already exists on this device")]
    AlreadySignedUp,

    /// The operation requires a live (unlocked) wallet session.
    #[error("vault is locked")]
    VaultLocked,

    /// A second unlock attempt arrived while one was in flight. The
    /// guard is a single-slot, non-queuing mutex: the second caller is
    /// rejected, not queued.
    #[error("an unlock attempt is already in flight")]
    ConcurrentUnlockRejected,

    /// Biometric retrieval was declined, errored, or the password
    /// cache is empty. A fallback signal, not an alarm: the caller
    /// falls back to manual password entry.
    #[error("biometric unlock is unavailable")]
    BiometricUnavailable,

    /// A secure-storage read or write failed mid-operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An encryption-side failure (sign-up or re-encryption paths).
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<DecryptionError> for AuthError {
    fn from(_: DecryptionError) -> Self {
        Self::InvalidPassword
    }
}

// ---------------------------------------------------------------------------
// ResetError
// ---------------------------------------------------------------------------

/// Aggregate of the storage failures encountered during a reset.
///
/// Reset is a best-effort total wipe: every removal is attempted even
/// if earlier ones fail, and the state transition to
/// [`AuthState::NotSignedUp`] happens unconditionally. This error
/// reports what went wrong for diagnostics; its presence never means
/// the wipe was abandoned.
#[derive(Debug, Error)]
#[error("reset completed with {} storage failure(s)", failures.len())]
pub struct ResetError {
    /// The individual removal failures, in key order.
    pub failures: Vec<StorageError>,
}

// ---------------------------------------------------------------------------
// Result aliases
// ---------------------------------------------------------------------------

/// Result of a vault lifecycle operation.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Result of a secure-storage operation.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_state_display() {
        assert_eq!(AuthState::NotSignedUp.to_string(), "not-signed-up");
        assert_eq!(AuthState::Locked.to_string(), "locked");
        assert_eq!(AuthState::Unlocked.to_string(), "unlocked");
    }

    #[test]
    fn account_serde_json_roundtrip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let account = Account::new("0xAAAA000000000000000000000000000000000001");
        let json = serde_json::to_string(&account)?;
        let parsed: Account = serde_json::from_str(&json)?;
        assert_eq!(account, parsed);
        Ok(())
    }

    #[test]
    fn account_list_order_survives_serde() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let accounts = vec![
            Account::new("0xAAA"),
            Account::new("0xBBB"),
            Account::new("0xCCC"),
        ];
        let json = serde_json::to_string(&accounts)?;
        let parsed: Vec<Account> = serde_json::from_str(&json)?;
        assert_eq!(accounts, parsed);
        Ok(())
    }

    #[test]
    fn decryption_error_converts_to_invalid_password() {
        let auth: AuthError = DecryptionError::Invalid.into();
        assert!(matches!(auth, AuthError::InvalidPassword));
    }

    #[test]
    fn storage_error_preserves_key() {
        let err = StorageError::WriteFailed {
            key: "seed_phrase".into(),
            reason: "disk full".into(),
        };
        assert_eq!(err.key(), "seed_phrase");
        assert!(err.to_string().contains("seed_phrase"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn reset_error_display_counts_failures() {
        let err = ResetError {
            failures: vec![
                StorageError::WriteFailed {
                    key: "accounts".into(),
                    reason: "simulated".into(),
                },
                StorageError::WriteFailed {
                    key: "password".into(),
                    reason: "simulated".into(),
                },
            ],
        };
        assert!(err.to_string().contains("2 storage failure(s)"));
    }
}
