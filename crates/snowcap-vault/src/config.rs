//! Vault configuration with sensible defaults.
//!
//! All operational parameters of the vault are centralized here: the
//! fixed secure-storage keys and the KDF cost profile. Every value has
//! a documented default.

use snowcap_crypto::kdf::Argon2Params;
use snowcap_types::CryptoError;

// ---------------------------------------------------------------------------
// Default storage keys
// ---------------------------------------------------------------------------

/// Default key for the encrypted seed-phrase blob.
pub const KEY_SEED_PHRASE: &str = "seed_phrase";

/// Default key for the encrypted account-list blob.
pub const KEY_ACCOUNTS: &str = "accounts";

/// Default key for the biometric-gated plaintext password cache.
pub const KEY_PASSWORD_CACHE: &str = "password";

// ---------------------------------------------------------------------------
// StorageKeys
// ---------------------------------------------------------------------------

/// The fixed secure-storage keys the vault owns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageKeys {
    /// Key of the encrypted seed-phrase blob.
    pub seed_phrase: String,
    /// Key of the encrypted account-list blob.
    pub accounts: String,
    /// Key of the biometric password cache.
    pub password_cache: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            seed_phrase: KEY_SEED_PHRASE.into(),
            accounts: KEY_ACCOUNTS.into(),
            password_cache: KEY_PASSWORD_CACHE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// VaultConfig
// ---------------------------------------------------------------------------

/// Vault configuration.
#[derive(Clone, Debug, Default)]
pub struct VaultConfig {
    /// Argon2id cost profile used for new encryptions. Existing blobs
    /// carry their own parameters and are unaffected by changes here.
    pub kdf: Argon2Params,
    /// Secure-storage keys. Overridable for tests; fixed in production.
    pub keys: StorageKeys,
}

impl VaultConfig {
    /// Validates all configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if any KDF cost is zero, the memory cost
    /// is below the Argon2 minimum for the parallelism degree, or any
    /// storage key is empty or duplicated.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.kdf.t_cost == 0 {
            return Err(CryptoError {
                reason: "kdf.t_cost must be greater than 0".into(),
            });
        }
        if self.kdf.p_cost == 0 {
            return Err(CryptoError {
                reason: "kdf.p_cost must be greater than 0".into(),
            });
        }
        if self.kdf.m_cost < 8 * self.kdf.p_cost {
            return Err(CryptoError {
                reason: format!(
                    "kdf.m_cost must be at least 8 * p_cost ({})",
                    8 * self.kdf.p_cost
                ),
            });
        }

        let keys = [
            &self.keys.seed_phrase,
            &self.keys.accounts,
            &self.keys.password_cache,
        ];
        if keys.iter().any(|k| k.is_empty()) {
            return Err(CryptoError {
                reason: "storage keys must not be empty".into(),
            });
        }
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            return Err(CryptoError {
                reason: "storage keys must be distinct".into(),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
