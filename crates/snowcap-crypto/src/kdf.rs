//! Argon2id key derivation for vault encryption.
//!
//! Derives a 256-bit encryption key from the user's password and a
//! random salt using Argon2id (memory-hard, GPU-resistant). The pass
//! is deliberately slow; callers under an async executor must not run
//! it on the event loop.

use snowcap_types::CryptoError;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Argon2Params
// ---------------------------------------------------------------------------

/// Tuning parameters for the Argon2id key derivation function.
///
/// # Defaults
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `m_cost`  | 65 536  | Memory usage in KiB (64 MiB) |
/// | `t_cost`  | 3       | Number of iterations |
/// | `p_cost`  | 1       | Degree of parallelism |
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB. Must be ≥ 8 × `p_cost`.
    pub m_cost: u32,
    /// Time cost (number of passes). Must be ≥ 1.
    pub t_cost: u32,
    /// Parallelism degree. Must be ≥ 1.
    pub p_cost: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            m_cost: 65_536, // 64 MiB
            t_cost: 3,
            p_cost: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// 256-bit key derived by Argon2id.
///
/// Zeroized when dropped to minimize the time key material resides in
/// memory. Deliberately implements neither `Clone` nor `Debug`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Fixed byte length of the derived key.
    pub const LEN: usize = 32;

    /// Returns the raw 32-byte key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Minimum acceptable salt length. RFC 9106 recommends ≥ 16 bytes;
/// the vault always uses 32.
const MIN_SALT_LEN: usize = 16;

/// Derives a 256-bit key from a password and salt using Argon2id.
///
/// # Errors
///
/// Returns [`CryptoError`] if the salt is too short, the parameters
/// are rejected by the `argon2` crate, or the derivation itself fails.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<DerivedKey, CryptoError> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError {
            reason: format!(
                "salt must be at least {MIN_SALT_LEN} bytes, got {}",
                salt.len()
            ),
        });
    }

    let argon2_params = argon2::Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(DerivedKey::LEN),
    )
    .map_err(|e| CryptoError {
        reason: format!("invalid Argon2 parameters: {e}"),
    })?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError {
            reason: format!("Argon2id derivation failed: {e}"),
        })?;

    Ok(DerivedKey(output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Light parameters suitable for fast unit tests.
    fn test_params() -> Argon2Params {
        Argon2Params {
            m_cost: 256, // 256 KiB — fast for testing
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn derive_key_is_deterministic() -> Result<(), CryptoError> {
        let password = b"correct horse battery staple";
        let salt = b"0123456789abcdef"; // 16 bytes
        let key1 = derive_key(password, salt, &test_params())?;
        let key2 = derive_key(password, salt, &test_params())?;
        assert_eq!(key1.as_bytes(), key2.as_bytes());
        Ok(())
    }

    #[test]
    fn different_password_different_key() -> Result<(), CryptoError> {
        let salt = b"0123456789abcdef";
        let key_a = derive_key(b"password_a", salt, &test_params())?;
        let key_b = derive_key(b"password_b", salt, &test_params())?;
        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
        Ok(())
    }

    #[test]
    fn different_salt_different_key() -> Result<(), CryptoError> {
        let key_a = derive_key(b"same_password", b"salt_aaaaaaa_aaa", &test_params())?;
        let key_b = derive_key(b"same_password", b"salt_bbbbbbb_bbb", &test_params())?;
        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
        Ok(())
    }

    #[test]
    fn salt_too_short_rejected() {
        assert!(derive_key(b"pw", b"short", &test_params()).is_err());
    }

    #[test]
    fn zero_t_cost_rejected() {
        let params = Argon2Params {
            t_cost: 0,
            ..test_params()
        };
        assert!(derive_key(b"pw", b"0123456789abcdef", &params).is_err());
    }

    #[test]
    fn zero_p_cost_rejected() {
        let params = Argon2Params {
            p_cost: 0,
            ..test_params()
        };
        assert!(derive_key(b"pw", b"0123456789abcdef", &params).is_err());
    }

    #[test]
    fn empty_password_is_allowed() -> Result<(), CryptoError> {
        let key = derive_key(b"", b"0123456789abcdef", &test_params())?;
        assert_eq!(key.as_bytes().len(), 32);
        Ok(())
    }

    #[test]
    fn params_serde_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let params = Argon2Params::default();
        let json = serde_json::to_string(&params)?;
        let parsed: Argon2Params = serde_json::from_str(&json)?;
        assert_eq!(params, parsed);
        Ok(())
    }
}
