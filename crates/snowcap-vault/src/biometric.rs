//! Biometric-backed secondary unlock.
//!
//! The platform biometric prompt is abstracted behind the
//! [`BiometricGate`] capability trait so the core's control flow is
//! identical whether the device has Face ID, a fingerprint reader, or
//! nothing at all ([`UnsupportedGate`]).
//!
//! The cached password lives in the secure store behind the platform's
//! biometric vault — it is *not* an encrypted blob; its
//! confidentiality is delegated to the platform. Caching is an
//! explicit user opt-in via [`BiometricUnlockAdapter::enable`].

use std::sync::Arc;

use async_trait::async_trait;
use snowcap_types::{AuthError, AuthResult, StorageResult};
use zeroize::Zeroizing;

use crate::manager::VaultManager;
use crate::session::WalletSession;

// ---------------------------------------------------------------------------
// BiometricGate
// ---------------------------------------------------------------------------

/// Outcome of a platform biometric prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BiometricVerdict {
    /// The user passed the biometric check.
    Approved,
    /// The user failed or dismissed the prompt.
    Denied,
    /// The platform has no biometric capability (or it is disabled).
    Unavailable,
}

/// Platform biometric prompt capability.
#[async_trait]
pub trait BiometricGate: Send + Sync {
    /// Shows the platform biometric prompt and reports the outcome.
    /// Must not panic; platform errors map to
    /// [`BiometricVerdict::Unavailable`].
    async fn prompt(&self) -> BiometricVerdict;
}

/// Gate for platforms without biometric hardware. Always reports
/// [`BiometricVerdict::Unavailable`].
pub struct UnsupportedGate;

#[async_trait]
impl BiometricGate for UnsupportedGate {
    async fn prompt(&self) -> BiometricVerdict {
        BiometricVerdict::Unavailable
    }
}

// ---------------------------------------------------------------------------
// BiometricUnlockAdapter
// ---------------------------------------------------------------------------

/// Retrieves the cached password behind the biometric gate and
/// delegates to [`VaultManager::unlock`].
pub struct BiometricUnlockAdapter {
    gate: Arc<dyn BiometricGate>,
    manager: Arc<VaultManager>,
}

impl BiometricUnlockAdapter {
    /// Creates an adapter over a gate and the vault manager.
    pub fn new(gate: Arc<dyn BiometricGate>, manager: Arc<VaultManager>) -> Self {
        Self { gate, manager }
    }

    /// Unlocks the vault using the biometric-gated cached password.
    ///
    /// If the prompt is denied or unavailable, the cache is empty, or
    /// the cache read fails, this returns
    /// [`AuthError::BiometricUnavailable`] **without** touching the
    /// vault manager — the caller silently falls back to manual
    /// password entry. A present cached password that fails to decrypt
    /// the vault still surfaces as `InvalidPassword`, exactly as a
    /// typed password would.
    pub async fn unlock_with_biometrics(&self) -> AuthResult<Arc<WalletSession>> {
        match self.gate.prompt().await {
            BiometricVerdict::Approved => {}
            BiometricVerdict::Denied | BiometricVerdict::Unavailable => {
                return Err(AuthError::BiometricUnavailable);
            }
        }

        let key = self.manager.password_cache_key();
        let cached = match self.manager.store().get_item(key).await {
            Ok(Some(password)) => Zeroizing::new(password),
            Ok(None) => return Err(AuthError::BiometricUnavailable),
            Err(e) => {
                tracing::warn!(%e, "password cache read failed");
                return Err(AuthError::BiometricUnavailable);
            }
        };

        self.manager.unlock(&cached).await
    }

    /// Enables biometric unlock by caching the password.
    ///
    /// The password is verified against the stored seed record first;
    /// a password that cannot unlock the vault is never cached.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidPassword`] / [`AuthError::NotSignedUp`]
    ///   from verification.
    /// - [`AuthError::Storage`] if the cache write fails.
    pub async fn enable(&self, password: &str) -> AuthResult<()> {
        self.manager.verify_password(password).await?;
        self.manager
            .store()
            .set_item(self.manager.password_cache_key(), password)
            .await?;
        tracing::info!("biometric unlock enabled");
        Ok(())
    }

    /// Disables biometric unlock, removing the cached password.
    /// Idempotent.
    pub async fn disable(&self) -> StorageResult<()> {
        self.manager
            .store()
            .remove_item(self.manager.password_cache_key())
            .await?;
        tracing::info!("biometric unlock disabled");
        Ok(())
    }

    /// Whether a cached password exists.
    pub async fn is_enabled(&self) -> StorageResult<bool> {
        Ok(self
            .manager
            .store()
            .get_item(self.manager.password_cache_key())
            .await?
            .is_some())
    }
}
