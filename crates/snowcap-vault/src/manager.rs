//! Vault orchestration: sign-up, unlock, lock, reset, account growth.
//!
//! The [`VaultManager`] is the only component that moves secrets
//! between the secure store, the encryptor, and the in-memory
//! [`WalletSession`]. It owns the [`AuthStateMachine`] and a single
//! optional session slot — no other place in the process holds
//! decrypted secrets.
//!
//! # Concurrency
//!
//! All operations are async; every store call and every KDF pass is a
//! suspension point (the KDF runs under `spawn_blocking` so the slow
//! Argon2id pass never blocks the executor). Unlock is guarded by a
//! single-slot, non-queuing mutex: a second unlock arriving while one
//! is in flight is rejected with `ConcurrentUnlockRejected`, not
//! queued. Reset, sign-up, and account growth serialize on the same
//! mutex by waiting, so none of them can interleave with an in-flight
//! unlock. Within one unlock the seed-phrase decrypt happens before
//! the accounts decrypt, which happens before the state transition.

use std::sync::Arc;

use snowcap_crypto::encryptor::{self, EncryptedBlob};
use snowcap_crypto::kdf::Argon2Params;
use snowcap_types::{
    Account, AuthError, AuthResult, AuthState, CryptoError, DecryptionError, ResetError,
    StorageResult,
};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use crate::config::VaultConfig;
use crate::events::VaultHooks;
use crate::session::WalletSession;
use crate::state::AuthStateMachine;
use crate::store::SecureStore;

// ---------------------------------------------------------------------------
// VaultManager
// ---------------------------------------------------------------------------

/// Orchestrates the encrypted vault and the authentication lifecycle.
///
/// The manager returns sessions as `Arc<WalletSession>`: the slot here
/// keeps one reference, the caller gets another, and the backing
/// memory is zeroized when the last reference is dropped. [`lock`] and
/// [`reset`] release the manager's reference; callers are expected to
/// drop theirs promptly rather than stash it.
///
/// [`lock`]: VaultManager::lock
/// [`reset`]: VaultManager::reset
pub struct VaultManager {
    store: Arc<dyn SecureStore>,
    hooks: Arc<dyn VaultHooks>,
    config: VaultConfig,
    state: AuthStateMachine,
    /// The single session slot. `Some` iff the state is `Unlocked`.
    session: Mutex<Option<Arc<WalletSession>>>,
    /// Serializes vault operations. Unlock uses `try_lock` (reject,
    /// don't queue); everything else waits.
    op_lock: Mutex<()>,
}

impl VaultManager {
    /// Opens the vault manager against a secure store.
    ///
    /// Probes the store to resolve the initial state: `Locked` if both
    /// vault records exist, `NotSignedUp` otherwise. A device with
    /// exactly one record violates the both-or-none invariant; it is
    /// logged and treated as not signed up (a reset cleans it up).
    ///
    /// # Errors
    ///
    /// - [`AuthError::Crypto`] if the configuration is invalid.
    /// - [`AuthError::Storage`] if the probe reads fail.
    pub async fn open(
        store: Arc<dyn SecureStore>,
        hooks: Arc<dyn VaultHooks>,
        config: VaultConfig,
    ) -> AuthResult<Self> {
        config.validate()?;

        let has_seed = store.get_item(&config.keys.seed_phrase).await?.is_some();
        let has_accounts = store.get_item(&config.keys.accounts).await?.is_some();

        let initial = match (has_seed, has_accounts) {
            (true, true) => AuthState::Locked,
            (false, false) => AuthState::NotSignedUp,
            _ => {
                tracing::warn!(
                    has_seed,
                    has_accounts,
                    "vault records are inconsistent; treating device as not signed up"
                );
                AuthState::NotSignedUp
            }
        };

        tracing::info!(state = %initial, "vault manager opened");

        Ok(Self {
            store,
            hooks,
            config,
            state: AuthStateMachine::new(initial),
            session: Mutex::new(None),
            op_lock: Mutex::new(()),
        })
    }

    // -- Queries ----------------------------------------------------------

    /// The current authentication state.
    pub fn status(&self) -> AuthState {
        self.state.state()
    }

    /// Subscribes to authentication state changes.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The live session, if the vault is unlocked.
    pub async fn session(&self) -> Option<Arc<WalletSession>> {
        self.session.lock().await.clone()
    }

    /// Whether both vault records exist in storage.
    pub async fn is_signed_up(&self) -> StorageResult<bool> {
        let has_seed = self
            .store
            .get_item(&self.config.keys.seed_phrase)
            .await?
            .is_some();
        let has_accounts = self
            .store
            .get_item(&self.config.keys.accounts)
            .await?
            .is_some();
        Ok(has_seed && has_accounts)
    }

    pub(crate) fn store(&self) -> &Arc<dyn SecureStore> {
        &self.store
    }

    pub(crate) fn password_cache_key(&self) -> &str {
        &self.config.keys.password_cache
    }

    // -- Sign-up ----------------------------------------------------------

    /// Creates the vault: encrypts the seed phrase and account list
    /// under one password and stores both records.
    ///
    /// Both records are written or neither is: if the second write
    /// fails the first is rolled back best-effort before the error is
    /// returned. On success the state transitions
    /// `NotSignedUp -> Locked` and `auth_initialized` fires. The vault
    /// stays locked; call [`unlock`](Self::unlock) to open a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlreadySignedUp`] if a vault exists.
    /// - [`AuthError::Crypto`] / [`AuthError::Storage`] on encryption
    ///   or write failure.
    pub async fn create_vault(
        &self,
        mnemonic: &str,
        accounts: &[Account],
        password: &str,
    ) -> AuthResult<()> {
        let _guard = self.op_lock.lock().await;

        if self.status() != AuthState::NotSignedUp {
            return Err(AuthError::AlreadySignedUp);
        }

        let password = Zeroizing::new(password.to_string());
        let keys = &self.config.keys;

        let accounts_plain =
            Zeroizing::new(serde_json::to_vec(accounts).map_err(|e| CryptoError {
                reason: format!("failed to serialize account list: {e}"),
            })?);
        let seed_plain = Zeroizing::new(mnemonic.as_bytes().to_vec());

        let seed_blob = encrypt_off_thread(seed_plain, password.clone(), self.config.kdf).await?;
        let accounts_blob = encrypt_off_thread(accounts_plain, password, self.config.kdf).await?;

        self.store
            .set_item(&keys.seed_phrase, &seed_blob.to_json()?)
            .await?;
        if let Err(e) = self
            .store
            .set_item(&keys.accounts, &accounts_blob.to_json()?)
            .await
        {
            // Roll back the first record so no orphan blob survives.
            if let Err(rollback) = self.store.remove_item(&keys.seed_phrase).await {
                tracing::error!(%rollback, "failed to roll back seed record after write failure");
            }
            return Err(e.into());
        }

        self.state.vault_created()?;
        self.hooks.auth_initialized();
        tracing::info!(accounts = accounts.len(), "vault created");
        Ok(())
    }

    // -- Unlock / lock ----------------------------------------------------

    /// Unlocks the vault with a password, producing a live session.
    ///
    /// # Process
    ///
    /// 1. Reject immediately if another unlock is in flight.
    /// 2. Fetch both records; either missing is `NotSignedUp`.
    /// 3. Decrypt the seed phrase, then the account list, each
    ///    validated independently — a blob pair encrypted under
    ///    different passwords is never expected, but never assumed
    ///    absent either.
    /// 4. Construct the session, transition to `Unlocked`, fire
    ///    `wallet_initialized`.
    ///
    /// On any failure the state is left exactly as it was — no partial
    /// session, no partial transition. The password and every derived
    /// copy are zeroized on all exit paths.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ConcurrentUnlockRejected`] — an unlock is in flight.
    /// - [`AuthError::NotSignedUp`] — either record is missing.
    /// - [`AuthError::InvalidPassword`] — either blob failed to
    ///   decrypt (wrong password or corruption, indistinguishable).
    /// - [`AuthError::Storage`] — a store read failed.
    pub async fn unlock(&self, password: &str) -> AuthResult<Arc<WalletSession>> {
        let _guard = self
            .op_lock
            .try_lock()
            .map_err(|_| AuthError::ConcurrentUnlockRejected)?;

        let password = Zeroizing::new(password.to_string());
        let keys = &self.config.keys;

        let seed_json = self
            .store
            .get_item(&keys.seed_phrase)
            .await?
            .ok_or(AuthError::NotSignedUp)?;
        let accounts_json = self
            .store
            .get_item(&keys.accounts)
            .await?
            .ok_or(AuthError::NotSignedUp)?;

        let seed_blob = EncryptedBlob::from_json(&seed_json)?;
        let accounts_blob = EncryptedBlob::from_json(&accounts_json)?;

        let mnemonic = secret_utf8(decrypt_off_thread(seed_blob, password.clone()).await?)?;
        let accounts_plain = decrypt_off_thread(accounts_blob, password.clone()).await?;
        let accounts: Vec<Account> = serde_json::from_slice(&accounts_plain)
            .map_err(|_| DecryptionError::Invalid)
            .map_err(AuthError::from)?;

        let session = Arc::new(WalletSession::new(mnemonic, accounts, password.clone()));

        self.state.session_opened()?;
        *self.session.lock().await = Some(session.clone());
        self.hooks.wallet_initialized(&session);
        tracing::info!("vault unlocked");
        Ok(session)
    }

    /// Locks the vault, dropping the manager's session reference and
    /// transitioning `Unlocked -> Locked`. Idempotent if already
    /// locked.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotSignedUp`] if no vault exists — locking nothing
    /// is an illegal transition, not a silent no-op.
    pub async fn lock(&self) -> AuthResult<()> {
        let mut slot = self.session.lock().await;
        self.state.session_closed()?;
        if slot.take().is_some() {
            tracing::info!("vault locked");
        }
        Ok(())
    }

    /// Verifies a password against the stored seed record without
    /// opening a session.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`unlock`](Self::unlock), minus the
    /// concurrency guard.
    pub async fn verify_password(&self, password: &str) -> AuthResult<()> {
        let password = Zeroizing::new(password.to_string());
        let seed_json = self
            .store
            .get_item(&self.config.keys.seed_phrase)
            .await?
            .ok_or(AuthError::NotSignedUp)?;
        let blob = EncryptedBlob::from_json(&seed_json)?;
        decrypt_off_thread(blob, password).await?;
        Ok(())
    }

    // -- Account growth ---------------------------------------------------

    /// Appends an account to the session's list and re-encrypts
    /// **both** records under the session password — the seed phrase
    /// and account list are never re-encrypted independently, so both
    /// always decrypt under the same password.
    ///
    /// Returns the grown session, which replaces the manager's slot.
    ///
    /// # Errors
    ///
    /// - [`AuthError::VaultLocked`] if no session is live.
    /// - [`AuthError::Crypto`] / [`AuthError::Storage`] on
    ///   re-encryption or write failure (the stored pair remains
    ///   decryptable under the session password either way).
    pub async fn add_account(&self, account: Account) -> AuthResult<Arc<WalletSession>> {
        let _guard = self.op_lock.lock().await;
        let mut slot = self.session.lock().await;
        let current = slot.as_ref().ok_or(AuthError::VaultLocked)?;

        let grown = current.with_account(account);
        let password = Zeroizing::new(grown.password().to_owned());
        let keys = &self.config.keys;

        let seed_plain = Zeroizing::new(grown.mnemonic().as_bytes().to_vec());
        let accounts_plain =
            Zeroizing::new(serde_json::to_vec(grown.accounts()).map_err(|e| CryptoError {
                reason: format!("failed to serialize account list: {e}"),
            })?);

        let seed_blob = encrypt_off_thread(seed_plain, password.clone(), self.config.kdf).await?;
        let accounts_blob = encrypt_off_thread(accounts_plain, password, self.config.kdf).await?;

        self.store
            .set_item(&keys.seed_phrase, &seed_blob.to_json()?)
            .await?;
        self.store
            .set_item(&keys.accounts, &accounts_blob.to_json()?)
            .await?;

        let grown = Arc::new(grown);
        *slot = Some(grown.clone());
        tracing::info!(accounts = grown.accounts().len(), "account added");
        Ok(grown)
    }

    // -- Reset ------------------------------------------------------------

    /// Best-effort total wipe of the vault.
    ///
    /// Removes the seed-phrase record, the account-list record, and
    /// the biometric password cache. Every removal is attempted even
    /// if earlier ones fail; failures are aggregated into the error.
    /// The state transition to `NotSignedUp` and the destruction of
    /// any live session happen **unconditionally** — leaving stale
    /// secrets visible is worse than reporting an incomplete error.
    /// Fires `reset_completed` in all cases. Idempotent.
    ///
    /// Waits for any in-flight unlock to finish before wiping.
    ///
    /// # Errors
    ///
    /// [`ResetError`] listing the removals that failed. The wipe-
    /// complete state holds regardless.
    pub async fn reset(&self) -> Result<(), ResetError> {
        let _guard = self.op_lock.lock().await;
        let keys = &self.config.keys;

        let mut failures = Vec::new();
        for key in [&keys.seed_phrase, &keys.accounts, &keys.password_cache] {
            if let Err(e) = self.store.remove_item(key).await {
                tracing::warn!(%e, key = key.as_str(), "reset: removal failed");
                failures.push(e);
            }
        }

        *self.session.lock().await = None;
        self.state.wiped();
        self.hooks.reset_completed();
        tracing::info!(failures = failures.len(), "vault reset");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ResetError { failures })
        }
    }
}

// ---------------------------------------------------------------------------
// Blocking crypto helpers
// ---------------------------------------------------------------------------

/// Runs the slow KDF + AEAD encrypt on a blocking thread.
async fn encrypt_off_thread(
    plaintext: Zeroizing<Vec<u8>>,
    password: Zeroizing<String>,
    params: Argon2Params,
) -> Result<EncryptedBlob, CryptoError> {
    tokio::task::spawn_blocking(move || encryptor::encrypt(&plaintext, &password, &params))
        .await
        .map_err(|e| CryptoError {
            reason: format!("encryption task failed: {e}"),
        })?
}

/// Runs the slow KDF + AEAD decrypt on a blocking thread.
async fn decrypt_off_thread(
    blob: EncryptedBlob,
    password: Zeroizing<String>,
) -> AuthResult<Zeroizing<Vec<u8>>> {
    tokio::task::spawn_blocking(move || encryptor::decrypt(&blob, &password))
        .await
        .map_err(|e| {
            AuthError::Crypto(CryptoError {
                reason: format!("decryption task failed: {e}"),
            })
        })?
        .map_err(AuthError::from)
}

/// Converts decrypted bytes to a string, treating non-UTF-8 output as
/// a corrupted blob. Both the input and the returned string are
/// zeroized on drop, so no exit path between decryption and session
/// construction leaks an unscrubbed copy.
fn secret_utf8(bytes: Zeroizing<Vec<u8>>) -> AuthResult<Zeroizing<String>> {
    match std::str::from_utf8(&bytes) {
        Ok(s) => Ok(Zeroizing::new(s.to_owned())),
        Err(_) => Err(DecryptionError::Invalid.into()),
    }
}
