//! Encrypted secret vault and authentication state machine for the
//! Snowcap mobile wallet.
//!
//! This crate is the wallet's security nucleus: it protects the seed
//! phrase and account list at rest under password-derived encryption
//! and governs when that material may be materialized in memory.
//!
//! - [`manager::VaultManager`] — unlock/lock/reset orchestration and
//!   the single in-memory session slot
//! - [`state::AuthStateMachine`] — `NotSignedUp` / `Locked` /
//!   `Unlocked` lifecycle with enforced transitions
//! - [`biometric::BiometricUnlockAdapter`] — biometric-gated cached
//!   password unlock
//! - [`store::SecureStore`] — the platform secure-storage contract
//!   the core consumes but never implements
//!
//! Everything UI-facing (screens, navigation, toasts, on-chain calls)
//! is an external collaborator notified through
//! [`events::VaultHooks`].

pub mod biometric;
pub mod config;
pub mod events;
pub mod manager;
pub mod session;
pub mod state;
pub mod store;

pub use biometric::{BiometricGate, BiometricUnlockAdapter, BiometricVerdict, UnsupportedGate};
pub use config::{StorageKeys, VaultConfig};
pub use events::{NoHooks, VaultHooks};
pub use manager::VaultManager;
pub use session::WalletSession;
pub use state::AuthStateMachine;
pub use store::{FileSecureStore, MemorySecureStore, SecureStore};
