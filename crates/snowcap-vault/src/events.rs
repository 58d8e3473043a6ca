//! Collaborator notifications fired after state transitions.
//!
//! The vault core tells the rest of the application about completed
//! transitions through [`VaultHooks`]. Notifications are one-shot and
//! synchronous, fired at the end of the transition that caused them —
//! any presentation delay (navigation, toasts) is the UI layer's
//! business, never embedded here. The core consumes no return value.
//!
//! Hooks borrow the session rather than receiving copies, so no
//! secret material is cloned out of the manager's session slot.

use crate::session::WalletSession;

// ---------------------------------------------------------------------------
// VaultHooks
// ---------------------------------------------------------------------------

/// One-shot notifications to external collaborators.
///
/// All methods have empty default bodies; implementors override the
/// ones they care about. Implementations must be fast and must not
/// call back into the vault — they run inside the transition.
pub trait VaultHooks: Send + Sync {
    /// A wallet session was opened (successful unlock). The downstream
    /// wallet state can initialize itself from the borrowed session.
    fn wallet_initialized(&self, _session: &WalletSession) {}

    /// The vault was created for the first time (sign-up completed).
    fn auth_initialized(&self) {}

    /// A reset wiped the vault; collaborators should clear their own
    /// dependent state (wallet store, recipients, settings).
    fn reset_completed(&self) {}
}

/// No-op hooks for hosts that do not observe vault transitions.
pub struct NoHooks;

impl VaultHooks for NoHooks {}
