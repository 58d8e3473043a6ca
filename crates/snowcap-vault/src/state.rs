//! Authentication lifecycle state machine.
//!
//! ```text
//! NotSignedUp ──vault_created()──▶ Locked ──session_opened()──▶ Unlocked
//!      ▲                            ▲  ▲                          │
//!      │                            │  └──────session_closed()────┘
//!      └────────── wiped() ◀── (any state)
//! ```
//!
//! - `vault_created` — first successful vault creation (sign-up).
//! - `session_opened` — successful unlock; also legal from `Unlocked`
//!   (re-authentication replaces the session).
//! - `session_closed` — lock; idempotent if already `Locked`.
//! - `wiped` — reset; unconditional, from any state.
//!
//! Illegal transitions fail with a typed error rather than silently
//! no-opping. State is published through a `watch` channel so UI
//! consumers can subscribe to changes.

use snowcap_types::{AuthError, AuthState};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// AuthStateMachine
// ---------------------------------------------------------------------------

/// Tracks the coarse vault lifecycle state and enforces legal
/// transitions.
///
/// Owned by the application's composition root (in practice, by the
/// vault manager) and passed by reference to whatever needs to query
/// or observe it — there is no hidden global.
pub struct AuthStateMachine {
    tx: watch::Sender<AuthState>,
}

impl AuthStateMachine {
    /// Creates a machine in the given initial state.
    ///
    /// The initial state comes from probing storage: `Locked` if the
    /// vault records exist, `NotSignedUp` otherwise. `Unlocked` is
    /// never a valid initial state.
    pub fn new(initial: AuthState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The current state.
    pub fn state(&self) -> AuthState {
        *self.tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// `NotSignedUp -> Locked` on first successful vault creation.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadySignedUp`] from any other state.
    pub fn vault_created(&self) -> Result<(), AuthError> {
        self.transition(|state| match state {
            AuthState::NotSignedUp => Ok(AuthState::Locked),
            AuthState::Locked | AuthState::Unlocked => Err(AuthError::AlreadySignedUp),
        })
    }

    /// `Locked -> Unlocked` via a successful unlock. Also legal from
    /// `Unlocked` (the new session replaces the old one).
    ///
    /// # Errors
    ///
    /// [`AuthError::NotSignedUp`] if no vault exists.
    pub fn session_opened(&self) -> Result<(), AuthError> {
        self.transition(|state| match state {
            AuthState::Locked | AuthState::Unlocked => Ok(AuthState::Unlocked),
            AuthState::NotSignedUp => Err(AuthError::NotSignedUp),
        })
    }

    /// `Unlocked -> Locked` via lock. Idempotent if already `Locked`.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotSignedUp`] if no vault exists.
    pub fn session_closed(&self) -> Result<(), AuthError> {
        self.transition(|state| match state {
            AuthState::Unlocked | AuthState::Locked => Ok(AuthState::Locked),
            AuthState::NotSignedUp => Err(AuthError::NotSignedUp),
        })
    }

    /// Any state `-> NotSignedUp` via reset. Never fails: leaving
    /// stale state visible is worse than rejecting the wipe.
    pub fn wiped(&self) {
        self.tx.send_replace(AuthState::NotSignedUp);
    }

    /// Applies `f` to the current state atomically: the check and the
    /// update happen under the channel's internal lock, so two racing
    /// transitions cannot both observe the same prior state.
    /// Subscribers are woken only when the state actually moves —
    /// rejected and idempotent transitions are silent.
    fn transition(
        &self,
        f: impl FnOnce(AuthState) -> Result<AuthState, AuthError>,
    ) -> Result<(), AuthError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| match f(*state) {
            Ok(next) if next != *state => {
                *state = next;
                true
            }
            Ok(_) => false,
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() -> Result<(), AuthError> {
        let machine = AuthStateMachine::new(AuthState::NotSignedUp);
        assert_eq!(machine.state(), AuthState::NotSignedUp);

        machine.vault_created()?;
        assert_eq!(machine.state(), AuthState::Locked);

        machine.session_opened()?;
        assert_eq!(machine.state(), AuthState::Unlocked);

        machine.session_closed()?;
        assert_eq!(machine.state(), AuthState::Locked);

        machine.wiped();
        assert_eq!(machine.state(), AuthState::NotSignedUp);
        Ok(())
    }

    #[test]
    fn unlock_while_not_signed_up_is_rejected() {
        let machine = AuthStateMachine::new(AuthState::NotSignedUp);
        assert!(matches!(
            machine.session_opened(),
            Err(AuthError::NotSignedUp)
        ));
        assert_eq!(machine.state(), AuthState::NotSignedUp);
    }

    #[test]
    fn lock_while_not_signed_up_is_rejected() {
        let machine = AuthStateMachine::new(AuthState::NotSignedUp);
        assert!(matches!(
            machine.session_closed(),
            Err(AuthError::NotSignedUp)
        ));
    }

    #[test]
    fn lock_is_idempotent_when_locked() -> Result<(), AuthError> {
        let machine = AuthStateMachine::new(AuthState::Locked);
        machine.session_closed()?;
        machine.session_closed()?;
        assert_eq!(machine.state(), AuthState::Locked);
        Ok(())
    }

    #[test]
    fn double_sign_up_is_rejected() {
        let machine = AuthStateMachine::new(AuthState::Locked);
        assert!(matches!(
            machine.vault_created(),
            Err(AuthError::AlreadySignedUp)
        ));
    }

    #[test]
    fn reauthentication_from_unlocked_is_legal() -> Result<(), AuthError> {
        let machine = AuthStateMachine::new(AuthState::Locked);
        machine.session_opened()?;
        machine.session_opened()?;
        assert_eq!(machine.state(), AuthState::Unlocked);
        Ok(())
    }

    #[test]
    fn wipe_from_any_state() {
        for initial in [AuthState::NotSignedUp, AuthState::Locked, AuthState::Unlocked] {
            let machine = AuthStateMachine::new(initial);
            machine.wiped();
            assert_eq!(machine.state(), AuthState::NotSignedUp);
        }
    }

    #[test]
    fn silent_transitions_do_not_wake_subscribers() -> Result<(), AuthError> {
        let machine = AuthStateMachine::new(AuthState::Locked);
        let rx = machine.subscribe();

        // Rejected transition: no wakeup.
        assert!(machine.vault_created().is_err());
        assert!(!rx.has_changed().expect("sender alive"));

        // Idempotent lock while already locked: no wakeup.
        machine.session_closed()?;
        assert!(!rx.has_changed().expect("sender alive"));

        // A real move wakes the subscriber.
        machine.session_opened()?;
        assert!(rx.has_changed().expect("sender alive"));
        Ok(())
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() -> Result<(), AuthError> {
        let machine = AuthStateMachine::new(AuthState::Locked);
        let mut rx = machine.subscribe();

        machine.session_opened()?;
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow(), AuthState::Unlocked);
        Ok(())
    }
}
