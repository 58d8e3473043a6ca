//! The in-memory wallet session.
//!
//! A [`WalletSession`] holds the decrypted mnemonic, the account list,
//! and the password that produced them, for exactly as long as the
//! vault is unlocked. It is never persisted and is zeroized on drop.

use snowcap_types::Account;
use zeroize::{Zeroize, Zeroizing};

// ---------------------------------------------------------------------------
// WalletSession
// ---------------------------------------------------------------------------

/// Decrypted wallet material, live only while the vault is `Unlocked`.
///
/// Owned by the vault manager's single session slot; the manager drops
/// its reference on lock or reset and the backing memory is scrubbed
/// when the last reference goes away. Deliberately implements neither
/// `Clone` nor `Debug`.
pub struct WalletSession {
    /// The decrypted seed phrase.
    mnemonic: Zeroizing<String>,
    /// Ordered account list; index maps to derivation path.
    accounts: Vec<Account>,
    /// The password this session was opened with. Needed to re-encrypt
    /// both records together when the account list grows.
    password: Zeroizing<String>,
}

impl WalletSession {
    /// Assembles a session from freshly decrypted material. The secret
    /// strings stay wrapped from decryption to here, so no exit path
    /// between the two can drop an unscrubbed copy.
    pub(crate) fn new(
        mnemonic: Zeroizing<String>,
        accounts: Vec<Account>,
        password: Zeroizing<String>,
    ) -> Self {
        Self {
            mnemonic,
            accounts,
            password,
        }
    }

    /// The decrypted seed phrase.
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// The ordered account list.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// The password the session was opened with.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// A copy of the session with `account` appended.
    pub(crate) fn with_account(&self, account: Account) -> Self {
        let mut accounts = self.accounts.clone();
        accounts.push(account);
        Self {
            mnemonic: self.mnemonic.clone(),
            accounts,
            password: self.password.clone(),
        }
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        // The mnemonic and password scrub themselves; the addresses
        // need a hand.
        for account in &mut self.accounts {
            account.address.zeroize();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_expose_material() {
        let session = WalletSession::new(
            Zeroizing::new("abandon ability able".into()),
            vec![Account::new("0xAAA"), Account::new("0xBBB")],
            Zeroizing::new("pass123".into()),
        );
        assert_eq!(session.mnemonic(), "abandon ability able");
        assert_eq!(session.accounts().len(), 2);
        assert_eq!(session.accounts()[0].address, "0xAAA");
        assert_eq!(session.password(), "pass123");
    }

    #[test]
    fn with_account_appends_in_order() {
        let session = WalletSession::new(
            Zeroizing::new("mnemonic".into()),
            vec![Account::new("0xAAA")],
            Zeroizing::new("pw".into()),
        );
        let grown = session.with_account(Account::new("0xBBB"));
        assert_eq!(grown.accounts().len(), 2);
        assert_eq!(grown.accounts()[1].address, "0xBBB");
        // Original untouched.
        assert_eq!(session.accounts().len(), 1);
    }
}
