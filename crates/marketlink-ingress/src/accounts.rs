//! Account numbers and sequences: same-chain replay protection.
//!
//! Every account has a fixed account number (assigned on its first
//! authenticated transaction) and a sequence that must equal the signed
//! `sequence` of its next transaction.
//! A successfully authenticated transaction bumps the sequence, so replaying
//! the same signed bytes fails with [`MarketError::SequenceMismatch`].

use std::collections::HashMap;

use marketlink_types::{AccAddress, MarketError, Result};

/// Per-account replay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub account_number: u64,
    /// Sequence the next transaction must carry.
    pub sequence: u64,
}

/// In-memory account table.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: HashMap<AccAddress, AccountState>,
    next_account_number: u64,
}

impl AccountRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the account, creating it with the next account number if it
    /// has never been seen.
    pub fn register(&mut self, address: &AccAddress) -> AccountState {
        if let Some(state) = self.accounts.get(address) {
            return *state;
        }
        let state = AccountState {
            account_number: self.next_account_number,
            sequence: 0,
        };
        self.next_account_number += 1;
        self.accounts.insert(address.clone(), state);
        state
    }

    #[must_use]
    pub fn account(&self, address: &AccAddress) -> Option<AccountState> {
        self.accounts.get(address).copied()
    }

    /// The state a transaction from `address` must match. An unknown
    /// account is expected at the next free account number and sequence 0;
    /// nothing is recorded.
    #[must_use]
    pub fn expected(&self, address: &AccAddress) -> AccountState {
        self.account(address).unwrap_or(AccountState {
            account_number: self.next_account_number,
            sequence: 0,
        })
    }

    /// Check a transaction's account number and sequence against the table.
    /// Read-only.
    ///
    /// # Errors
    /// - `AccountNumberMismatch` if the account number differs
    /// - `SequenceMismatch` if the sequence is not the expected next one
    pub fn check(&self, address: &AccAddress, account_number: u64, sequence: u64) -> Result<()> {
        let state = self.expected(address);
        if state.account_number != account_number {
            return Err(MarketError::AccountNumberMismatch {
                expected: state.account_number,
                actual: account_number,
            });
        }
        if state.sequence != sequence {
            return Err(MarketError::SequenceMismatch {
                expected: state.sequence,
                actual: sequence,
            });
        }
        Ok(())
    }

    /// Consume the current sequence.
    pub fn increment_sequence(&mut self, address: &AccAddress) {
        if let Some(state) = self.accounts.get_mut(address) {
            state.sequence += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
