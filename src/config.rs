//! Policies that decide how strictly balance operations guard an account.

use clap::ValueEnum;

/// Which operations refuse to take more money than an account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FundsPolicy {
    /// Only transfers check the sender's balance. Withdrawals may leave an
    /// account with a negative balance.
    TransferOnly,
    /// Withdrawals and transfers both require `balance >= amount`.
    #[default]
    Uniform,
}

impl FundsPolicy {
    /// Whether a withdrawal must be rejected when the balance is too low.
    pub fn checks_withdrawals(self) -> bool {
        matches!(self, FundsPolicy::Uniform)
    }
}

/// Which transaction records a transfer writes to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransferLedger {
    /// One `WITHDRAWAL` record on the recipient's account that carries the
    /// sender's balance after the transfer.
    ///
    /// Existing ledgers were written this way, so it stays the default.
    #[default]
    RecipientOnly,
    /// A `WITHDRAWAL` on the sender's account and a `DEPOSIT` on the
    /// recipient's account, each with that account's own balance.
    DoubleEntry,
}

/// Settings for the balance operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankConfig {
    /// Which operations check for sufficient funds.
    pub funds_policy: FundsPolicy,
    /// Which ledger records a transfer creates.
    pub transfer_ledger: TransferLedger,
}
