//! The ledger of balance-affecting events.
//!
//! This module contains:
//! - The `Transaction` model and the `NewTransaction` record written by each balance operation
//! - Database functions for storing and querying transactions
//! - The JSON report of the current user's transactions

mod core;
mod report;

pub use core::{
    NewTransaction, Transaction, TransactionType, create_transaction, create_transaction_table,
};
pub use report::get_transaction_report_endpoint;

#[cfg(test)]
pub use core::{count_transactions, get_transactions_for_account};
