//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    account::AccountId,
    money::{get_decimal, to_sql_text},
};

pub type TransactionId = i64;

/// The kind of event a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money was paid into the account.
    Deposit,
    /// Money was taken out of the account.
    Withdrawal,
    /// Interest was paid into the account.
    ///
    /// The balance operations never write this type. It is kept so ledgers
    /// that already hold interest rows can still be read and reported.
    Interest,
}

impl TransactionType {
    fn as_i64(self) -> i64 {
        match self {
            TransactionType::Deposit => 1,
            TransactionType::Withdrawal => 2,
            TransactionType::Interest => 3,
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            1 => Ok(TransactionType::Deposit),
            2 => Ok(TransactionType::Withdrawal),
            3 => Ok(TransactionType::Interest),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

/// An immutable record of an event that changed an account's balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the transaction is recorded against.
    pub account_id: AccountId,
    /// The amount of money moved.
    pub amount: Decimal,
    /// The balance recorded alongside the transaction.
    pub balance_after_transaction: Decimal,
    /// What kind of event this was.
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// The data for a transaction that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub balance_after_transaction: Decimal,
    pub transaction_type: TransactionType,
    pub timestamp: OffsetDateTime,
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            balance_after_transaction TEXT NOT NULL,
            transaction_type INTEGER NOT NULL CHECK (transaction_type IN (1, 2, 3)),
            timestamp TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    // Reports filter by account and order by time.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_timestamp
        ON \"transaction\"(account_id, timestamp)",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: get_decimal(row, 2)?,
        balance_after_transaction: get_decimal(row, 3)?,
        transaction_type: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

/// Save a transaction to the ledger.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if `account_id` does not refer to an account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (account_id, amount, balance_after_transaction, transaction_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, account_id, amount, balance_after_transaction, transaction_type, timestamp",
        )?
        .query_row(
            (
                new_transaction.account_id,
                to_sql_text(new_transaction.amount),
                to_sql_text(new_transaction.balance_after_transaction),
                new_transaction.transaction_type,
                new_transaction.timestamp,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::AccountNotFound,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Get every transaction recorded against `account_id`, oldest first.
#[cfg(test)]
pub fn get_transactions_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, amount, balance_after_transaction, transaction_type, timestamp
            FROM \"transaction\" WHERE account_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?
        .query_map((account_id,), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of transactions in the database.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| row.get(0))
        .map_err(|error| error.into())
}
