//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::{create_account_table, create_account_type_table},
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all of the application's tables if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// Returns [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so must be set first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_type_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
