use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    money::{get_decimal, to_sql_text},
    user::UserID,
};

pub type AccountId = i64;
pub type AccountTypeId = i64;

/// A kind of bank account, e.g. "Savings".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountType {
    /// The id for the account type.
    pub id: AccountTypeId,
    /// The display name of the account type.
    pub name: String,
    /// How many times per year interest is calculated for accounts of this
    /// type, e.g. 12 for monthly or 4 for quarterly.
    pub interest_calculation_per_year: i64,
}

/// A customer's bank account.
///
/// Each user owns at most one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The kind of account, which decides how often interest is calculated.
    pub account_type: AccountType,
    /// The amount of money in the account.
    pub balance: Decimal,
    /// When the first deposit was made, or `None` if nothing has been
    /// deposited yet.
    #[serde(with = "time::serde::rfc3339::option")]
    pub initial_deposit_date: Option<OffsetDateTime>,
    /// When interest starts accruing. Set on the first deposit.
    #[serde(with = "time::serde::rfc3339::option")]
    pub interest_start_date: Option<OffsetDateTime>,
}

pub fn create_account_type_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            interest_calculation_per_year INTEGER NOT NULL
                CHECK (interest_calculation_per_year > 0)
        )",
        (),
    )?;

    Ok(())
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL UNIQUE,
            account_type_id INTEGER NOT NULL,
            balance TEXT NOT NULL,
            initial_deposit_date TEXT,
            interest_start_date TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_type_id) REFERENCES account_type(id) ON UPDATE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a new account type.
///
/// # Errors
/// Returns [Error::SqlError] if the name is already taken or
/// `interest_calculation_per_year` is not positive.
pub fn create_account_type(
    name: &str,
    interest_calculation_per_year: i64,
    connection: &Connection,
) -> Result<AccountType, Error> {
    connection.execute(
        "INSERT INTO account_type (name, interest_calculation_per_year) VALUES (?1, ?2)",
        (name, interest_calculation_per_year),
    )?;

    Ok(AccountType {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        interest_calculation_per_year,
    })
}

/// Open an account with a zero balance for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the user already has an account, or if
/// `user_id` or `account_type` do not exist.
pub fn create_account(
    user_id: UserID,
    account_type: &AccountType,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account (user_id, account_type_id, balance) VALUES (?1, ?2, ?3)",
        (
            user_id.as_i64(),
            account_type.id,
            to_sql_text(Decimal::ZERO),
        ),
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id,
        account_type: account_type.clone(),
        balance: Decimal::ZERO,
        initial_deposit_date: None,
        interest_start_date: None,
    })
}

const SELECT_ACCOUNT: &str = "SELECT account.id, account.user_id, account.balance, \
    account.initial_deposit_date, account.interest_start_date, \
    account_type.id, account_type.name, account_type.interest_calculation_per_year \
    FROM account \
    INNER JOIN account_type ON account.account_type_id = account_type.id";

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        balance: get_decimal(row, 2)?,
        initial_deposit_date: row.get(3)?,
        interest_start_date: row.get(4)?,
        account_type: AccountType {
            id: row.get(5)?,
            name: row.get(6)?,
            interest_calculation_per_year: row.get(7)?,
        },
    })
}

/// Get the account owned by `user_id`.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the user does not have an account, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_account_for_user(user_id: UserID, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE account.user_id = ?1"))?
        .query_row((user_id.as_i64(),), map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
            error => error.into(),
        })
}

/// Get the account owned by the user registered with `email`.
///
/// # Errors
/// Returns [Error::RecipientNotFound] if no such user has an account, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_account_by_owner_email(email: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} INNER JOIN user ON account.user_id = user.id WHERE user.email = ?1"
        ))?
        .query_row((email,), map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::RecipientNotFound(email.to_owned()),
            error => error.into(),
        })
}

/// Overwrite the balance of the account `id`.
///
/// This is a plain write: callers that read the balance first must hold a
/// write transaction across the read and the write, or concurrent updates
/// will be lost.
///
/// # Errors
/// Returns [Error::AccountNotFound] if no account has the ID `id`.
pub fn update_balance(id: AccountId, balance: Decimal, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (to_sql_text(balance), id),
    )?;

    if rows_affected == 0 {
        return Err(Error::AccountNotFound);
    }

    Ok(())
}

/// Save the fields a deposit changes: the balance and the two interest
/// bookkeeping dates.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the account is not in the database.
pub fn update_deposit_fields(account: &Account, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account
        SET initial_deposit_date = ?1, balance = ?2, interest_start_date = ?3
        WHERE id = ?4",
        (
            account.initial_deposit_date,
            to_sql_text(account.balance),
            account.interest_start_date,
            account.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::AccountNotFound);
    }

    Ok(())
}



#[cfg(test)]
mod get_account_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        test_utils::{create_test_customer, get_test_connection},
        user::UserID,
    };

    use super::{get_account_by_owner_email, get_account_for_user, update_balance};

    #[test]
    fn new_account_has_zero_balance_and_no_dates() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", Decimal::ZERO, &connection);

        let account = get_account_for_user(user.id, &connection).unwrap();

        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.initial_deposit_date, None);
        assert_eq!(account.interest_start_date, None);
        assert_eq!(account.account_type.interest_calculation_per_year, 12);
    }

    #[test]
    fn user_without_account_is_an_error() {
        let connection = get_test_connection();

        let result = get_account_for_user(UserID::new(42), &connection);

        assert_eq!(result, Err(Error::AccountNotFound));
    }

    #[test]
    fn finds_account_by_owner_email() {
        let connection = get_test_connection();
        create_test_customer("alice@example.com", dec!(10), &connection);
        let (_, want) = create_test_customer("bob@example.com", dec!(20), &connection);

        let got = get_account_by_owner_email("bob@example.com", &connection);

        assert_eq!(got, Ok(want));
    }

    #[test]
    fn unknown_owner_email_is_recipient_not_found() {
        let connection = get_test_connection();
        create_test_customer("alice@example.com", dec!(10), &connection);

        let got = get_account_by_owner_email("mallory@example.com", &connection);

        assert_eq!(
            got,
            Err(Error::RecipientNotFound("mallory@example.com".to_owned()))
        );
    }

    #[test]
    fn update_balance_on_missing_account_fails() {
        let connection = get_test_connection();

        assert_eq!(
            update_balance(999, dec!(1), &connection),
            Err(Error::AccountNotFound)
        );
    }

    // Reading the balance and writing it back outside of a write transaction
    // is the race the balance operations guard against: the second write is
    // based on a stale read and silently discards the first.
    #[test]
    fn unserialized_read_modify_write_loses_an_update() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", dec!(500), &connection);

        let first_read = get_account_for_user(user.id, &connection).unwrap();
        let second_read = get_account_for_user(user.id, &connection).unwrap();

        update_balance(first_read.id, first_read.balance - dec!(100), &connection).unwrap();
        update_balance(second_read.id, second_read.balance - dec!(50), &connection).unwrap();

        let account = get_account_for_user(user.id, &connection).unwrap();
        assert_eq!(account.balance, dec!(450), "the first withdrawal should be lost");
    }
}
