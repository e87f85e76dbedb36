use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    account::{Account, AccountType, create_account, create_account_type, update_balance},
    db::initialize,
    user::{User, create_user},
};

/// An in-memory database with all of the application's tables.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// The monthly-interest account type shared by test customers.
pub(crate) fn get_or_create_savings_type(connection: &Connection) -> AccountType {
    let existing = connection.query_row(
        "SELECT id, name, interest_calculation_per_year FROM account_type WHERE name = 'Savings'",
        [],
        |row| {
            Ok(AccountType {
                id: row.get(0)?,
                name: row.get(1)?,
                interest_calculation_per_year: row.get(2)?,
            })
        },
    );

    match existing {
        Ok(account_type) => account_type,
        Err(rusqlite::Error::QueryReturnedNoRows) => create_account_type("Savings", 12, connection)
            .expect("Could not create account type"),
        Err(error) => panic!("Could not query account types: {error}"),
    }
}

/// Register a user with a savings account holding `balance`.
pub(crate) fn create_test_customer(
    email: &str,
    balance: Decimal,
    connection: &Connection,
) -> (User, Account) {
    let account_type = get_or_create_savings_type(connection);
    let user = create_user(email, connection).expect("Could not create test user");
    let mut account =
        create_account(user.id, &account_type, connection).expect("Could not create account");

    update_balance(account.id, balance, connection).expect("Could not set balance");
    account.balance = balance;

    (user, account)
}
