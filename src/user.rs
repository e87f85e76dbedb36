//! Code for creating the user table and fetching users from the database.
//!
//! Users are registered outside of this application. The table only holds
//! what the balance operations need: an ID to own an account and an email
//! to address transfers to.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A customer of the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, used as the recipient identifier for transfers.
    pub email: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred, e.g. the
/// email is already registered.
pub fn create_user(email: &str, connection: &Connection) -> Result<User, Error> {
    connection.execute("INSERT INTO user (email) VALUES (?1)", (email,))?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
    })
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - no user is registered with `email` ([Error::UnknownUser]),
/// - there was an error trying to access the database.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], |row| {
            Ok(User {
                id: UserID::new(row.get(0)?),
                email: row.get(1)?,
            })
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UnknownUser(email.to_owned()),
            error => error.into(),
        })
}
