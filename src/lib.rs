//! Banking is a web app for moving money in and out of a customer's bank account.
//!
//! This library provides the endpoints for depositing, withdrawing and
//! transferring money, and a JSON report of an account's transactions.
//! Endpoints are designed to be called by an HTMX front end: success responses
//! redirect with the `HX-Redirect` header and failures are rendered as alert
//! fragments.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod calendar;
mod config;
mod db;
mod deposit;
mod endpoints;
mod identity;
mod logging;
mod money;
mod routing;
mod timezone;
mod transaction;
mod transfer;
mod user;
mod withdraw;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountType, create_account, create_account_type};
pub use app_state::AppState;
pub use config::{BankConfig, FundsPolicy, TransferLedger};
pub use db::initialize as initialize_db;
pub use deposit::deposit;
pub use identity::FORWARDED_EMAIL_HEADER;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Amount;
pub use routing::build_router;
pub use transaction::{Transaction, TransactionType};
pub use transfer::{TransferReceipt, transfer};
pub use user::{User, UserID, create_user, get_user_by_email};
pub use withdraw::withdraw;

use crate::alert::Alert;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An amount of money that is zero or negative was given for an operation
    /// that moves money.
    #[error("{0} is not a positive amount")]
    InvalidAmount(Decimal),

    /// The account does not hold enough money for the requested operation.
    #[error("insufficient balance: tried to take {amount} from a balance of {balance}")]
    InsufficientFunds {
        /// The balance of the account before the operation.
        balance: Decimal,
        /// The amount the operation tried to take.
        amount: Decimal,
    },

    /// No account belongs to a user with the given email.
    #[error("no account belongs to the email \"{0}\"")]
    RecipientNotFound(String),

    /// The sender and the recipient of a transfer are the same account.
    #[error("cannot transfer money to the sending account")]
    SelfTransfer,

    /// Applying the amount would take a balance outside the range a
    /// [Decimal] can hold.
    #[error("the resulting balance is out of range")]
    BalanceOverflow,

    /// The acting user does not have an account.
    #[error("the user does not have a bank account")]
    AccountNotFound,

    /// No user is registered with the given email.
    #[error("no user is registered with the email \"{0}\"")]
    UnknownUser(String),

    /// An account type was configured to calculate interest zero (or fewer)
    /// times per year, so the first interest date cannot be computed.
    #[error("interest cannot be calculated {0} times per year")]
    InvalidInterestFrequency(i64),

    /// Adding months to a date went past the range supported by `time`.
    #[error("the interest start date is out of range")]
    DateOutOfRange,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_alert_response()
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidAmount(amount) => Alert::error(
                "Invalid amount",
                &format!("{amount} is not a valid amount. Enter an amount greater than zero."),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::InsufficientFunds { .. } => {
                Alert::error_simple("Insufficient balance.").into_response(StatusCode::BAD_REQUEST)
            }
            Error::RecipientNotFound(_) => Alert::error_simple("Recipient account not found.")
                .into_response(StatusCode::NOT_FOUND),
            Error::SelfTransfer => Alert::error(
                "Invalid recipient",
                "You cannot transfer money to your own account.",
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::BalanceOverflow => Alert::error(
                "Amount too large",
                "The resulting balance would be out of range. Enter a smaller amount.",
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::AccountNotFound => Alert::error(
                "Account not found",
                "You do not have a bank account yet. Open an account and try again.",
            )
            .into_response(StatusCode::NOT_FOUND),
            Error::UnknownUser(_) => Alert::error(
                "Not signed in",
                "Your identity could not be verified. Sign in and try again.",
            )
            .into_response(StatusCode::UNAUTHORIZED),
            Error::InvalidTimezoneError(timezone) => Alert::error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            )
            .into_response(StatusCode::INTERNAL_SERVER_ERROR),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
