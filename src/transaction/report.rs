//! The report of the current user's transactions, optionally limited to a
//! date range.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// axum_extra's Query parses an empty string as None, which is what an
// unfilled date input sends.
use axum_extra::extract::Query;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_account_for_user},
    transaction::{Transaction, core::map_transaction_row},
    user::UserID,
};

/// The state needed to build a transaction report.
#[derive(Debug, Clone)]
pub struct TransactionReportState {
    /// The database connection for reading accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The date range filter of the report.
///
/// The filter only applies when both ends of the range are given.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// The first day to include.
    pub start: Option<Date>,
    /// The last day to include.
    pub end: Option<Date>,
}

impl ReportQuery {
    fn date_range(&self) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// A user's account together with its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReport {
    pub account: Account,
    pub transactions: Vec<Transaction>,
}

/// A route handler that returns the current user's transactions as JSON.
pub async fn get_transaction_report_endpoint(
    State(state): State<TransactionReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_transaction_report(user_id, query.date_range(), &connection) {
        Ok(report) => Json(report).into_response(),
        Err(error) => {
            tracing::error!("could not get the transaction report for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Get the account of `user_id` and its transactions ordered by time.
///
/// When `date_range` is given, only transactions whose local date lies in the
/// range (inclusive) are returned.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the user has no account, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_transaction_report(
    user_id: UserID,
    date_range: Option<DateRange>,
    connection: &Connection,
) -> Result<TransactionReport, Error> {
    let account = get_account_for_user(user_id, connection)?;

    // Timestamps are stored as "YYYY-MM-DD HH:MM:SS+HH:MM" in the local
    // offset, so the first ten characters are the local date. SQLite's
    // `date()` would convert to UTC first.
    let transactions = match date_range {
        Some(DateRange { start, end }) => connection
            .prepare(
                "SELECT id, account_id, amount, balance_after_transaction, transaction_type, timestamp \
                FROM \"transaction\" \
                WHERE account_id = ?1 AND substr(timestamp, 1, 10) BETWEEN ?2 AND ?3 \
                ORDER BY timestamp ASC, id ASC",
            )?
            .query_map(
                (account.id, start.to_string(), end.to_string()),
                map_transaction_row,
            )?
            .collect::<Result<Vec<_>, _>>()?,
        None => connection
            .prepare(
                "SELECT id, account_id, amount, balance_after_transaction, transaction_type, timestamp \
                FROM \"transaction\" \
                WHERE account_id = ?1 \
                ORDER BY timestamp ASC, id ASC",
            )?
            .query_map((account.id,), map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(TransactionReport {
        account,
        transactions,
    })
}
