//! Withdrawing money from the current user's account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::Form;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, get_account_for_user, update_balance},
    alert::Alert,
    config::FundsPolicy,
    endpoints,
    money::{Amount, format_currency},
    timezone::now_in,
    transaction::{NewTransaction, TransactionType, create_transaction},
    user::UserID,
};

/// The state needed to withdraw money.
#[derive(Debug, Clone)]
pub struct WithdrawState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Whether withdrawals may overdraw an account.
    pub funds_policy: FundsPolicy,
}

impl FromRef<AppState> for WithdrawState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            funds_policy: state.bank_config.funds_policy,
        }
    }
}

/// The form data for a withdrawal.
#[derive(Debug, Deserialize, Serialize)]
pub struct WithdrawForm {
    /// The amount in dollars.
    pub amount: Decimal,
}

/// A route handler for withdrawing money, redirects to the transaction report on success.
pub async fn withdraw_endpoint(
    State(state): State<WithdrawState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<WithdrawForm>,
) -> Response {
    let amount = match Amount::new(form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let Some(now) = now_in(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match withdraw(user_id, amount, now, state.funds_policy, &connection) {
        Ok(account) => {
            tracing::info!(
                "User {user_id} withdrew {} from account {}",
                amount.as_decimal(),
                account.id
            );

            let message = format!(
                "Successfully withdrawn {} from your account",
                format_currency(amount.as_decimal())
            );
            Alert::success(&message, "").into_redirect_response(endpoints::TRANSACTION_REPORT)
        }
        Err(Error::InsufficientFunds { balance, amount }) => {
            tracing::debug!(
                "User {user_id} tried to withdraw {amount} from a balance of {balance}"
            );
            Alert::error_simple("Insufficient balance to withdraw.")
                .into_response(StatusCode::BAD_REQUEST)
        }
        Err(error) => {
            tracing::error!("could not withdraw {} for user {user_id}: {error}", amount.as_decimal());
            error.into_alert_response()
        }
    }
}

/// Subtract `amount` from the account of `user_id` and record a withdrawal.
///
/// With [FundsPolicy::Uniform] the withdrawal is refused when the balance is
/// less than `amount`. With [FundsPolicy::TransferOnly] the balance may go
/// negative.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if the user has no account,
/// - [Error::InsufficientFunds] if the policy checks withdrawals and the
///   balance is too low,
/// - [Error::BalanceOverflow] if the new balance cannot be represented,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn withdraw(
    user_id: UserID,
    amount: Amount,
    now: OffsetDateTime,
    funds_policy: FundsPolicy,
    connection: &Connection,
) -> Result<Account, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let mut account = get_account_for_user(user_id, &transaction)?;

    if funds_policy.checks_withdrawals() && account.balance < amount.as_decimal() {
        return Err(Error::InsufficientFunds {
            balance: account.balance,
            amount: amount.as_decimal(),
        });
    }

    account.balance = account
        .balance
        .checked_sub(amount.as_decimal())
        .ok_or(Error::BalanceOverflow)?;
    update_balance(account.id, account.balance, &transaction)?;

    create_transaction(
        NewTransaction {
            account_id: account.id,
            amount: amount.as_decimal(),
            balance_after_transaction: account.balance,
            transaction_type: TransactionType::Withdrawal,
            timestamp: now,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(account)
}
