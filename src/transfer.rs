//! Transferring money from the current user's account to another user's account.

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
    account::{Account, get_account_by_owner_email, get_account_for_user, update_balance},
    alert::Alert,
    config::TransferLedger,
    endpoints,
    money::{Amount, format_currency},
    timezone::now_in,
    transaction::{NewTransaction, Transaction, TransactionType, create_transaction},
    user::UserID,
};

/// The state needed to transfer money.
#[derive(Debug, Clone)]
pub struct TransferState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Which ledger records a transfer creates.
    pub transfer_ledger: TransferLedger,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            transfer_ledger: state.bank_config.transfer_ledger,
        }
    }
}

/// The form data for a transfer.
#[derive(Debug, Deserialize, Serialize)]
pub struct TransferForm {
    /// The email of the user receiving the money.
    #[serde(alias = "recipient_username")]
    pub recipient_email: String,
    /// The amount in dollars.
    pub amount: Decimal,
}

/// The accounts and ledger records changed by a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// The sender's account after the transfer.
    pub sender: Account,
    /// The recipient's account after the transfer.
    pub recipient: Account,
    /// The transactions recorded for the transfer.
    pub transactions: Vec<Transaction>,
}

/// A route handler for transferring money, redirects to the transaction report on success.
///
/// On failure the response is an error alert without a redirect, so the
/// client stays on the transfer form.
pub async fn transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransferForm>,
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

    match transfer(
        user_id,
        &form.recipient_email,
        amount,
        now,
        state.transfer_ledger,
        &connection,
    ) {
        Ok(receipt) => {
            tracing::info!(
                "User {user_id} transferred {} from account {} to account {}",
                amount.as_decimal(),
                receipt.sender.id,
                receipt.recipient.id
            );

            let message = format!(
                "{} successfully transferred to {}.",
                format_currency(amount.as_decimal()),
                form.recipient_email
            );
            Alert::success(&message, "").into_redirect_response(endpoints::TRANSACTION_REPORT)
        }
        Err(Error::InsufficientFunds { balance, amount }) => {
            tracing::debug!(
                "User {user_id} tried to transfer {amount} from a balance of {balance}"
            );
            Alert::error_simple("Insufficient balance to transfer.")
                .into_response(StatusCode::BAD_REQUEST)
        }
        Err(error @ (Error::RecipientNotFound(_) | Error::SelfTransfer)) => {
            tracing::debug!("User {user_id} gave an invalid recipient: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "could not transfer {} for user {user_id}: {error}",
                amount.as_decimal()
            );
            error.into_alert_response()
        }
    }
}

/// Move `amount` from the account of `sender_id` to the account owned by the
/// user registered with `recipient_email`.
///
/// The checks run in order: the sender's balance must cover `amount`, the
/// recipient must exist, and the recipient must not be the sender. The first
/// failing check aborts the transfer and nothing is changed.
///
/// Which transactions are recorded depends on `ledger`, see [TransferLedger].
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if the sender has no account,
/// - [Error::InsufficientFunds] if the sender's balance is less than `amount`,
/// - [Error::RecipientNotFound] if no account belongs to `recipient_email`,
/// - [Error::SelfTransfer] if the recipient's account is the sender's,
/// - [Error::BalanceOverflow] if either new balance cannot be represented,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn transfer(
    sender_id: UserID,
    recipient_email: &str,
    amount: Amount,
    now: OffsetDateTime,
    ledger: TransferLedger,
    connection: &Connection,
) -> Result<TransferReceipt, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let mut sender = get_account_for_user(sender_id, &transaction)?;

    if sender.balance < amount.as_decimal() {
        return Err(Error::InsufficientFunds {
            balance: sender.balance,
            amount: amount.as_decimal(),
        });
    }

    let mut recipient = get_account_by_owner_email(recipient_email, &transaction)?;

    if recipient.id == sender.id {
        return Err(Error::SelfTransfer);
    }

    sender.balance = sender
        .balance
        .checked_sub(amount.as_decimal())
        .ok_or(Error::BalanceOverflow)?;
    recipient.balance = recipient
        .balance
        .checked_add(amount.as_decimal())
        .ok_or(Error::BalanceOverflow)?;
    update_balance(sender.id, sender.balance, &transaction)?;
    update_balance(recipient.id, recipient.balance, &transaction)?;

    let records = match ledger {
        TransferLedger::RecipientOnly => vec![NewTransaction {
            account_id: recipient.id,
            amount: amount.as_decimal(),
            balance_after_transaction: sender.balance,
            transaction_type: TransactionType::Withdrawal,
            timestamp: now,
        }],
        TransferLedger::DoubleEntry => vec![
            NewTransaction {
                account_id: sender.id,
                amount: amount.as_decimal(),
                balance_after_transaction: sender.balance,
                transaction_type: TransactionType::Withdrawal,
                timestamp: now,
            },
            NewTransaction {
                account_id: recipient.id,
                amount: amount.as_decimal(),
                balance_after_transaction: recipient.balance,
                transaction_type: TransactionType::Deposit,
                timestamp: now,
            },
        ],
    };

    let transactions = records
        .into_iter()
        .map(|record| create_transaction(record, &transaction))
        .collect::<Result<Vec<_>, _>>()?;

    transaction.commit()?;

    Ok(TransferReceipt {
        sender,
        recipient,
        transactions,
    })
}
