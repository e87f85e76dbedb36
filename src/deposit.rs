//! Depositing money into the current user's account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use axum_extra::extract::Form;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, get_account_for_user, update_deposit_fields},
    alert::Alert,
    calendar::add_months,
    endpoints,
    money::{Amount, format_currency},
    timezone::now_in,
    transaction::{NewTransaction, TransactionType, create_transaction},
    user::UserID,
};

/// The state needed to deposit money.
#[derive(Debug, Clone)]
pub struct DepositState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DepositState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for a deposit.
#[derive(Debug, Deserialize, Serialize)]
pub struct DepositForm {
    /// The amount in dollars.
    pub amount: Decimal,
}

/// A route handler for depositing money, redirects to the transaction report on success.
pub async fn deposit_endpoint(
    State(state): State<DepositState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DepositForm>,
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

    match deposit(user_id, amount, now, &connection) {
        Ok(account) => {
            tracing::info!(
                "User {user_id} deposited {} into account {}",
                amount.as_decimal(),
                account.id
            );

            let message = format!(
                "{} was deposited to your account successfully",
                format_currency(amount.as_decimal())
            );
            Alert::success(&message, "").into_redirect_response(endpoints::TRANSACTION_REPORT)
        }
        Err(error) => {
            tracing::error!("could not deposit {} for user {user_id}: {error}", amount.as_decimal());
            error.into_alert_response()
        }
    }
}

/// Add `amount` to the account of `user_id` and record a deposit.
///
/// The first deposit into an account also sets when the account was first
/// funded (`now`) and when interest starts accruing: `12 / n` months later,
/// where `n` is how many times per year the account type calculates interest.
///
/// The read, the update and the ledger record happen in one write
/// transaction, so concurrent operations on the account cannot interleave.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if the user has no account,
/// - [Error::InvalidInterestFrequency] if the account type calculates interest
///   zero times per year,
/// - [Error::DateOutOfRange] if the interest start date cannot be represented,
/// - [Error::BalanceOverflow] if the new balance cannot be represented,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn deposit(
    user_id: UserID,
    amount: Amount,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Account, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let mut account = get_account_for_user(user_id, &transaction)?;

    if account.initial_deposit_date.is_none() {
        let per_year = account.account_type.interest_calculation_per_year;
        let next_interest_month = match per_year {
            n if n > 0 => u32::try_from(12 / n)
                .map_err(|_| Error::InvalidInterestFrequency(per_year))?,
            _ => return Err(Error::InvalidInterestFrequency(per_year)),
        };

        account.initial_deposit_date = Some(now);
        account.interest_start_date =
            Some(add_months(now, next_interest_month).ok_or(Error::DateOutOfRange)?);
    }

    account.balance = account
        .balance
        .checked_add(amount.as_decimal())
        .ok_or(Error::BalanceOverflow)?;
    update_deposit_fields(&account, &transaction)?;

    create_transaction(
        NewTransaction {
            account_id: account.id,
            amount: amount.as_decimal(),
            balance_after_transaction: account.balance,
            transaction_type: TransactionType::Deposit,
            timestamp: now,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(account)
}

#[cfg(test)]
mod deposit_tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error,
        account::{create_account, get_account_for_user},
        money::Amount,
        test_utils::{create_test_customer, get_test_connection},
        transaction::{TransactionType, count_transactions, get_transactions_for_account},
        user::{UserID, create_user},
    };

    use super::deposit;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).expect("test amounts must be positive")
    }

    #[test]
    fn increases_balance() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", dec!(100.25), &connection);

        let account = deposit(
            user.id,
            amount(dec!(49.75)),
            datetime!(2025-05-01 09:00 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(account.balance, dec!(150));
        assert_eq!(
            get_account_for_user(user.id, &connection).unwrap().balance,
            dec!(150)
        );
    }

    #[test]
    fn first_deposit_sets_interest_dates() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", dec!(0), &connection);
        let now = datetime!(2025-01-31 10:00 +13);

        deposit(user.id, amount(dec!(10)), now, &connection).unwrap();

        let account = get_account_for_user(user.id, &connection).unwrap();
        assert_eq!(account.initial_deposit_date, Some(now));
        // Monthly interest starts one month later, clamped to the end of February.
        assert_eq!(
            account.interest_start_date,
            Some(datetime!(2025-02-28 10:00 +13))
        );
    }

    #[test]
    fn interest_start_uses_account_type_frequency() {
        let connection = get_test_connection();
        let quarterly = crate::account::create_account_type("Term", 4, &connection).unwrap();
        let user = create_user("alice@example.com", &connection).unwrap();
        create_account(user.id, &quarterly, &connection).unwrap();
        let now = datetime!(2025-11-15 12:00 UTC);

        let account = deposit(user.id, amount(dec!(10)), now, &connection).unwrap();

        assert_eq!(
            account.interest_start_date,
            Some(datetime!(2026-02-15 12:00 UTC))
        );
    }

    #[test]
    fn frequency_above_twelve_starts_interest_immediately() {
        let connection = get_test_connection();
        let weekly = crate::account::create_account_type("Weekly", 52, &connection).unwrap();
        let user = create_user("alice@example.com", &connection).unwrap();
        create_account(user.id, &weekly, &connection).unwrap();
        let now = datetime!(2025-11-15 12:00 UTC);

        let account = deposit(user.id, amount(dec!(10)), now, &connection).unwrap();

        assert_eq!(account.interest_start_date, Some(now));
    }

    #[test]
    fn second_deposit_keeps_interest_dates() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", dec!(0), &connection);
        let first = datetime!(2025-01-10 10:00 UTC);

        deposit(user.id, amount(dec!(10)), first, &connection).unwrap();
        let account = deposit(
            user.id,
            amount(dec!(5)),
            datetime!(2025-03-10 10:00 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(account.balance, dec!(15));
        assert_eq!(account.initial_deposit_date, Some(first));
        assert_eq!(
            account.interest_start_date,
            Some(datetime!(2025-02-10 10:00 UTC))
        );
    }

    #[test]
    fn records_deposit_transaction() {
        let connection = get_test_connection();
        let (user, account) = create_test_customer("alice@example.com", dec!(20), &connection);
        let now = datetime!(2025-04-01 08:30 UTC);

        deposit(user.id, amount(dec!(30)), now, &connection).unwrap();

        let transactions = get_transactions_for_account(account.id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].transaction_type, TransactionType::Deposit);
        assert_eq!(transactions[0].amount, dec!(30));
        assert_eq!(transactions[0].balance_after_transaction, dec!(50));
        assert_eq!(transactions[0].timestamp, now);
    }

    #[test]
    fn zero_interest_frequency_is_rejected_without_changes() {
        let connection = get_test_connection();
        connection
            .pragma_update(None, "ignore_check_constraints", true)
            .unwrap();
        let broken = crate::account::create_account_type("Broken", 0, &connection).unwrap();
        connection
            .pragma_update(None, "ignore_check_constraints", false)
            .unwrap();
        let user = create_user("alice@example.com", &connection).unwrap();
        create_account(user.id, &broken, &connection).unwrap();

        let result = deposit(
            user.id,
            amount(dec!(10)),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidInterestFrequency(0)));
        let account = get_account_for_user(user.id, &connection).unwrap();
        assert_eq!(account.balance, dec!(0));
        assert_eq!(account.initial_deposit_date, None);
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[test]
    fn overflowing_balance_is_rejected_without_changes() {
        let connection = get_test_connection();
        let (user, _) = create_test_customer("alice@example.com", dec!(500), &connection);

        let result = deposit(
            user.id,
            amount(rust_decimal::Decimal::MAX),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        );

        assert_eq!(result, Err(Error::BalanceOverflow));
        let account = get_account_for_user(user.id, &connection).unwrap();
        assert_eq!(account.balance, dec!(500));
        assert_eq!(account.initial_deposit_date, None);
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[test]
    fn user_without_account_is_rejected() {
        let connection = get_test_connection();

        let result = deposit(
            UserID::new(123),
            amount(dec!(10)),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        );

        assert_eq!(result, Err(Error::AccountNotFound));
        assert_eq!(count_transactions(&connection), Ok(0));
    }
}
