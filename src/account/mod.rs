//! Bank accounts, their account types, and the queries the balance operations
//! run against them.

mod core;

pub use core::{
    Account, AccountId, AccountType, create_account, create_account_table,
    create_account_type, create_account_type_table, get_account_by_owner_email,
    get_account_for_user, update_balance, update_deposit_fields,
};
