//! The API endpoints URIs.

/// The page listing the current user's transactions. Balance operations
/// redirect here on success.
pub const TRANSACTION_REPORT: &str = "/transactions/report";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for depositing money into the current user's account.
pub const DEPOSIT_API: &str = "/api/deposit";
/// The route for withdrawing money from the current user's account.
pub const WITHDRAW_API: &str = "/api/withdraw";
/// The route for transferring money to another user's account.
pub const TRANSFER_API: &str = "/api/transfer";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_REPORT);

        assert_endpoint_is_valid_uri(endpoints::COFFEE);
        assert_endpoint_is_valid_uri(endpoints::DEPOSIT_API);
        assert_endpoint_is_valid_uri(endpoints::WITHDRAW_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSFER_API);
    }
}
