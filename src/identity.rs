//! Middleware that identifies the user making a request.
//!
//! Authentication happens in front of this service: a reverse proxy signs the
//! user in and forwards their email in the [FORWARDED_EMAIL_HEADER] header.
//! The service must only be reachable through that proxy.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert, user::get_user_by_email};

/// The request header holding the authenticated user's email.
pub const FORWARDED_EMAIL_HEADER: &str = "x-forwarded-email";

/// The state needed for the identity middleware.
#[derive(Debug, Clone)]
pub struct IdentityState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that resolves the forwarded email to a user.
///
/// The user ID is placed into the request and the request executed normally
/// if the user is registered, otherwise a 401 alert is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn user_guard(
    State(state): State<IdentityState>,
    mut request: Request,
    next: Next,
) -> Response {
    let email = match request
        .headers()
        .get(FORWARDED_EMAIL_HEADER)
        .map(|value| value.to_str())
    {
        Some(Ok(email)) if !email.is_empty() => email.to_owned(),
        Some(Err(error)) => {
            tracing::warn!("{FORWARDED_EMAIL_HEADER} header is not valid text: {error}");
            return get_unauthorized_response();
        }
        _ => {
            tracing::warn!(
                "Request to {} is missing the {FORWARDED_EMAIL_HEADER} header",
                request.uri().path()
            );
            return get_unauthorized_response();
        }
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        get_user_by_email(&email, &connection)
    };

    match user {
        Ok(user) => {
            request.extensions_mut().insert(user.id);
            next.run(request).await
        }
        Err(error) => {
            tracing::warn!("Could not identify user: {error}");
            error.into_alert_response()
        }
    }
}

fn get_unauthorized_response() -> Response {
    Alert::error(
        "Not signed in",
        "Your identity could not be verified. Sign in and try again.",
    )
    .into_response(StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod user_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        http::{HeaderName, HeaderValue, StatusCode},
        middleware,
        routing::get,
    };
    use axum_test::TestServer;

    use crate::{
        test_utils::get_test_connection,
        user::{UserID, create_user},
    };

    use super::{FORWARDED_EMAIL_HEADER, IdentityState, user_guard};

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    fn get_test_server() -> (TestServer, UserID) {
        let connection = get_test_connection();
        let user = create_user("alice@example.com", &connection).unwrap();
        let state = IdentityState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), user_guard))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            user.id,
        )
    }

    fn email_header(email: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(FORWARDED_EMAIL_HEADER),
            HeaderValue::from_static(email),
        )
    }

    #[tokio::test]
    async fn known_email_sets_user_id() {
        let (server, user_id) = get_test_server();
        let (name, value) = email_header("alice@example.com");

        let response = server.get(TEST_PROTECTED_ROUTE).add_header(name, value).await;

        response.assert_status_ok();
        assert_eq!(response.text(), user_id.to_string());
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (server, _) = get_test_server();

        server
            .get(TEST_PROTECTED_ROUTE)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_header_is_unauthorized() {
        let (server, _) = get_test_server();
        let (name, value) = email_header("");

        server
            .get(TEST_PROTECTED_ROUTE)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let (server, _) = get_test_server();
        let (name, value) = email_header("mallory@example.com");

        server
            .get(TEST_PROTECTED_ROUTE)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
