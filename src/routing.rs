//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState,
    alert::Alert,
    deposit::deposit_endpoint,
    endpoints,
    identity::user_guard,
    transaction::get_transaction_report_endpoint,
    transfer::transfer_endpoint,
    withdraw::withdraw_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::COFFEE, get(get_coffee));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTION_REPORT,
            get(get_transaction_report_endpoint),
        )
        .route(endpoints::DEPOSIT_API, post(deposit_endpoint))
        .route(endpoints::WITHDRAW_API, post(withdraw_endpoint))
        .route(endpoints::TRANSFER_API, post(transfer_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), user_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

async fn get_404_not_found() -> Response {
    Alert::error(
        "Page not found",
        "The page you are looking for does not exist.",
    )
    .into_response(StatusCode::NOT_FOUND)
}
