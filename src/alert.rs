//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments that the front end swaps into its
//! `#alert-container`, so they double as the user-facing notification for
//! every balance operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertType {
    Success,
    Error,
}

/// A message to show the user after an operation.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub alert_type: AlertType,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    /// Create a new error alert without details
    pub fn error_simple(message: &'a str) -> Self {
        Self::error(message, "")
    }

    pub fn into_html(self) -> Markup {
        let (container_style, data_type) = match self.alert_type {
            AlertType::Success => (
                "p-4 mb-4 text-sm rounded-lg text-green-800 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400",
                "success",
            ),
            AlertType::Error => (
                "p-4 mb-4 text-sm rounded-lg text-red-800 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400",
                "error",
            ),
        };

        html! {
            div
                id="alert"
                role="alert"
                data-alert-type=(data_type)
                class=(container_style)
                hx-swap-oob="true"
            {
                p class="alert-message font-medium" { (self.message) }

                @if !self.details.is_empty() {
                    p class="alert-details" { (self.details) }
                }
            }
        }
    }

    /// Render the alert as the body of a response with `status_code`.
    pub fn into_response(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }

    /// Render the alert and tell HTMX to navigate to `endpoint`.
    pub fn into_redirect_response(self, endpoint: &str) -> Response {
        (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoint.to_owned()),
            self.into_html(),
        )
            .into_response()
    }
}
