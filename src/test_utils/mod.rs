#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use fixtures::{create_test_customer, get_test_connection};
pub(crate) use html::{assert_valid_html, must_get_alert_message, parse_html_fragment};
pub(crate) use http::{assert_hx_redirect, parse_json};
