use axum::{body::Body, response::Response};
use scraper::{ElementRef, Html, Selector};

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not get response body");
    let text = String::from_utf8_lossy(&body).to_string();

    Html::parse_fragment(&text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

#[track_caller]
pub(crate) fn must_get_alert(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("[role=alert]").unwrap())
        .next()
        .expect("No alert found")
}

/// Get the headline of the alert in `html`, e.g. "Insufficient balance.".
#[track_caller]
pub(crate) fn must_get_alert_message(html: &Html) -> String {
    must_get_alert(html)
        .select(&Selector::parse("p.alert-message").unwrap())
        .next()
        .expect("No alert message found")
        .text()
        .collect::<String>()
}
