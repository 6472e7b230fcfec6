//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Form fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 5] = [
    "password",
    "confirm_password",
    "old_password",
    "new_password",
    "otp_token",
];

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged in full at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = match extract_header_and_body_text_from_request(request).await {
        Ok(parts) => parts,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let is_form = headers
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if headers.method == Method::POST && is_form {
        log_request(&headers, &redact_form(&body_text));
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, Body::from(body_text));
    let response = next.run(request).await;

    let (headers, body_text) = match extract_header_and_body_text_from_response(response).await {
        Ok(parts) => parts,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&headers, &body_text);

    Response::from_parts(headers, Body::from(body_text))
}

/// Replace the value of `field_name` in a URL encoded form with asterisks.
fn redact_form(form_text: &str) -> String {
    REDACTED_FIELDS
        .iter()
        .fold(form_text.to_owned(), |text, field| redact_field(&text, field))
}

fn redact_field(form_text: &str, field_name: &str) -> String {
    let prefix = format!("{field_name}=");

    form_text
        .split('&')
        .map(|pair| {
            if pair.starts_with(&prefix) {
                format!("{prefix}********")
            } else {
                pair.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> Result<(axum::http::request::Parts, String), axum::Error> {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((headers, String::from_utf8_lossy(&body_bytes).to_string()))
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> Result<(axum::http::response::Parts, String), axum::Error> {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((headers, String::from_utf8_lossy(&body_bytes).to_string()))
}

/// The first [LOG_BODY_LENGTH_LIMIT] bytes of `body`, cut on a character boundary.
fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            headers.method,
            headers.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            headers.method,
            headers.uri
        );
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            headers.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", headers.status);
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_field, redact_form, truncate};

    #[test]
    fn redacts_only_the_named_field() {
        let form = "email=a%40example.com&password=hunter2&confirm_password=hunter2";

        let redacted = redact_field(form, "password");

        assert_eq!(
            redacted,
            "email=a%40example.com&password=********&confirm_password=hunter2"
        );
    }

    #[test]
    fn log_in_form_hides_password_and_one_time_code() {
        let form = "email=a%40example.com&password=hunter2&otp_token=123456&remember_me=on";

        assert_eq!(
            redact_form(form),
            "email=a%40example.com&password=********&otp_token=********&remember_me=on"
        );
    }

    #[test]
    fn leaves_form_without_field_unchanged() {
        let form = "amount=10&card_id=1";

        assert_eq!(redact_field(form, "password"), form);
    }

    #[test]
    fn truncates_on_character_boundary() {
        let body = "д".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(body.starts_with(truncated));
    }

    #[tokio::test]
    async fn body_passes_through_middleware() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app);

        let response = server.post("/echo").text("hello").await;

        response.assert_status_ok();
        response.assert_text("hello");
    }
}
