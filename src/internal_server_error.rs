//! The page shown when the server fails to handle a request.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

const DEFAULT_HINT: &str = "Please try again later. If the problem persists, contact the bank.";

/// A 500 page, optionally telling the operator how to fix the problem.
#[derive(Debug, Default)]
pub struct InternalServerError {
    hint: Option<String>,
}

impl InternalServerError {
    pub fn with_hint(hint: impl Into<String>) -> Self {
        Self {
            hint: Some(hint.into()),
        }
    }
}

impl IntoResponse for InternalServerError {
    fn into_response(self) -> Response {
        let hint = self.hint.as_deref().unwrap_or(DEFAULT_HINT);
        let page = error_view("Internal Server Error", "500", "Sorry, something went wrong.", hint);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// Send an HTMX client to the 500 page.
///
/// Plain page loads should render [InternalServerError] directly instead.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        endpoints,
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_document},
    };

    use super::{
        InternalServerError, get_internal_server_error_page, get_internal_server_error_redirect,
    };

    #[tokio::test]
    async fn error_page_is_valid_html() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_valid_html(&parse_html_document(response).await);
    }

    #[tokio::test]
    async fn hint_is_shown_on_page() {
        let response = InternalServerError::with_hint("Check the --timezone option.").into_response();

        let document = parse_html_document(response).await;
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Check the --timezone option."), "got page text {text:?}");
    }

    #[test]
    fn htmx_redirect_points_at_error_page() {
        let response = get_internal_server_error_redirect();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }
}
