//! The page to display when a customer opens a staff-only page.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct Forbidden;

impl IntoResponse for Forbidden {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Html(
                error_view(
                    "Forbidden",
                    "403",
                    "Staff only.",
                    "This page is only available to bank staff.",
                )
                .into_string(),
            ),
        )
            .into_response()
    }
}
