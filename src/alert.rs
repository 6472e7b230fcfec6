//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with styling based on its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with no extra details.
    SuccessSimple { message: String },
    /// An error message with details explaining how to fix it.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    pub(crate) fn into_markup(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, message, details),
        };

        html! {
            div
                id="alert"
                role="alert"
                class=(container_style)
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        class="text-lg leading-none"
                        onclick="this.closest('#alert').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 rounded-lg border text-green-800 \
    border-green-300 bg-green-50 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800";

const ERROR_STYLE: &str = "p-4 mb-4 rounded-lg border text-red-800 \
    border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";
