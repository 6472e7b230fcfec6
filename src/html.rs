//! Shared page layout, style constants and small HTML building blocks.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use rust_decimal::Decimal;

use crate::{
    endpoints,
    money::{Currency, format_money},
};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_SECONDARY_STYLE: &str = "w-full py-2.5 px-5 mb-2 \
    text-sm font-medium text-gray-900 bg-white rounded border border-gray-200 \
    hover:bg-gray-100 hover:text-blue-700 focus:z-10 dark:bg-gray-800 \
    dark:text-gray-400 dark:border-gray-600 dark:hover:text-white \
    dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

// Form styles
pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";
pub const FORM_ERROR_STYLE: &str = "text-red-500 text-base";
pub const FORM_CHECKBOX_STYLE: &str = "rounded-xs";
pub const FORM_RADIO_GROUP_STYLE: &str = "flex flex-col gap-2";
pub const FORM_RADIO_INPUT_STYLE: &str = "peer h-4 w-4 shrink-0 cursor-pointer \
    text-blue-600 border-gray-300 dark:border-gray-600 focus-visible:ring-2 \
    focus-visible:ring-blue-500 focus-visible:ring-offset-2 \
    focus-visible:ring-offset-white focus-visible:dark:ring-offset-gray-900";
pub const FORM_RADIO_LABEL_STYLE: &str = "flex-1 rounded border border-gray-300 \
    dark:border-gray-600 bg-white dark:bg-gray-700 px-3 py-2 text-sm font-medium \
    text-gray-700 dark:text-white cursor-pointer transition \
    hover:border-gray-400 hover:bg-gray-50 hover:text-gray-900 \
    hover:dark:border-gray-500 hover:dark:bg-gray-600 active:scale-[0.99] \
    peer-checked:border-blue-600 peer-checked:bg-blue-50 peer-checked:text-blue-700 \
    peer-checked:shadow-sm peer-checked:dark:border-blue-500 \
    peer-checked:dark:bg-blue-600/20 peer-checked:dark:text-blue-200";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Status badge styles
pub const BADGE_PENDING_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-yellow-800 bg-yellow-100 rounded-full \
    dark:bg-yellow-900 dark:text-yellow-300";
pub const BADGE_APPROVED_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-green-800 bg-green-100 rounded-full \
    dark:bg-green-900 dark:text-green-300";
pub const BADGE_REJECTED_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-red-800 bg-red-100 rounded-full \
    dark:bg-red-900 dark:text-red-300";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// The full page around `content`, with HTMX loaded and a container for alerts.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Bankroll" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link href="/static/main.css" rel="stylesheet";
                script src="/static/htmx-2.0.8-min.js" integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz" {}
                script src="/static/htmx-ext-response-targets-2.0.4.js" integrity="sha384-T41oglUPvXLGBVyRdZsVRxNWnOOqCynaPubjUVjxhsjFTKrFJGEMm3/0KGmNQ+Pg" {}
                style { (PreEscaped(INDICATOR_CSS)) }
                script src="/static/app.js" defer {}
            }

            body
                hx-ext="response-targets"
                class="min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                div
                    id="alert-container"
                    class="hidden fixed bottom-4 left-1/2 -translate-x-1/2 z-50 w-full max-w-md px-4"
                {}
            }
        }
    }
}

/// Hides the loading spinner until HTMX marks the form as busy.
const INDICATOR_CSS: &str = "#indicator.htmx-indicator { display: none; } \
    .htmx-request #indicator, #indicator.htmx-request { display: inline; }";

/// A full page for an HTTP error, e.g. "404" with an explanation and a way back.
pub fn error_view(title: &str, status: &str, description: &str, fix: &str) -> Markup {
    let content = html! {
        main class="mx-auto max-w-screen-sm px-4 py-16 text-center"
        {
            p class="mb-4 text-7xl lg:text-9xl font-extrabold text-blue-600 dark:text-blue-500"
            {
                (status)
            }
            h1 class="mb-4 text-3xl md:text-4xl font-bold text-gray-900 dark:text-white"
            {
                (description)
            }
            p class="mb-8 text-lg text-gray-600 dark:text-gray-300" { (fix) }
            a href=(endpoints::ROOT) class=(BUTTON_PRIMARY_STYLE) { "Back to your accounts" }
        }
    };

    base(title, &content)
}

/// The card that holds the log-in and registration forms.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        main class="flex flex-col items-center px-6 py-8 mx-auto"
        {
            p class="flex items-center gap-2 mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                img class="w-8 h-8" src="/static/favicon-128x128.png" alt="";
                "Bankroll"
            }

            section
                class="w-full sm:max-w-md p-6 sm:p-8 space-y-6 bg-white rounded-lg shadow
                    dark:bg-gray-800 dark:border dark:border-gray-700"
            {
                h1 class="text-xl md:text-2xl font-bold text-gray-900 dark:text-white"
                {
                    (form_title)
                }

                (form)
            }
        }
    }
}

/// A password input with a label and an optional error message below it.
///
/// `name` is used for both the input's name and ID.
pub fn password_input(
    name: &str,
    label: &str,
    min_length: u8,
    autofocus: bool,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label
                for=(name)
                class=(FORM_LABEL_STYLE)
            {
                (label)
            }

            input
                type="password"
                name=(name)
                id=(name)
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[autofocus || error_message.is_some()]
                minlength=(min_length);

            (field_error(error_message))
        }

    }
}

/// Shown inside submit buttons while a request is in flight.
pub fn loading_spinner() -> Markup {
    html! {
        span
            aria-hidden="true"
            class="inline-block w-4 h-4 me-2 align-middle rounded-full border-2
                border-white border-t-transparent animate-spin"
        {}
    }
}

/// The error message shown under a form field.
pub fn field_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message
        {
            p class=(FORM_ERROR_STYLE) { (error_message) }
        }
    }
}

/// An amount of money with its currency code, e.g. "1,234.50 BYN".
///
/// Negative amounts are shown in red.
pub fn money(amount: Decimal, currency: Currency) -> Markup {
    html! {
        @if amount.is_sign_negative() {
            span class="text-red-600 dark:text-red-400" { (format_money(amount, currency)) }
        } @else {
            span { (format_money(amount, currency)) }
        }
    }
}
