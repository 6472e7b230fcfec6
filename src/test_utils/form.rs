use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"))
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("want a form in the page, found none")
}

/// Check that `form` sends its request to `endpoint` with the HTMX `attribute`, e.g. "hx-post".
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    assert_eq!(
        form.value().attr(attribute),
        Some(endpoint),
        "want form with {attribute}=\"{endpoint}\""
    );
}

/// Check that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = form
        .select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("want an input named {name:?}, found none"));

    assert_eq!(input.value().attr("type"), Some(type_), "input {name:?}");
    assert!(
        input.value().attr("required").is_some(),
        "want input {name:?} to be required"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let button = form
        .select(&selector("button[type=submit]"))
        .next();

    assert!(button.is_some(), "want a submit button in the form");
}

/// Check the text of the first paragraph in `form`, where form errors are shown.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let paragraph = form
        .select(&selector("p"))
        .next()
        .expect("want an error message paragraph, found none");
    let got_error_message = paragraph.text().collect::<String>();

    assert_eq!(want_error_message, got_error_message.trim());
}
