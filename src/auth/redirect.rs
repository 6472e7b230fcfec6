//! Sending users back to the page they were on once they have logged in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// The path and query of `uri` if it is a page on this site other than the log-in page.
fn local_target(uri: &Uri) -> Option<String> {
    let target = uri.path_and_query()?.as_str();
    let is_local = target.starts_with('/') && !target.starts_with("//");

    (is_local && uri.path() != endpoints::LOG_IN_VIEW).then(|| target.to_owned())
}

/// Accept a user-supplied redirect URL only if it stays on this site.
///
/// Absolute and protocol-relative URLs are rejected so that the log-in form
/// cannot be used to send users elsewhere.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    local_target(&uri)
}

/// The page that `request` was made from.
///
/// HTMX calls to the API report their page in the `HX-Current-URL` header,
/// which is the browser's absolute URL. Other requests are page loads.
fn redirect_target(request: &Request) -> Option<String> {
    if !request.uri().path().starts_with("/api") {
        return normalize_redirect_url(request.uri().path_and_query()?.as_str());
    }

    let headers = request.headers();
    let is_htmx = headers
        .get("hx-request")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));

    if !is_htmx {
        tracing::warn!("API request to {} without HTMX headers", request.uri().path());
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|value| value.to_str().ok())?;

    let target = current_url.parse::<Uri>().ok().as_ref().and_then(local_target);
    if target.is_none() {
        tracing::warn!("Ignoring HX-Current-URL {current_url}");
    }

    target
}

/// The log-in page URL that returns the user to where `request` came from,
/// or to the home page when that cannot be worked out.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = redirect_target(request).unwrap_or_else(|| endpoints::ROOT.to_owned());

    match serde_urlencoded::to_string([("redirect_url", target.as_str())]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}
