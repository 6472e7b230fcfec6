use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// Render the choice between the two kinds of transfer.
pub async fn get_transfers_page() -> Response {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Transfers" }

            div class="w-full flex flex-col"
            {
                a href=(endpoints::TRANSFER_BY_ACCOUNT_VIEW) class=(BUTTON_SECONDARY_STYLE)
                {
                    "Send to an account number"
                }
                a href=(endpoints::TRANSFER_BETWEEN_CARDS_VIEW) class=(BUTTON_SECONDARY_STYLE)
                {
                    "Move money between my cards"
                }
            }
        }
    };

    base("Transfers", &content).into_response()
}

#[cfg(test)]
mod transfers_page_tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::get_transfers_page;

    #[tokio::test]
    async fn links_to_both_transfer_forms() {
        let response = get_transfers_page().await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let links: Vec<_> = html
            .select(&Selector::parse("main a, div a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert!(links.contains(&endpoints::TRANSFER_BY_ACCOUNT_VIEW));
        assert!(links.contains(&endpoints::TRANSFER_BETWEEN_CARDS_VIEW));
    }
}
