//! The navigation bar shown at the top of every logged-in page.

use maud::{Markup, html};

use crate::endpoints;

const CUSTOMER_LINKS: [(&str, &str); 5] = [
    (endpoints::CARDS_VIEW, "Cards"),
    (endpoints::TRANSFERS_VIEW, "Transfers"),
    (endpoints::SAVINGS_GOALS_VIEW, "Savings"),
    (endpoints::CREDITS_VIEW, "Credits"),
    (endpoints::PROFILE_VIEW, "Profile"),
];

const STAFF_LINKS: [(&str, &str); 3] = [
    (endpoints::STAFF_DASHBOARD_VIEW, "Dashboard"),
    (endpoints::DEPOSIT_QUEUE_VIEW, "Deposits"),
    (endpoints::CREDIT_APPLICATIONS_VIEW, "Credit applications"),
];

const LINK_STYLE: &str = "block rounded px-3 py-2 text-gray-700 hover:bg-gray-100 \
    hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800 dark:hover:text-blue-300";
const CURRENT_LINK_STYLE: &str = "block rounded px-3 py-2 font-semibold text-white \
    bg-blue-700 dark:bg-blue-600";

/// A link in the navigation bar, highlighted when it is the page being viewed.
#[derive(Clone, Copy)]
struct Link {
    url: &'static str,
    title: &'static str,
    is_current: bool,
}

impl Link {
    fn render(self) -> Markup {
        let style = if self.is_current {
            CURRENT_LINK_STYLE
        } else {
            LINK_STYLE
        };

        html! {
            li {
                a href=(self.url) class=(style) aria-current=[self.is_current.then_some("page")] {
                    (self.title)
                }
            }
        }
    }
}

/// The links for either customers or staff, ending with a log-out link.
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// The customer navigation bar with the link to `active_endpoint` highlighted.
    pub fn new(active_endpoint: &str) -> Self {
        Self::with_links(&CUSTOMER_LINKS, active_endpoint)
    }

    /// The staff navigation bar with the link to `active_endpoint` highlighted.
    pub fn staff(active_endpoint: &str) -> Self {
        Self::with_links(&STAFF_LINKS, active_endpoint)
    }

    pub fn for_user(is_staff: bool, active_endpoint: &str) -> Self {
        if is_staff {
            Self::staff(active_endpoint)
        } else {
            Self::new(active_endpoint)
        }
    }

    fn with_links(links: &[(&'static str, &'static str)], active_endpoint: &str) -> Self {
        let links = links
            .iter()
            .map(|&(url, title)| Link {
                url,
                title,
                is_current: url == active_endpoint,
            })
            .chain([Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            }])
            .collect();

        Self { links }
    }

    /// Small screens get the links in a collapsible menu.
    pub fn into_html(self) -> Markup {
        let current_title = self
            .links
            .iter()
            .find(|link| link.is_current)
            .map_or("Menu", |link| link.title);

        html! {
            nav class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div class="max-w-screen-xl mx-auto flex items-center justify-between p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="Bankroll logo" class="h-8";
                        span class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Bankroll"
                        }
                    }

                    ul class="hidden lg:flex lg:gap-2 font-medium"
                    {
                        @for link in &self.links { (link.render()) }
                    }

                    details class="relative lg:hidden"
                    {
                        summary
                            class="cursor-pointer list-none rounded px-3 py-2 font-semibold
                                text-blue-700 dark:text-blue-300"
                        {
                            (current_title)
                        }

                        ul
                            class="absolute right-0 z-40 mt-2 w-56 rounded-lg border
                                border-gray-200 bg-white p-2 shadow-lg
                                dark:border-gray-700 dark:bg-gray-900"
                        {
                            @for link in &self.links { (link.render()) }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    fn current_links(nav_bar: &NavBar) -> Vec<&str> {
        nav_bar
            .links
            .iter()
            .filter(|link| link.is_current)
            .map(|link| link.url)
            .collect()
    }

    #[test]
    fn highlights_only_the_current_page() {
        for endpoint in [
            endpoints::CARDS_VIEW,
            endpoints::TRANSFERS_VIEW,
            endpoints::SAVINGS_GOALS_VIEW,
            endpoints::CREDITS_VIEW,
            endpoints::PROFILE_VIEW,
        ] {
            assert_eq!(current_links(&NavBar::new(endpoint)), vec![endpoint]);
        }
    }

    #[test]
    fn pages_outside_the_menu_highlight_nothing() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::LOG_OUT,
            endpoints::NEW_CARD_VIEW,
            endpoints::DEPOSIT_QUEUE_VIEW,
        ] {
            assert!(current_links(&NavBar::new(endpoint)).is_empty());
        }
    }

    #[test]
    fn staff_see_review_queues() {
        let nav_bar = NavBar::for_user(true, endpoints::DEPOSIT_QUEUE_VIEW);

        let urls: Vec<&str> = nav_bar.links.iter().map(|link| link.url).collect();

        assert_eq!(
            urls,
            [
                endpoints::STAFF_DASHBOARD_VIEW,
                endpoints::DEPOSIT_QUEUE_VIEW,
                endpoints::CREDIT_APPLICATIONS_VIEW,
                endpoints::LOG_OUT,
            ]
        );
        assert_eq!(current_links(&nav_bar), [endpoints::DEPOSIT_QUEUE_VIEW]);
    }

    #[test]
    fn rendered_menu_marks_current_page() {
        let markup = NavBar::new(endpoints::CREDITS_VIEW).into_html().into_string();
        let fragment = Html::parse_fragment(&markup);
        let selector = Selector::parse("a[aria-current=page]").unwrap();

        let current: Vec<_> = fragment
            .select(&selector)
            .filter_map(|link| link.value().attr("href"))
            .collect();

        // Once in the desktop bar and once in the mobile menu.
        assert_eq!(current, [endpoints::CREDITS_VIEW, endpoints::CREDITS_VIEW]);
    }
}
