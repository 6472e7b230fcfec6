//! The profile page of the logged in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, get_totp_secret, get_user_by_id},
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    profile::get_address,
};

/// The state needed for the profile pages.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's name, email, address and authenticator setup link.
///
/// Staff members are sent to the staff dashboard instead.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    if user.is_staff {
        return Ok(Redirect::to(endpoints::STAFF_DASHBOARD_VIEW).into_response());
    }

    let address = get_address(user_id, &connection)?;
    let otpauth_url = match get_totp_secret(user_id, &connection) {
        Ok(secret) => Some(secret.otpauth_url(&user.email)?),
        Err(Error::NotFound) => None,
        Err(error) => return Err(error),
    };

    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();
    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full max-w-md"
            {
                h1 class="text-xl font-bold" { "Profile" }

                dl id="profile-details" class="grid grid-cols-2 gap-2"
                {
                    dt class="font-medium" { "Name" }
                    dd { (user.full_name()) }
                    dt class="font-medium" { "Email" }
                    dd { (user.email) }
                }

                h2 class="text-lg font-semibold" { "Address" }

                @match &address {
                    Some(address) => {
                        address id="address" class="not-italic"
                        {
                            (address.street_address) br;
                            (address.city) " " (address.postal_code) br;
                            (address.country)
                        }
                        a href=(endpoints::EDIT_ADDRESS_VIEW) class=(LINK_STYLE) { "Edit address" }
                    }
                    None => {
                        p class="text-gray-500 dark:text-gray-400" { "You have not added an address yet." }
                        a href=(endpoints::EDIT_ADDRESS_VIEW) class=(LINK_STYLE) { "Add address" }
                    }
                }

                h2 class="text-lg font-semibold" { "Authenticator" }

                @match &otpauth_url {
                    Some(url) => {
                        p { "Add this account to your authenticator app to get the code asked for when logging in." }
                        a id="otpauth-url" href=(url) class=(LINK_STYLE) { "Set up authenticator" }
                        pre class="text-xs break-all whitespace-pre-wrap" { (url) }
                    }
                    None => {
                        p class="text-gray-500 dark:text-gray-400" { "No authenticator is set up for this account." }
                    }
                }

                p
                {
                    a href=(endpoints::CHANGE_PASSWORD_VIEW) class=(LINK_STYLE) { "Change password" }
                }
            }
        }
    };

    Ok(base("Profile", &content).into_response())
}

#[cfg(test)]
mod profile_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        auth::create_totp_device,
        endpoints,
        profile::{UserAddress, save_address},
        test_utils::{
            assert_valid_html, create_test_staff, create_test_user, get_test_connection,
            parse_html_document,
        },
    };

    use super::{ProfileState, get_profile_page};

    #[tokio::test]
    async fn shows_user_and_address() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        save_address(
            user.id,
            &UserAddress {
                street_address: "1 Lenina".to_owned(),
                city: "Minsk".to_owned(),
                postal_code: 220030,
                country: "Belarus".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_profile_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let details = html
            .select(&Selector::parse("#profile-details").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(details.contains("anna@example.com"));
        let address = html
            .select(&Selector::parse("#address").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(address.contains("Minsk 220030"), "got {address:?}");
    }

    #[tokio::test]
    async fn prompts_for_missing_address() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_profile_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You have not added an address yet."));
    }

    #[tokio::test]
    async fn shows_authenticator_link() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        create_totp_device(user.id, &connection).unwrap();
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_profile_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let link = html
            .select(&Selector::parse("a#otpauth-url").unwrap())
            .next()
            .expect("want a link for the authenticator app");
        let href = link.value().attr("href").unwrap();
        assert!(href.starts_with("otpauth://totp/Bankroll:"), "got {href}");
    }

    #[tokio::test]
    async fn staff_are_redirected_to_dashboard() {
        let connection = get_test_connection();
        let staff = create_test_staff(&connection, "staff@example.com");
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_profile_page(State(state), Extension(staff.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::STAFF_DASHBOARD_VIEW
        );
    }
}
