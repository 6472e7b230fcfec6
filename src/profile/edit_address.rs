//! Adding or changing the user's address.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    profile::{AddressForm, ProfileState, UserAddress, get_address, save_address},
};

fn text_input(name: &str, label: &str, value: &str) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }
            input
                id=(name)
                type="text"
                name=(name)
                required
                value=(value)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn address_form(values: &AddressForm, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::ADDRESS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { "Error: " (error_message) }
            }

            (text_input("street_address", "Street address", &values.street_address))
            (text_input("city", "City", &values.city))

            div
            {
                label for="postal_code" class=(FORM_LABEL_STYLE) { "Postal code" }
                input
                    id="postal_code"
                    type="number"
                    name="postal_code"
                    min="1"
                    step="1"
                    required
                    value=(values.postal_code)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (text_input("country", "Country", &values.country))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save address" }
        }
    }
}

/// Render the address form, pre-filled with the current address.
pub async fn get_edit_address_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let address = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;
        get_address(user_id, &connection)?
    };

    let values = match address {
        Some(address) => AddressForm {
            street_address: address.street_address,
            city: address.city,
            postal_code: address.postal_code.to_string(),
            country: address.country,
        },
        None => AddressForm::default(),
    };

    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Address" }
            (address_form(&values, None))
        }
    };

    Ok(base("Address", &content).into_response())
}

/// Save the user's address and redirect to the profile page.
pub async fn update_address_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AddressForm>,
) -> Response {
    let address = match UserAddress::from_form(&form) {
        Ok(address) => address,
        Err(error) => return address_form(&form, Some(&error.to_string())).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match save_address(user_id, &address, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} updated their address");
            (
                HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not save the address of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_address_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        endpoints,
        profile::{AddressForm, ProfileState, UserAddress, get_address, save_address},
        test_utils::{
            assert_form_error_message, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            create_test_user, get_test_connection, must_get_form, parse_html_document,
            parse_html_fragment,
        },
    };

    use super::{get_edit_address_page, update_address_endpoint};

    fn form() -> AddressForm {
        AddressForm {
            street_address: "1 Lenina".to_owned(),
            city: "Minsk".to_owned(),
            postal_code: "220030".to_owned(),
            country: "Belarus".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_prefills_current_address() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        save_address(
            user.id,
            &UserAddress::from_form(&form()).unwrap(),
            &connection,
        )
        .unwrap();
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_edit_address_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::ADDRESS_API, "hx-post");
        let city = form
            .select(&scraper::Selector::parse("input[name=city]").unwrap())
            .next()
            .unwrap();
        assert_eq!(city.value().attr("value"), Some("Minsk"));
    }

    #[tokio::test]
    async fn saves_and_redirects() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            update_address_endpoint(State(state.clone()), Extension(user.id), Form(form())).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::PROFILE_VIEW);
        let address = get_address(user.id, &state.db_connection.lock().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(address.postal_code, 220030);
    }

    #[tokio::test]
    async fn invalid_postal_code_shows_error() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "anna@example.com");
        let state = ProfileState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = update_address_endpoint(
            State(state),
            Extension(user.id),
            Form(AddressForm {
                postal_code: "-4".to_owned(),
                ..form()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: postal code must be a positive number");
    }
}
