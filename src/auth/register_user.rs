//! The registration page for opening a customer account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Email, NewUser, PasswordHash, User, ValidatedPassword, create_totp_device, create_user,
        set_auth_cookie,
    },
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, field_error, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    profile::{AddressForm, UserAddress, save_address},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
pub(crate) const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

/// The maximum length of a first or last name.
const NAME_MAX_LENGTH: usize = 150;

/// Error messages for each field of the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    address: Option<String>,
}

fn text_input(
    name: &str,
    label: &str,
    type_: &str,
    value: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(type_)
                name=(name)
                id=(name)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()]
                value=(value);

            (field_error(error_message))
        }
    }
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("email", "Email", "email", &form.email, errors.email.as_deref()))
            (text_input("first_name", "First name", "text", &form.first_name, errors.first_name.as_deref()))
            (text_input("last_name", "Last name", "text", &form.last_name, errors.last_name.as_deref()))
            (password_input("password", "Password", PASSWORD_INPUT_MIN_LENGTH, false, errors.password.as_deref()))
            (password_input("confirm_password", "Confirm Password", PASSWORD_INPUT_MIN_LENGTH, false, errors.confirm_password.as_deref()))
            (text_input("street_address", "Street address", "text", &form.street_address, None))
            (text_input("city", "City", "text", &form.city, None))
            (text_input("postal_code", "Postal code", "number", &form.postal_code, None))
            (text_input("country", "Country", "text", &form.country, None))
            (field_error(errors.address.as_deref()))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form =
        registration_form(&RegisterForm::default(), &RegistrationErrors::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    #[cfg(test)]
    pub fn new(
        cookie_secret: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: crate::app_state::create_cookie_key(cookie_secret),
            cookie_duration: crate::auth::DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub street_address: String,
    pub city: String,
    /// Kept as text so that a bad value can be shown back to the user.
    pub postal_code: String,
    pub country: String,
}

impl RegisterForm {
    fn address_form(&self) -> AddressForm {
        AddressForm {
            street_address: self.street_address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// The fields of a registration form that passed validation, except the password.
struct ValidRegistration {
    email: Email,
    first_name: String,
    last_name: String,
    address: UserAddress,
}

fn validate_name(name: &str, field: &'static str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyField(field))
    } else if name.chars().count() > NAME_MAX_LENGTH {
        Err(Error::FieldTooLong(field, NAME_MAX_LENGTH))
    } else {
        Ok(name.to_owned())
    }
}

/// Validate the registration form, collecting an error message for each invalid field.
fn validate_form(form: &RegisterForm) -> Result<ValidRegistration, RegistrationErrors> {
    let mut errors = RegistrationErrors::default();

    let email = Email::new(&form.email)
        .inspect_err(|error| errors.email = Some(error.to_string()))
        .ok();
    let first_name = validate_name(&form.first_name, "first name")
        .inspect_err(|error| errors.first_name = Some(error.to_string()))
        .ok();
    let last_name = validate_name(&form.last_name, "last name")
        .inspect_err(|error| errors.last_name = Some(error.to_string()))
        .ok();
    let address = UserAddress::from_form(&form.address_form())
        .inspect_err(|error| errors.address = Some(error.to_string()))
        .ok();

    match (email, first_name, last_name, address) {
        (Some(email), Some(first_name), Some(last_name), Some(address)) => Ok(ValidRegistration {
            email,
            first_name,
            last_name,
            address,
        }),
        _ => Err(errors),
    }
}

/// Insert the user with their address and authenticator secret, or nothing at all.
fn create_customer(
    new_user: NewUser,
    address: &UserAddress,
    connection: &Connection,
) -> Result<User, Error> {
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(new_user, &transaction)?;
    save_address(user.id, address, &transaction)?;
    create_totp_device(user.id, &transaction)?;

    transaction.commit()?;

    Ok(user)
}

/// Create a customer account and log the new user in.
///
/// The account gets an authenticator secret, shown on the profile page the
/// user is sent to. Invalid input re-renders the form with an error message
/// next to each offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let ValidRegistration {
        email,
        first_name,
        last_name,
        address,
    } = match validate_form(&user_data) {
        Ok(fields) => fields,
        Err(errors) => return registration_form(&user_data, &errors).into_response(),
    };

    let user_inputs = [email.as_ref(), first_name.as_str(), last_name.as_str()];
    let validated_password = match ValidatedPassword::new(&user_data.password, &user_inputs) {
        Ok(password) => password,
        Err(error) => {
            let errors = RegistrationErrors {
                password: Some(error.to_string()),
                ..Default::default()
            };
            return registration_form(&user_data, &errors).into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        let errors = RegistrationErrors {
            confirm_password: Some("Passwords do not match".to_owned()),
            ..Default::default()
        };
        return registration_form(&user_data, &errors).into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let new_user = NewUser {
        email,
        first_name,
        last_name,
        password_hash,
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_customer(new_user, &address, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(Error::DuplicateEmail(email)) => {
            let errors = RegistrationErrors {
                email: Some(format!("The email {email} is already registered.")),
                ..Default::default()
            };
            return registration_form(&user_data, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        auth::register_user::get_register_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let h1_selector = scraper::Selector::parse("h1").unwrap();
        let titles = document.select(&h1_selector).collect::<Vec<_>>();
        assert_eq!(titles.len(), 1, "want 1 h1, got {}", titles.len());
        let title_text = titles[0].text().collect::<String>().to_lowercase();
        assert_eq!(title_text.trim(), "create account");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "first_name", "text");
        assert_form_input(&form, "last_name", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_input(&form, "street_address", "text");
        assert_form_input(&form, "city", "text");
        assert_form_input(&form, "postal_code", "number");
        assert_form_input(&form, "country", "text");
        assert_form_submit_button(&form);

        let log_in_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&log_in_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::LOG_IN_VIEW));
    }
}
