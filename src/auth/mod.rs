//! User accounts, log-in sessions and the middleware that protects routes.

mod change_password;
mod cookie;
mod email;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod staff;
mod token;
mod totp;
mod user;

pub use change_password::{change_password_endpoint, get_change_password_page};
pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use email::Email;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub use register_user::{get_register_page, register_user};
pub use staff::staff_guard;
pub use totp::{TotpSecret, create_totp_device, create_totp_device_table, get_totp_secret};
pub use user::{
    NewUser, User, UserID, create_user, create_user_table, get_user_by_email,
    get_user_by_id, set_staff, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
