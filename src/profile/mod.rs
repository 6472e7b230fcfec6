//! The user's profile, their address and the staff dashboard.

mod address;
mod edit_address;
mod page;
mod staff_dashboard;

pub use address::{AddressForm, UserAddress, create_address_table, get_address, save_address};
pub use edit_address::{get_edit_address_page, update_address_endpoint};
pub use page::{ProfileState, get_profile_page};
pub use staff_dashboard::get_staff_dashboard_page;
