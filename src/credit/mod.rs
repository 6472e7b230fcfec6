//! Credit applications, staff decisions and the credits they create.

mod apply;
mod credits_page;
mod db;
mod domain;
mod staff;

pub use apply::{apply_credit_endpoint, get_apply_credit_page};
pub use credits_page::get_credits_page;
pub use db::{
    ApplicationWithApplicant, count_pending_credit_applications, create_credit_application,
    create_credit_tables, decide_credit_application, get_active_credits,
    get_all_credit_applications, get_credit_application, get_credit_applications_for_user,
};
pub use domain::{
    Credit, CreditApplication, CreditApplicationForm, CreditApplicationId, CreditStatus,
    NewCreditApplication, PURPOSE_MAX_LENGTH, annuity,
};
pub use staff::{decide_credit_endpoint, get_credit_applications_page, get_credit_decision_page};
