//! Staff review of credit applications.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::BankingRules,
    auth::UserID,
    credit::{
        ApplicationWithApplicant, CreditApplicationId, CreditStatus, annuity,
        credits_page::status_badge, decide_credit_application, get_all_credit_applications,
        get_credit_application,
    },
    deposit::DecisionForm,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, money,
    },
    money::Currency,
    navigation::NavBar,
};

/// The state needed for reviewing credit applications.
#[derive(Debug, Clone)]
pub struct CreditReviewState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub banking_rules: BankingRules,
}

impl FromRef<AppState> for CreditReviewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            banking_rules: state.banking_rules,
        }
    }
}

/// Render every credit application, pending ones first.
pub async fn get_credit_applications_page(
    State(state): State<CreditReviewState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let applications = get_all_credit_applications(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve credit applications: {error}"))?;

    Ok(applications_view(&applications).into_response())
}

fn application_row(entry: &ApplicationWithApplicant) -> Markup {
    let application = &entry.application;
    let decision_url = format_endpoint(endpoints::CREDIT_DECISION_VIEW, application.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (entry.applicant_email) }
            td class=(TABLE_CELL_STYLE) { (money(application.amount, Currency::Byn)) }
            td class=(TABLE_CELL_STYLE) { (application.purpose) }
            td class=(TABLE_CELL_STYLE) { (application.created_at.date()) }
            td class=(TABLE_CELL_STYLE) { (status_badge(application.status)) }
            td class=(TABLE_CELL_STYLE)
            {
                @if application.status == CreditStatus::Pending {
                    a href=(decision_url) class=(LINK_STYLE) { "Review" }
                }
            }
        }
    }
}

fn applications_view(applications: &[ApplicationWithApplicant]) -> Markup {
    let nav_bar = NavBar::staff(endpoints::CREDIT_APPLICATIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Credit applications" }

                @if applications.is_empty() {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "No one has applied for a credit yet."
                    }
                } @else {
                    div class="overflow-x-auto dark:bg-gray-800"
                    {
                        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Applicant" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Purpose" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Submitted" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for application in applications {
                                    (application_row(application))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Credit applications", &content)
}

/// Render the decision form for a pending credit application.
///
/// The page previews the repayment the credit would have if approved.
pub async fn get_credit_decision_page(
    State(state): State<CreditReviewState>,
    Path(application_id): Path<CreditApplicationId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let application = get_credit_application(application_id, &connection)?;
    let rules = state.banking_rules;
    let monthly_payment = annuity(
        application.amount,
        rules.credit_interest_rate,
        rules.credit_term_months,
    )?;
    let decision_url = format_endpoint(endpoints::CREDIT_DECISION_API, application.id);

    let nav_bar = NavBar::staff(endpoints::CREDIT_APPLICATIONS_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Credit decision" }

            dl class="w-full mb-4 grid grid-cols-2 gap-2"
            {
                dt class="font-medium" { "Amount" }
                dd { (money(application.amount, Currency::Byn)) }
                dt class="font-medium" { "Purpose" }
                dd { (application.purpose) }
                dt class="font-medium" { "Status" }
                dd { (status_badge(application.status)) }
                dt class="font-medium" { "Interest rate" }
                dd { (rules.credit_interest_rate) "%" }
                dt class="font-medium" { "Term" }
                dd { (rules.credit_term_months) " months" }
                dt class="font-medium" { "Monthly payment" }
                dd id="monthly-payment" { (money(monthly_payment, Currency::Byn)) }
            }

            @if application.status == CreditStatus::Pending {
                form
                    hx-post=(decision_url)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4"
                {
                    div class="flex items-center gap-2"
                    {
                        input
                            id="approved"
                            type="checkbox"
                            name="approved"
                            value="on"
                            class=(FORM_CHECKBOX_STYLE);
                        label for="approved" { "Approve this credit" }
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Submitting without ticking the box rejects the application."
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Submit decision" }
                }
            } @else {
                p class="mb-4" { "This application has already been decided." }
            }

            a href=(endpoints::CREDIT_APPLICATIONS_VIEW) class=(LINK_STYLE)
            {
                "Back to the applications"
            }
        }
    };

    Ok(base("Credit decision", &content).into_response())
}

/// Approve or reject a credit application and return to the list.
pub async fn decide_credit_endpoint(
    State(state): State<CreditReviewState>,
    Extension(staff_id): Extension<UserID>,
    Path(application_id): Path<CreditApplicationId>,
    Form(form): Form<DecisionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = decide_credit_application(
        application_id,
        form.is_approved(),
        &state.banking_rules,
        OffsetDateTime::now_utc(),
        &connection,
    );

    match result {
        Ok(credit) => {
            match credit {
                Some(credit) => tracing::info!(
                    "Staff member {staff_id} approved credit application {application_id} as credit {}",
                    credit.id
                ),
                None => tracing::info!(
                    "Staff member {staff_id} rejected credit application {application_id}"
                ),
            }
            (
                HxRedirect(endpoints::CREDIT_APPLICATIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
