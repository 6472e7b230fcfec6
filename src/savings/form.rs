use maud::{Markup, html};
use time::Date;

use crate::{
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    savings::GOAL_NAME_MAX_LENGTH,
};

/// Where and how the savings goal form is submitted.
pub(super) enum FormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// The values shown in the savings goal form.
#[derive(Default)]
pub(super) struct FormValues<'a> {
    pub goal_name: &'a str,
    pub target_amount: Option<String>,
    pub target_date: Option<Date>,
}

pub(super) fn savings_goal_form(
    action: FormAction,
    values: &FormValues,
    min_date: Option<Date>,
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        FormAction::Create(url) => (Some(url), None, "Create goal"),
        FormAction::Update(url) => (None, Some(url), "Save changes"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="goal_name" class=(FORM_LABEL_STYLE) { "Goal name" }

                input
                    id="goal_name"
                    type="text"
                    name="goal_name"
                    value=(values.goal_name)
                    placeholder="New car"
                    maxlength=(GOAL_NAME_MAX_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="target_amount" class=(FORM_LABEL_STYLE) { "Target amount" }

                input
                    id="target_amount"
                    type="number"
                    name="target_amount"
                    value=[values.target_amount.as_deref()]
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="target_date" class=(FORM_LABEL_STYLE) { "Target date" }

                input
                    id="target_date"
                    type="date"
                    name="target_date"
                    value=[values.target_date]
                    min=[min_date]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { "Error: " (error_message) }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                (submit_text)
            }
        }
    }
}
