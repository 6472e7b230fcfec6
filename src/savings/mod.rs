//! Savings goals with a monthly contribution plan.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod review;

pub use create::{SavingsGoalState, create_savings_goal_endpoint, get_new_savings_goal_page};
pub use db::{
    approve_savings_goal, create_savings_goal, create_savings_goal_table, delete_savings_goal,
    get_approved_savings_goals, get_savings_goal, update_savings_goal,
};
pub use delete::{delete_savings_goal_endpoint, get_delete_savings_goal_page};
pub use domain::{
    GOAL_NAME_MAX_LENGTH, GoalName, NewSavingsGoal, SavingsGoal, SavingsGoalForm, SavingsGoalId,
};
pub use edit::{get_edit_savings_goal_page, update_savings_goal_endpoint};
pub use list::get_savings_goals_page;
pub use review::{approve_savings_goal_endpoint, get_review_savings_goal_page};
