//! Deposits are held as pending on a card until a staff member approves or rejects them.

mod core;
mod decision;
mod queue;
mod request;

pub use core::{
    PendingDeposit, approve_deposit, count_pending_deposits, get_pending_deposit,
    get_pending_deposits, reject_deposit, request_deposit,
};
pub use decision::{DecisionForm, decide_deposit_endpoint, get_deposit_decision_page};
pub use queue::get_deposit_queue_page;
pub use request::{get_deposit_page, request_deposit_endpoint};
