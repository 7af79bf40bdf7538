pub mod confirm;
pub mod finalize;
pub mod prove;

pub use confirm::{
    Confirmation, TransactionDriver, DEFAULT_CONFIRMATION_TIMEOUT, RECEIPT_POLL_INTERVAL,
};
pub use finalize::FinalizeAction;
pub use prove::ProveAction;

use std::future::Future;
use withdrawal::WithdrawalError;

/// Trait for executable onchain actions.
pub trait Action: Send {
    /// Check if the action has already been completed, so `execute` can be skipped.
    fn is_completed(&self) -> impl Future<Output = Result<bool, WithdrawalError>> + Send;

    /// Execute the action and wait for its transaction to confirm.
    fn execute(&mut self) -> impl Future<Output = Result<Confirmation, WithdrawalError>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}
