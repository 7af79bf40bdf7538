//! Withdrawal lifecycle core.
//!
//! A withdrawal moves from initiation on L2 through proving and finalizing on L1.
//! [`WithdrawalClassifier`] reports where a withdrawal stands, the
//! [`ProtocolStrategy`] implementations build the L1 transactions that move it
//! forward on output-oracle and fault-proof chains.

pub mod contract;
mod error;
pub mod hash;
pub mod nonce;
pub mod poll;
pub mod proof;
pub mod state;
pub mod strategy;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ProofError, WithdrawalError};
pub use nonce::NonceCounter;
pub use poll::{poll_until, PollError};
pub use proof::{ProofProvider, ProveParams, RpcProofProvider};
pub use state::{WithdrawalClassifier, ANCHOR_POLL_INTERVAL};
pub use strategy::{
    FaultProofStrategy, LegacyStrategy, ProtocolStrategy, ProtocolVariant, ProveTransaction,
};
pub use types::{
    format_duration, Anchor, Classification, InvalidationReason, ProofRecord, Stage, Withdrawal,
    WithdrawalHash, WithdrawalState,
};
