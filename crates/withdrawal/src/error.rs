use crate::types::{format_duration, InvalidationReason, WithdrawalHash};
use alloy_primitives::{Address, TxHash, B256};
use client::ChainError;
use std::time::Duration;
use thiserror::Error;

/// Failures of a withdrawal run, grouped the way callers act on them.
#[derive(Error, Debug)]
pub enum WithdrawalError {
    #[error("withdrawal transaction {0} not found on L2")]
    NotFound(TxHash),

    #[error("withdrawal transaction {0} failed on L2")]
    ExecutionFailed(TxHash),

    #[error("malformed withdrawal in {tx_hash}: {reason}")]
    MalformedWithdrawal { tx_hash: TxHash, reason: String },

    #[error("{}", not_provable_message(.withdrawal_block, .anchor_block, .estimated_wait))]
    NotProvableYet {
        withdrawal_block: u64,
        anchor_block: Option<u64>,
        estimated_wait: Option<Duration>,
    },

    #[error("withdrawal {0} has not been proven")]
    NotProven(WithdrawalHash),

    #[error(
        "finalization period has not elapsed: {} remaining (finalizable at timestamp {ready_at})",
        format_duration(.remaining.to_owned())
    )]
    TimeLockActive { ready_at: u64, remaining: Duration },

    #[error("withdrawal cannot be finalized: {0}")]
    NotFinalizable(String),

    #[error("withdrawal {0} is already proven")]
    AlreadyProven(WithdrawalHash),

    #[error("withdrawal {0} is already finalized")]
    AlreadyFinalized(WithdrawalHash),

    #[error("proof for withdrawal {hash} is no longer valid: {reason}; it must be proven again against a new anchor")]
    ProofInvalidated {
        hash: WithdrawalHash,
        reason: InvalidationReason,
    },

    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(#[from] ProofError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("transaction {0} reverted")]
    TransactionReverted(TxHash),

    #[error("transaction {tx_hash} not confirmed within {}s", .timeout.as_secs())]
    ConfirmationTimeout { tx_hash: TxHash, timeout: Duration },

    #[error("cancelled while waiting for {0}")]
    Cancelled(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction sender {actual} does not match signer {expected}")]
    SenderMismatch { expected: Address, actual: Address },
}

/// Failures while assembling prove parameters.
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("L2 block {0} not found")]
    MissingBlock(u64),

    #[error("no storage proof returned for withdrawal {0}")]
    MissingStorageProof(WithdrawalHash),

    #[error("withdrawal {hash} is not in message passer storage at L2 block {block}")]
    WithdrawalNotInStorage { hash: WithdrawalHash, block: u64 },

    #[error("output root mismatch at L2 block {block}: anchor has {expected}, computed {computed}")]
    OutputRootMismatch {
        block: u64,
        expected: B256,
        computed: B256,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

fn not_provable_message(
    withdrawal_block: &u64,
    anchor_block: &Option<u64>,
    estimated_wait: &Option<Duration>,
) -> String {
    let anchor = anchor_block.map_or_else(
        || "no anchor has been proposed yet".to_string(),
        |block| format!("latest anchor covers L2 block {block}"),
    );
    let wait = estimated_wait.map_or_else(
        || "wait for the next dispute game".to_string(),
        |wait| format!("next covering anchor expected in ~{}", format_duration(wait)),
    );
    format!("withdrawal in L2 block {withdrawal_block} is not provable yet: {anchor}; {wait}")
}
