//! Protocol strategies.
//!
//! Output-oracle and fault-proof chains agree on the lifecycle but differ in
//! where anchors and proofs live. Callers only see [`ProtocolStrategy`].

mod fault_proof;
mod legacy;

pub use fault_proof::FaultProofStrategy;
pub use legacy::LegacyStrategy;

use crate::{
    types::{Anchor, InvalidationReason, ProofRecord, Withdrawal, WithdrawalHash},
    WithdrawalError,
};
use alloy_primitives::{Address, Bytes, TxKind};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// L2OutputOracle with a fixed finalization period
    Legacy,
    /// DisputeGameFactory with per-submitter proofs
    FaultProof,
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy output oracle"),
            Self::FaultProof => f.write_str("fault proofs"),
        }
    }
}

/// A prove transaction and the anchor it proves against.
#[derive(Debug, Clone)]
pub struct ProveTransaction {
    pub anchor: Anchor,
    pub request: TransactionRequest,
}

/// The operations the classifier and the actions need from a protocol variant.
///
/// Fault-proof proofs are keyed by submitter: a proof is only found, and can
/// only be finalized, by the address that submitted it.
#[async_trait]
pub trait ProtocolStrategy: Send + Sync {
    fn variant(&self) -> ProtocolVariant;

    /// Portal that receives prove and finalize transactions.
    fn portal(&self) -> Address;

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, WithdrawalError>;

    /// Most recent anchor, if any has been published.
    async fn latest_anchor(&self) -> Result<Option<Anchor>, WithdrawalError>;

    /// Rough time until an anchor covers `withdrawal_block`, when it can be estimated.
    async fn estimate_anchor_wait(
        &self,
        latest: Option<&Anchor>,
        withdrawal_block: u64,
    ) -> Result<Option<Duration>, WithdrawalError>;

    /// Stored proof for `hash`. The legacy portal ignores `submitter`.
    async fn proof_record(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Option<ProofRecord>, WithdrawalError>;

    /// Seconds between proving and finalizing.
    async fn finalization_period(&self) -> Result<u64, WithdrawalError>;

    /// Reason the anchor behind `proof` no longer counts, if it doesn't.
    async fn check_proof_validity(
        &self,
        proof: &ProofRecord,
    ) -> Result<Option<InvalidationReason>, WithdrawalError>;

    /// Anchor covering the withdrawal, or `NotProvableYet`.
    async fn check_provable(&self, withdrawal: &Withdrawal) -> Result<Anchor, WithdrawalError> {
        let latest = self.latest_anchor().await?;
        match latest {
            Some(anchor) if anchor.covers(withdrawal.l2_block) => Ok(anchor),
            latest => {
                let estimated_wait = self
                    .estimate_anchor_wait(latest.as_ref(), withdrawal.l2_block)
                    .await?;
                Err(WithdrawalError::NotProvableYet {
                    withdrawal_block: withdrawal.l2_block,
                    anchor_block: latest.map(|anchor| anchor.l2_block()),
                    estimated_wait,
                })
            }
        }
    }

    /// Stored, still valid proof whose finalization period has elapsed at `now`.
    async fn matured_proof(
        &self,
        withdrawal: &Withdrawal,
        submitter: Address,
        now: u64,
    ) -> Result<ProofRecord, WithdrawalError> {
        if self.is_finalized(withdrawal.hash).await? {
            return Err(WithdrawalError::AlreadyFinalized(withdrawal.hash));
        }

        let proof = self
            .proof_record(withdrawal.hash, submitter)
            .await?
            .ok_or(WithdrawalError::NotProven(withdrawal.hash))?;

        if let Some(reason) = self.check_proof_validity(&proof).await? {
            return Err(WithdrawalError::ProofInvalidated {
                hash: withdrawal.hash,
                reason,
            });
        }

        let ready_at = proof.ready_at(self.finalization_period().await?);
        if now < ready_at {
            return Err(WithdrawalError::TimeLockActive {
                ready_at,
                remaining: Duration::from_secs(ready_at - now),
            });
        }

        Ok(proof)
    }

    /// Prove transaction against the latest anchor; fails with `NotProvableYet`
    /// when it does not cover the withdrawal.
    async fn build_prove_transaction(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<ProveTransaction, WithdrawalError>;

    /// Finalize transaction for a matured proof; nothing is built while the
    /// finalization period at L1 time `now` is still running.
    async fn build_finalize_transaction(
        &self,
        withdrawal: &Withdrawal,
        submitter: Address,
        now: u64,
    ) -> Result<TransactionRequest, WithdrawalError>;
}

/// Contract call to `to` with ABI encoded `input`.
pub(crate) fn call_request(to: Address, input: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        to: Some(TxKind::Call(to)),
        input: TransactionInput::new(Bytes::from(input)),
        ..Default::default()
    }
}
