//! Prove parameters for L2→L1 withdrawals.
//!
//! A withdrawal is proven by showing that `sentMessages[hash]` is set in the
//! L2ToL1MessagePasser storage at the anchor's L2 block, and that the anchor's
//! output root commits to that storage.

use crate::{
    hash::{compute_output_root, compute_storage_slot},
    types::{Anchor, Withdrawal},
    ProofError,
};
use alloy_primitives::{Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use async_trait::async_trait;
use binding::opstack::{OutputRootProof, MESSAGE_PASSER_ADDRESS, OUTPUT_VERSION_V0};
use client::ChainError;
use tracing::debug;

/// Proof data for a prove transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProveParams {
    pub output_root_proof: OutputRootProof,
    /// Storage proof of the withdrawal in the message passer
    pub withdrawal_proof: Vec<Bytes>,
}

/// Source of prove parameters.
#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Parameters proving `withdrawal` against `anchor`.
    async fn prove_params(
        &self,
        withdrawal: &Withdrawal,
        anchor: &Anchor,
    ) -> Result<ProveParams, ProofError>;
}

/// [`ProofProvider`] backed by an L2 node's `eth_getProof`.
#[derive(Debug, Clone)]
pub struct RpcProofProvider<P> {
    l2_provider: P,
}

impl<P> RpcProofProvider<P> {
    pub const fn new(l2_provider: P) -> Self {
        Self { l2_provider }
    }
}

#[async_trait]
impl<P> ProofProvider for RpcProofProvider<P>
where
    P: Provider + Clone,
{
    async fn prove_params(
        &self,
        withdrawal: &Withdrawal,
        anchor: &Anchor,
    ) -> Result<ProveParams, ProofError> {
        // The proof is taken at the anchor's block, not the withdrawal's:
        // it has to match the output root the anchor commits to.
        let block_number = anchor.l2_block();
        debug!(
            withdrawal_hash = %withdrawal.hash,
            withdrawal_block = withdrawal.l2_block,
            anchor_block = block_number,
            "Generating withdrawal proof"
        );

        let block = self
            .l2_provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(ChainError::rpc)?
            .ok_or(ProofError::MissingBlock(block_number))?;

        let storage_slot = compute_storage_slot(withdrawal.hash);
        let account_proof = self
            .l2_provider
            .get_proof(MESSAGE_PASSER_ADDRESS, vec![storage_slot])
            .block_id(BlockNumberOrTag::Number(block_number).into())
            .await
            .map_err(ChainError::rpc)?;

        let storage_proof = account_proof
            .storage_proof
            .first()
            .ok_or(ProofError::MissingStorageProof(withdrawal.hash))?;

        if storage_proof.value != U256::from(1) {
            return Err(ProofError::WithdrawalNotInStorage {
                hash: withdrawal.hash,
                block: block_number,
            });
        }

        let output_root_proof = OutputRootProof {
            version: OUTPUT_VERSION_V0,
            stateRoot: block.header.state_root,
            messagePasserStorageRoot: account_proof.storage_hash,
            latestBlockhash: block.header.hash,
        };

        let computed = compute_output_root(&output_root_proof);
        if computed != anchor.root() {
            return Err(ProofError::OutputRootMismatch {
                block: block_number,
                expected: anchor.root(),
                computed,
            });
        }

        debug!(
            proof_nodes = storage_proof.proof.len(),
            output_root = %computed,
            "Generated withdrawal proof"
        );

        Ok(ProveParams {
            output_root_proof,
            withdrawal_proof: storage_proof.proof.clone(),
        })
    }
}
