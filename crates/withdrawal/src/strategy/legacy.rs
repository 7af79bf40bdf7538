use super::{call_request, ProtocolStrategy, ProtocolVariant, ProveTransaction};
use crate::{
    contract::LegacyContracts,
    proof::ProofProvider,
    types::{Anchor, InvalidationReason, ProofRecord, ProvenAgainst, Withdrawal, WithdrawalHash},
    WithdrawalError,
};
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use binding::opstack::IOptimismPortal;
use client::ChainError;
use std::time::Duration;
use tracing::info;

/// Withdrawals proven against L2OutputOracle proposals.
#[derive(Debug, Clone)]
pub struct LegacyStrategy<C, P> {
    portal: Address,
    contracts: C,
    proofs: P,
}

impl<C, P> LegacyStrategy<C, P> {
    pub const fn new(portal: Address, contracts: C, proofs: P) -> Self {
        Self {
            portal,
            contracts,
            proofs,
        }
    }
}

#[async_trait]
impl<C, P> ProtocolStrategy for LegacyStrategy<C, P>
where
    C: LegacyContracts,
    P: ProofProvider,
{
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::Legacy
    }

    fn portal(&self) -> Address {
        self.portal
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, WithdrawalError> {
        Ok(self.contracts.is_finalized(hash).await?)
    }

    async fn latest_anchor(&self) -> Result<Option<Anchor>, WithdrawalError> {
        Ok(self.contracts.latest_output().await?.map(Anchor::Output))
    }

    async fn estimate_anchor_wait(
        &self,
        latest: Option<&Anchor>,
        withdrawal_block: u64,
    ) -> Result<Option<Duration>, WithdrawalError> {
        let params = self.contracts.oracle_params().await?;
        if params.submission_interval == 0 {
            return Ok(None);
        }

        let covered = latest.map_or(0, Anchor::l2_block);
        let proposals = withdrawal_block
            .saturating_sub(covered)
            .div_ceil(params.submission_interval)
            .max(1);
        let seconds = proposals
            .saturating_mul(params.submission_interval)
            .saturating_mul(params.l2_block_time);

        Ok(Some(Duration::from_secs(seconds)))
    }

    async fn proof_record(
        &self,
        hash: WithdrawalHash,
        _submitter: Address,
    ) -> Result<Option<ProofRecord>, WithdrawalError> {
        Ok(self.contracts.proven_withdrawal(hash).await?)
    }

    async fn finalization_period(&self) -> Result<u64, WithdrawalError> {
        Ok(self.contracts.oracle_params().await?.finalization_period)
    }

    async fn check_proof_validity(
        &self,
        proof: &ProofRecord,
    ) -> Result<Option<InvalidationReason>, WithdrawalError> {
        let ProvenAgainst::Output { index, root } = proof.anchor else {
            return Err(ChainError::Unexpected(
                "legacy portal returned a dispute game proof".to_string(),
            )
            .into());
        };

        Ok(match self.contracts.output_at(index).await? {
            None => Some(InvalidationReason::OutputDeleted { index }),
            Some(output) if output.root != root => {
                Some(InvalidationReason::OutputReplaced { index })
            }
            Some(_) => None,
        })
    }

    async fn build_prove_transaction(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<ProveTransaction, WithdrawalError> {
        let anchor = self.check_provable(withdrawal).await?;
        let params = self.proofs.prove_params(withdrawal, &anchor).await?;

        info!(
            withdrawal_hash = %withdrawal.hash,
            output_index = anchor.index(),
            output_l2_block = anchor.l2_block(),
            proof_nodes = params.withdrawal_proof.len(),
            "Built prove transaction"
        );

        let call = IOptimismPortal::proveWithdrawalTransactionCall {
            _tx: withdrawal.transaction.clone(),
            _l2OutputIndex: U256::from(anchor.index()),
            _outputRootProof: params.output_root_proof,
            _withdrawalProof: params.withdrawal_proof,
        };

        Ok(ProveTransaction {
            anchor,
            request: call_request(self.portal, call.abi_encode()),
        })
    }

    async fn build_finalize_transaction(
        &self,
        withdrawal: &Withdrawal,
        submitter: Address,
        now: u64,
    ) -> Result<TransactionRequest, WithdrawalError> {
        self.matured_proof(withdrawal, submitter, now).await?;

        // The portal trusts its stored proof; only the message is resubmitted
        let call = IOptimismPortal::finalizeWithdrawalTransactionCall {
            _tx: withdrawal.transaction.clone(),
        };
        Ok(call_request(self.portal, call.abi_encode()))
    }
}
