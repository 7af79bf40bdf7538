use super::{call_request, ProtocolStrategy, ProtocolVariant, ProveTransaction};
use crate::{
    contract::{FaultProofContracts, Finalizability},
    proof::ProofProvider,
    types::{
        Anchor, GameStatus, InvalidationReason, ProofRecord, ProvenAgainst, Withdrawal,
        WithdrawalHash,
    },
    WithdrawalError,
};
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use binding::opstack::IOptimismPortal2;
use client::ChainError;
use std::time::Duration;
use tracing::{debug, info};

/// Withdrawals proven against dispute games.
///
/// Proofs are stored per `(withdrawal, submitter)`: the finalize transaction
/// must come from the address that proved.
#[derive(Debug, Clone)]
pub struct FaultProofStrategy<C, P> {
    portal: Address,
    contracts: C,
    proofs: P,
}

impl<C, P> FaultProofStrategy<C, P> {
    pub const fn new(portal: Address, contracts: C, proofs: P) -> Self {
        Self {
            portal,
            contracts,
            proofs,
        }
    }
}

#[async_trait]
impl<C, P> ProtocolStrategy for FaultProofStrategy<C, P>
where
    C: FaultProofContracts,
    P: ProofProvider,
{
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::FaultProof
    }

    fn portal(&self) -> Address {
        self.portal
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, WithdrawalError> {
        Ok(self.contracts.is_finalized(hash).await?)
    }

    async fn latest_anchor(&self) -> Result<Option<Anchor>, WithdrawalError> {
        let respected = self.contracts.respected_game_type().await?;
        let game = self.contracts.latest_game(respected.game_type).await?;
        Ok(game.map(Anchor::Game))
    }

    async fn estimate_anchor_wait(
        &self,
        _latest: Option<&Anchor>,
        _withdrawal_block: u64,
    ) -> Result<Option<Duration>, WithdrawalError> {
        // Games are created on demand by proposers, there is no fixed cadence
        Ok(None)
    }

    async fn proof_record(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Option<ProofRecord>, WithdrawalError> {
        Ok(self.contracts.proven_withdrawal(hash, submitter).await?)
    }

    async fn finalization_period(&self) -> Result<u64, WithdrawalError> {
        Ok(self.contracts.proof_maturity_delay().await?)
    }

    async fn check_proof_validity(
        &self,
        proof: &ProofRecord,
    ) -> Result<Option<InvalidationReason>, WithdrawalError> {
        let ProvenAgainst::Game { proxy } = proof.anchor else {
            return Err(ChainError::Unexpected(
                "fault-proof portal returned an output proposal proof".to_string(),
            )
            .into());
        };

        if self.contracts.is_blacklisted(proxy).await? {
            return Ok(Some(InvalidationReason::GameBlacklisted));
        }

        let game = self.contracts.game_info(proxy).await?;
        if game.status == GameStatus::ChallengerWins {
            return Ok(Some(InvalidationReason::ChallengerWins));
        }

        let respected = self.contracts.respected_game_type().await?;
        if game.game_type != respected.game_type {
            return Ok(Some(InvalidationReason::GameTypeChanged {
                game_type: game.game_type,
                respected: respected.game_type,
            }));
        }
        if game.created_at < respected.updated_at {
            return Ok(Some(InvalidationReason::GameCreatedBeforeTypeUpdate {
                created_at: game.created_at,
                updated_at: respected.updated_at,
            }));
        }

        debug!(%proxy, status = ?game.status, "Proof game still valid");
        Ok(None)
    }

    async fn build_prove_transaction(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<ProveTransaction, WithdrawalError> {
        let anchor = self.check_provable(withdrawal).await?;
        let params = self.proofs.prove_params(withdrawal, &anchor).await?;

        info!(
            withdrawal_hash = %withdrawal.hash,
            game_index = anchor.index(),
            game_l2_block = anchor.l2_block(),
            proof_nodes = params.withdrawal_proof.len(),
            "Built prove transaction"
        );

        let call = IOptimismPortal2::proveWithdrawalTransactionCall {
            _tx: withdrawal.transaction.clone(),
            _disputeGameIndex: U256::from(anchor.index()),
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

        // Game resolution, finality delay and blacklist are the portal's call
        if let Finalizability::Rejected(reason) = self
            .contracts
            .check_withdrawal(withdrawal.hash, submitter)
            .await?
        {
            return Err(WithdrawalError::NotFinalizable(reason));
        }

        let call = IOptimismPortal2::finalizeWithdrawalTransactionCall {
            _tx: withdrawal.transaction.clone(),
        };
        let mut request = call_request(self.portal, call.abi_encode());
        // msg.sender selects the proof
        request.from = Some(submitter);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_message, Simulation};

    const DELAY: u64 = 604_800;

    fn withdrawal(sim: &Simulation, l2_block: u64) -> Withdrawal {
        let tx_hash = sim.add_withdrawal(sample_message(1), l2_block);
        sim.withdrawal(tx_hash)
    }

    #[tokio::test]
    async fn test_prove_requires_covering_game() {
        let sim = Simulation::fault_proof();
        let w = withdrawal(&sim, 100);
        let strategy = sim.fault_proof_strategy();

        let err = strategy.build_prove_transaction(&w).await.unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::NotProvableYet {
                anchor_block: None,
                estimated_wait: None,
                ..
            }
        ));

        sim.add_game(99);
        let err = strategy.build_prove_transaction(&w).await.unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::NotProvableYet {
                anchor_block: Some(99),
                ..
            }
        ));

        sim.add_game(100);
        let prove = strategy.build_prove_transaction(&w).await.unwrap();
        assert_eq!(prove.anchor.index(), 1);

        let call = IOptimismPortal2::proveWithdrawalTransactionCall::abi_decode(
            prove.request.input.input().unwrap(),
        )
        .unwrap();
        assert_eq!(call._disputeGameIndex, U256::from(1));
    }

    #[tokio::test]
    async fn test_latest_game_ignores_other_game_types() {
        let sim = Simulation::fault_proof();
        sim.add_game(200);
        sim.set_respected_game_type(1);
        sim.add_game(150);

        let anchor = sim.fault_proof_strategy().latest_anchor().await.unwrap().unwrap();
        assert_eq!(anchor.l2_block(), 150);
    }

    #[tokio::test]
    async fn test_proof_is_bound_to_submitter() {
        let sim = Simulation::fault_proof();
        sim.add_game(150);
        let w = withdrawal(&sim, 100);
        sim.record_proof(&w, 0);
        let strategy = sim.fault_proof_strategy();

        let other = Address::repeat_byte(0xee);
        assert!(strategy.proof_record(w.hash, sim.sender()).await.unwrap().is_some());
        assert!(strategy.proof_record(w.hash, other).await.unwrap().is_none());

        let err = strategy
            .build_finalize_transaction(&w, other, u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::NotProven(_)));
    }

    #[tokio::test]
    async fn test_finalize_checks_time_lock_then_portal() {
        let sim = Simulation::fault_proof();
        sim.add_game(150);
        let w = withdrawal(&sim, 100);
        sim.record_proof(&w, 0);
        let proven_at = sim.l1_time();
        let strategy = sim.fault_proof_strategy();

        let err = strategy
            .build_finalize_transaction(&w, sim.sender(), proven_at + DELAY - 60)
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::TimeLockActive { ready_at, .. } if ready_at == proven_at + DELAY));

        // Game still in progress: the portal refuses
        let err = strategy
            .build_finalize_transaction(&w, sim.sender(), proven_at + DELAY)
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::NotFinalizable(reason) if reason.contains("not been resolved")));

        sim.resolve_game(0, GameStatus::DefenderWins);
        sim.advance_time(DELAY);
        let request = strategy
            .build_finalize_transaction(&w, sim.sender(), sim.l1_time())
            .await
            .unwrap();
        assert_eq!(request.from, Some(sim.sender()));
        IOptimismPortal2::finalizeWithdrawalTransactionCall::abi_decode(
            request.input.input().unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_invalidated_games() {
        let sim = Simulation::fault_proof();
        sim.add_game(150);
        let w = withdrawal(&sim, 100);
        sim.record_proof(&w, 0);
        let strategy = sim.fault_proof_strategy();
        let proof = strategy.proof_record(w.hash, sim.sender()).await.unwrap().unwrap();

        assert_eq!(strategy.check_proof_validity(&proof).await.unwrap(), None);

        sim.resolve_game(0, GameStatus::ChallengerWins);
        assert_eq!(
            strategy.check_proof_validity(&proof).await.unwrap(),
            Some(InvalidationReason::ChallengerWins)
        );

        sim.blacklist_game(0);
        assert_eq!(
            strategy.check_proof_validity(&proof).await.unwrap(),
            Some(InvalidationReason::GameBlacklisted)
        );

        let err = strategy
            .build_finalize_transaction(&w, sim.sender(), u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::ProofInvalidated {
                reason: InvalidationReason::GameBlacklisted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_game_type_change_invalidates_proof() {
        let sim = Simulation::fault_proof();
        sim.add_game(150);
        let w = withdrawal(&sim, 100);
        sim.record_proof(&w, 0);
        let strategy = sim.fault_proof_strategy();
        let proof = strategy.proof_record(w.hash, sim.sender()).await.unwrap().unwrap();

        sim.set_respected_game_type(1);
        assert_eq!(
            strategy.check_proof_validity(&proof).await.unwrap(),
            Some(InvalidationReason::GameTypeChanged {
                game_type: 0,
                respected: 1
            })
        );

        // Switching back does not revive games created before the update
        sim.advance_time(12);
        sim.set_respected_game_type(0);
        assert!(matches!(
            strategy.check_proof_validity(&proof).await.unwrap(),
            Some(InvalidationReason::GameCreatedBeforeTypeUpdate { .. })
        ));
    }
}
