use crate::{
    poll::{poll_until, PollError},
    strategy::ProtocolStrategy,
    types::{Anchor, Classification, ProofRecord, Withdrawal, WithdrawalState},
    WithdrawalError,
};
use alloy_primitives::{Address, TxHash};
use client::ChainReader;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Interval between anchor coverage checks.
pub const ANCHOR_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Read-only classifier for withdrawals.
///
/// Every call re-reads chain state; nothing is cached between calls.
/// `submitter` selects the proof on fault-proof chains.
pub struct WithdrawalClassifier<'a, L1: ?Sized, L2: ?Sized, S: ?Sized> {
    l1: &'a L1,
    l2: &'a L2,
    strategy: &'a S,
    submitter: Address,
}

impl<'a, L1, L2, S> WithdrawalClassifier<'a, L1, L2, S>
where
    L1: ChainReader + ?Sized,
    L2: ChainReader + ?Sized,
    S: ProtocolStrategy + ?Sized,
{
    pub const fn new(l1: &'a L1, l2: &'a L2, strategy: &'a S, submitter: Address) -> Self {
        Self {
            l1,
            l2,
            strategy,
            submitter,
        }
    }

    /// Fetch the L2 receipt and parse the withdrawal it initiated.
    pub async fn load_withdrawal(&self, tx_hash: TxHash) -> Result<Withdrawal, WithdrawalError> {
        let receipt = self
            .l2
            .receipt(tx_hash)
            .await?
            .ok_or(WithdrawalError::NotFound(tx_hash))?;
        let withdrawal = Withdrawal::from_receipt(&receipt)?;

        debug!(
            %tx_hash,
            withdrawal_hash = %withdrawal.hash,
            l2_block = withdrawal.l2_block,
            "Loaded withdrawal"
        );
        Ok(withdrawal)
    }

    pub async fn classify(&self, tx_hash: TxHash) -> Result<Classification, WithdrawalError> {
        let withdrawal = self.load_withdrawal(tx_hash).await?;
        let state = self.classify_withdrawal(&withdrawal).await?;
        Ok(Classification { withdrawal, state })
    }

    /// Current state of an already loaded withdrawal.
    pub async fn classify_withdrawal(
        &self,
        withdrawal: &Withdrawal,
    ) -> Result<WithdrawalState, WithdrawalError> {
        if self.strategy.is_finalized(withdrawal.hash).await? {
            return Ok(WithdrawalState::Finalized);
        }

        // A stored proof carries its own covering anchor; newer anchors may
        // claim lower blocks without affecting it.
        if let Some(proof) = self
            .strategy
            .proof_record(withdrawal.hash, self.submitter)
            .await?
        {
            return self.classify_proven(proof).await;
        }

        match self.strategy.check_provable(withdrawal).await {
            Ok(anchor) => Ok(WithdrawalState::ProvableUnproven { anchor }),
            Err(WithdrawalError::NotProvableYet {
                withdrawal_block,
                anchor_block,
                estimated_wait,
            }) => Ok(WithdrawalState::NotYetProvable {
                withdrawal_block,
                anchor_block,
                estimated_wait,
            }),
            Err(err) => Err(err),
        }
    }

    async fn classify_proven(&self, proof: ProofRecord) -> Result<WithdrawalState, WithdrawalError> {
        if let Some(reason) = self.strategy.check_proof_validity(&proof).await? {
            return Ok(WithdrawalState::ProofInvalidated { proof, reason });
        }

        let period = self.strategy.finalization_period().await?;
        let now = self.l1.latest_header().await?.timestamp;
        let ready_at = proof.ready_at(period);

        Ok(if now < ready_at {
            WithdrawalState::ProvenWaitingTimeLock {
                proof,
                ready_at,
                remaining: Duration::from_secs(ready_at - now),
            }
        } else {
            WithdrawalState::ReadyToFinalize { proof }
        })
    }

    /// Poll every `interval` until an anchor covers the withdrawal.
    ///
    /// At `deadline` the last `NotProvableYet` is returned.
    pub async fn wait_until_provable(
        &self,
        withdrawal: &Withdrawal,
        interval: Duration,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<Anchor, WithdrawalError> {
        let result = poll_until(interval, deadline, cancel, move || async move {
            match self.strategy.check_provable(withdrawal).await {
                Ok(anchor) => Ok(Some(anchor)),
                Err(WithdrawalError::NotProvableYet { anchor_block, .. }) => {
                    info!(
                        l2_block = withdrawal.l2_block,
                        anchor_block = ?anchor_block,
                        "Waiting for an anchor covering the withdrawal"
                    );
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        })
        .await;

        match result {
            Ok(anchor) => Ok(anchor),
            Err(PollError::Failed(err)) => Err(err),
            Err(PollError::TimedOut) => self.strategy.check_provable(withdrawal).await,
            Err(PollError::Cancelled) => Err(WithdrawalError::Cancelled(format!(
                "anchor covering L2 block {}",
                withdrawal.l2_block
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{sample_message, test_signer, Simulation, FINALIZATION_PERIOD},
        types::{GameStatus, InvalidationReason, Stage},
    };
    use client::ChainWriter;

    async fn classify(sim: &Simulation, tx_hash: TxHash) -> Result<WithdrawalState, WithdrawalError> {
        let (l1, l2, strategy) = (sim.l1(), sim.l2(), sim.strategy());
        WithdrawalClassifier::new(&l1, &l2, strategy.as_ref(), sim.sender())
            .classify(tx_hash)
            .await
            .map(|classification| classification.state)
    }

    async fn finalize_on_chain(sim: &Simulation, withdrawal: &Withdrawal) {
        let mut request = sim
            .strategy()
            .build_finalize_transaction(withdrawal, sim.sender(), sim.l1_time())
            .await
            .unwrap();
        request.from = Some(sim.sender());
        request.nonce = Some(sim.pending_nonce());
        let raw = test_signer()(request).await.unwrap();
        sim.l1().send_raw_transaction(raw).await.unwrap();
    }

    #[tokio::test]
    async fn test_legacy_lifecycle() {
        let sim = Simulation::legacy();
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);

        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(
            state,
            WithdrawalState::NotYetProvable {
                withdrawal_block: 100,
                anchor_block: None,
                ..
            }
        ));

        let index = sim.add_output(100);
        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(state, WithdrawalState::ProvableUnproven { anchor } if anchor.index() == index));

        let w = sim.withdrawal(tx_hash);
        sim.record_proof(&w, index);
        let proven_at = sim.l1_time();

        sim.advance_time(FINALIZATION_PERIOD - 1);
        match classify(&sim, tx_hash).await.unwrap() {
            WithdrawalState::ProvenWaitingTimeLock {
                ready_at,
                remaining,
                ..
            } => {
                assert_eq!(ready_at, proven_at + FINALIZATION_PERIOD);
                assert_eq!(remaining, Duration::from_secs(1));
            }
            other => panic!("unexpected state: {other}"),
        }

        sim.advance_time(1);
        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(state, WithdrawalState::ReadyToFinalize { .. }));

        finalize_on_chain(&sim, &w).await;
        assert_eq!(classify(&sim, tx_hash).await.unwrap(), WithdrawalState::Finalized);
    }

    #[tokio::test]
    async fn test_classification_is_idempotent() {
        let sim = Simulation::fault_proof();
        sim.add_game(120);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        sim.record_proof(&sim.withdrawal(tx_hash), 0);

        let first = classify(&sim, tx_hash).await.unwrap();
        let second = classify(&sim, tx_hash).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.stage(), Stage::ProvenWaitingTimeLock);
    }

    #[tokio::test]
    async fn test_finalized_stays_finalized() {
        let sim = Simulation::fault_proof();
        sim.add_game(100);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        let w = sim.withdrawal(tx_hash);
        sim.record_proof(&w, 0);
        sim.resolve_game(0, GameStatus::DefenderWins);
        sim.advance_time(FINALIZATION_PERIOD);
        finalize_on_chain(&sim, &w).await;

        assert_eq!(classify(&sim, tx_hash).await.unwrap(), WithdrawalState::Finalized);

        // Later anchor changes cannot move it back
        sim.blacklist_game(0);
        sim.set_respected_game_type(1);
        sim.advance_time(FINALIZATION_PERIOD);
        assert_eq!(classify(&sim, tx_hash).await.unwrap(), WithdrawalState::Finalized);
    }

    #[tokio::test]
    async fn test_proof_of_other_submitter_is_invisible() {
        let sim = Simulation::fault_proof();
        sim.add_game(100);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        sim.record_proof(&sim.withdrawal(tx_hash), 0);

        let (l1, l2, strategy) = (sim.l1(), sim.l2(), sim.fault_proof_strategy());
        let other = Address::repeat_byte(0x42);
        let state = WithdrawalClassifier::new(&l1, &l2, &strategy, other)
            .classify(tx_hash)
            .await
            .unwrap()
            .state;
        assert!(matches!(state, WithdrawalState::ProvableUnproven { .. }));
    }

    #[tokio::test]
    async fn test_invalidated_game_is_reported() {
        let sim = Simulation::fault_proof();
        sim.add_game(100);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        sim.record_proof(&sim.withdrawal(tx_hash), 0);
        sim.resolve_game(0, GameStatus::ChallengerWins);

        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(
            state,
            WithdrawalState::ProofInvalidated {
                reason: InvalidationReason::ChallengerWins,
                ..
            }
        ));
        assert_eq!(state.stage(), Stage::ProvableUnproven);
    }

    #[tokio::test]
    async fn test_proven_withdrawal_ignores_lower_newer_game() {
        let sim = Simulation::fault_proof();
        sim.add_game(120);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        sim.record_proof(&sim.withdrawal(tx_hash), 0);
        sim.resolve_game(0, GameStatus::DefenderWins);

        // A newer game claiming an earlier block does not affect the proof
        sim.add_game(50);
        let state = classify(&sim, tx_hash).await.unwrap();
        assert_eq!(state.stage(), Stage::ProvenWaitingTimeLock);

        sim.advance_time(FINALIZATION_PERIOD);
        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(state, WithdrawalState::ReadyToFinalize { .. }));
    }

    #[tokio::test]
    async fn test_deleted_output_invalidates_proof() {
        let sim = Simulation::legacy();
        sim.add_output(90);
        let index = sim.add_output(150);
        let tx_hash = sim.add_withdrawal(sample_message(1), 100);
        sim.record_proof(&sim.withdrawal(tx_hash), index);

        // The latest output left behind no longer covers the withdrawal
        sim.delete_outputs_from(index);
        let state = classify(&sim, tx_hash).await.unwrap();
        assert!(matches!(
            state,
            WithdrawalState::ProofInvalidated {
                reason: InvalidationReason::OutputDeleted { index: 1 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_receipt_errors() {
        let sim = Simulation::legacy();

        let missing = TxHash::repeat_byte(0x01);
        assert!(matches!(
            classify(&sim, missing).await,
            Err(WithdrawalError::NotFound(hash)) if hash == missing
        ));

        let failed = sim.add_failed_withdrawal(100);
        assert!(matches!(
            classify(&sim, failed).await,
            Err(WithdrawalError::ExecutionFailed(hash)) if hash == failed
        ));

        let plain = sim.add_plain_transaction(100);
        assert!(matches!(
            classify(&sim, plain).await,
            Err(WithdrawalError::MalformedWithdrawal { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_provable_returns_covering_anchor() {
        let sim = Simulation::fault_proof();
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));

        let proposer = sim.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            proposer.add_game(110);
        });

        let (l1, l2, strategy) = (sim.l1(), sim.l2(), sim.fault_proof_strategy());
        let classifier = WithdrawalClassifier::new(&l1, &l2, &strategy, sim.sender());
        let start = Instant::now();
        let anchor = classifier
            .wait_until_provable(
                &w,
                ANCHOR_POLL_INTERVAL,
                start + Duration::from_secs(600),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(anchor.l2_block(), 110);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_provable_gives_up_at_deadline() {
        let sim = Simulation::legacy();
        sim.add_output(50);
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));

        let (l1, l2, strategy) = (sim.l1(), sim.l2(), sim.legacy_strategy());
        let classifier = WithdrawalClassifier::new(&l1, &l2, &strategy, sim.sender());
        let deadline = Instant::now() + Duration::from_secs(150);
        let err = classifier
            .wait_until_provable(&w, ANCHOR_POLL_INTERVAL, deadline, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawalError::NotProvableYet {
                anchor_block: Some(50),
                ..
            }
        ));
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_provable_cancelled() {
        let sim = Simulation::fault_proof();
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            trigger.cancel();
        });

        let (l1, l2, strategy) = (sim.l1(), sim.l2(), sim.fault_proof_strategy());
        let err = WithdrawalClassifier::new(&l1, &l2, &strategy, sim.sender())
            .wait_until_provable(
                &w,
                ANCHOR_POLL_INTERVAL,
                Instant::now() + Duration::from_secs(600),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::Cancelled(_)));
    }
}
