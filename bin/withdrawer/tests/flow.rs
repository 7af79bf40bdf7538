//! Runs the withdrawer against a simulated L1/L2 pair.

use action::TransactionDriver;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use withdrawal::{
    test_utils::{
        sample_message, test_signer, SimulatedL1, SimulatedL2, Simulation, FINALIZATION_PERIOD,
    },
    types::GameStatus,
    InvalidationReason, NonceCounter, ProtocolStrategy, WithdrawalError,
};
use withdrawer::{Outcome, Withdrawer};

struct Harness {
    sim: Simulation,
    driver: TransactionDriver<SimulatedL1>,
    l2: SimulatedL2,
    strategy: Box<dyn ProtocolStrategy>,
}

impl Harness {
    fn new(sim: Simulation) -> Self {
        Self {
            driver: TransactionDriver::new(
                sim.l1(),
                test_signer(),
                sim.sender(),
                CancellationToken::new(),
            ),
            l2: sim.l2(),
            strategy: sim.strategy(),
            sim,
        }
    }

    fn withdrawer(&self) -> Withdrawer<'_, SimulatedL1, SimulatedL2, dyn ProtocolStrategy> {
        Withdrawer::new(
            &self.driver,
            &self.l2,
            self.strategy.as_ref(),
            NonceCounter::new(self.sim.pending_nonce()),
            CancellationToken::new(),
        )
    }
}

#[tokio::test(start_paused = true)]
async fn test_fault_proof_withdrawal_end_to_end() {
    let harness = Harness::new(Simulation::fault_proof());
    let sim = &harness.sim;
    sim.add_game(120);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);
    let proven_at = sim.l1_time();

    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    match &outcome {
        Outcome::Proven {
            ready_at,
            remaining,
            ..
        } => {
            assert_eq!(*ready_at, Some(proven_at + FINALIZATION_PERIOD));
            assert_eq!(*remaining, Some(Duration::from_secs(FINALIZATION_PERIOD)));
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert!(outcome.to_string().contains("finalize in ~7d"));

    // Second run inside the finalization period sends nothing
    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::WaitingForTimeLock { .. }));
    assert_eq!(sim.sent_transactions().len(), 1);

    sim.resolve_game(0, GameStatus::DefenderWins);
    sim.advance_time(FINALIZATION_PERIOD);
    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::Finalized { .. }));

    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert_eq!(outcome, Outcome::AlreadyFinalized);

    let sent = sim.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].nonce, 0);
    assert_eq!(sent[1].nonce, 1);
}

#[tokio::test(start_paused = true)]
async fn test_legacy_withdrawal_end_to_end() {
    let harness = Harness::new(Simulation::legacy());
    let sim = &harness.sim;
    sim.add_output(150);
    let tx_hash = sim.add_withdrawal(sample_message(7), 100);

    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::Proven { .. }));

    sim.advance_time(FINALIZATION_PERIOD);
    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::Finalized { .. }));
    assert!(sim.is_finalized(sim.withdrawal(tx_hash).hash));
}

#[tokio::test]
async fn test_not_provable_reports_wait() {
    let harness = Harness::new(Simulation::legacy());
    let sim = &harness.sim;
    sim.add_output(90);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);

    let err = harness.withdrawer().advance(tx_hash).await.unwrap_err();
    assert_eq!(err.to_string(), "classifying withdrawal");

    let cause = err.downcast_ref::<WithdrawalError>().unwrap();
    assert!(matches!(
        cause,
        WithdrawalError::NotProvableYet {
            withdrawal_block: 100,
            anchor_block: Some(90),
            estimated_wait: Some(_),
        }
    ));
    let message = cause.to_string();
    assert!(message.contains("100"));
    assert!(message.contains("90"));
    assert!(sim.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_anchor_then_proves() {
    let harness = Harness::new(Simulation::fault_proof());
    let sim = harness.sim.clone();
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);

    let proposer = sim.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(150)).await;
        proposer.add_game(100);
    });

    let outcome = harness
        .withdrawer()
        .with_anchor_wait(Some(Duration::from_secs(600)))
        .advance(tx_hash)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Proven { .. }));
}

#[tokio::test]
async fn test_invalidated_proof_is_fatal() {
    let harness = Harness::new(Simulation::fault_proof());
    let sim = &harness.sim;
    sim.add_game(120);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);
    sim.record_proof(&sim.withdrawal(tx_hash), 0);
    sim.blacklist_game(0);

    let err = harness.withdrawer().advance(tx_hash).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WithdrawalError>(),
        Some(WithdrawalError::ProofInvalidated {
            reason: InvalidationReason::GameBlacklisted,
            ..
        })
    ));
    assert!(sim.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_failed_l2_transaction_is_fatal() {
    let harness = Harness::new(Simulation::legacy());
    let tx_hash = harness.sim.add_failed_withdrawal(100);

    let err = harness.withdrawer().advance(tx_hash).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WithdrawalError>(),
        Some(WithdrawalError::ExecutionFailed(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout_names_stage() {
    let sim = Simulation::legacy();
    sim.add_output(150);
    sim.set_receipt_delay(None);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);

    let driver = TransactionDriver::new(sim.l1(), test_signer(), sim.sender(), CancellationToken::new())
        .with_timeout(Duration::from_secs(30));
    let l2 = sim.l2();
    let strategy = sim.legacy_strategy();
    let mut withdrawer = Withdrawer::new(
        &driver,
        &l2,
        &strategy,
        NonceCounter::new(0),
        CancellationToken::new(),
    );

    let err = withdrawer.advance(tx_hash).await.unwrap_err();
    assert_eq!(err.to_string(), "confirming transaction");
    assert!(matches!(
        err.downcast_ref::<WithdrawalError>(),
        Some(WithdrawalError::ConfirmationTimeout { .. })
    ));
    // The broadcast transaction used its nonce
    assert_eq!(withdrawer.nonces().current(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reprove_after_invalidated_game() {
    let harness = Harness::new(Simulation::fault_proof());
    let sim = &harness.sim;
    sim.add_game(120);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);
    sim.record_proof(&sim.withdrawal(tx_hash), 0);
    sim.resolve_game(0, GameStatus::ChallengerWins);
    sim.add_game(130);

    let outcome = harness
        .withdrawer()
        .with_reprove(true)
        .advance(tx_hash)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Proven { ready_at: Some(_), .. }));
    assert_eq!(sim.sent_transactions().len(), 1);

    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::WaitingForTimeLock { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_finalizes_after_lower_game_is_created() {
    let harness = Harness::new(Simulation::fault_proof());
    let sim = &harness.sim;
    sim.add_game(120);
    let tx_hash = sim.add_withdrawal(sample_message(1), 100);
    sim.record_proof(&sim.withdrawal(tx_hash), 0);
    sim.resolve_game(0, GameStatus::DefenderWins);
    sim.advance_time(FINALIZATION_PERIOD);
    sim.add_game(50);

    let outcome = harness.withdrawer().advance(tx_hash).await.unwrap();
    assert!(matches!(outcome, Outcome::Finalized { .. }));
    assert!(sim.is_finalized(sim.withdrawal(tx_hash).hash));
}
