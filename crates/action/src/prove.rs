//! Prove withdrawal action.
//!
//! Submits a proof to L1 that a withdrawal was initiated on L2.

use crate::{Action, Confirmation, TransactionDriver};
use client::ChainWriter;
use tracing::info;
use withdrawal::{NonceCounter, ProtocolStrategy, Withdrawal, WithdrawalError};

/// Action to prove a withdrawal against the latest anchor.
pub struct ProveAction<'a, C, S: ?Sized> {
    driver: &'a TransactionDriver<C>,
    strategy: &'a S,
    withdrawal: &'a Withdrawal,
    nonces: &'a mut NonceCounter,
}

impl<'a, C, S> ProveAction<'a, C, S>
where
    C: ChainWriter,
    S: ProtocolStrategy + ?Sized,
{
    pub fn new(
        driver: &'a TransactionDriver<C>,
        strategy: &'a S,
        withdrawal: &'a Withdrawal,
        nonces: &'a mut NonceCounter,
    ) -> Self {
        Self {
            driver,
            strategy,
            withdrawal,
            nonces,
        }
    }

    /// A proof by our sender exists and its anchor still stands.
    async fn has_valid_proof(&self) -> Result<bool, WithdrawalError> {
        let Some(proof) = self
            .strategy
            .proof_record(self.withdrawal.hash, self.driver.from())
            .await?
        else {
            return Ok(false);
        };
        Ok(self.strategy.check_proof_validity(&proof).await?.is_none())
    }
}

impl<C, S> Action for ProveAction<'_, C, S>
where
    C: ChainWriter,
    S: ProtocolStrategy + ?Sized,
{
    async fn is_completed(&self) -> Result<bool, WithdrawalError> {
        Ok(self.strategy.is_finalized(self.withdrawal.hash).await? || self.has_valid_proof().await?)
    }

    async fn execute(&mut self) -> Result<Confirmation, WithdrawalError> {
        let hash = self.withdrawal.hash;
        if self.strategy.is_finalized(hash).await? {
            return Err(WithdrawalError::AlreadyFinalized(hash));
        }
        if self.has_valid_proof().await? {
            return Err(WithdrawalError::AlreadyProven(hash));
        }

        info!(
            withdrawal_hash = %hash,
            l2_block = self.withdrawal.l2_block,
            variant = %self.strategy.variant(),
            "Generating withdrawal proof"
        );
        let prove = self.strategy.build_prove_transaction(self.withdrawal).await?;

        let confirmation = self
            .driver
            .submit_and_confirm(prove.request, self.nonces)
            .await?;

        info!(
            tx_hash = %confirmation.tx_hash,
            withdrawal_hash = %hash,
            anchor = %prove.anchor,
            "Withdrawal proven on L1"
        );
        Ok(confirmation)
    }

    fn description(&self) -> String {
        format!("Proving withdrawal {} on L1", self.withdrawal.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;
    use withdrawal::{
        test_utils::{sample_message, test_signer, Simulation},
        types::GameStatus,
        WithdrawalClassifier, WithdrawalState,
    };

    #[tokio::test(start_paused = true)]
    async fn test_prove_records_proof() {
        let sim = Simulation::legacy();
        sim.add_output(150);
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));
        let strategy = sim.legacy_strategy();
        let driver = TransactionDriver::new(sim.l1(), test_signer(), sim.sender(), CancellationToken::new());
        let mut nonces = NonceCounter::new(0);

        let mut action = ProveAction::new(&driver, &strategy, &w, &mut nonces);
        assert!(action.description().contains(&w.hash.to_string()));
        assert!(!action.is_completed().await.unwrap());

        action.execute().await.unwrap();
        assert!(action.is_completed().await.unwrap());

        let err = action.execute().await.unwrap_err();
        assert!(matches!(err, WithdrawalError::AlreadyProven(hash) if hash == w.hash));
        assert_eq!(sim.sent_transactions().len(), 1);

        let (l1, l2) = (sim.l1(), sim.l2());
        let state = WithdrawalClassifier::new(&l1, &l2, &strategy, sim.sender())
            .classify_withdrawal(&w)
            .await
            .unwrap();
        assert!(matches!(state, WithdrawalState::ProvenWaitingTimeLock { .. }));
    }

    #[tokio::test]
    async fn test_prove_not_ready_without_anchor() {
        let sim = Simulation::fault_proof();
        sim.add_game(99);
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));
        let strategy = sim.fault_proof_strategy();
        let driver = TransactionDriver::new(sim.l1(), test_signer(), sim.sender(), CancellationToken::new());
        let mut nonces = NonceCounter::new(0);

        let mut action = ProveAction::new(&driver, &strategy, &w, &mut nonces);
        assert!(!action.is_completed().await.unwrap());

        let err = action.execute().await.unwrap_err();
        assert!(matches!(err, WithdrawalError::NotProvableYet { .. }));
        assert!(sim.sent_transactions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reprove_after_invalidated_game() {
        let sim = Simulation::fault_proof();
        sim.add_game(120);
        let w = sim.withdrawal(sim.add_withdrawal(sample_message(1), 100));
        sim.record_proof(&w, 0);
        sim.resolve_game(0, GameStatus::ChallengerWins);
        sim.add_game(130);

        let strategy = sim.fault_proof_strategy();
        let driver = TransactionDriver::new(sim.l1(), test_signer(), sim.sender(), CancellationToken::new());
        let mut nonces = NonceCounter::new(0);
        let mut action = ProveAction::new(&driver, &strategy, &w, &mut nonces);

        // The stale proof does not count as done
        assert!(!action.is_completed().await.unwrap());
        action.execute().await.unwrap();
        assert!(action.is_completed().await.unwrap());
    }
}
