//! Finalize withdrawal action.
//!
//! Finalizes a proven withdrawal on L1, executing the withdrawal transaction
//! and releasing the funds to the target.

use crate::{Action, Confirmation, TransactionDriver};
use client::ChainWriter;
use tracing::info;
use withdrawal::{NonceCounter, ProtocolStrategy, Withdrawal, WithdrawalError};

/// Action to finalize a proven withdrawal.
///
/// On fault-proof chains the driver's sender must be the address that proved.
pub struct FinalizeAction<'a, C, S: ?Sized> {
    driver: &'a TransactionDriver<C>,
    strategy: &'a S,
    withdrawal: &'a Withdrawal,
    nonces: &'a mut NonceCounter,
}

impl<'a, C, S> FinalizeAction<'a, C, S>
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

    /// Timestamp of the latest L1 block.
    async fn l1_time(&self) -> Result<u64, WithdrawalError> {
        Ok(self.driver.chain().latest_header().await?.timestamp)
    }
}

impl<C, S> Action for FinalizeAction<'_, C, S>
where
    C: ChainWriter,
    S: ProtocolStrategy + ?Sized,
{
    async fn is_completed(&self) -> Result<bool, WithdrawalError> {
        self.strategy.is_finalized(self.withdrawal.hash).await
    }

    async fn execute(&mut self) -> Result<Confirmation, WithdrawalError> {
        let now = self.l1_time().await?;
        let request = self
            .strategy
            .build_finalize_transaction(self.withdrawal, self.driver.from(), now)
            .await?;

        info!(
            withdrawal_hash = %self.withdrawal.hash,
            proof_submitter = %self.driver.from(),
            "Finalizing withdrawal"
        );
        let confirmation = self.driver.submit_and_confirm(request, self.nonces).await?;

        info!(
            tx_hash = %confirmation.tx_hash,
            withdrawal_hash = %self.withdrawal.hash,
            "Withdrawal finalized on L1"
        );
        Ok(confirmation)
    }

    fn description(&self) -> String {
        format!("Finalizing withdrawal {} on L1", self.withdrawal.hash)
    }
}
