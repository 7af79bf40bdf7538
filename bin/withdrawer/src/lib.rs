//! Advance one withdrawal a single step.

pub mod config;

use action::{Action, Confirmation, FinalizeAction, ProveAction, TransactionDriver};
use alloy_primitives::TxHash;
use client::{ChainReader, ChainWriter};
use eyre::WrapErr;
use std::{fmt, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use withdrawal::{
    format_duration, Classification, NonceCounter, ProtocolStrategy, Withdrawal,
    WithdrawalClassifier, WithdrawalError, WithdrawalState, ANCHOR_POLL_INTERVAL,
};

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    AlreadyFinalized,
    /// Prove transaction confirmed.
    Proven {
        confirmation: Confirmation,
        ready_at: Option<u64>,
        remaining: Option<Duration>,
    },
    /// Proven earlier, finalization period still running.
    WaitingForTimeLock { ready_at: u64, remaining: Duration },
    Finalized { confirmation: Confirmation },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyFinalized => f.write_str("Withdrawal is already finalized, nothing to do"),
            Self::Proven {
                confirmation,
                ready_at,
                remaining,
            } => {
                write!(f, "Withdrawal proven in {}", confirmation.tx_hash)?;
                match (ready_at, remaining) {
                    (Some(ready_at), Some(remaining)) => write!(
                        f,
                        "; finalize in ~{} (after timestamp {ready_at})",
                        format_duration(*remaining)
                    ),
                    _ => f.write_str("; run again to finalize"),
                }
            }
            Self::WaitingForTimeLock {
                ready_at,
                remaining,
            } => write!(
                f,
                "Withdrawal is proven; finalization period ends in {} (after timestamp {ready_at})",
                format_duration(*remaining)
            ),
            Self::Finalized { confirmation } => {
                write!(f, "Withdrawal finalized in {}", confirmation.tx_hash)
            }
        }
    }
}

/// Runs the classify, prove or finalize sequence for one withdrawal.
///
/// Owns the run's nonce counter; the driver's sender is also the proof
/// submitter used for classification.
pub struct Withdrawer<'a, L1, L2: ?Sized, S: ?Sized> {
    driver: &'a TransactionDriver<L1>,
    l2: &'a L2,
    strategy: &'a S,
    nonces: NonceCounter,
    wait_for_anchor: Option<Duration>,
    reprove: bool,
    cancel: CancellationToken,
}

impl<'a, L1, L2, S> Withdrawer<'a, L1, L2, S>
where
    L1: ChainWriter,
    L2: ChainReader + ?Sized,
    S: ProtocolStrategy + ?Sized,
{
    pub fn new(
        driver: &'a TransactionDriver<L1>,
        l2: &'a L2,
        strategy: &'a S,
        nonces: NonceCounter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            driver,
            l2,
            strategy,
            nonces,
            wait_for_anchor: None,
            reprove: false,
            cancel,
        }
    }

    /// Wait up to `wait` for a covering anchor instead of failing right away.
    pub fn with_anchor_wait(mut self, wait: Option<Duration>) -> Self {
        self.wait_for_anchor = wait;
        self
    }

    /// Prove again when the stored proof's anchor has been invalidated.
    pub fn with_reprove(mut self, reprove: bool) -> Self {
        self.reprove = reprove;
        self
    }

    pub const fn nonces(&self) -> NonceCounter {
        self.nonces
    }

    fn classifier(&self) -> WithdrawalClassifier<'a, L1, L2, S> {
        WithdrawalClassifier::new(
            self.driver.chain(),
            self.l2,
            self.strategy,
            self.driver.from(),
        )
    }

    /// Classify the withdrawal and take the one action its state allows.
    pub async fn advance(&mut self, tx_hash: TxHash) -> eyre::Result<Outcome> {
        let Classification { withdrawal, state } = self
            .classifier()
            .classify(tx_hash)
            .await
            .wrap_err("classifying withdrawal")?;

        info!(
            %tx_hash,
            withdrawal_hash = %withdrawal.hash,
            l2_block = withdrawal.l2_block,
            variant = %self.strategy.variant(),
            "Withdrawal is {state}"
        );

        match state {
            WithdrawalState::Finalized => Ok(Outcome::AlreadyFinalized),
            WithdrawalState::NotYetProvable {
                withdrawal_block,
                anchor_block,
                estimated_wait,
            } => {
                let Some(wait) = self.wait_for_anchor else {
                    return Err(WithdrawalError::NotProvableYet {
                        withdrawal_block,
                        anchor_block,
                        estimated_wait,
                    })
                    .wrap_err("classifying withdrawal");
                };
                self.classifier()
                    .wait_until_provable(
                        &withdrawal,
                        ANCHOR_POLL_INTERVAL,
                        Instant::now() + wait,
                        &self.cancel,
                    )
                    .await
                    .wrap_err("waiting for an anchor")?;
                self.prove(&withdrawal).await
            }
            WithdrawalState::ProvableUnproven { .. } => self.prove(&withdrawal).await,
            WithdrawalState::ProofInvalidated { reason, .. } if self.reprove => {
                warn!(%reason, "Stored proof is invalid, proving again");
                self.prove(&withdrawal).await
            }
            WithdrawalState::ProofInvalidated { reason, .. } => {
                warn!("Run again with --reprove to prove against a new anchor");
                Err(WithdrawalError::ProofInvalidated {
                    hash: withdrawal.hash,
                    reason,
                })
                .wrap_err("classifying withdrawal")
            }
            WithdrawalState::ProvenWaitingTimeLock {
                ready_at,
                remaining,
                ..
            } => Ok(Outcome::WaitingForTimeLock { ready_at, remaining }),
            WithdrawalState::ReadyToFinalize { .. } => self.finalize(&withdrawal).await,
        }
    }

    async fn prove(&mut self, withdrawal: &Withdrawal) -> eyre::Result<Outcome> {
        let mut action = ProveAction::new(self.driver, self.strategy, withdrawal, &mut self.nonces);
        let Some(confirmation) = run(&mut action, "proving withdrawal").await? else {
            // Proven elsewhere since classification
            return match self.classifier().classify_withdrawal(withdrawal).await {
                Ok(WithdrawalState::Finalized) => Ok(Outcome::AlreadyFinalized),
                Ok(WithdrawalState::ProvenWaitingTimeLock {
                    ready_at,
                    remaining,
                    ..
                }) => Ok(Outcome::WaitingForTimeLock { ready_at, remaining }),
                Ok(WithdrawalState::ReadyToFinalize { .. }) => self.finalize(withdrawal).await,
                Ok(state) => Err(eyre::eyre!("unexpected state after proving: {state}")),
                Err(err) => Err(eyre::Report::new(err).wrap_err("classifying withdrawal")),
            };
        };

        // Report the time lock of the proof just recorded
        let (ready_at, remaining) = match self.classifier().classify_withdrawal(withdrawal).await {
            Ok(WithdrawalState::ProvenWaitingTimeLock {
                ready_at,
                remaining,
                ..
            }) => (Some(ready_at), Some(remaining)),
            Ok(state) => {
                warn!(%state, "Unexpected state after proving");
                (None, None)
            }
            Err(err) => {
                warn!(error = %err, "Could not classify withdrawal after proving");
                (None, None)
            }
        };

        Ok(Outcome::Proven {
            confirmation,
            ready_at,
            remaining,
        })
    }

    async fn finalize(&mut self, withdrawal: &Withdrawal) -> eyre::Result<Outcome> {
        let mut action =
            FinalizeAction::new(self.driver, self.strategy, withdrawal, &mut self.nonces);
        Ok(match run(&mut action, "finalizing withdrawal").await? {
            Some(confirmation) => Outcome::Finalized { confirmation },
            None => Outcome::AlreadyFinalized,
        })
    }
}

/// Execute `action` unless it is already done; `None` means it was skipped.
async fn run<A: Action>(action: &mut A, stage: &'static str) -> eyre::Result<Option<Confirmation>> {
    if action
        .is_completed()
        .await
        .map_err(|err| stage_error(err, stage))?
    {
        info!("Skipping, already done: {}", action.description());
        return Ok(None);
    }

    info!("{}", action.description());
    action
        .execute()
        .await
        .map(Some)
        .map_err(|err| stage_error(err, stage))
}

/// Attach the failing stage; failures after broadcast belong to confirming.
fn stage_error(err: WithdrawalError, stage: &'static str) -> eyre::Report {
    let stage = match err {
        WithdrawalError::TransactionReverted(_)
        | WithdrawalError::ConfirmationTimeout { .. }
        | WithdrawalError::Cancelled(_) => "confirming transaction",
        _ => stage,
    };
    eyre::Report::new(err).wrap_err(stage)
}
