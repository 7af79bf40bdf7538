//! Transaction confirmation driver.
//!
//! Signs and broadcasts an L1 transaction, then polls for its receipt until it
//! lands, the deadline passes, or the run is cancelled.

use alloy_primitives::{Address, TxHash};
use alloy_rpc_types_eth::TransactionRequest;
use client::{ChainError, ChainWriter, SignerFn};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use withdrawal::{poll_until, NonceCounter, PollError, WithdrawalError};

pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// A transaction included with success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

pub struct TransactionDriver<C> {
    chain: C,
    signer: SignerFn,
    from: Address,
    poll_interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<C: ChainWriter> TransactionDriver<C> {
    /// `signer` must sign for `from`.
    pub fn new(chain: C, signer: SignerFn, from: Address, cancel: CancellationToken) -> Self {
        Self {
            chain,
            signer,
            from,
            poll_interval: RECEIPT_POLL_INTERVAL,
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            cancel,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn chain(&self) -> &C {
        &self.chain
    }

    /// Address every transaction is sent from.
    pub const fn from(&self) -> Address {
        self.from
    }

    /// Sign `request` with `nonce` and broadcast it.
    ///
    /// A request that names a different sender is refused before signing.
    pub async fn submit(
        &self,
        mut request: TransactionRequest,
        nonce: u64,
    ) -> Result<TxHash, WithdrawalError> {
        if let Some(actual) = request.from.filter(|from| *from != self.from) {
            return Err(WithdrawalError::SenderMismatch {
                expected: self.from,
                actual,
            });
        }
        request.from = Some(self.from);
        request.nonce = Some(nonce);

        let raw = (self.signer)(request)
            .await
            .map_err(|e| WithdrawalError::Signing(format!("{e:#}")))?;
        let tx_hash = self.chain.send_raw_transaction(raw).await?;

        info!(%tx_hash, nonce, from = %self.from, "Transaction submitted");
        Ok(tx_hash)
    }

    /// Poll for the receipt of `tx_hash` until `deadline`.
    ///
    /// A missing receipt keeps the poll going; any lookup error ends it.
    pub async fn confirm(
        &self,
        tx_hash: TxHash,
        deadline: Instant,
    ) -> Result<Confirmation, WithdrawalError> {
        let timeout = deadline.saturating_duration_since(Instant::now());

        let result = poll_until(self.poll_interval, deadline, &self.cancel, move || async move {
            let receipt = self.chain.receipt(tx_hash).await?;
            if receipt.is_none() {
                info!(%tx_hash, "waiting for tx confirmation");
            }
            Ok::<_, ChainError>(receipt)
        })
        .await;

        match result {
            Ok(receipt) if receipt.success => {
                info!(
                    %tx_hash,
                    block_number = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Transaction confirmed"
                );
                Ok(Confirmation {
                    tx_hash,
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                })
            }
            Ok(_) => Err(WithdrawalError::TransactionReverted(tx_hash)),
            Err(PollError::TimedOut) => Err(WithdrawalError::ConfirmationTimeout { tx_hash, timeout }),
            Err(PollError::Cancelled) => Err(WithdrawalError::Cancelled(format!(
                "confirmation of {tx_hash}"
            ))),
            Err(PollError::Failed(err)) => Err(err.into()),
        }
    }

    /// Submit with the run's next nonce and wait up to the configured timeout.
    ///
    /// The nonce is consumed once the node accepted the transaction, even if
    /// it later reverts or times out.
    pub async fn submit_and_confirm(
        &self,
        request: TransactionRequest,
        nonces: &mut NonceCounter,
    ) -> Result<Confirmation, WithdrawalError> {
        let tx_hash = self.submit(request, nonces.current()).await?;
        nonces.advance();
        self.confirm(tx_hash, Instant::now() + self.timeout).await
    }
}
