//! Chain Client Adapter.
//!
//! Read access (receipts, headers) and raw transaction submission for one
//! chain. Contract reads live next to the code that interprets them; they
//! report failures through [`ChainError::call`].

use alloy_network::ReceiptResponse;
use alloy_primitives::{Bytes, Log, TxHash, B256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::decode_revert_reason;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// The parts of a transaction receipt the withdrawer inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

/// The parts of a block header the withdrawer inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    pub number: u64,
    pub hash: B256,
    pub state_root: B256,
    pub timestamp: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Transport or node failure
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A contract read failed or reverted
    #[error("{call} failed: {reason}")]
    Call { call: &'static str, reason: String },

    #[error("Block {0} not found")]
    BlockNotFound(String),

    /// The node answered with something that cannot be interpreted
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ChainError {
    pub fn rpc(err: impl fmt::Display) -> Self {
        Self::Rpc(err.to_string())
    }

    /// Wrap a failed contract call, decoding the revert reason when there is one.
    pub fn call(call: &'static str, err: alloy_contract::Error) -> Self {
        let reason = err
            .as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
            .unwrap_or_else(|| err.to_string());
        Self::Call { call, reason }
    }
}

/// Read side of a chain connection.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Receipt for a transaction, `None` while it is not yet visible.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError>;

    async fn header(&self, block: BlockNumberOrTag) -> Result<HeaderInfo, ChainError>;

    async fn latest_header(&self) -> Result<HeaderInfo, ChainError> {
        self.header(BlockNumberOrTag::Latest).await
    }
}

/// Write side of a chain connection.
#[async_trait]
pub trait ChainWriter: ChainReader {
    /// Broadcast a signed, EIP-2718 encoded transaction.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, ChainError>;
}

/// [`ChainReader`] and [`ChainWriter`] over an alloy provider.
#[derive(Debug, Clone)]
pub struct RpcChain<P> {
    provider: P,
}

impl<P> RpcChain<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> ChainReader for RpcChain<P>
where
    P: Provider + Clone,
{
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(ChainError::rpc)?;

        Ok(receipt.map(|receipt| ReceiptInfo {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }))
    }

    async fn header(&self, block: BlockNumberOrTag) -> Result<HeaderInfo, ChainError> {
        let block = self
            .provider
            .get_block_by_number(block)
            .await
            .map_err(ChainError::rpc)?
            .ok_or_else(|| ChainError::BlockNotFound(block.to_string()))?;

        Ok(HeaderInfo {
            number: block.header.number,
            hash: block.header.hash,
            state_root: block.header.state_root,
            timestamp: block.header.timestamp,
        })
    }
}

#[async_trait]
impl<P> ChainWriter for RpcChain<P>
where
    P: Provider + Clone,
{
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(ChainError::rpc)?;
        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_messages() {
        let err = ChainError::Call {
            call: "provenWithdrawals",
            reason: "execution reverted".to_string(),
        };
        assert_eq!(err.to_string(), "provenWithdrawals failed: execution reverted");

        let err = ChainError::BlockNotFound(BlockNumberOrTag::Number(100).to_string());
        assert!(err.to_string().contains("100"));
    }
}
