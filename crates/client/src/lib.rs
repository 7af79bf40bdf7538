//! Chain access for the withdrawer.
//!
//! - [`chain`]: the [`ChainReader`] / [`ChainWriter`] seams and their alloy implementation
//! - [`signer`]: private key, mnemonic and Ledger wallets
//! - [`SignerFn`]: closure that fills fee fields and signs a prepared transaction

pub mod chain;
pub mod signer;

pub use chain::{ChainError, ChainReader, ChainWriter, HeaderInfo, ReceiptInfo, RpcChain};
pub use signer::{create_wallet, SignerMethod, DEFAULT_HD_PATH};

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, Ethereum, EthereumWallet, NetworkWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::TransactionRequest;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// A function that signs a transaction request and returns signed bytes.
///
/// The request must already carry its nonce; fees and gas are filled in here.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Error deriving a key from a mnemonic
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Zero or several signing methods were selected
    #[error("One (and only one) of --private-key, --ledger, --mnemonic must be set")]
    SignerSelection,

    /// Error opening the hardware wallet
    #[error("Ledger error: {0}")]
    Ledger(String),
}

/// Convenience function to create an ethereum rpc provider from url.
///
/// No fillers are installed: nonces come from the run's counter and fees are
/// filled by [`fill_transaction`].
pub fn create_provider(rpc_url: &str) -> Result<RootProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{rpc_url}: {e}")))?;
    let provider = RootProvider::new_http(url);

    Ok(provider)
}

/// Create a SignerFn from a wallet and provider.
///
/// The provider is used to fill gas and fee fields before signing with the
/// wallet's default signer. The nonce is never touched.
pub fn wallet_signer_fn<P>(wallet: EthereumWallet, chain_id: u64, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = NetworkWallet::<Ethereum>::default_signer_address(&wallet);

    Arc::new(move |tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;

            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    })
}

/// Fill fee and gas fields using the provider.
///
/// Fails if the nonce has not been assigned: nonces belong to the run's counter.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    if tx.nonce.is_none() {
        eyre::bail!("transaction nonce must be assigned before signing");
    }

    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    // Fees first, gas estimation may depend on them
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // 20% headroom
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    debug!(
        nonce = tx.nonce,
        gas = tx.gas,
        max_fee_per_gas = tx.max_fee_per_gas,
        "Filled transaction"
    );

    Ok(tx)
}
