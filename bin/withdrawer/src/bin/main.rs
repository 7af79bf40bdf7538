use action::TransactionDriver;
use alloy_provider::Provider;
use clap::Parser;
use client::RpcChain;
use config::FinalityContract;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use withdrawal::{
    contract::{RpcFaultProofContracts, RpcLegacyContracts},
    FaultProofStrategy, LegacyStrategy, NonceCounter, ProtocolStrategy, RpcProofProvider,
};
use withdrawer::{
    config::{Cli, LogFormat},
    Withdrawer,
};

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.resolve()?;
    info!(
        network = %config.network_name,
        l2_rpc = %config.network.l2_rpc_url,
        portal = %config.network.portal,
        finality = %config.network.finality.address(),
        fault_proofs = config.network.finality.is_fault_proof(),
        withdrawal = %config.withdrawal,
        "Loaded config"
    );

    let l1_provider = client::create_provider(&config.l1_rpc_url)?;
    let l2_provider = client::create_provider(&config.network.l2_rpc_url)?;

    let chain_id = l1_provider.get_chain_id().await?;
    let (wallet, from) = client::create_wallet(&config.signer, chain_id).await?;
    let signer = client::wallet_signer_fn(wallet, chain_id, l1_provider.clone());
    let nonce = l1_provider.get_transaction_count(from).pending().await?;
    info!(chain_id, %from, nonce, "Connected to L1");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            on_signal.cancel();
        }
    });

    let portal = config.network.portal;
    let proofs = RpcProofProvider::new(l2_provider.clone());
    let strategy: Box<dyn ProtocolStrategy> = match config.network.finality {
        FinalityContract::OutputOracle(oracle) => Box::new(LegacyStrategy::new(
            portal,
            RpcLegacyContracts::new(l1_provider.clone(), portal, oracle),
            proofs,
        )),
        FinalityContract::DisputeGameFactory(factory) => Box::new(FaultProofStrategy::new(
            portal,
            RpcFaultProofContracts::new(l1_provider.clone(), portal, factory),
            proofs,
        )),
    };

    let driver = TransactionDriver::new(RpcChain::new(l1_provider), signer, from, cancel.clone())
        .with_timeout(config.confirmation_timeout);
    let l2 = RpcChain::new(l2_provider);

    let outcome = Withdrawer::new(
        &driver,
        &l2,
        strategy.as_ref(),
        NonceCounter::new(nonce),
        cancel,
    )
    .with_anchor_wait(config.wait_for_anchor)
    .with_reprove(config.reprove)
    .advance(config.withdrawal)
    .await?;

    info!("{outcome}");
    Ok(())
}
