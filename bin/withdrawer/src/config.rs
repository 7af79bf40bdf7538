use alloy_primitives::{Address, TxHash};
use clap::{Parser, ValueEnum};
use client::{SignerMethod, DEFAULT_HD_PATH};
use config::{ConfigError, Network, NetworkConfig, NetworkConfigBuilder};
use eyre::WrapErr;
use std::{fmt, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Prove and finalize an OP Stack withdrawal on L1.
///
/// Each run moves the withdrawal one step forward: prove it when an anchor
/// covers it, finalize it once the finalization period has passed.
#[derive(Parser)]
#[command(name = "withdrawer", version)]
pub struct Cli {
    /// L1 RPC endpoint
    #[arg(long, env = "L1_RPC_URL")]
    pub rpc: String,

    /// Network preset
    #[arg(long, default_value = "base-mainnet")]
    pub network: String,

    /// L2 RPC endpoint (custom network)
    #[arg(long)]
    pub l2_rpc: Option<String>,

    /// OptimismPortal address on L1 (custom network)
    #[arg(long)]
    pub portal_address: Option<Address>,

    /// L2OutputOracle address on L1 (custom legacy network)
    #[arg(long)]
    pub l2oo_address: Option<Address>,

    /// DisputeGameFactory address on L1 (custom fault-proof network)
    #[arg(long)]
    pub dgf_address: Option<Address>,

    /// The custom network uses fault proofs
    #[arg(long)]
    pub fault_proofs: bool,

    /// TOML file describing a custom network
    #[arg(long)]
    pub network_file: Option<PathBuf>,

    /// L2 transaction hash that initiated the withdrawal
    #[arg(long)]
    pub withdrawal: TxHash,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// BIP-39 mnemonic for signing transactions
    #[arg(long, env = "MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Derivation path for --mnemonic and --ledger
    #[arg(long, default_value = DEFAULT_HD_PATH)]
    pub hd_path: String,

    /// Sign with a Ledger device
    #[arg(long)]
    pub ledger: bool,

    /// Seconds to wait for each transaction to confirm
    #[arg(long, default_value_t = 300)]
    pub confirmation_timeout: u64,

    /// Wait up to this many seconds for an anchor covering the withdrawal
    #[arg(long)]
    pub wait_for_anchor: Option<u64>,

    /// Prove again when the stored proof's anchor has been invalidated
    #[arg(long)]
    pub reprove: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cli")
            .field("rpc", &self.rpc)
            .field("network", &self.network)
            .field("withdrawal", &self.withdrawal)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// Everything a run needs, validated.
#[derive(Debug)]
pub struct RunConfig {
    pub l1_rpc_url: String,
    /// Preset name, or "custom"
    pub network_name: String,
    pub network: NetworkConfig,
    pub withdrawal: TxHash,
    pub signer: SignerMethod,
    pub confirmation_timeout: Duration,
    pub wait_for_anchor: Option<Duration>,
    pub reprove: bool,
}

impl Cli {
    /// Validate the flags. No chain is contacted.
    pub fn resolve(self) -> eyre::Result<RunConfig> {
        let (network_name, network) = self
            .network_config()
            .wrap_err("invalid network configuration")?;
        let signer = SignerMethod::from_flags(
            self.private_key,
            self.mnemonic,
            self.ledger,
            self.hd_path,
        )?;

        Ok(RunConfig {
            l1_rpc_url: self.rpc,
            network_name,
            network,
            withdrawal: self.withdrawal,
            signer,
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout),
            wait_for_anchor: self.wait_for_anchor.map(Duration::from_secs),
            reprove: self.reprove,
        })
    }

    fn overrides(&self) -> NetworkConfigBuilder {
        let mut builder = NetworkConfigBuilder::default().fault_proofs(self.fault_proofs);
        if let Some(url) = &self.l2_rpc {
            builder = builder.l2_rpc_url(url.as_str());
        }
        if let Some(portal) = self.portal_address {
            builder = builder.portal(portal);
        }
        if let Some(oracle) = self.l2oo_address {
            builder = builder.output_oracle(oracle);
        }
        if let Some(factory) = self.dgf_address {
            builder = builder.dispute_game_factory(factory);
        }
        builder
    }

    /// Preset, network file, or custom overrides; any override flag selects custom.
    pub fn network_config(&self) -> Result<(String, NetworkConfig), ConfigError> {
        let overrides = self.overrides();
        let custom = !overrides.is_empty() || self.fault_proofs;

        match &self.network_file {
            Some(_) if custom => Err(ConfigError::ConflictingFlag {
                flag: "--network-file",
                reason: "cannot be combined with custom network flags",
            }),
            Some(path) => Ok((path.display().to_string(), NetworkConfig::from_file(path)?)),
            None if custom => Ok(("custom".to_string(), overrides.build()?)),
            None => {
                let network: Network = self.network.parse()?;
                Ok((network.to_string(), network.config()))
            }
        }
    }
}
