//! Network configuration for withdrawals.
//!
//! Provides the L2 endpoint and L1 contract addresses for the supported OP Stack
//! networks, plus a builder for custom deployments.

use crate::ConfigError;
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, path::Path, str::FromStr};

/// Named network presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    BaseMainnet,
    BaseSepolia,
    OpMainnet,
    OpSepolia,
}

impl Network {
    /// Every preset, in display order.
    pub const ALL: [Self; 4] = [
        Self::BaseMainnet,
        Self::BaseSepolia,
        Self::OpMainnet,
        Self::OpSepolia,
    ];

    /// CLI name of the preset.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BaseMainnet => "base-mainnet",
            Self::BaseSepolia => "base-sepolia",
            Self::OpMainnet => "op-mainnet",
            Self::OpSepolia => "op-sepolia",
        }
    }

    /// Configuration bundled with the preset.
    pub const fn config(self) -> NetworkConfig {
        match self {
            Self::BaseMainnet => NetworkConfig::base_mainnet(),
            Self::BaseSepolia => NetworkConfig::base_sepolia(),
            Self::OpMainnet => NetworkConfig::op_mainnet(),
            Self::OpSepolia => NetworkConfig::op_sepolia(),
        }
    }

    /// Comma separated list of preset names, for help and error messages.
    pub fn names() -> String {
        Self::ALL.map(Self::name).join(", ")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|network| network.name() == s)
            .ok_or_else(|| ConfigError::UnknownNetwork(s.to_string()))
    }
}

/// L1 contract that anchors L2 state, which also selects the protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalityContract {
    /// L2OutputOracle: a single proposer publishes output roots.
    OutputOracle(Address),
    /// DisputeGameFactory: output roots are claims in dispute games.
    DisputeGameFactory(Address),
}

impl FinalityContract {
    pub const fn address(&self) -> Address {
        match self {
            Self::OutputOracle(address) | Self::DisputeGameFactory(address) => *address,
        }
    }

    pub const fn is_fault_proof(&self) -> bool {
        matches!(self, Self::DisputeGameFactory(_))
    }
}

/// Complete network configuration for a withdrawal run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// L2 JSON-RPC endpoint
    pub l2_rpc_url: Cow<'static, str>,
    /// OptimismPortal (legacy) or OptimismPortal2 (fault proofs) on L1
    pub portal: Address,
    /// Finality anchor contract on L1
    pub finality: FinalityContract,
}

impl NetworkConfig {
    /// Base mainnet configuration.
    pub const fn base_mainnet() -> Self {
        Self {
            l2_rpc_url: Cow::Borrowed("https://mainnet.base.org"),
            // https://etherscan.io/address/0x49048044D57e1C92A77f79988d21Fa8fAF74E97e
            portal: address!("0x49048044d57e1c92a77f79988d21fa8faf74e97e"),
            finality: FinalityContract::DisputeGameFactory(address!(
                "0x43edb88c4b80fdd2adff2412a7bebf9df42cb40e"
            )),
        }
    }

    /// Base Sepolia testnet configuration.
    pub const fn base_sepolia() -> Self {
        Self {
            l2_rpc_url: Cow::Borrowed("https://sepolia.base.org"),
            portal: address!("0x49f53e41452c74589e85ca1677426ba426459e85"),
            finality: FinalityContract::DisputeGameFactory(address!(
                "0xd6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1"
            )),
        }
    }

    /// OP mainnet configuration.
    pub const fn op_mainnet() -> Self {
        Self {
            l2_rpc_url: Cow::Borrowed("https://mainnet.optimism.io"),
            portal: address!("0xbeb5fc579115071764c7423a4f12edde41f106ed"),
            finality: FinalityContract::DisputeGameFactory(address!(
                "0xe5965ab5962edc7477c8520243a95517cd252fa9"
            )),
        }
    }

    /// OP Sepolia testnet configuration.
    pub const fn op_sepolia() -> Self {
        Self {
            l2_rpc_url: Cow::Borrowed("https://sepolia.optimism.io"),
            portal: address!("0x16fc5058f25648194471939df75cf27a2fdc48bc"),
            finality: FinalityContract::DisputeGameFactory(address!(
                "0x05f9613adb30026ffd634f38e5c4dfd30a197fa1"
            )),
        }
    }

    /// Load a custom network from a TOML file.
    ///
    /// ```toml
    /// l2_rpc_url = "http://localhost:9545"
    /// portal = "0x..."
    /// finality = { output_oracle = "0x..." }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse a custom network from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        if config.l2_rpc_url.is_empty() {
            return Err(ConfigError::MissingField("l2_rpc_url"));
        }
        Ok(config)
    }
}

/// Builder for custom network configurations assembled from override flags.
///
/// The protocol variant is chosen explicitly with [`Self::fault_proofs`]; the
/// matching anchor address must be present and the other must be absent.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfigBuilder {
    l2_rpc_url: Option<String>,
    portal: Option<Address>,
    output_oracle: Option<Address>,
    dispute_game_factory: Option<Address>,
    fault_proofs: bool,
}

impl NetworkConfigBuilder {
    /// Set the L2 RPC endpoint.
    pub fn l2_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.l2_rpc_url = Some(url.into());
        self
    }

    /// Set the portal address.
    pub const fn portal(mut self, address: Address) -> Self {
        self.portal = Some(address);
        self
    }

    /// Set the L2OutputOracle address (legacy chains).
    pub const fn output_oracle(mut self, address: Address) -> Self {
        self.output_oracle = Some(address);
        self
    }

    /// Set the DisputeGameFactory address (fault-proof chains).
    pub const fn dispute_game_factory(mut self, address: Address) -> Self {
        self.dispute_game_factory = Some(address);
        self
    }

    /// Select the fault-proof variant.
    pub const fn fault_proofs(mut self, enabled: bool) -> Self {
        self.fault_proofs = enabled;
        self
    }

    /// True when no override has been supplied.
    pub const fn is_empty(&self) -> bool {
        self.l2_rpc_url.is_none()
            && self.portal.is_none()
            && self.output_oracle.is_none()
            && self.dispute_game_factory.is_none()
    }

    /// Validate the overrides and build the network configuration.
    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        let l2_rpc_url = self.l2_rpc_url.ok_or(ConfigError::MissingFlag("--l2-rpc"))?;
        let portal = self
            .portal
            .ok_or(ConfigError::MissingFlag("--portal-address"))?;

        let finality = if self.fault_proofs {
            if self.output_oracle.is_some() {
                return Err(ConfigError::ConflictingFlag {
                    flag: "--l2oo-address",
                    reason: "fault-proof networks are anchored by a DisputeGameFactory",
                });
            }
            FinalityContract::DisputeGameFactory(
                self.dispute_game_factory
                    .ok_or(ConfigError::MissingFlag("--dgf-address"))?,
            )
        } else {
            if self.dispute_game_factory.is_some() {
                return Err(ConfigError::ConflictingFlag {
                    flag: "--dgf-address",
                    reason: "requires --fault-proofs",
                });
            }
            FinalityContract::OutputOracle(
                self.output_oracle
                    .ok_or(ConfigError::MissingFlag("--l2oo-address"))?,
            )
        };

        Ok(NetworkConfig {
            l2_rpc_url: Cow::Owned(l2_rpc_url),
            portal,
            finality,
        })
    }
}
