//! Configuration types for the withdrawer.
//!
//! This crate provides:
//! - Network presets (Base and OP, mainnet and Sepolia)
//! - The finality contract that selects the protocol variant
//! - Custom network overrides and TOML network files

pub mod network;

pub use network::{FinalityContract, Network, NetworkConfig, NetworkConfigBuilder};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown network: {0} (expected one of: {names})", names = Network::names())]
    UnknownNetwork(String),

    #[error("Missing {0} flag")]
    MissingFlag(&'static str),

    #[error("{flag} cannot be used here: {reason}")]
    ConflictingFlag {
        flag: &'static str,
        reason: &'static str,
    },

    #[error("Missing field `{0}` in network file")]
    MissingField(&'static str),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid network file: {0}")]
    Parse(#[from] toml::de::Error),
}
