//! Contract bindings for the OP Stack withdrawal contracts.
//!
//! Covers both L1 finality flavors:
//! - output-oracle chains (OptimismPortal, L2OutputOracle)
//! - fault-proof chains (OptimismPortal2, DisputeGameFactory, FaultDisputeGame)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod opstack;
