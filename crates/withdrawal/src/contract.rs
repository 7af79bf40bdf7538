//! L1 contract reads for both finality flavors.
//!
//! [`LegacyContracts`] covers OptimismPortal + L2OutputOracle,
//! [`FaultProofContracts`] covers OptimismPortal2 + DisputeGameFactory.

use crate::types::{
    DisputeGame, GameInfo, GameStatus, OutputProposal, ProofRecord, ProvenAgainst, WithdrawalHash,
};
use alloy_primitives::{hex, Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::decode_revert_reason;
use async_trait::async_trait;
use binding::opstack::{
    IDisputeGameFactory, IFaultDisputeGame, IL2OutputOracle, IOptimismPortal, IOptimismPortal2,
};
use client::ChainError;
use tracing::debug;

/// L2OutputOracle constants used for time-lock gating and wait estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleParams {
    /// L2 blocks between output proposals
    pub submission_interval: u64,
    /// Seconds per L2 block
    pub l2_block_time: u64,
    pub finalization_period: u64,
}

/// Game type the portal accepts proofs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespectedGameType {
    pub game_type: u32,
    /// L1 timestamp of the last change; older games are not accepted
    pub updated_at: u64,
}

/// Outcome of the portal's `checkWithdrawal` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalizability {
    Allowed,
    /// The predicate reverted with this reason
    Rejected(String),
}

#[async_trait]
pub trait LegacyContracts: Send + Sync {
    async fn latest_output(&self) -> Result<Option<OutputProposal>, ChainError>;

    /// Output at `index`, `None` if it does not exist (or was deleted).
    async fn output_at(&self, index: u64) -> Result<Option<OutputProposal>, ChainError>;

    async fn oracle_params(&self) -> Result<OracleParams, ChainError>;

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
    ) -> Result<Option<ProofRecord>, ChainError>;

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError>;
}

#[async_trait]
pub trait FaultProofContracts: Send + Sync {
    async fn respected_game_type(&self) -> Result<RespectedGameType, ChainError>;

    /// Most recently created game of `game_type`.
    async fn latest_game(&self, game_type: u32) -> Result<Option<DisputeGame>, ChainError>;

    async fn game_info(&self, proxy: Address) -> Result<GameInfo, ChainError>;

    async fn is_blacklisted(&self, proxy: Address) -> Result<bool, ChainError>;

    async fn proof_maturity_delay(&self) -> Result<u64, ChainError>;

    /// Proof stored for `(hash, submitter)`; other submitters' proofs are invisible.
    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Option<ProofRecord>, ChainError>;

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError>;

    async fn check_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Finalizability, ChainError>;
}

fn to_u64(value: U256, what: &str) -> Result<u64, ChainError> {
    value
        .try_into()
        .map_err(|_| ChainError::Unexpected(format!("{what} does not fit in u64: {value}")))
}

fn u128_to_u64(value: u128, what: &str) -> Result<u64, ChainError> {
    u64::try_from(value)
        .map_err(|_| ChainError::Unexpected(format!("{what} does not fit in u64: {value}")))
}

/// [`LegacyContracts`] over an L1 provider.
#[derive(Debug, Clone)]
pub struct RpcLegacyContracts<P> {
    provider: P,
    portal: Address,
    oracle: Address,
}

impl<P> RpcLegacyContracts<P> {
    pub const fn new(provider: P, portal: Address, oracle: Address) -> Self {
        Self {
            provider,
            portal,
            oracle,
        }
    }
}

#[async_trait]
impl<P> LegacyContracts for RpcLegacyContracts<P>
where
    P: Provider + Clone,
{
    async fn latest_output(&self) -> Result<Option<OutputProposal>, ChainError> {
        let oracle = IL2OutputOracle::new(self.oracle, &self.provider);
        let next = oracle
            .nextOutputIndex()
            .call()
            .await
            .map_err(|e| ChainError::call("nextOutputIndex", e))?;

        if next.is_zero() {
            return Ok(None);
        }
        self.output_at(to_u64(next - U256::from(1), "output index")?)
            .await
    }

    async fn output_at(&self, index: u64) -> Result<Option<OutputProposal>, ChainError> {
        let oracle = IL2OutputOracle::new(self.oracle, &self.provider);

        // Reading past the end reverts; deleted outputs shrink the array
        let next = oracle
            .nextOutputIndex()
            .call()
            .await
            .map_err(|e| ChainError::call("nextOutputIndex", e))?;
        if U256::from(index) >= next {
            return Ok(None);
        }

        let output = oracle
            .getL2Output(U256::from(index))
            .call()
            .await
            .map_err(|e| ChainError::call("getL2Output", e))?;

        Ok(Some(OutputProposal {
            index,
            l2_block: u128_to_u64(output.l2BlockNumber, "output L2 block")?,
            root: output.outputRoot,
            timestamp: u128_to_u64(output.timestamp, "output timestamp")?,
        }))
    }

    async fn oracle_params(&self) -> Result<OracleParams, ChainError> {
        let oracle = IL2OutputOracle::new(self.oracle, &self.provider);
        let submission_interval = oracle
            .SUBMISSION_INTERVAL()
            .call()
            .await
            .map_err(|e| ChainError::call("SUBMISSION_INTERVAL", e))?;
        let l2_block_time = oracle
            .L2_BLOCK_TIME()
            .call()
            .await
            .map_err(|e| ChainError::call("L2_BLOCK_TIME", e))?;
        let finalization_period = oracle
            .FINALIZATION_PERIOD_SECONDS()
            .call()
            .await
            .map_err(|e| ChainError::call("FINALIZATION_PERIOD_SECONDS", e))?;

        Ok(OracleParams {
            submission_interval: to_u64(submission_interval, "SUBMISSION_INTERVAL")?,
            l2_block_time: to_u64(l2_block_time, "L2_BLOCK_TIME")?,
            finalization_period: to_u64(finalization_period, "FINALIZATION_PERIOD_SECONDS")?,
        })
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
    ) -> Result<Option<ProofRecord>, ChainError> {
        let portal = IOptimismPortal::new(self.portal, &self.provider);
        let proven = portal
            .provenWithdrawals(hash)
            .call()
            .await
            .map_err(|e| ChainError::call("provenWithdrawals", e))?;

        if proven.timestamp == 0 {
            return Ok(None);
        }

        Ok(Some(ProofRecord {
            submitter: None,
            anchor: ProvenAgainst::Output {
                index: u128_to_u64(proven.l2OutputIndex, "output index")?,
                root: proven.outputRoot,
            },
            timestamp: u128_to_u64(proven.timestamp, "proof timestamp")?,
        }))
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        let portal = IOptimismPortal::new(self.portal, &self.provider);
        portal
            .finalizedWithdrawals(hash)
            .call()
            .await
            .map_err(|e| ChainError::call("finalizedWithdrawals", e))
    }
}

/// [`FaultProofContracts`] over an L1 provider.
#[derive(Debug, Clone)]
pub struct RpcFaultProofContracts<P> {
    provider: P,
    portal: Address,
    factory: Address,
}

impl<P> RpcFaultProofContracts<P> {
    pub const fn new(provider: P, portal: Address, factory: Address) -> Self {
        Self {
            provider,
            portal,
            factory,
        }
    }
}

#[async_trait]
impl<P> FaultProofContracts for RpcFaultProofContracts<P>
where
    P: Provider + Clone,
{
    async fn respected_game_type(&self) -> Result<RespectedGameType, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        let game_type = portal
            .respectedGameType()
            .call()
            .await
            .map_err(|e| ChainError::call("respectedGameType", e))?;
        let updated_at = portal
            .respectedGameTypeUpdatedAt()
            .call()
            .await
            .map_err(|e| ChainError::call("respectedGameTypeUpdatedAt", e))?;

        Ok(RespectedGameType {
            game_type,
            updated_at,
        })
    }

    async fn latest_game(&self, game_type: u32) -> Result<Option<DisputeGame>, ChainError> {
        let factory = IDisputeGameFactory::new(self.factory, &self.provider);
        let game_count = factory
            .gameCount()
            .call()
            .await
            .map_err(|e| ChainError::call("gameCount", e))?;
        if game_count.is_zero() {
            return Ok(None);
        }

        let games = factory
            .findLatestGames(game_type, game_count - U256::from(1), U256::from(1))
            .call()
            .await
            .map_err(|e| ChainError::call("findLatestGames", e))?;
        let Some(game) = games.first() else {
            return Ok(None);
        };

        // GameId packs type (32 bits) | timestamp (64 bits) | proxy (160 bits)
        let proxy = Address::from_slice(&game.metadata[12..32]);

        // extraData starts with the disputed L2 block number
        let l2_block = game
            .extraData
            .get(..32)
            .map(U256::from_be_slice)
            .ok_or_else(|| {
                ChainError::Unexpected(format!(
                    "game {} extraData too short: 0x{}",
                    game.index,
                    hex::encode(&game.extraData)
                ))
            })?;

        let game = DisputeGame {
            index: to_u64(game.index, "game index")?,
            proxy,
            game_type,
            l2_block: to_u64(l2_block, "game L2 block")?,
            root: game.rootClaim,
            created_at: game.timestamp,
        };
        debug!(
            game_index = game.index,
            game_l2_block = game.l2_block,
            %proxy,
            "Found latest dispute game"
        );
        Ok(Some(game))
    }

    async fn game_info(&self, proxy: Address) -> Result<GameInfo, ChainError> {
        let game = IFaultDisputeGame::new(proxy, &self.provider);
        let status = game
            .status()
            .call()
            .await
            .map_err(|e| ChainError::call("status", e))?;
        let game_type = game
            .gameType()
            .call()
            .await
            .map_err(|e| ChainError::call("gameType", e))?;
        let created_at = game
            .createdAt()
            .call()
            .await
            .map_err(|e| ChainError::call("createdAt", e))?;
        let l2_block = game
            .l2BlockNumber()
            .call()
            .await
            .map_err(|e| ChainError::call("l2BlockNumber", e))?;

        Ok(GameInfo {
            proxy,
            game_type,
            status: GameStatus::try_from(status)
                .map_err(|s| ChainError::Unexpected(format!("unknown game status {s}")))?,
            created_at,
            l2_block: to_u64(l2_block, "game L2 block")?,
        })
    }

    async fn is_blacklisted(&self, proxy: Address) -> Result<bool, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        portal
            .disputeGameBlacklist(proxy)
            .call()
            .await
            .map_err(|e| ChainError::call("disputeGameBlacklist", e))
    }

    async fn proof_maturity_delay(&self) -> Result<u64, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        let delay = portal
            .proofMaturityDelaySeconds()
            .call()
            .await
            .map_err(|e| ChainError::call("proofMaturityDelaySeconds", e))?;
        to_u64(delay, "proofMaturityDelaySeconds")
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Option<ProofRecord>, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        let proven = portal
            .provenWithdrawals(hash, submitter)
            .call()
            .await
            .map_err(|e| ChainError::call("provenWithdrawals", e))?;

        if proven.timestamp == 0 {
            return Ok(None);
        }

        Ok(Some(ProofRecord {
            submitter: Some(submitter),
            anchor: ProvenAgainst::Game {
                proxy: proven.disputeGameProxy,
            },
            timestamp: proven.timestamp,
        }))
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        portal
            .finalizedWithdrawals(hash)
            .call()
            .await
            .map_err(|e| ChainError::call("finalizedWithdrawals", e))
    }

    async fn check_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Finalizability, ChainError> {
        let portal = IOptimismPortal2::new(self.portal, &self.provider);
        match portal.checkWithdrawal(hash, submitter).call().await {
            Ok(_) => Ok(Finalizability::Allowed),
            Err(err) => match err.as_revert_data() {
                Some(data) => {
                    let reason = decode_revert_reason(&data)
                        .unwrap_or_else(|| format!("reverted with 0x{}", hex::encode(&data)));
                    Ok(Finalizability::Rejected(reason))
                }
                None => Err(ChainError::call("checkWithdrawal", err)),
            },
        }
    }
}
