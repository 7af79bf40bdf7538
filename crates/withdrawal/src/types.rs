use crate::{hash::compute_withdrawal_hash, WithdrawalError};
use alloy_primitives::{Address, TxHash, B256};
use alloy_sol_types::SolEvent;
use binding::opstack::{
    IL2ToL1MessagePasser::MessagePassed, WithdrawalTransaction, MESSAGE_PASSER_ADDRESS,
};
use client::ReceiptInfo;
use std::{fmt, time::Duration};

pub type WithdrawalHash = B256;

/// A withdrawal initiated on L2, as recorded by its `MessagePassed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    /// L2 transaction that initiated the withdrawal
    pub tx_hash: TxHash,
    /// L2 block the transaction was included in
    pub l2_block: u64,
    /// Message fields, in the form the portal expects them
    pub transaction: WithdrawalTransaction,
    /// Fingerprint correlating L2 and L1 state
    pub hash: WithdrawalHash,
}

impl Withdrawal {
    /// Parse the withdrawal out of its L2 receipt.
    ///
    /// Only `MessagePassed` logs emitted by the message passer predeploy count.
    /// The fingerprint is recomputed from the message fields and must match the
    /// one the event carries.
    pub fn from_receipt(receipt: &ReceiptInfo) -> Result<Self, WithdrawalError> {
        if !receipt.success {
            return Err(WithdrawalError::ExecutionFailed(receipt.tx_hash));
        }

        let malformed = |reason: String| WithdrawalError::MalformedWithdrawal {
            tx_hash: receipt.tx_hash,
            reason,
        };

        let log = receipt
            .logs
            .iter()
            .find(|log| {
                log.address == MESSAGE_PASSER_ADDRESS
                    && log.topics().first() == Some(&MessagePassed::SIGNATURE_HASH)
            })
            .ok_or_else(|| malformed("no MessagePassed event in receipt".to_string()))?;

        let event = MessagePassed::decode_log(log)
            .map_err(|e| malformed(format!("cannot decode MessagePassed: {e}")))?
            .data;

        let l2_block = receipt
            .block_number
            .ok_or_else(|| malformed("receipt has no block number".to_string()))?;

        let transaction = WithdrawalTransaction {
            nonce: event.nonce,
            sender: event.sender,
            target: event.target,
            value: event.value,
            gasLimit: event.gasLimit,
            data: event.data,
        };

        let hash = compute_withdrawal_hash(&transaction);
        if hash != event.withdrawalHash {
            return Err(malformed(format!(
                "withdrawal hash mismatch: event has {}, computed {hash}",
                event.withdrawalHash
            )));
        }

        Ok(Self {
            tx_hash: receipt.tx_hash,
            l2_block,
            transaction,
            hash,
        })
    }
}

/// An output root proposed to the L2OutputOracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputProposal {
    pub index: u64,
    pub l2_block: u64,
    pub root: B256,
    pub timestamp: u64,
}

/// A dispute game created by the DisputeGameFactory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisputeGame {
    pub index: u64,
    pub proxy: Address,
    pub game_type: u32,
    pub l2_block: u64,
    pub root: B256,
    pub created_at: u64,
}

/// An L1 claim about L2 state that withdrawals are proven against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Output(OutputProposal),
    Game(DisputeGame),
}

impl Anchor {
    /// Output index (legacy) or game index (fault proofs) passed to the portal.
    pub const fn index(&self) -> u64 {
        match self {
            Self::Output(output) => output.index,
            Self::Game(game) => game.index,
        }
    }

    pub const fn l2_block(&self) -> u64 {
        match self {
            Self::Output(output) => output.l2_block,
            Self::Game(game) => game.l2_block,
        }
    }

    /// Output root the anchor commits to.
    pub const fn root(&self) -> B256 {
        match self {
            Self::Output(output) => output.root,
            Self::Game(game) => game.root,
        }
    }

    /// Whether a withdrawal from `l2_block` can be proven against this anchor.
    pub const fn covers(&self, l2_block: u64) -> bool {
        self.l2_block() >= l2_block
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Output(_) => "output proposal",
            Self::Game(_) => "dispute game",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} (L2 block {})",
            self.kind(),
            self.index(),
            self.l2_block()
        )
    }
}

/// Resolution of a dispute game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    ChallengerWins,
    DefenderWins,
}

impl TryFrom<u8> for GameStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::InProgress),
            1 => Ok(Self::ChallengerWins),
            2 => Ok(Self::DefenderWins),
            other => Err(other),
        }
    }
}

/// On-chain facts about a dispute game referenced by a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    pub proxy: Address,
    pub game_type: u32,
    pub status: GameStatus,
    pub created_at: u64,
    pub l2_block: u64,
}

/// What a stored proof points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenAgainst {
    Output { index: u64, root: B256 },
    Game { proxy: Address },
}

/// A proof accepted by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofRecord {
    /// Proof submitter; the legacy portal does not record it
    pub submitter: Option<Address>,
    pub anchor: ProvenAgainst,
    /// L1 timestamp of the prove transaction
    pub timestamp: u64,
}

impl ProofRecord {
    /// Earliest L1 timestamp at which the withdrawal may be finalized.
    pub const fn ready_at(&self, finalization_period: u64) -> u64 {
        self.timestamp.saturating_add(finalization_period)
    }
}

/// Why a stored proof no longer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    GameBlacklisted,
    ChallengerWins,
    GameTypeChanged { game_type: u32, respected: u32 },
    GameCreatedBeforeTypeUpdate { created_at: u64, updated_at: u64 },
    OutputDeleted { index: u64 },
    OutputReplaced { index: u64 },
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameBlacklisted => f.write_str("dispute game was blacklisted"),
            Self::ChallengerWins => f.write_str("dispute game resolved in favor of the challenger"),
            Self::GameTypeChanged {
                game_type,
                respected,
            } => write!(
                f,
                "dispute game type {game_type} is no longer respected (now {respected})"
            ),
            Self::GameCreatedBeforeTypeUpdate {
                created_at,
                updated_at,
            } => write!(
                f,
                "dispute game created at {created_at}, before the respected game type changed at {updated_at}"
            ),
            Self::OutputDeleted { index } => write!(f, "output proposal #{index} was deleted"),
            Self::OutputReplaced { index } => {
                write!(f, "output proposal #{index} was replaced with a different root")
            }
        }
    }
}

/// Lifecycle stages in their total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    NotYetProvable,
    ProvableUnproven,
    ProvenWaitingTimeLock,
    ReadyToFinalize,
    Finalized,
}

/// Where a withdrawal stands, with the data needed to act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalState {
    /// No anchor covers the withdrawal block yet.
    NotYetProvable {
        withdrawal_block: u64,
        anchor_block: Option<u64>,
        estimated_wait: Option<Duration>,
    },
    /// Covered by `anchor`, no proof stored.
    ProvableUnproven { anchor: Anchor },
    /// Proven, finalization period still running.
    ProvenWaitingTimeLock {
        proof: ProofRecord,
        ready_at: u64,
        remaining: Duration,
    },
    ReadyToFinalize { proof: ProofRecord },
    /// A proof exists but its anchor was invalidated; it must be proven again.
    ProofInvalidated {
        proof: ProofRecord,
        reason: InvalidationReason,
    },
    Finalized,
}

impl WithdrawalState {
    /// An invalidated proof counts as unproven.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::NotYetProvable { .. } => Stage::NotYetProvable,
            Self::ProvableUnproven { .. } | Self::ProofInvalidated { .. } => {
                Stage::ProvableUnproven
            }
            Self::ProvenWaitingTimeLock { .. } => Stage::ProvenWaitingTimeLock,
            Self::ReadyToFinalize { .. } => Stage::ReadyToFinalize,
            Self::Finalized => Stage::Finalized,
        }
    }
}

impl fmt::Display for WithdrawalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYetProvable {
                withdrawal_block,
                anchor_block,
                estimated_wait,
            } => {
                write!(f, "not yet provable: withdrawal is in L2 block {withdrawal_block}")?;
                match anchor_block {
                    Some(block) => write!(f, ", latest anchor covers L2 block {block}")?,
                    None => f.write_str(", no anchor proposed yet")?,
                }
                match estimated_wait {
                    Some(wait) => write!(f, " (next covering anchor in ~{})", format_duration(*wait)),
                    None => f.write_str(" (wait for the next dispute game)"),
                }
            }
            Self::ProvableUnproven { anchor } => write!(f, "ready to prove against {anchor}"),
            Self::ProvenWaitingTimeLock {
                ready_at,
                remaining,
                ..
            } => write!(
                f,
                "proven, finalization period ends in {} (at timestamp {ready_at})",
                format_duration(*remaining)
            ),
            Self::ReadyToFinalize { .. } => f.write_str("ready to finalize"),
            Self::ProofInvalidated { reason, .. } => {
                write!(f, "proof invalidated ({reason}), withdrawal must be proven again")
            }
            Self::Finalized => f.write_str("finalized"),
        }
    }
}

/// Result of classifying one withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub withdrawal: Withdrawal,
    pub state: WithdrawalState,
}

/// Render a duration as `1d 2h 3m 4s`, dropping zero units.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }

    let units = [
        (secs / 86_400, "d"),
        (secs % 86_400 / 3_600, "h"),
        (secs % 3_600 / 60, "m"),
        (secs % 60, "s"),
    ];

    units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}
