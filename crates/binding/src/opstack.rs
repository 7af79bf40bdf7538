//! OP Stack contract bindings.
//!
//! Includes contracts for L2→L1 withdrawals:
//! - L2ToL1MessagePasser (L2 predeploy)
//! - OptimismPortal + L2OutputOracle (L1 contracts, output-oracle finality)
//! - OptimismPortal2 + DisputeGameFactory + FaultDisputeGame (L1 contracts, fault proofs)

use alloy_primitives::{address, Address, B256};
use alloy_sol_types::sol;

/// L2ToL1MessagePasser predeploy address (same on all OP Stack chains).
pub const MESSAGE_PASSER_ADDRESS: Address = address!("4200000000000000000000000000000000000016");

/// Version byte string of the only output root format in use.
pub const OUTPUT_VERSION_V0: B256 = B256::ZERO;

sol! {
    /// L2ToL1MessagePasser - L2 predeploy contract for initiating withdrawals
    #[sol(rpc)]
    interface IL2ToL1MessagePasser {
        /// Emitted when a withdrawal is initiated on L2
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        /// Check if a withdrawal message has been sent
        function sentMessages(bytes32) external view returns (bool);
    }

    /// OptimismPortal - legacy L1 portal proving against L2OutputOracle outputs
    #[sol(rpc)]
    interface IOptimismPortal {
        /// Proven withdrawal data, keyed by withdrawal hash only
        function provenWithdrawals(bytes32 withdrawalHash)
            external view returns (bytes32 outputRoot, uint128 timestamp, uint128 l2OutputIndex);

        /// Query if a withdrawal has been finalized
        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Prove a withdrawal against an L2 output proposal
        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _l2OutputIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;

        /// Finalize a proven withdrawal
        function finalizeWithdrawalTransaction(WithdrawalTransaction calldata _tx) external;
    }

    /// L2OutputOracle - legacy L1 contract storing proposed L2 output roots
    #[sol(rpc)]
    interface IL2OutputOracle {
        /// Number of outputs proposed so far (index of the next output)
        function nextOutputIndex() external view returns (uint256);

        /// Get an output proposal by index
        function getL2Output(uint256 _l2OutputIndex)
            external view returns (OutputProposal memory);

        /// Number of L2 blocks between output proposals
        function SUBMISSION_INTERVAL() external view returns (uint256);

        /// L2 block time in seconds
        function L2_BLOCK_TIME() external view returns (uint256);

        /// Challenge window for proposed outputs (usually 7 days)
        function FINALIZATION_PERIOD_SECONDS() external view returns (uint256);
    }

    /// OptimismPortal2 - L1 portal for fault-proof chains
    #[sol(rpc)]
    interface IOptimismPortal2 {
        /// Query proven withdrawals by hash and proof submitter
        function provenWithdrawals(bytes32 withdrawalHash, address proofSubmitter)
            external view returns (address disputeGameProxy, uint64 timestamp);

        /// Query if a withdrawal has been finalized
        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Get the proof maturity delay (usually 7 days = 604800 seconds)
        function proofMaturityDelaySeconds()
            external view returns (uint256);

        /// Get the respected game type for filtering dispute games
        function respectedGameType()
            external view returns (uint32);

        /// Timestamp of the last respected game type change
        function respectedGameTypeUpdatedAt()
            external view returns (uint64);

        /// Whether a dispute game has been blacklisted by the guardian
        function disputeGameBlacklist(address game)
            external view returns (bool);

        /// Reverts with a reason if the withdrawal cannot be finalized by the submitter
        function checkWithdrawal(bytes32 _withdrawalHash, address _proofSubmitter)
            external view;

        /// Prove a withdrawal against a dispute game
        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _disputeGameIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;

        /// Finalize a withdrawal proven by msg.sender
        function finalizeWithdrawalTransaction(WithdrawalTransaction calldata _tx) external;
    }

    /// DisputeGameFactory - Used to find dispute games for proof generation
    #[sol(rpc)]
    interface IDisputeGameFactory {
        /// Dispute game search result
        struct GameSearchResult {
            uint256 index;
            bytes32 metadata;
            uint64 timestamp;
            bytes32 rootClaim;
            bytes extraData;
        }

        /// Get the total number of dispute games created
        function gameCount() external view returns (uint256 gameCount_);

        /// Find latest games of a given type
        function findLatestGames(
            uint32 _gameType,
            uint256 _start,
            uint256 _n
        ) external view returns (GameSearchResult[] memory games_);
    }

    /// IFaultDisputeGame - Standard interface for fault dispute games
    #[sol(rpc)]
    interface IFaultDisputeGame {
        /// Get the L2 block number this game is disputing
        function l2BlockNumber() external view returns (uint256);

        /// Get the game status (0 = in progress, 1 = challenger wins, 2 = defender wins)
        function status() external view returns (uint8);

        /// Get the game type
        function gameType() external view returns (uint32);

        /// Get the creation timestamp
        function createdAt() external view returns (uint64);
    }

    /// Output root proof structure (used in proving withdrawals)
    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    /// Withdrawal transaction structure (shared across contracts)
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }

    /// Output proposal stored by the L2OutputOracle
    #[derive(Debug, PartialEq, Eq)]
    struct OutputProposal {
        bytes32 outputRoot;
        uint128 timestamp;
        uint128 l2BlockNumber;
    }
}
