//! In-memory L1/L2 pair for exercising withdrawals without a node.
//!
//! [`Simulation`] owns the shared world; [`SimulatedL1`] and [`SimulatedL2`] are
//! the chain views handed to the code under test. Transactions signed with
//! [`test_signer`] are decoded and executed by [`SimulatedL1`] against a small
//! model of the portal.

use crate::{
    contract::{
        FaultProofContracts, Finalizability, LegacyContracts, OracleParams, RespectedGameType,
    },
    hash::{compute_output_root, compute_withdrawal_hash},
    proof::{ProofProvider, ProveParams},
    strategy::{FaultProofStrategy, LegacyStrategy, ProtocolStrategy, ProtocolVariant},
    types::{
        Anchor, DisputeGame, GameInfo, GameStatus, OutputProposal, ProofRecord, ProvenAgainst,
        Withdrawal, WithdrawalHash,
    },
    ProofError,
};
use alloy_primitives::{address, keccak256, Address, Bytes, Log, TxHash, TxKind, B256, U256};
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionRequest};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use binding::opstack::{
    IL2ToL1MessagePasser::MessagePassed, IOptimismPortal2, OutputRootProof, WithdrawalTransaction,
    MESSAGE_PASSER_ADDRESS, OUTPUT_VERSION_V0,
};
use client::{ChainError, ChainReader, ChainWriter, HeaderInfo, ReceiptInfo, SignerFn};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;

pub const SIM_PORTAL: Address = address!("0x00000000000000000000000000000000000a11ce");
pub const SIM_SENDER: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const GENESIS_TIME: u64 = 1_700_000_000;
pub const SUBMISSION_INTERVAL: u64 = 120;
pub const L2_BLOCK_TIME: u64 = 2;
pub const FINALIZATION_PERIOD: u64 = 604_800;

const L1_BLOCK_TIME: u64 = 12;

/// A withdrawal message from `SIM_SENDER` to itself.
pub fn sample_message(nonce: u64) -> WithdrawalTransaction {
    WithdrawalTransaction {
        nonce: U256::from(nonce) | (U256::from(1) << 240),
        sender: SIM_SENDER,
        target: SIM_SENDER,
        value: U256::from(10_000_000_000_000_000u64),
        gasLimit: U256::from(100_000),
        data: Bytes::new(),
    }
}

/// Signer producing `from ‖ nonce ‖ to ‖ input`, the format [`SimulatedL1`] accepts.
pub fn test_signer() -> SignerFn {
    Arc::new(|tx: TransactionRequest| {
        Box::pin(async move {
            let from = tx.from.ok_or_else(|| eyre::eyre!("missing from"))?;
            let nonce = tx.nonce.ok_or_else(|| eyre::eyre!("missing nonce"))?;
            let to = match tx.to {
                Some(TxKind::Call(to)) => to,
                _ => eyre::bail!("missing call target"),
            };
            let input = tx.input.input().cloned().unwrap_or_default();

            let mut raw = Vec::with_capacity(48 + input.len());
            raw.extend_from_slice(from.as_slice());
            raw.extend_from_slice(&nonce.to_be_bytes());
            raw.extend_from_slice(to.as_slice());
            raw.extend_from_slice(&input);
            Ok(Bytes::from(raw))
        })
    })
}

/// Signer that always fails, like a disconnected hardware wallet.
pub fn failing_signer() -> SignerFn {
    Arc::new(|_tx| Box::pin(async { Err(eyre::eyre!("device not connected")) }))
}

/// An L1 transaction as the simulated node received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub nonce: u64,
    pub to: Address,
    pub input: Bytes,
}

struct L1Receipt {
    visible_at: Option<Instant>,
    receipt: ReceiptInfo,
}

struct World {
    variant: ProtocolVariant,
    l1_time: u64,
    l1_block: u64,
    next_nonce: u64,

    l2_receipts: HashMap<TxHash, ReceiptInfo>,
    sent_messages: HashSet<WithdrawalHash>,
    l2_tx_count: u64,

    outputs: Vec<OutputProposal>,
    games: Vec<(DisputeGame, GameStatus)>,
    respected: RespectedGameType,
    blacklist: HashSet<Address>,

    // Legacy proofs are stored under Address::ZERO
    proofs: HashMap<(WithdrawalHash, Address), ProofRecord>,
    finalized: HashSet<WithdrawalHash>,

    l1_receipts: HashMap<TxHash, L1Receipt>,
    sent: Vec<SentTransaction>,
    receipt_delay: Option<Duration>,
    revert_next: bool,
    receipt_error: Option<String>,
}

impl World {
    fn new(variant: ProtocolVariant) -> Self {
        Self {
            variant,
            l1_time: GENESIS_TIME,
            l1_block: 1_000,
            next_nonce: 0,
            l2_receipts: HashMap::new(),
            sent_messages: HashSet::new(),
            l2_tx_count: 0,
            outputs: Vec::new(),
            games: Vec::new(),
            respected: RespectedGameType {
                game_type: 0,
                updated_at: 0,
            },
            blacklist: HashSet::new(),
            proofs: HashMap::new(),
            finalized: HashSet::new(),
            l1_receipts: HashMap::new(),
            sent: Vec::new(),
            receipt_delay: Some(Duration::from_secs(10)),
            revert_next: false,
            receipt_error: None,
        }
    }

    fn proof_key(&self, hash: WithdrawalHash, submitter: Address) -> (WithdrawalHash, Address) {
        match self.variant {
            ProtocolVariant::Legacy => (hash, Address::ZERO),
            ProtocolVariant::FaultProof => (hash, submitter),
        }
    }

    fn game_by_proxy(&self, proxy: Address) -> Option<&(DisputeGame, GameStatus)> {
        self.games.iter().find(|(game, _)| game.proxy == proxy)
    }

    /// Portal bookkeeping for a prove call; `false` means the call reverts.
    fn prove(&mut self, hash: WithdrawalHash, from: Address, index: u64) -> bool {
        if self.finalized.contains(&hash) || !self.sent_messages.contains(&hash) {
            return false;
        }
        let Ok(index_usize) = usize::try_from(index) else {
            return false;
        };

        let record = match self.variant {
            ProtocolVariant::Legacy => {
                let Some(output) = self.outputs.get(index_usize) else {
                    return false;
                };
                ProofRecord {
                    submitter: None,
                    anchor: ProvenAgainst::Output {
                        index,
                        root: output.root,
                    },
                    timestamp: self.l1_time,
                }
            }
            ProtocolVariant::FaultProof => {
                let Some((game, status)) = self.games.get(index_usize) else {
                    return false;
                };
                if game.game_type != self.respected.game_type
                    || *status == GameStatus::ChallengerWins
                    || self.blacklist.contains(&game.proxy)
                {
                    return false;
                }
                ProofRecord {
                    submitter: Some(from),
                    anchor: ProvenAgainst::Game { proxy: game.proxy },
                    timestamp: self.l1_time,
                }
            }
        };

        let key = self.proof_key(hash, from);
        self.proofs.insert(key, record);
        true
    }

    /// Why the portal would refuse to finalize, if it would.
    fn finalize_rejection(&self, hash: WithdrawalHash, submitter: Address) -> Option<String> {
        if self.finalized.contains(&hash) {
            return Some("OptimismPortal: withdrawal has already been finalized".to_string());
        }
        let Some(proof) = self.proofs.get(&self.proof_key(hash, submitter)) else {
            return Some(
                "OptimismPortal: withdrawal has not been proven by proof submitter address yet"
                    .to_string(),
            );
        };

        if let ProvenAgainst::Game { proxy } = proof.anchor {
            if self.blacklist.contains(&proxy) {
                return Some("OptimismPortal: dispute game has been blacklisted".to_string());
            }
            match self.game_by_proxy(proxy) {
                Some((_, GameStatus::DefenderWins)) => {}
                _ => {
                    return Some(
                        "OptimismPortal: dispute game has not been resolved in favor of the root claim"
                            .to_string(),
                    )
                }
            }
        }

        if self.l1_time < proof.ready_at(FINALIZATION_PERIOD) {
            return Some("OptimismPortal: proven withdrawal has not matured yet".to_string());
        }
        None
    }

    fn finalize(&mut self, hash: WithdrawalHash, from: Address) -> bool {
        if self.finalize_rejection(hash, from).is_some() {
            return false;
        }
        self.finalized.insert(hash)
    }

    /// Run a portal call; other calls and targets revert.
    fn execute(&mut self, tx: &SentTransaction) -> bool {
        if tx.to != SIM_PORTAL {
            return false;
        }
        // Legacy and fault-proof portals share these selectors
        if let Ok(call) = IOptimismPortal2::proveWithdrawalTransactionCall::abi_decode(&tx.input) {
            let Ok(index) = u64::try_from(call._disputeGameIndex) else {
                return false;
            };
            return self.prove(compute_withdrawal_hash(&call._tx), tx.from, index);
        }
        if let Ok(call) = IOptimismPortal2::finalizeWithdrawalTransactionCall::abi_decode(&tx.input)
        {
            return self.finalize(compute_withdrawal_hash(&call._tx), tx.from);
        }
        false
    }

    fn anchor_proof(l2_block: u64) -> OutputRootProof {
        let header = l2_header(l2_block);
        OutputRootProof {
            version: OUTPUT_VERSION_V0,
            stateRoot: header.state_root,
            messagePasserStorageRoot: keccak256([b"storage".as_slice(), &l2_block.to_be_bytes()].concat()),
            latestBlockhash: header.hash,
        }
    }
}

fn l2_header(number: u64) -> HeaderInfo {
    HeaderInfo {
        number,
        hash: keccak256(number.to_be_bytes()),
        state_root: keccak256([b"state".as_slice(), &number.to_be_bytes()].concat()),
        timestamp: GENESIS_TIME + number * L2_BLOCK_TIME,
    }
}

fn lock(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A simulated L1/L2 pair for one protocol variant.
#[derive(Clone)]
pub struct Simulation {
    world: Arc<Mutex<World>>,
}

impl Simulation {
    pub fn legacy() -> Self {
        Self::new(ProtocolVariant::Legacy)
    }

    pub fn fault_proof() -> Self {
        Self::new(ProtocolVariant::FaultProof)
    }

    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            world: Arc::new(Mutex::new(World::new(variant))),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }

    pub fn l1(&self) -> SimulatedL1 {
        SimulatedL1 {
            world: self.world.clone(),
        }
    }

    pub fn l2(&self) -> SimulatedL2 {
        SimulatedL2 {
            world: self.world.clone(),
        }
    }

    pub fn legacy_strategy(&self) -> LegacyStrategy<SimulatedL1, SimulatedL2> {
        LegacyStrategy::new(SIM_PORTAL, self.l1(), self.l2())
    }

    pub fn fault_proof_strategy(&self) -> FaultProofStrategy<SimulatedL1, SimulatedL2> {
        FaultProofStrategy::new(SIM_PORTAL, self.l1(), self.l2())
    }

    /// Strategy matching the simulated variant.
    pub fn strategy(&self) -> Box<dyn ProtocolStrategy> {
        match self.world().variant {
            ProtocolVariant::Legacy => Box::new(self.legacy_strategy()),
            ProtocolVariant::FaultProof => Box::new(self.fault_proof_strategy()),
        }
    }

    pub const fn sender(&self) -> Address {
        SIM_SENDER
    }

    pub const fn portal(&self) -> Address {
        SIM_PORTAL
    }

    pub fn l1_time(&self) -> u64 {
        self.world().l1_time
    }

    /// Move the L1 clock forward.
    pub fn advance_time(&self, seconds: u64) {
        let mut world = self.world();
        world.l1_time += seconds;
        world.l1_block += seconds / L1_BLOCK_TIME;
    }

    /// Nonce the L1 node expects next from `SIM_SENDER`.
    pub fn pending_nonce(&self) -> u64 {
        self.world().next_nonce
    }

    pub fn set_pending_nonce(&self, nonce: u64) {
        self.world().next_nonce = nonce;
    }

    /// Include a successful withdrawal transaction in `l2_block`.
    pub fn add_withdrawal(&self, message: WithdrawalTransaction, l2_block: u64) -> TxHash {
        let hash = compute_withdrawal_hash(&message);
        let event = MessagePassed {
            nonce: message.nonce,
            sender: message.sender,
            target: message.target,
            value: message.value,
            gasLimit: message.gasLimit,
            data: message.data,
            withdrawalHash: hash,
        };
        let log = Log {
            address: MESSAGE_PASSER_ADDRESS,
            data: event.encode_log_data(),
        };

        let mut world = self.world();
        world.sent_messages.insert(hash);
        Self::insert_l2_receipt(&mut world, l2_block, true, vec![log])
    }

    /// Include a reverted transaction in `l2_block`.
    pub fn add_failed_withdrawal(&self, l2_block: u64) -> TxHash {
        Self::insert_l2_receipt(&mut self.world(), l2_block, false, vec![])
    }

    /// Include a successful transaction without a withdrawal event.
    pub fn add_plain_transaction(&self, l2_block: u64) -> TxHash {
        Self::insert_l2_receipt(&mut self.world(), l2_block, true, vec![])
    }

    fn insert_l2_receipt(world: &mut World, l2_block: u64, success: bool, logs: Vec<Log>) -> TxHash {
        world.l2_tx_count += 1;
        let tx_hash = keccak256([b"l2-tx".as_slice(), &world.l2_tx_count.to_be_bytes()].concat());
        world.l2_receipts.insert(
            tx_hash,
            ReceiptInfo {
                tx_hash,
                success,
                block_number: Some(l2_block),
                gas_used: 50_000,
                logs,
            },
        );
        tx_hash
    }

    /// Parsed withdrawal of an L2 transaction added earlier.
    pub fn withdrawal(&self, tx_hash: TxHash) -> Withdrawal {
        let receipt = self
            .world()
            .l2_receipts
            .get(&tx_hash)
            .cloned()
            .expect("unknown L2 transaction");
        Withdrawal::from_receipt(&receipt).expect("not a withdrawal")
    }

    /// Propose an output for `l2_block`, returns its index.
    pub fn add_output(&self, l2_block: u64) -> u64 {
        let mut world = self.world();
        let index = world.outputs.len() as u64;
        let output = OutputProposal {
            index,
            l2_block,
            root: compute_output_root(&World::anchor_proof(l2_block)),
            timestamp: world.l1_time,
        };
        world.outputs.push(output);
        index
    }

    /// Overwrite the root of output `index`.
    pub fn replace_output(&self, index: u64) {
        let mut world = self.world();
        let output = &mut world.outputs[index as usize];
        output.root = keccak256(output.root);
    }

    /// Delete output `index` and every later output.
    pub fn delete_outputs_from(&self, index: u64) {
        self.world().outputs.truncate(index as usize);
    }

    /// Create a game of the respected type for `l2_block`, returns its index.
    pub fn add_game(&self, l2_block: u64) -> u64 {
        let mut world = self.world();
        let index = world.games.len() as u64;
        let game = DisputeGame {
            index,
            proxy: Address::from_word(keccak256([b"game".as_slice(), &index.to_be_bytes()].concat())),
            game_type: world.respected.game_type,
            l2_block,
            root: compute_output_root(&World::anchor_proof(l2_block)),
            created_at: world.l1_time,
        };
        world.games.push((game, GameStatus::InProgress));
        index
    }

    pub fn resolve_game(&self, index: u64, status: GameStatus) {
        self.world().games[index as usize].1 = status;
    }

    pub fn blacklist_game(&self, index: u64) {
        let mut world = self.world();
        let proxy = world.games[index as usize].0.proxy;
        world.blacklist.insert(proxy);
    }

    pub fn set_respected_game_type(&self, game_type: u32) {
        let mut world = self.world();
        world.respected = RespectedGameType {
            game_type,
            updated_at: world.l1_time,
        };
    }

    /// Store a proof from `SIM_SENDER` against anchor `index` at the current L1 time.
    pub fn record_proof(&self, withdrawal: &Withdrawal, index: u64) {
        assert!(
            self.world().prove(withdrawal.hash, SIM_SENDER, index),
            "simulated prove rejected"
        );
    }

    pub fn is_finalized(&self, hash: WithdrawalHash) -> bool {
        self.world().finalized.contains(&hash)
    }

    /// Delay before sent L1 transactions show a receipt; `None` never mines them.
    pub fn set_receipt_delay(&self, delay: Option<Duration>) {
        self.world().receipt_delay = delay;
    }

    /// Make the next L1 transaction revert.
    pub fn revert_next_transaction(&self) {
        self.world().revert_next = true;
    }

    /// Make L1 receipt lookups fail with `reason`.
    pub fn fail_receipts(&self, reason: &str) {
        self.world().receipt_error = Some(reason.to_string());
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.world().sent.clone()
    }
}

/// L1 view of a [`Simulation`].
#[derive(Clone)]
pub struct SimulatedL1 {
    world: Arc<Mutex<World>>,
}

impl SimulatedL1 {
    fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }
}

#[async_trait]
impl ChainReader for SimulatedL1 {
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        let world = self.world();
        if let Some(reason) = &world.receipt_error {
            return Err(ChainError::Rpc(reason.clone()));
        }
        Ok(world.l1_receipts.get(&tx_hash).and_then(|entry| {
            entry
                .visible_at
                .filter(|at| Instant::now() >= *at)
                .map(|_| entry.receipt.clone())
        }))
    }

    async fn header(&self, block: BlockNumberOrTag) -> Result<HeaderInfo, ChainError> {
        let world = self.world();
        let number = match block {
            BlockNumberOrTag::Number(number) => number,
            _ => world.l1_block,
        };
        let behind = world.l1_block.saturating_sub(number);
        Ok(HeaderInfo {
            number,
            hash: keccak256([b"l1".as_slice(), &number.to_be_bytes()].concat()),
            state_root: B256::ZERO,
            timestamp: world.l1_time.saturating_sub(behind * L1_BLOCK_TIME),
        })
    }
}

#[async_trait]
impl ChainWriter for SimulatedL1 {
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, ChainError> {
        if raw.len() < 48 {
            return Err(ChainError::Rpc("invalid raw transaction".to_string()));
        }
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&raw[20..28]);
        let tx = SentTransaction {
            hash: keccak256(&raw),
            from: Address::from_slice(&raw[0..20]),
            nonce: u64::from_be_bytes(nonce),
            to: Address::from_slice(&raw[28..48]),
            input: Bytes::copy_from_slice(&raw[48..]),
        };

        let mut world = self.world();
        if tx.nonce < world.next_nonce {
            return Err(ChainError::Rpc("nonce too low".to_string()));
        }
        if tx.nonce > world.next_nonce {
            return Err(ChainError::Rpc("nonce too high".to_string()));
        }
        world.next_nonce += 1;

        let success = if world.revert_next {
            world.revert_next = false;
            false
        } else {
            world.execute(&tx)
        };

        let receipt = ReceiptInfo {
            tx_hash: tx.hash,
            success,
            block_number: Some(world.l1_block + 1),
            gas_used: 120_000,
            logs: vec![],
        };
        let visible_at = world.receipt_delay.map(|delay| Instant::now() + delay);
        world
            .l1_receipts
            .insert(tx.hash, L1Receipt { visible_at, receipt });
        world.sent.push(tx.clone());

        Ok(tx.hash)
    }
}

#[async_trait]
impl LegacyContracts for SimulatedL1 {
    async fn latest_output(&self) -> Result<Option<OutputProposal>, ChainError> {
        Ok(self.world().outputs.last().copied())
    }

    async fn output_at(&self, index: u64) -> Result<Option<OutputProposal>, ChainError> {
        Ok(self.world().outputs.get(index as usize).copied())
    }

    async fn oracle_params(&self) -> Result<OracleParams, ChainError> {
        Ok(OracleParams {
            submission_interval: SUBMISSION_INTERVAL,
            l2_block_time: L2_BLOCK_TIME,
            finalization_period: FINALIZATION_PERIOD,
        })
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
    ) -> Result<Option<ProofRecord>, ChainError> {
        Ok(self.world().proofs.get(&(hash, Address::ZERO)).copied())
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        Ok(self.world().finalized.contains(&hash))
    }
}

#[async_trait]
impl FaultProofContracts for SimulatedL1 {
    async fn respected_game_type(&self) -> Result<RespectedGameType, ChainError> {
        Ok(self.world().respected)
    }

    async fn latest_game(&self, game_type: u32) -> Result<Option<DisputeGame>, ChainError> {
        Ok(self
            .world()
            .games
            .iter()
            .rev()
            .map(|(game, _)| *game)
            .find(|game| game.game_type == game_type))
    }

    async fn game_info(&self, proxy: Address) -> Result<GameInfo, ChainError> {
        let world = self.world();
        let (game, status) = world.game_by_proxy(proxy).ok_or_else(|| ChainError::Call {
            call: "status",
            reason: format!("no dispute game at {proxy}"),
        })?;
        Ok(GameInfo {
            proxy,
            game_type: game.game_type,
            status: *status,
            created_at: game.created_at,
            l2_block: game.l2_block,
        })
    }

    async fn is_blacklisted(&self, proxy: Address) -> Result<bool, ChainError> {
        Ok(self.world().blacklist.contains(&proxy))
    }

    async fn proof_maturity_delay(&self) -> Result<u64, ChainError> {
        Ok(FINALIZATION_PERIOD)
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Option<ProofRecord>, ChainError> {
        Ok(self.world().proofs.get(&(hash, submitter)).copied())
    }

    async fn is_finalized(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        Ok(self.world().finalized.contains(&hash))
    }

    async fn check_withdrawal(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
    ) -> Result<Finalizability, ChainError> {
        Ok(match self.world().finalize_rejection(hash, submitter) {
            Some(reason) => Finalizability::Rejected(reason),
            None => Finalizability::Allowed,
        })
    }
}

/// L2 view of a [`Simulation`].
#[derive(Clone)]
pub struct SimulatedL2 {
    world: Arc<Mutex<World>>,
}

#[async_trait]
impl ChainReader for SimulatedL2 {
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        Ok(lock(&self.world).l2_receipts.get(&tx_hash).cloned())
    }

    async fn header(&self, block: BlockNumberOrTag) -> Result<HeaderInfo, ChainError> {
        match block {
            BlockNumberOrTag::Number(number) => Ok(l2_header(number)),
            other => Err(ChainError::BlockNotFound(other.to_string())),
        }
    }
}

#[async_trait]
impl ProofProvider for SimulatedL2 {
    async fn prove_params(
        &self,
        withdrawal: &Withdrawal,
        anchor: &Anchor,
    ) -> Result<ProveParams, ProofError> {
        let block = anchor.l2_block();
        if !lock(&self.world).sent_messages.contains(&withdrawal.hash) || block < withdrawal.l2_block
        {
            return Err(ProofError::WithdrawalNotInStorage {
                hash: withdrawal.hash,
                block,
            });
        }

        let output_root_proof = World::anchor_proof(block);
        let computed = compute_output_root(&output_root_proof);
        if computed != anchor.root() {
            return Err(ProofError::OutputRootMismatch {
                block,
                expected: anchor.root(),
                computed,
            });
        }

        Ok(ProveParams {
            output_root_proof,
            withdrawal_proof: vec![Bytes::copy_from_slice(withdrawal.hash.as_slice())],
        })
    }
}
