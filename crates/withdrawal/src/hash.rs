use crate::types::WithdrawalHash;
use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;
use binding::opstack::{OutputRootProof, WithdrawalTransaction};

/// Withdrawal fingerprint, as computed by `Hashing.hashWithdrawal`.
///
/// `keccak256(abi.encode(nonce, sender, target, value, gasLimit, data))`, encoded
/// as a parameter sequence rather than as a tuple with a leading offset.
pub fn compute_withdrawal_hash(tx: &WithdrawalTransaction) -> WithdrawalHash {
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    keccak256(encoded)
}

/// Slot of `sentMessages[withdrawal_hash]` in the L2ToL1MessagePasser.
///
/// The mapping sits at slot 0, so the slot is `keccak256(hash ‖ 0)`.
pub fn compute_storage_slot(withdrawal_hash: WithdrawalHash) -> B256 {
    let mut data = [0u8; 64];
    data[0..32].copy_from_slice(withdrawal_hash.as_slice());
    keccak256(data)
}

/// Output root committed by an anchor, `Hashing.hashOutputRootProof`.
pub fn compute_output_root(proof: &OutputRootProof) -> B256 {
    keccak256(
        [
            proof.version.as_slice(),
            proof.stateRoot.as_slice(),
            proof.messagePasserStorageRoot.as_slice(),
            proof.latestBlockhash.as_slice(),
        ]
        .concat(),
    )
}
