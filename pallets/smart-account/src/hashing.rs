//! Canonical action hashes and owner signature recovery.
//!
//! These encodings are the wire contract with off-chain signers. A layout
//! change must bump its version constant.

use alloc::vec::Vec;
use codec::Encode;
use frame::hashing::keccak_256;
use hex_literal::hex;
use polkadot_sdk::{
  sp_core::{H160, H256},
  sp_io,
};

use crate::types::{NativeTransaction, UserOperation};

pub const USER_OPERATION_VERSION: u8 = 1;

pub const DOMAIN_NAME: &[u8] = b"SmartAccount";
pub const DOMAIN_VERSION: &[u8] = b"1";
pub const DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,uint256 chainId)";
pub const TRANSACTION_TYPE: &[u8] = b"Transaction(uint256 txType,uint256 from,uint256 to,uint256 gasLimit,uint256 gasPerPubdataByteLimit,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,uint256 nonce,uint256 value,bytes data,bytes32[] factoryDeps)";

const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Half the secp256k1 group order. A larger `s` is the malleable twin of a valid signature.
const SECP256K1_HALF_ORDER: [u8; 32] =
  hex!("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0");

pub const SIGNATURE_LEN: usize = 65;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureError {
  InvalidLength,
  InvalidRecoveryId,
  MalleableS,
  RecoveryFailed,
}

/// Relay-side operation hash: `keccak(SCALE(keccak(packed op), dispatcher, chain_id))`.
///
/// The signature is excluded; the payload is committed through its own hash
/// so the packed preimage stays fixed-size.
pub fn user_operation_hash<AccountId: Encode, Balance: Encode>(
  op: &UserOperation<AccountId, Balance>,
  dispatcher: &AccountId,
  chain_id: u64,
) -> H256 {
  let packed = (
    USER_OPERATION_VERSION,
    op.sender,
    op.nonce,
    &op.call.dest,
    &op.call.value,
    keccak_256(&op.call.payload),
    op.call_gas_limit,
    op.verification_gas_limit,
    op.pre_verification_gas,
    &op.max_fee_per_gas,
    &op.max_priority_fee_per_gas,
  )
    .encode();
  H256(keccak_256(
    &(keccak_256(&packed), dispatcher, chain_id).encode(),
  ))
}

/// EIP-191 personal-message digest of a 32-byte hash.
pub fn eth_signed_message_hash(hash: &H256) -> [u8; 32] {
  let mut message = Vec::with_capacity(ETH_SIGNED_MESSAGE_PREFIX.len() + 32);
  message.extend_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
  message.extend_from_slice(hash.as_bytes());
  keccak_256(&message)
}

pub fn domain_separator(chain_id: u64) -> [u8; 32] {
  keccak_256(
    &(
      keccak_256(DOMAIN_TYPE),
      keccak_256(DOMAIN_NAME),
      keccak_256(DOMAIN_VERSION),
      chain_id,
    )
      .encode(),
  )
}

/// Typed-data hash of a native transaction: `keccak(0x19 ‖ 0x01 ‖ domain ‖ struct)`.
pub fn transaction_hash<AccountId: Encode, Balance: Encode>(
  tx: &NativeTransaction<AccountId, Balance>,
  chain_id: u64,
) -> H256 {
  let deps: Vec<u8> = tx.factory_deps.iter().flat_map(|dep| dep.0).collect();
  let struct_hash = keccak_256(
    &(
      keccak_256(TRANSACTION_TYPE),
      tx.tx_type,
      tx.from,
      &tx.to,
      tx.gas_limit,
      tx.gas_per_pubdata_byte_limit,
      &tx.max_fee_per_gas,
      &tx.max_priority_fee_per_gas,
      tx.nonce,
      &tx.value,
      keccak_256(&tx.data),
      keccak_256(&deps),
    )
      .encode(),
  );

  let mut message = Vec::with_capacity(66);
  message.extend_from_slice(&[0x19, 0x01]);
  message.extend_from_slice(&domain_separator(chain_id));
  message.extend_from_slice(&struct_hash);
  H256(keccak_256(&message))
}

/// Recover the Ethereum-style address that produced `signature` over `digest`.
///
/// Accepts `r ‖ s ‖ v` with `v` in `{0, 1, 27, 28}` and only the low-`s` form.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<H160, SignatureError> {
  let mut sig: [u8; SIGNATURE_LEN] = signature
    .try_into()
    .map_err(|_| SignatureError::InvalidLength)?;
  if sig[32..64] > SECP256K1_HALF_ORDER[..] {
    return Err(SignatureError::MalleableS);
  }
  sig[64] = match sig[64] {
    v @ (0 | 1) => v,
    v @ (27 | 28) => v - 27,
    _ => return Err(SignatureError::InvalidRecoveryId),
  };
  let pubkey = sp_io::crypto::secp256k1_ecdsa_recover(&sig, digest)
    .map_err(|_| SignatureError::RecoveryFailed)?;
  Ok(H160::from_slice(&keccak_256(&pubkey)[12..]))
}
