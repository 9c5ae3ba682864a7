//! Data model shared by both account protocols.
//!
//! Stored types (`SmartAccount`, `ValidatedTransaction`) are bounded and
//! `MaxEncodedLen`; pending actions are only ever dispatch arguments and are
//! never persisted.

use alloc::vec::Vec;
use frame::prelude::*;
use hex_literal::hex;
use polkadot_sdk::{
  sp_core::{H160, H256},
  sp_runtime::traits::{AtLeast32BitUnsigned, SaturatedConversion},
};

pub type SmartAccountId = u64;

/// Which lifecycle protocol an account follows.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum AccountKind<AccountId> {
  /// Two-phase relay protocol; the relay identity is fixed at creation.
  Standard { dispatcher: AccountId },
  /// Four-phase protocol driven by the runtime's bootloader identity.
  Native,
}

#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct SmartAccount<AccountId, BlockNumber> {
  pub owner: H160,
  pub kind: AccountKind<AccountId>,
  pub sovereign_account: AccountId,
  pub created_at: BlockNumber,
}

/// Outcome of signature validation. A rejection is a reportable result, not a fault.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum AuthorizationResult {
  Accepted,
  Rejected,
}

/// Returned by the bootloader-facing validation when the owner signed.
pub const VALIDATION_SUCCESS_MAGIC: [u8; 4] = hex!("202bcce7");

/// Relay-facing validation data reporting a signature failure.
pub const SIG_VALIDATION_FAILED: u64 = 1;

impl AuthorizationResult {
  pub fn is_accepted(&self) -> bool {
    matches!(self, Self::Accepted)
  }

  /// Sentinel integer form used by the standard protocol (`0` = accepted).
  pub fn validation_data(&self) -> u64 {
    match self {
      Self::Accepted => 0,
      Self::Rejected => SIG_VALIDATION_FAILED,
    }
  }

  /// Four-byte magic form used by the native protocol.
  pub fn magic(&self) -> [u8; 4] {
    match self {
      Self::Accepted => VALIDATION_SUCCESS_MAGIC,
      Self::Rejected => [0u8; 4],
    }
  }
}

impl From<bool> for AuthorizationResult {
  fn from(accepted: bool) -> Self {
    if accepted {
      Self::Accepted
    } else {
      Self::Rejected
    }
  }
}

/// A single forwarded call: destination, native value and opaque payload.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct ActionCall<AccountId, Balance> {
  pub dest: AccountId,
  pub value: Balance,
  pub payload: Vec<u8>,
}

/// Relay-bundled operation for standard accounts.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct UserOperation<AccountId, Balance> {
  pub sender: SmartAccountId,
  /// Sequenced by the relay; not checked by the account.
  pub nonce: u64,
  pub call: ActionCall<AccountId, Balance>,
  pub call_gas_limit: u64,
  pub verification_gas_limit: u64,
  pub pre_verification_gas: u64,
  pub max_fee_per_gas: Balance,
  pub max_priority_fee_per_gas: Balance,
  pub signature: Vec<u8>,
}

/// Bootloader-driven transaction for native accounts.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct NativeTransaction<AccountId, Balance> {
  pub tx_type: u8,
  pub from: SmartAccountId,
  pub to: AccountId,
  pub gas_limit: u64,
  pub gas_per_pubdata_byte_limit: u64,
  pub max_fee_per_gas: Balance,
  pub max_priority_fee_per_gas: Balance,
  /// Replay slot; must equal the authority's current counter.
  pub nonce: u64,
  pub value: Balance,
  pub data: Vec<u8>,
  pub factory_deps: Vec<H256>,
  pub signature: Vec<u8>,
}

impl<AccountId, Balance> NativeTransaction<AccountId, Balance>
where
  Balance: AtLeast32BitUnsigned + Copy,
{
  /// Fee owed to the bootloader: `gas_limit * max_fee_per_gas`.
  pub fn fee(&self) -> Option<Balance> {
    let gas: Balance = self.gas_limit.saturated_into();
    self.max_fee_per_gas.checked_mul(&gas)
  }

  /// Fee plus forwarded value; what the account must hold before validation.
  pub fn total_required_balance(&self) -> Option<Balance> {
    self.fee()?.checked_add(&self.value)
  }

  pub fn as_call(&self) -> ActionCall<AccountId, Balance>
  where
    AccountId: Clone,
  {
    ActionCall {
      dest: self.to.clone(),
      value: self.value,
      payload: self.data.clone(),
    }
  }
}

/// `Validated` state of a native account between bootloader phases.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct ValidatedTransaction {
  pub tx_hash: H256,
  pub result: AuthorizationResult,
  pub fee_paid: bool,
}

/// Caller sets accepted by the gated entry points.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallerGate {
  Dispatcher,
  /// The owner, or the account's own sovereign acting on itself.
  OwnerOrSelf,
  DispatcherOrOwner,
  Unrestricted,
}

/// How a destination is reached.
#[derive(Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub enum CallKind {
  /// Payload is a runtime call dispatched with the sovereign's origin.
  System,
  /// Payload is handed to the runtime's external call adapter.
  External,
}

/// Why a forwarded call did not go through.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallFailure {
  /// The callee failed; carries its raw failure payload.
  Reverted(Vec<u8>),
  /// The sovereign cannot cover the forwarded value.
  InsufficientBalance,
  /// A system-target payload that is not a runtime call.
  UndecodableSystemCall,
  Dispatch(DispatchError),
}

impl From<DispatchError> for CallFailure {
  fn from(e: DispatchError) -> Self {
    Self::Dispatch(e)
  }
}

impl CallFailure {
  /// Raw bytes to surface for diagnostics.
  pub fn revert_data(&self) -> Vec<u8> {
    match self {
      Self::Reverted(data) => data.clone(),
      Self::Dispatch(e) => e.encode(),
      Self::InsufficientBalance | Self::UndecodableSystemCall => Vec::new(),
    }
  }
}
