//! What differs between the relay-driven and bootloader-driven flows.
//!
//! Both flows share one authorization and execution engine in the pallet;
//! a `Protocol` only pins down which account kind it serves, the caller
//! sets of its phases, and how its pending action is hashed and signed.

use polkadot_sdk::{frame_support::traits::Get, sp_core::H256};

use crate::{
  Config, NativeTransactionOf, Pallet, SmartAccountOf, UserOperationOf, hashing,
  types::{AccountKind, CallerGate},
};

pub trait Protocol<T: Config> {
  type Action;

  const VALIDATE: CallerGate;
  const EXECUTE: CallerGate;

  fn supports(kind: &AccountKind<T::AccountId>) -> bool;

  /// Canonical hash of `action` as the off-chain signer computed it.
  fn action_hash(action: &Self::Action, account: &SmartAccountOf<T>) -> H256;

  /// Digest the owner actually signs for a given action hash.
  fn signed_digest(action_hash: &H256) -> [u8; 32];

  fn signature(action: &Self::Action) -> &[u8];
}

/// Two-phase relay protocol (validate, then execute in a later call).
pub struct Standard;

impl<T: Config> Protocol<T> for Standard {
  type Action = UserOperationOf<T>;

  const VALIDATE: CallerGate = CallerGate::Dispatcher;
  const EXECUTE: CallerGate = CallerGate::DispatcherOrOwner;

  fn supports(kind: &AccountKind<T::AccountId>) -> bool {
    matches!(kind, AccountKind::Standard { .. })
  }

  fn action_hash(op: &UserOperationOf<T>, account: &SmartAccountOf<T>) -> H256 {
    hashing::user_operation_hash(op, &Pallet::<T>::dispatcher_of(account), T::ChainId::get())
  }

  fn signed_digest(action_hash: &H256) -> [u8; 32] {
    hashing::eth_signed_message_hash(action_hash)
  }

  fn signature(op: &UserOperationOf<T>) -> &[u8] {
    &op.signature
  }
}

/// Bootloader protocol (validate, pay, execute as separate phases).
pub struct Native;

impl<T: Config> Protocol<T> for Native {
  type Action = NativeTransactionOf<T>;

  const VALIDATE: CallerGate = CallerGate::Dispatcher;
  const EXECUTE: CallerGate = CallerGate::DispatcherOrOwner;

  fn supports(kind: &AccountKind<T::AccountId>) -> bool {
    matches!(kind, AccountKind::Native)
  }

  fn action_hash(tx: &NativeTransactionOf<T>, _account: &SmartAccountOf<T>) -> H256 {
    hashing::transaction_hash(tx, T::ChainId::get())
  }

  fn signed_digest(action_hash: &H256) -> [u8; 32] {
    action_hash.0
  }

  fn signature(tx: &NativeTransactionOf<T>) -> &[u8] {
    &tx.signature
  }
}
