//! Adapter traits for the smart account pallet
//!
//! Collaborators the runtime provides: ordinary call targets, the replay
//! authority and the owner address mapping.

use alloc::vec::Vec;
use core::marker::PhantomData;
use frame::prelude::*;
use polkadot_sdk::{frame_system, sp_core::H160, sp_runtime::traits::SaturatedConversion};

/// Ordinary (non-system) call targets.
pub trait ExternalCall<AccountId, Balance> {
  /// Invoke `payload` on `dest` on behalf of `from`.
  ///
  /// `value` has already been moved to `dest` when this runs. `Err` carries
  /// the callee's raw failure payload.
  fn call(
    from: &AccountId,
    dest: &AccountId,
    value: Balance,
    payload: &[u8],
  ) -> Result<Vec<u8>, Vec<u8>>;
}

/// Replay authority tracking consumed action identifiers per account.
pub trait NonceAuthority<AccountId> {
  fn nonce(who: &AccountId) -> u64;

  /// Consume `expected` if it is the current counter value, fail otherwise.
  fn increment_if_equals(who: &AccountId, expected: u64) -> DispatchResult;
}

/// Maps an owner's signing address to the runtime account it calls from.
pub trait AddressMapper<AccountId> {
  fn to_account_id(address: &H160) -> AccountId;
}

pub const NONCE_MISMATCH: DispatchError = DispatchError::Other("ReplayNonceMismatch");

/// `NonceAuthority` backed by `frame_system` account nonces.
pub struct SystemNonceAuthority<T>(PhantomData<T>);

impl<T: frame_system::Config> NonceAuthority<T::AccountId> for SystemNonceAuthority<T> {
  fn nonce(who: &T::AccountId) -> u64 {
    frame_system::Pallet::<T>::account_nonce(who).saturated_into()
  }

  fn increment_if_equals(who: &T::AccountId, expected: u64) -> DispatchResult {
    ensure!(Self::nonce(who) == expected, NONCE_MISMATCH);
    frame_system::Pallet::<T>::inc_account_nonce(who);
    Ok(())
  }
}

/// No external targets; every ordinary call fails.
impl<AccountId, Balance> ExternalCall<AccountId, Balance> for () {
  fn call(_: &AccountId, _: &AccountId, _: Balance, _: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
    Err(b"ExternalCall not configured".to_vec())
  }
}
