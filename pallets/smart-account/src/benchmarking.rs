#![cfg(feature = "runtime-benchmarks")]

extern crate alloc;

use crate::*;
use alloc::{vec, vec::Vec};
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::traits::fungible::{Inspect, Mutate};
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_core::{H160, H256};
use polkadot_sdk::sp_runtime::traits::Zero;

#[benchmarks]
mod benches {
  use super::*;

  fn endowment<T: Config>() -> BalanceOf<T> {
    T::Currency::minimum_balance().saturating_add(1_000_000_000u32.into())
  }

  fn endow<T: Config>(who: &T::AccountId) {
    T::Currency::set_balance(who, endowment::<T>());
  }

  fn new_account<T: Config>(kind: AccountKind<T::AccountId>) -> (SmartAccountId, T::AccountId) {
    let creator: T::AccountId = account("creator", 0, 0);
    let id = NextAccountId::<T>::get();
    Pallet::<T>::create_account(RawOrigin::Signed(creator).into(), T::BenchmarkHelper::owner(), kind)
      .unwrap();
    let sovereign = Pallet::<T>::sovereign_account_id(id);
    endow::<T>(&sovereign);
    (id, sovereign)
  }

  /// A cheap runtime call routed through the system target.
  fn remark_call<T: Config>() -> ActionCallOf<T> {
    let call: <T as Config>::RuntimeCall =
      frame_system::Call::<T>::remark { remark: vec![] }.into();
    ActionCall {
      dest: T::BenchmarkHelper::system_target(),
      value: Zero::zero(),
      payload: call.encode(),
    }
  }

  fn signed_user_op<T: Config>(id: SmartAccountId) -> (UserOperationOf<T>, H256) {
    let mut op = UserOperation {
      sender: id,
      nonce: 0,
      call: remark_call::<T>(),
      call_gas_limit: 100_000,
      verification_gas_limit: 50_000,
      pre_verification_gas: 21_000,
      max_fee_per_gas: 1u32.into(),
      max_priority_fee_per_gas: 1u32.into(),
      signature: Vec::new(),
    };
    let op_hash = Pallet::<T>::user_operation_hash(&op).unwrap();
    op.signature = T::BenchmarkHelper::sign(&hashing::eth_signed_message_hash(&op_hash));
    (op, op_hash)
  }

  fn signed_tx<T: Config>(id: SmartAccountId, nonce: u64) -> (NativeTransactionOf<T>, H256) {
    let call = remark_call::<T>();
    let mut tx = NativeTransaction {
      tx_type: 113,
      from: id,
      to: call.dest,
      gas_limit: 1_000,
      gas_per_pubdata_byte_limit: 800,
      max_fee_per_gas: 1u32.into(),
      max_priority_fee_per_gas: 1u32.into(),
      nonce,
      value: Zero::zero(),
      data: call.payload,
      factory_deps: vec![H256::repeat_byte(1)],
      signature: Vec::new(),
    };
    let tx_hash = Pallet::<T>::transaction_hash(&tx);
    tx.signature = T::BenchmarkHelper::sign(&tx_hash.0);
    (tx, tx_hash)
  }

  fn validated_tx<T: Config>() -> (SmartAccountId, NativeTransactionOf<T>, H256) {
    let (id, sovereign) = new_account::<T>(AccountKind::Native);
    let nonce = T::NonceAuthority::nonce(&sovereign);
    let (tx, tx_hash) = signed_tx::<T>(id, nonce);
    let bootloader = T::Bootloader::get();
    endow::<T>(&bootloader);
    Pallet::<T>::validate_transaction(RawOrigin::Signed(bootloader).into(), tx_hash, tx.clone())
      .unwrap();
    (id, tx, tx_hash)
  }

  #[benchmark]
  fn create_account() {
    let caller: T::AccountId = whitelisted_caller();
    let owner = T::BenchmarkHelper::owner();
    let dispatcher: T::AccountId = account("relay", 0, 0);

    #[extrinsic_call]
    _(
      RawOrigin::Signed(caller),
      owner,
      AccountKind::Standard { dispatcher },
    );

    assert_eq!(NextAccountId::<T>::get(), 1);
    assert!(Accounts::<T>::contains_key(0));
  }

  #[benchmark]
  fn fund_account() {
    let caller: T::AccountId = whitelisted_caller();
    endow::<T>(&caller);
    let (id, sovereign) = new_account::<T>(AccountKind::Native);
    let before = T::Currency::balance(&sovereign);
    let amount: BalanceOf<T> = 1_000u32.into();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), id, amount);

    assert_eq!(T::Currency::balance(&sovereign), before.saturating_add(amount));
  }

  #[benchmark]
  fn transfer_ownership() {
    // Leave something pending so the clear path is measured.
    let (pending_id, _, _) = validated_tx::<T>();
    let owner = T::AddressMapper::to_account_id(&T::BenchmarkHelper::owner());
    let new_owner = H160::repeat_byte(0x55);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), pending_id, new_owner);

    assert_eq!(Accounts::<T>::get(pending_id).map(|a| a.owner), Some(new_owner));
    assert!(PendingValidations::<T>::get(pending_id).is_none());
  }

  #[benchmark]
  fn validate_user_operation() {
    let dispatcher: T::AccountId = whitelisted_caller();
    endow::<T>(&dispatcher);
    let (id, _) = new_account::<T>(AccountKind::Standard {
      dispatcher: dispatcher.clone(),
    });
    let (op, op_hash) = signed_user_op::<T>(id);
    let missing_funds: BalanceOf<T> = 1_000u32.into();

    #[extrinsic_call]
    _(RawOrigin::Signed(dispatcher), op, op_hash, missing_funds);
  }

  #[benchmark]
  fn execute() {
    let dispatcher: T::AccountId = whitelisted_caller();
    let (id, _) = new_account::<T>(AccountKind::Standard {
      dispatcher: dispatcher.clone(),
    });
    let call = remark_call::<T>();

    #[extrinsic_call]
    _(
      RawOrigin::Signed(dispatcher),
      id,
      call.dest,
      call.value,
      call.payload,
    );
  }

  #[benchmark]
  fn execute_batch(c: Linear<1, { T::MaxBatchCalls::get() }>) {
    let dispatcher: T::AccountId = whitelisted_caller();
    let (id, _) = new_account::<T>(AccountKind::Standard {
      dispatcher: dispatcher.clone(),
    });
    let calls: Vec<ActionCallOf<T>> = (0..c).map(|_| remark_call::<T>()).collect();

    #[extrinsic_call]
    _(RawOrigin::Signed(dispatcher), id, calls);
  }

  #[benchmark]
  fn validate_transaction() {
    let (id, sovereign) = new_account::<T>(AccountKind::Native);
    let nonce = T::NonceAuthority::nonce(&sovereign);
    let (tx, tx_hash) = signed_tx::<T>(id, nonce);

    #[extrinsic_call]
    _(RawOrigin::Signed(T::Bootloader::get()), tx_hash, tx);

    assert_eq!(T::NonceAuthority::nonce(&sovereign), nonce.saturating_add(1));
    assert_eq!(
      PendingValidations::<T>::get(id).map(|p| p.result),
      Some(AuthorizationResult::Accepted)
    );
  }

  #[benchmark]
  fn pay_for_transaction() {
    let (id, tx, tx_hash) = validated_tx::<T>();

    #[extrinsic_call]
    _(RawOrigin::Signed(T::Bootloader::get()), tx_hash, tx);

    assert_eq!(PendingValidations::<T>::get(id).map(|p| p.fee_paid), Some(true));
  }

  #[benchmark]
  fn execute_transaction() {
    let (id, tx, tx_hash) = validated_tx::<T>();

    #[extrinsic_call]
    _(RawOrigin::Signed(T::Bootloader::get()), tx_hash, tx);

    assert!(PendingValidations::<T>::get(id).is_none());
  }

  #[benchmark]
  fn execute_transaction_from_outside() {
    let caller: T::AccountId = whitelisted_caller();
    let (id, sovereign) = new_account::<T>(AccountKind::Native);
    let nonce = T::NonceAuthority::nonce(&sovereign);
    let (tx, _) = signed_tx::<T>(id, nonce);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), tx);

    assert_eq!(T::NonceAuthority::nonce(&sovereign), nonce.saturating_add(1));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
