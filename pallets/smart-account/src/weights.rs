#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn create_account() -> Weight;
  fn fund_account() -> Weight;
  fn transfer_ownership() -> Weight;
  fn validate_user_operation() -> Weight;
  fn execute() -> Weight;
  fn execute_batch(c: u32) -> Weight;
  fn validate_transaction() -> Weight;
  fn pay_for_transaction() -> Weight;
  fn execute_transaction() -> Weight;
  fn execute_transaction_from_outside() -> Weight;
}

/// Signature recovery dominates every validating call.
const ECRECOVER: u64 = 45_000_000;

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
  fn create_account() -> Weight {
    Weight::from_parts(18_000_000, 1600)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn fund_account() -> Weight {
    Weight::from_parts(22_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn transfer_ownership() -> Weight {
    Weight::from_parts(14_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn validate_user_operation() -> Weight {
    Weight::from_parts(ECRECOVER.saturating_add(20_000_000), 2400)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn execute() -> Weight {
    Weight::from_parts(25_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn execute_batch(c: u32) -> Weight {
    Weight::from_parts(10_000_000, 1000)
      .saturating_add(Weight::from_parts(20_000_000, 1000).saturating_mul(c.into()))
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().reads(2_u64.saturating_mul(c.into())))
      .saturating_add(T::DbWeight::get().writes(2_u64.saturating_mul(c.into())))
  }

  fn validate_transaction() -> Weight {
    Weight::from_parts(ECRECOVER.saturating_add(15_000_000), 2400)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn pay_for_transaction() -> Weight {
    Weight::from_parts(24_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(3))
  }

  fn execute_transaction() -> Weight {
    Weight::from_parts(28_000_000, 2200)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(3))
  }

  fn execute_transaction_from_outside() -> Weight {
    Weight::from_parts(ECRECOVER.saturating_add(35_000_000), 2800)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(3))
  }
}

impl WeightInfo for () {
  fn create_account() -> Weight { Weight::from_parts(18_000_000, 1600) }
  fn fund_account() -> Weight { Weight::from_parts(22_000_000, 1800) }
  fn transfer_ownership() -> Weight { Weight::from_parts(14_000_000, 1200) }
  fn validate_user_operation() -> Weight { Weight::from_parts(65_000_000, 2400) }
  fn execute() -> Weight { Weight::from_parts(25_000_000, 2000) }
  fn execute_batch(c: u32) -> Weight {
    Weight::from_parts(10_000_000, 1000)
      .saturating_add(Weight::from_parts(20_000_000, 1000).saturating_mul(c.into()))
  }
  fn validate_transaction() -> Weight { Weight::from_parts(60_000_000, 2400) }
  fn pay_for_transaction() -> Weight { Weight::from_parts(24_000_000, 2000) }
  fn execute_transaction() -> Weight { Weight::from_parts(28_000_000, 2200) }
  fn execute_transaction_from_outside() -> Weight { Weight::from_parts(80_000_000, 2800) }
}
