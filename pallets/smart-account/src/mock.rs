use crate as pallet_smart_account;
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::{
    PalletId, construct_runtime,
    traits::{ConstU32, ConstU64, Contains, Get},
  },
  sp_core::{
    H160, H256,
    Pair as _, ecdsa,
  },
  sp_runtime::{
    BuildStorage,
    traits::{BlakeTwo256, IdentityLookup},
  },
};

use alloc::{collections::BTreeMap, vec, vec::Vec};
use core::cell::RefCell;

use crate::{
  ActionCall, AddressMapper, ExternalCall, NativeTransactionOf, SmartAccountId,
  SystemNonceAuthority, UserOperationOf, hashing,
};

type Block = polkadot_sdk::frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = u128;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;

/// Relay driving standard accounts in tests.
pub const RELAY: AccountId = 10;
pub const BOOTLOADER: AccountId = 11;
/// Token contract reached through `ExternalCall`.
pub const TOKEN: AccountId = 20;
/// Destination whose every call fails.
pub const REVERTER: AccountId = 21;
pub const SYSTEM_TARGET: AccountId = 0xFFFF;

pub const CHAIN_ID: u64 = 1337;
pub const REVERT_REASON: &[u8] = b"always reverts";

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Balances: polkadot_sdk::pallet_balances,
    SmartAccount: pallet_smart_account,
  }
);

impl polkadot_sdk::frame_system::Config for Test {
  type BaseCallFilter = polkadot_sdk::frame_support::traits::Everything;
  type BlockWeights = ();
  type BlockLength = ();
  type DbWeight = ();
  type RuntimeOrigin = RuntimeOrigin;
  type RuntimeCall = RuntimeCall;
  type Nonce = u64;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Block = Block;
  type RuntimeEvent = RuntimeEvent;
  type BlockHashCount = ConstU64<250>;
  type Version = ();
  type PalletInfo = PalletInfo;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
  type OnNewAccount = ();
  type OnKilledAccount = ();
  type SystemWeightInfo = ();
  type SS58Prefix = ();
  type OnSetCode = ();
  type MaxConsumers = ConstU32<16>;
  type RuntimeTask = ();
  type ExtensionsWeightInfo = ();
  type SingleBlockMigrations = ();
  type MultiBlockMigrator = ();
  type PreInherents = ();
  type PostInherents = ();
  type PostTransactions = ();
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ConstU32<50>;
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type RuntimeEvent = RuntimeEvent;
  type DustRemoval = ();
  type ExistentialDeposit = ExistentialDeposit;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = RuntimeHoldReason;
  type RuntimeFreezeReason = RuntimeFreezeReason;
  type DoneSlashHandler = ();
}

pub struct ExistentialDeposit;
impl Get<Balance> for ExistentialDeposit {
  fn get() -> Balance {
    EXISTENTIAL_DEPOSIT.with(|ed| *ed.borrow())
  }
}

pub fn set_existential_deposit(amount: Balance) {
  EXISTENTIAL_DEPOSIT.with(|ed| *ed.borrow_mut() = amount);
}

pub struct SmartAccountPalletId;
impl Get<PalletId> for SmartAccountPalletId {
  fn get() -> PalletId {
    PalletId(*b"py/smacc")
  }
}

pub struct Bootloader;
impl Get<AccountId> for Bootloader {
  fn get() -> AccountId {
    BOOTLOADER
  }
}

pub struct SystemTargets;
impl Contains<AccountId> for SystemTargets {
  fn contains(who: &AccountId) -> bool {
    *who == SYSTEM_TARGET
  }
}

/// Owner addresses call from the account named by their low eight bytes.
pub struct LowBytesMapper;
impl AddressMapper<AccountId> for LowBytesMapper {
  fn to_account_id(address: &H160) -> AccountId {
    let mut low = [0u8; 8];
    low.copy_from_slice(&address.as_bytes()[12..]);
    AccountId::from_be_bytes(low)
  }
}

/// Calls understood by the `TOKEN` destination.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq)]
pub enum TokenCall {
  Mint { to: AccountId, amount: Balance },
  BalanceOf { who: AccountId },
}

thread_local! {
  static EXISTENTIAL_DEPOSIT: RefCell<Balance> = const { RefCell::new(1) };

  static TOKEN_BALANCES: RefCell<BTreeMap<AccountId, Balance>> = RefCell::new(BTreeMap::new());

  /// `(from, dest, value)` of every external call that went through.
  static EXTERNAL_CALLS: RefCell<Vec<(AccountId, AccountId, Balance)>> = RefCell::new(Vec::new());
}

pub fn reset_mock_adapters() {
  set_existential_deposit(1);
  TOKEN_BALANCES.with(|b| b.borrow_mut().clear());
  EXTERNAL_CALLS.with(|c| c.borrow_mut().clear());
}

pub fn token_balance(who: AccountId) -> Balance {
  TOKEN_BALANCES.with(|b| b.borrow().get(&who).copied().unwrap_or(0))
}

pub fn external_calls() -> Vec<(AccountId, AccountId, Balance)> {
  EXTERNAL_CALLS.with(|c| c.borrow().clone())
}

pub struct MockExternalCall;

impl ExternalCall<AccountId, Balance> for MockExternalCall {
  fn call(
    from: &AccountId,
    dest: &AccountId,
    value: Balance,
    payload: &[u8],
  ) -> Result<Vec<u8>, Vec<u8>> {
    match *dest {
      TOKEN => {
        let call = TokenCall::decode(&mut &payload[..]).map_err(|_| b"bad token call".to_vec())?;
        let output = match call {
          TokenCall::Mint { to, amount } => {
            TOKEN_BALANCES.with(|b| *b.borrow_mut().entry(to).or_default() += amount);
            Vec::new()
          }
          TokenCall::BalanceOf { who } => token_balance(who).encode(),
        };
        EXTERNAL_CALLS.with(|c| c.borrow_mut().push((*from, *dest, value)));
        Ok(output)
      }
      REVERTER => Err(REVERT_REASON.to_vec()),
      // Plain accounts accept value with any payload.
      _ => {
        EXTERNAL_CALLS.with(|c| c.borrow_mut().push((*from, *dest, value)));
        Ok(Vec::new())
      }
    }
  }
}

pub fn owner_pair() -> ecdsa::Pair {
  ecdsa::Pair::from_seed(&[0x11; 32])
}

pub fn stranger_pair() -> ecdsa::Pair {
  ecdsa::Pair::from_seed(&[0x22; 32])
}

/// 65-byte `r ‖ s ‖ v` signature with `v` in `{0, 1}`.
pub fn sign_digest(pair: &ecdsa::Pair, digest: &[u8; 32]) -> Vec<u8> {
  let sig = pair.sign_prehashed(digest);
  let bytes: &[u8] = sig.as_ref();
  bytes.to_vec()
}

pub fn eth_address(pair: &ecdsa::Pair) -> H160 {
  let probe = [0x42u8; 32];
  hashing::recover_signer(&probe, &sign_digest(pair, &probe)).expect("fresh signature recovers")
}

/// Runtime account the owner key calls from.
pub fn owner_origin_account(pair: &ecdsa::Pair) -> AccountId {
  LowBytesMapper::to_account_id(&eth_address(pair))
}

pub fn token_mint(to: AccountId, amount: Balance) -> ActionCall<AccountId, Balance> {
  ActionCall {
    dest: TOKEN,
    value: 0,
    payload: TokenCall::Mint { to, amount }.encode(),
  }
}

pub fn user_op(sender: SmartAccountId, call: ActionCall<AccountId, Balance>) -> UserOperationOf<Test> {
  crate::UserOperation {
    sender,
    nonce: 0,
    call,
    call_gas_limit: 100_000,
    verification_gas_limit: 50_000,
    pre_verification_gas: 21_000,
    max_fee_per_gas: 1,
    max_priority_fee_per_gas: 1,
    signature: Vec::new(),
  }
}

/// Sign `op` as the relay would expect from `pair`; returns the op hash.
pub fn sign_user_op(pair: &ecdsa::Pair, op: &mut UserOperationOf<Test>) -> H256 {
  let op_hash = SmartAccount::user_operation_hash(op).expect("standard account");
  op.signature = sign_digest(pair, &hashing::eth_signed_message_hash(&op_hash));
  op_hash
}

pub fn native_tx(from: SmartAccountId, nonce: u64) -> NativeTransactionOf<Test> {
  crate::NativeTransaction {
    tx_type: 113,
    from,
    to: TOKEN,
    gas_limit: 1_000,
    gas_per_pubdata_byte_limit: 800,
    max_fee_per_gas: 2,
    max_priority_fee_per_gas: 1,
    nonce,
    value: 0,
    data: TokenCall::Mint { to: CHARLIE, amount: 5 }.encode(),
    factory_deps: Vec::new(),
    signature: Vec::new(),
  }
}

pub fn sign_tx(pair: &ecdsa::Pair, tx: &mut NativeTransactionOf<Test>) -> H256 {
  let tx_hash = SmartAccount::transaction_hash(tx);
  tx.signature = sign_digest(pair, &tx_hash.0);
  tx_hash
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn owner() -> H160 {
    eth_address(&owner_pair())
  }

  fn sign(digest: &[u8; 32]) -> Vec<u8> {
    sign_digest(&owner_pair(), digest)
  }

  fn system_target() -> AccountId {
    SYSTEM_TARGET
  }
}

impl pallet_smart_account::Config for Test {
  type Balance = Balance;
  type Currency = Balances;
  type RuntimeCall = RuntimeCall;
  type ExternalCall = MockExternalCall;
  type NonceAuthority = SystemNonceAuthority<Test>;
  type AddressMapper = LowBytesMapper;
  type SystemTargets = SystemTargets;
  type Bootloader = Bootloader;
  type PalletId = SmartAccountPalletId;
  type ChainId = ConstU64<CHAIN_ID>;
  type MaxBatchCalls = ConstU32<4>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub const TEST_INITIAL_BALANCE: Balance = 10_000_000_000_000;

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  reset_mock_adapters();
  let mut t = polkadot_sdk::frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, TEST_INITIAL_BALANCE),
      (BOB, TEST_INITIAL_BALANCE),
      (CHARLIE, TEST_INITIAL_BALANCE),
      (RELAY, 1),
      (BOOTLOADER, 1),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
  });
  ext
}
