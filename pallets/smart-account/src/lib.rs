//! Smart Account Pallet
//!
//! A programmable identity controlled by a single secp256k1 owner key. Each
//! account is driven either by a trusted relay (standard accounts: validate,
//! then execute) or by the runtime's bootloader (native accounts: validate,
//! pay, execute), and its owner may always act directly.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{AddressMapper, ExternalCall, NonceAuthority, SystemNonceAuthority};

pub mod hashing;
pub mod protocol;

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::smart-account";

/// Nesting limit when decoding a system-target payload into a runtime call.
pub const MAX_CALL_DECODE_DEPTH: u32 = 256;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Address of the key `sign` signs with.
  fn owner() -> polkadot_sdk::sp_core::H160;
  fn sign(digest: &[u8; 32]) -> alloc::vec::Vec<u8>;
  /// A member of `SystemTargets`.
  fn system_target() -> AccountId;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    AddressMapper, ExternalCall, LOG_TARGET, MAX_CALL_DECODE_DEPTH, NonceAuthority, WeightInfo,
    hashing,
    protocol::{Native, Protocol, Standard},
    types::*,
  };
  use alloc::vec::Vec;
  use codec::DecodeLimit;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{
      PalletId,
      dispatch::{GetDispatchInfo, PostDispatchInfo},
      storage::with_storage_layer,
      traits::{
        Contains,
        fungible::{Inspect, Mutate},
        tokens::{Fortitude, Preservation},
      },
    },
    sp_core::{H160, H256, hexdisplay::HexDisplay},
    sp_runtime::traits::{AccountIdConversion, Dispatchable, Zero},
  };

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaybeSerializeDeserialize
      + MaxEncodedLen;

    /// Native currency held by account sovereigns.
    type Currency: Mutate<Self::AccountId, Balance = Self::Balance>;

    /// Calls accepted by system targets.
    type RuntimeCall: Parameter
      + Dispatchable<RuntimeOrigin = Self::RuntimeOrigin, PostInfo = PostDispatchInfo>
      + GetDispatchInfo
      + From<frame_system::Call<Self>>;

    type ExternalCall: ExternalCall<Self::AccountId, Self::Balance>;
    type NonceAuthority: NonceAuthority<Self::AccountId>;
    type AddressMapper: AddressMapper<Self::AccountId>;

    /// Destinations reached through runtime dispatch instead of `ExternalCall`.
    type SystemTargets: Contains<Self::AccountId>;

    /// Fixed dispatcher of every native account.
    #[pallet::constant]
    type Bootloader: Get<Self::AccountId>;

    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Domain separator input for both action hash layouts.
    #[pallet::constant]
    type ChainId: Get<u64>;

    #[pallet::constant]
    type MaxBatchCalls: Get<u32>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  pub type BalanceOf<T> = <T as Config>::Balance;

  pub type SmartAccountOf<T> =
    SmartAccount<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;

  pub type ActionCallOf<T> = ActionCall<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

  pub type UserOperationOf<T> =
    UserOperation<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

  pub type NativeTransactionOf<T> =
    NativeTransaction<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn next_account_id)]
  pub type NextAccountId<T> = StorageValue<_, SmartAccountId, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn accounts)]
  pub type Accounts<T: Config> =
    StorageMap<_, Blake2_128Concat, SmartAccountId, SmartAccountOf<T>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn sovereign_index)]
  pub type SovereignIndex<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, SmartAccountId, OptionQuery>;

  /// Native accounts between bootloader phases. Absent means idle.
  #[pallet::storage]
  #[pallet::getter(fn pending_validation)]
  pub type PendingValidations<T: Config> =
    StorageMap<_, Blake2_128Concat, SmartAccountId, ValidatedTransaction, OptionQuery>;

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn integrity_test() {
      assert!(T::MaxBatchCalls::get() > 0, "MaxBatchCalls must be non-zero");
      assert!(
        !T::SystemTargets::contains(&T::Bootloader::get()),
        "Bootloader must not be a system target"
      );
    }
  }

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    AccountCreated {
      account_id: SmartAccountId,
      owner: H160,
      kind: AccountKind<T::AccountId>,
      sovereign_account: T::AccountId,
    },
    AccountFunded {
      account_id: SmartAccountId,
      from: T::AccountId,
      amount: BalanceOf<T>,
    },
    OwnershipTransferred {
      account_id: SmartAccountId,
      previous_owner: H160,
      new_owner: H160,
    },
    UserOperationValidated {
      account_id: SmartAccountId,
      op_hash: H256,
      result: AuthorizationResult,
    },
    TransactionValidated {
      account_id: SmartAccountId,
      tx_hash: H256,
      nonce: u64,
      result: AuthorizationResult,
    },
    FeesSettled {
      account_id: SmartAccountId,
      payee: T::AccountId,
      amount: BalanceOf<T>,
    },
    Executed {
      account_id: SmartAccountId,
      dest: T::AccountId,
      value: BalanceOf<T>,
      kind: CallKind,
    },
    TransactionExecuted {
      account_id: SmartAccountId,
      tx_hash: H256,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    AccountNotFound,
    AccountIdOverflow,
    SovereignAccountCollision,
    /// Owner must not be the zero address.
    ZeroOwner,
    AmountZero,
    /// The account does not follow the protocol of the called entry point.
    WrongAccountKind,
    /// Caller is not in the set permitted for this entry point.
    NotAuthorizedCaller,
    InsufficientBalance,
    FeeOverflow,
    FailedToPay,
    /// A forwarded call on the relay path failed.
    CallFailed,
    /// A forwarded call on the bootloader path failed.
    FailedExecution,
    InvalidSignature,
    /// No validated transaction with this hash is pending.
    NotValidated,
    TransactionHashMismatch,
    FeesAlreadyPaid,
    TooManyCalls,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_account())]
    pub fn create_account(
      origin: OriginFor<T>,
      owner: H160,
      kind: AccountKind<T::AccountId>,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(!owner.is_zero(), Error::<T>::ZeroOwner);
      let account_id = NextAccountId::<T>::get();
      let next_id = account_id
        .checked_add(1)
        .ok_or(Error::<T>::AccountIdOverflow)?;
      let sovereign_account = Self::sovereign_account_id(account_id);
      ensure!(
        !SovereignIndex::<T>::contains_key(&sovereign_account),
        Error::<T>::SovereignAccountCollision
      );

      Accounts::<T>::insert(
        account_id,
        SmartAccount {
          owner,
          kind: kind.clone(),
          sovereign_account: sovereign_account.clone(),
          created_at: frame_system::Pallet::<T>::block_number(),
        },
      );
      SovereignIndex::<T>::insert(&sovereign_account, account_id);
      NextAccountId::<T>::put(next_id);
      // Never reaped, so the system nonce backing replay protection never resets.
      frame_system::Pallet::<T>::inc_providers(&sovereign_account);

      Self::deposit_event(Event::AccountCreated {
        account_id,
        owner,
        kind,
        sovereign_account,
      });
      Ok(())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::fund_account())]
    pub fn fund_account(
      origin: OriginFor<T>,
      account_id: SmartAccountId,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(!amount.is_zero(), Error::<T>::AmountZero);
      let account = Accounts::<T>::get(account_id).ok_or(Error::<T>::AccountNotFound)?;
      T::Currency::transfer(
        &who,
        &account.sovereign_account,
        amount,
        Preservation::Expendable,
      )?;
      Self::deposit_event(Event::AccountFunded {
        account_id,
        from: who,
        amount,
      });
      Ok(())
    }

    /// Replace the owner key. Takes effect for every later signature check;
    /// a native validation still pending under the previous owner is dropped.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::transfer_ownership())]
    pub fn transfer_ownership(
      origin: OriginFor<T>,
      account_id: SmartAccountId,
      new_owner: H160,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Accounts::<T>::try_mutate(account_id, |maybe| -> DispatchResult {
        let account = maybe.as_mut().ok_or(Error::<T>::AccountNotFound)?;
        Self::ensure_caller(CallerGate::OwnerOrSelf, account, &who)?;
        ensure!(!new_owner.is_zero(), Error::<T>::ZeroOwner);
        let previous_owner = core::mem::replace(&mut account.owner, new_owner);
        PendingValidations::<T>::remove(account_id);
        Self::deposit_event(Event::OwnershipTransferred {
          account_id,
          previous_owner,
          new_owner,
        });
        Ok(())
      })
    }

    /// Relay validation of a bundled operation, followed by the prefund.
    ///
    /// A wrong signer is reported through `UserOperationValidated`, not as an
    /// error; the prefund is still owed to the relay in that case.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::validate_user_operation())]
    pub fn validate_user_operation(
      origin: OriginFor<T>,
      op: UserOperationOf<T>,
      op_hash: H256,
      missing_funds: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::validate_user_operation_from(&who, &op, op_hash, missing_funds).map(|_| ())
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::execute().saturating_add(Pallet::<T>::forwarded_weight(dest, payload)))]
    pub fn execute(
      origin: OriginFor<T>,
      account_id: SmartAccountId,
      dest: T::AccountId,
      value: BalanceOf<T>,
      payload: Vec<u8>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let call = ActionCall {
        dest,
        value,
        payload,
      };
      Self::execute_from(&who, account_id, &call).map(|_| ())
    }

    #[pallet::call_index(5)]
    #[pallet::weight(
      T::WeightInfo::execute_batch(calls.len() as u32).saturating_add(
        calls.iter().fold(Weight::zero(), |acc, c| {
          acc.saturating_add(Pallet::<T>::forwarded_weight(&c.dest, &c.payload))
        })
      )
    )]
    pub fn execute_batch(
      origin: OriginFor<T>,
      account_id: SmartAccountId,
      calls: Vec<ActionCallOf<T>>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::execute_batch_from(&who, account_id, &calls)
    }

    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::validate_transaction())]
    pub fn validate_transaction(
      origin: OriginFor<T>,
      tx_hash: H256,
      tx: NativeTransactionOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::validate_transaction_from(&who, tx_hash, &tx).map(|_| ())
    }

    /// Pay the bootloader for a validated transaction, accepted or rejected.
    ///
    /// Open to any signed origin, but only the bootloader's own request moves
    /// funds. Any other caller pays the extrinsic fee for a no-op.
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::pay_for_transaction())]
    pub fn pay_for_transaction(
      origin: OriginFor<T>,
      tx_hash: H256,
      tx: NativeTransactionOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::pay_for_transaction_from(&who, tx_hash, &tx)
    }

    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::execute_transaction().saturating_add(Pallet::<T>::forwarded_weight(&tx.to, &tx.data)))]
    pub fn execute_transaction(
      origin: OriginFor<T>,
      tx_hash: H256,
      tx: NativeTransactionOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::execute_transaction_from(&who, tx_hash, &tx).map(|_| ())
    }

    /// Validate and execute an owner-signed transaction in one step. Anyone
    /// may relay it; the embedded signature is the authorization.
    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::execute_transaction_from_outside().saturating_add(Pallet::<T>::forwarded_weight(&tx.to, &tx.data)))]
    pub fn execute_transaction_from_outside(
      origin: OriginFor<T>,
      tx: NativeTransactionOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::execute_transaction_from_outside_from(&who, &tx).map(|_| ())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn sovereign_account_id(account_id: SmartAccountId) -> T::AccountId {
      let seed = frame::hashing::blake2_256(&(b"smart-account", account_id).encode());
      // Small AccountId types lose the sub-account payload to truncation.
      let mut id_bytes = T::PalletId::get().0;
      for (i, b) in seed.iter().enumerate() {
        id_bytes[i % 8] ^= b;
      }
      PalletId(id_bytes).into_sub_account_truncating(account_id)
    }

    pub fn dispatcher_of(account: &SmartAccountOf<T>) -> T::AccountId {
      match &account.kind {
        AccountKind::Standard { dispatcher } => dispatcher.clone(),
        AccountKind::Native => T::Bootloader::get(),
      }
    }

    pub fn is_authorized_caller(
      gate: CallerGate,
      account: &SmartAccountOf<T>,
      who: &T::AccountId,
    ) -> bool {
      let is_dispatcher = || *who == Self::dispatcher_of(account);
      let is_owner = || *who == T::AddressMapper::to_account_id(&account.owner);
      match gate {
        CallerGate::Dispatcher => is_dispatcher(),
        CallerGate::OwnerOrSelf => is_owner() || *who == account.sovereign_account,
        CallerGate::DispatcherOrOwner => is_dispatcher() || is_owner(),
        CallerGate::Unrestricted => true,
      }
    }

    fn ensure_caller(
      gate: CallerGate,
      account: &SmartAccountOf<T>,
      who: &T::AccountId,
    ) -> DispatchResult {
      ensure!(
        Self::is_authorized_caller(gate, account, who),
        Error::<T>::NotAuthorizedCaller
      );
      Ok(())
    }

    fn account_for<P: Protocol<T>>(
      account_id: SmartAccountId,
    ) -> Result<SmartAccountOf<T>, DispatchError> {
      let account = Accounts::<T>::get(account_id).ok_or(Error::<T>::AccountNotFound)?;
      ensure!(P::supports(&account.kind), Error::<T>::WrongAccountKind);
      Ok(account)
    }

    /// Hash a relay operation the way its signer must have, or `None` if
    /// `op.sender` is not a standard account.
    pub fn user_operation_hash(op: &UserOperationOf<T>) -> Option<H256> {
      let account = Self::account_for::<Standard>(op.sender).ok()?;
      Some(<Standard as Protocol<T>>::action_hash(op, &account))
    }

    pub fn transaction_hash(tx: &NativeTransactionOf<T>) -> H256 {
      hashing::transaction_hash(tx, T::ChainId::get())
    }

    /// Check that `action` carries the owner's signature over its canonical hash.
    ///
    /// Never fails: a foreign signer, a malformed signature or a supplied hash
    /// that does not match the canonical one all yield `Rejected`.
    pub fn authorize<P: Protocol<T>>(
      account_id: SmartAccountId,
      account: &SmartAccountOf<T>,
      action: &P::Action,
      supplied_hash: &H256,
    ) -> AuthorizationResult {
      let canonical = P::action_hash(action, account);
      if canonical != *supplied_hash {
        log::debug!(
          target: LOG_TARGET,
          "account {account_id}: supplied hash {supplied_hash:?} != canonical {canonical:?}"
        );
        return AuthorizationResult::Rejected;
      }
      match hashing::recover_signer(&P::signed_digest(&canonical), P::signature(action)) {
        Ok(signer) => (signer == account.owner).into(),
        Err(e) => {
          log::debug!(target: LOG_TARGET, "account {account_id}: unusable signature: {e:?}");
          AuthorizationResult::Rejected
        }
      }
    }

    fn spendable(who: &T::AccountId) -> BalanceOf<T> {
      T::Currency::reducible_balance(who, Preservation::Preserve, Fortitude::Polite)
    }

    /// Pay `amount` from the sovereign to the caller of the current phase.
    /// Zero is a no-op; a failed transfer is fatal.
    fn settle_fees(
      account_id: SmartAccountId,
      account: &SmartAccountOf<T>,
      payee: &T::AccountId,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      if amount.is_zero() {
        return Ok(());
      }
      ensure!(
        Self::spendable(&account.sovereign_account) >= amount,
        Error::<T>::InsufficientBalance
      );
      T::Currency::transfer(
        &account.sovereign_account,
        payee,
        amount,
        Preservation::Preserve,
      )
      .map_err(|e| {
        log::warn!(target: LOG_TARGET, "account {account_id}: fee transfer failed: {e:?}");
        Error::<T>::FailedToPay
      })?;
      Self::deposit_event(Event::FeesSettled {
        account_id,
        payee: payee.clone(),
        amount,
      });
      Ok(())
    }

    pub fn call_kind(dest: &T::AccountId) -> CallKind {
      if T::SystemTargets::contains(dest) {
        CallKind::System
      } else {
        CallKind::External
      }
    }

    /// Declared weight of a system-target payload; zero for ordinary targets.
    pub fn forwarded_weight(dest: &T::AccountId, payload: &[u8]) -> Weight {
      match Self::call_kind(dest) {
        CallKind::System => Self::decode_system_call(payload)
          .map(|call| call.get_dispatch_info().call_weight)
          .unwrap_or_default(),
        CallKind::External => Weight::zero(),
      }
    }

    fn decode_system_call(payload: &[u8]) -> Option<<T as Config>::RuntimeCall> {
      <<T as Config>::RuntimeCall as DecodeLimit>::decode_all_with_depth_limit(
        MAX_CALL_DECODE_DEPTH,
        &mut &payload[..],
      )
      .ok()
    }

    /// Move `call.value` out of the sovereign and invoke the destination.
    ///
    /// Runs in its own storage layer: on any failure the sovereign's balance
    /// is exactly what it was before.
    pub fn forward_call(
      account_id: SmartAccountId,
      sovereign: &T::AccountId,
      call: &ActionCallOf<T>,
    ) -> Result<Vec<u8>, CallFailure> {
      with_storage_layer(|| {
        if !call.value.is_zero() {
          ensure!(
            Self::spendable(sovereign) >= call.value,
            CallFailure::InsufficientBalance
          );
          T::Currency::transfer(sovereign, &call.dest, call.value, Preservation::Preserve)?;
        }

        let kind = Self::call_kind(&call.dest);
        let output = match kind {
          CallKind::System => {
            let runtime_call =
              Self::decode_system_call(&call.payload).ok_or(CallFailure::UndecodableSystemCall)?;
            let origin: T::RuntimeOrigin = frame_system::RawOrigin::Signed(sovereign.clone()).into();
            runtime_call
              .dispatch(origin)
              .map_err(|e| CallFailure::Reverted(e.error.encode()))?;
            Vec::new()
          }
          CallKind::External => {
            T::ExternalCall::call(sovereign, &call.dest, call.value, &call.payload)
              .map_err(CallFailure::Reverted)?
          }
        };

        Self::deposit_event(Event::Executed {
          account_id,
          dest: call.dest.clone(),
          value: call.value,
          kind,
        });
        Ok(output)
      })
    }

    fn call_error(account_id: SmartAccountId, failure: CallFailure, error: Error<T>) -> DispatchError {
      match failure {
        CallFailure::InsufficientBalance => Error::<T>::InsufficientBalance.into(),
        other => {
          log::warn!(
            target: LOG_TARGET,
            "account {account_id}: forwarded call failed: {other:?}, revert data 0x{}",
            HexDisplay::from(&other.revert_data())
          );
          error.into()
        }
      }
    }

    pub fn validate_user_operation_from(
      who: &T::AccountId,
      op: &UserOperationOf<T>,
      op_hash: H256,
      missing_funds: BalanceOf<T>,
    ) -> Result<AuthorizationResult, DispatchError> {
      let account_id = op.sender;
      let account = Self::account_for::<Standard>(account_id)?;
      Self::ensure_caller(<Standard as Protocol<T>>::VALIDATE, &account, who)?;

      let result = Self::authorize::<Standard>(account_id, &account, op, &op_hash);
      Self::settle_fees(account_id, &account, who, missing_funds)?;

      Self::deposit_event(Event::UserOperationValidated {
        account_id,
        op_hash,
        result,
      });
      Ok(result)
    }

    pub fn execute_from(
      who: &T::AccountId,
      account_id: SmartAccountId,
      call: &ActionCallOf<T>,
    ) -> Result<Vec<u8>, DispatchError> {
      let account = Self::account_for::<Standard>(account_id)?;
      Self::ensure_caller(<Standard as Protocol<T>>::EXECUTE, &account, who)?;
      Self::forward_call(account_id, &account.sovereign_account, call)
        .map_err(|failure| Self::call_error(account_id, failure, Error::<T>::CallFailed))
    }

    /// Forward `calls` in order; the first failure undoes the whole batch.
    pub fn execute_batch_from(
      who: &T::AccountId,
      account_id: SmartAccountId,
      calls: &[ActionCallOf<T>],
    ) -> DispatchResult {
      ensure!(
        calls.len() as u32 <= T::MaxBatchCalls::get(),
        Error::<T>::TooManyCalls
      );
      let account = Self::account_for::<Standard>(account_id)?;
      Self::ensure_caller(<Standard as Protocol<T>>::EXECUTE, &account, who)?;
      with_storage_layer(|| {
        for call in calls {
          Self::forward_call(account_id, &account.sovereign_account, call)
            .map_err(|failure| Self::call_error(account_id, failure, Error::<T>::CallFailed))?;
        }
        Ok(())
      })
    }

    /// Balance check, replay slot, signature, in that order.
    ///
    /// An unaffordable transaction leaves the nonce untouched. A rejected
    /// signature still consumes it.
    fn validate_native(
      account_id: SmartAccountId,
      account: &SmartAccountOf<T>,
      tx: &NativeTransactionOf<T>,
      tx_hash: &H256,
    ) -> Result<AuthorizationResult, DispatchError> {
      let required = tx
        .total_required_balance()
        .ok_or(Error::<T>::FeeOverflow)?;
      ensure!(
        Self::spendable(&account.sovereign_account) >= required,
        Error::<T>::InsufficientBalance
      );
      T::NonceAuthority::increment_if_equals(&account.sovereign_account, tx.nonce)?;
      Ok(Self::authorize::<Native>(account_id, account, tx, tx_hash))
    }

    pub fn validate_transaction_from(
      who: &T::AccountId,
      tx_hash: H256,
      tx: &NativeTransactionOf<T>,
    ) -> Result<AuthorizationResult, DispatchError> {
      let account_id = tx.from;
      let account = Self::account_for::<Native>(account_id)?;
      Self::ensure_caller(<Native as Protocol<T>>::VALIDATE, &account, who)?;

      with_storage_layer(|| {
        let result = Self::validate_native(account_id, &account, tx, &tx_hash)?;
        if let Some(stale) = PendingValidations::<T>::get(account_id) {
          log::debug!(
            target: LOG_TARGET,
            "account {account_id}: replacing unfinished validation {:?}",
            stale.tx_hash
          );
        }
        PendingValidations::<T>::insert(
          account_id,
          ValidatedTransaction {
            tx_hash,
            result,
            fee_paid: false,
          },
        );
        Self::deposit_event(Event::TransactionValidated {
          account_id,
          tx_hash,
          nonce: tx.nonce,
          result,
        });
        Ok(result)
      })
    }

    /// The pending validation for `tx_hash`, whatever its result.
    fn ensure_validated<'a>(
      pending: Option<&'a ValidatedTransaction>,
      tx_hash: &H256,
      tx: &NativeTransactionOf<T>,
    ) -> Result<&'a ValidatedTransaction, DispatchError> {
      let pending = pending
        .filter(|p| p.tx_hash == *tx_hash)
        .ok_or(Error::<T>::NotValidated)?;
      ensure!(
        Self::transaction_hash(tx) == *tx_hash,
        Error::<T>::TransactionHashMismatch
      );
      Ok(pending)
    }

    pub fn pay_for_transaction_from(
      who: &T::AccountId,
      tx_hash: H256,
      tx: &NativeTransactionOf<T>,
    ) -> DispatchResult {
      let account_id = tx.from;
      let account = Self::account_for::<Native>(account_id)?;
      if !Self::is_authorized_caller(CallerGate::Dispatcher, &account, who) {
        log::debug!(
          target: LOG_TARGET,
          "account {account_id}: ignoring fee payment requested by non-bootloader {who:?}"
        );
        return Ok(());
      }
      let fee = tx.fee().ok_or(Error::<T>::FeeOverflow)?;

      with_storage_layer(|| {
        PendingValidations::<T>::try_mutate(account_id, |maybe| -> DispatchResult {
          Self::ensure_validated(maybe.as_ref(), &tx_hash, tx)?;
          let pending = maybe.as_mut().ok_or(Error::<T>::NotValidated)?;
          ensure!(!pending.fee_paid, Error::<T>::FeesAlreadyPaid);
          pending.fee_paid = true;
          Ok(())
        })?;
        Self::settle_fees(account_id, &account, who, fee)
      })
    }

    pub fn execute_transaction_from(
      who: &T::AccountId,
      tx_hash: H256,
      tx: &NativeTransactionOf<T>,
    ) -> Result<Vec<u8>, DispatchError> {
      let account_id = tx.from;
      let account = Self::account_for::<Native>(account_id)?;
      Self::ensure_caller(<Native as Protocol<T>>::EXECUTE, &account, who)?;

      with_storage_layer(|| {
        // Idle before the call; a reentrant execute finds nothing to run.
        let pending = PendingValidations::<T>::take(account_id);
        let validated = Self::ensure_validated(pending.as_ref(), &tx_hash, tx)?;
        ensure!(validated.result.is_accepted(), Error::<T>::InvalidSignature);
        let output = Self::forward_call(account_id, &account.sovereign_account, &tx.as_call())
          .map_err(|failure| Self::call_error(account_id, failure, Error::<T>::FailedExecution))?;
        Self::deposit_event(Event::TransactionExecuted {
          account_id,
          tx_hash,
        });
        Ok(output)
      })
    }

    pub fn execute_transaction_from_outside_from(
      who: &T::AccountId,
      tx: &NativeTransactionOf<T>,
    ) -> Result<Vec<u8>, DispatchError> {
      let account_id = tx.from;
      let account = Self::account_for::<Native>(account_id)?;
      Self::ensure_caller(CallerGate::Unrestricted, &account, who)?;

      with_storage_layer(|| {
        let tx_hash = Self::transaction_hash(tx);
        let result = Self::validate_native(account_id, &account, tx, &tx_hash)?;
        ensure!(result.is_accepted(), Error::<T>::InvalidSignature);
        let output = Self::forward_call(account_id, &account.sovereign_account, &tx.as_call())
          .map_err(|failure| Self::call_error(account_id, failure, Error::<T>::FailedExecution))?;
        Self::deposit_event(Event::TransactionExecuted {
          account_id,
          tx_hash,
        });
        Ok(output)
      })
    }
  }
}
