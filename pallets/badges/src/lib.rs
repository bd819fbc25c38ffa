//! # Badge ledger pallet
//!
//! Semi-fungible badge classes whose sub-badge ID spaces scale to millions
//! of IDs. Holdings are tracked as range-compressed balances (per-ID amount
//! over canonical ID ranges) rather than one entry per ID. Transfers either
//! settle directly (forceful or approval-backed) or go through a mirrored
//! pending-transfer queue requiring bilateral consent. A per-badge freeze
//! range set and named manager capabilities gate every mutation.

#![cfg_attr(not(feature = "std"), no_std)]
// Constant call weights until generated WeightInfo lands.
#![allow(deprecated)]

use frame_support::{dispatch::DispatchResult, ensure, pallet_prelude::*};
use frame_system::{ensure_signed, pallet_prelude::*};
use sp_std::prelude::*;

pub use pallet::*;

pub mod balances;
pub mod pending;
pub mod ranges;
pub mod types;

pub mod migrations;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

/// The current storage version.
const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use crate::balances::{self as ledger, LedgerError};
    use crate::pending;
    use crate::ranges::{self, RangeError};
    use crate::types::{Badge, BadgeBalance, IdRange, MetadataOf, PendingTransfer, Permissions};
    use frame_support::traits::UnixTime;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;
        /// Clock for pending-transfer expiration and cancellation windows.
        type TimeProvider: UnixTime;
    }

    #[pallet::pallet]
    #[pallet::storage_version(STORAGE_VERSION)]
    pub struct Pallet<T>(_);

    /// Next badge class ID to allocate.
    #[pallet::storage]
    #[pallet::getter(fn next_badge_id)]
    pub type NextBadgeId<T> = StorageValue<_, u64, ValueQuery>;

    /// Badge class records by badge ID.
    #[pallet::storage]
    #[pallet::getter(fn badges)]
    #[pallet::unbounded]
    pub type Badges<T> = StorageMap<_, Blake2_128Concat, u64, Badge, OptionQuery>;

    /// Ledger records by (badge ID, account number). Created lazily, only
    /// removed by pruning after the badge is destroyed.
    #[pallet::storage]
    #[pallet::getter(fn balance_store)]
    #[pallet::unbounded]
    pub type BalanceStore<T> =
        StorageDoubleMap<_, Blake2_128Concat, u64, Blake2_128Concat, u64, BadgeBalance, OptionQuery>;

    /// Compact number assigned to an account on its first
    /// balance-affecting touch. Freeze ranges, pending-transfer parties and
    /// approvals all speak account numbers.
    #[pallet::storage]
    #[pallet::getter(fn account_number)]
    pub type AccountNumbers<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, u64, OptionQuery>;

    /// Reverse of [`AccountNumbers`].
    #[pallet::storage]
    #[pallet::getter(fn account_by_number)]
    pub type AccountByNumber<T: Config> =
        StorageMap<_, Blake2_128Concat, u64, T::AccountId, OptionQuery>;

    #[pallet::storage]
    #[pallet::getter(fn next_account_number)]
    pub type NextAccountNumber<T> = StorageValue<_, u64, ValueQuery>;

    /// Accounts (by number) that have asked to become manager of a badge,
    /// consumed by `transfer_manager`.
    #[pallet::storage]
    pub type ManagerTransferRequests<T> =
        StorageDoubleMap<_, Blake2_128Concat, u64, Blake2_128Concat, u64, (), OptionQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// An account was assigned its compact account number.
        AccountRegistered { account: T::AccountId, number: u64 },
        /// A new badge class was created.
        BadgeCreated { badge_id: u64, manager: u64 },
        /// New sub-badge IDs were allocated with the given per-ID supply,
        /// credited to the manager.
        SubBadgesCreated { badge_id: u64, range: IdRange, supply: u64 },
        /// Balances moved on the ledger.
        Transferred { badge_id: u64, from: u64, to: u64, range: IdRange, amount: u64 },
        /// A mirrored pending-transfer pair was created.
        TransferRequested {
            badge_id: u64,
            from: u64,
            to: u64,
            range: IdRange,
            amount: u64,
            from_nonce: u64,
            to_nonce: u64,
        },
        /// One side consented to a pending transfer; settlement still
        /// requires the counterparty.
        PendingTransferApproved { badge_id: u64, account: u64, nonce: u64 },
        /// A pending transfer settled into the ledger; both mirrored
        /// records are gone.
        PendingTransferSettled { badge_id: u64, from: u64, to: u64, range: IdRange, amount: u64 },
        /// A pending transfer was denied or cancelled.
        PendingTransferClosed { badge_id: u64, account: u64, nonce: u64 },
        /// An expired pending transfer was pruned from both queues.
        PendingTransferExpired { badge_id: u64, account: u64, nonce: u64 },
        /// An approval was overwritten for the given range; amount 0
        /// revokes.
        ApprovalSet { badge_id: u64, owner: u64, approved: u64, range: IdRange, amount: u64 },
        /// The manager revoked badges from a holder.
        Revoked { badge_id: u64, from: u64, range: IdRange, amount: u64 },
        /// A range of account numbers was added to or removed from the
        /// badge's freeze ranges.
        FreezeRangesUpdated { badge_id: u64, range: IdRange, frozen: bool },
        UrisUpdated { badge_id: u64 },
        PermissionsUpdated { badge_id: u64 },
        BytesUpdated { badge_id: u64 },
        /// An account volunteered (or withdrew) to take over as manager.
        ManagerTransferRequested { badge_id: u64, account: u64, active: bool },
        ManagerTransferred { badge_id: u64, from: u64, to: u64 },
        BadgeSelfDestructed { badge_id: u64 },
        /// Balance records of a destroyed badge were removed.
        BalancesPruned { badge_id: u64, removed: u32 },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Range bounds are inverted (`start > end`).
        InvalidRange,
        /// Ranges that must stay distinct would have been unioned.
        RangeOverlap,
        /// Removal of a range the holder does not fully own.
        RangeNotFullyOwned,
        /// Zero amounts denote absence and cannot be moved.
        InvalidAmount,
        InsufficientBalance,
        InsufficientApproval,
        /// `cant_cancel_before_time` exceeds `expiration_time`.
        InvalidExpiration,
        /// No pending transfer of the caller matches the nonce range.
        NonceNotFound,
        /// Every matching pending transfer has expired.
        TransferExpired,
        /// The sending side is frozen for this badge.
        AddressFrozen,
        /// The badge's permissions forbid this operation.
        PermissionDenied,
        /// Forceful settlement without the sending side's consent.
        TransferNotApproved,
        /// The initiator may not cancel yet.
        CannotCancelYet,
        /// A pending transfer must involve two distinct parties.
        SelfTransfer,
        BadgeNotFound,
        NotManager,
        Overflow,
        /// Manager transfer needs a standing request from the recipient.
        ManagerTransferNotRequested,
        /// Balances can only be pruned once the badge is destroyed.
        BadgeStillExists,
        /// Supply and count lists must pair up.
        LengthMismatch,
        UriTooLong,
        BytesTooLong,
    }

    impl<T> From<RangeError> for Error<T> {
        fn from(e: RangeError) -> Self {
            match e {
                RangeError::InvalidRange => Error::<T>::InvalidRange,
                RangeError::Overlap => Error::<T>::RangeOverlap,
                RangeError::NotFullyOwned => Error::<T>::RangeNotFullyOwned,
            }
        }
    }

    impl<T> From<LedgerError> for Error<T> {
        fn from(e: LedgerError) -> Self {
            match e {
                LedgerError::InvalidAmount => Error::<T>::InvalidAmount,
                LedgerError::InsufficientBalance => Error::<T>::InsufficientBalance,
                LedgerError::Overflow => Error::<T>::Overflow,
                LedgerError::Range(r) => r.into(),
            }
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Creates a new badge class managed by the caller. A default
        /// sub-badge supply of 0 is normalized to 1.
        #[pallet::call_index(0)]
        #[pallet::weight(10_000)]
        pub fn create_badge(
            origin: OriginFor<T>,
            uri: Vec<u8>,
            arbitrary_bytes: Vec<u8>,
            permissions: Permissions,
            default_subasset_supply: u64,
            standard: u64,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let manager = Self::account_number_or_assign(&who);
            let uri: MetadataOf = uri.try_into().map_err(|_| Error::<T>::UriTooLong)?;
            let arbitrary_bytes: MetadataOf =
                arbitrary_bytes.try_into().map_err(|_| Error::<T>::BytesTooLong)?;

            let id = NextBadgeId::<T>::get();
            NextBadgeId::<T>::put(id.checked_add(1).ok_or(Error::<T>::Overflow)?);
            let default_subasset_supply =
                if default_subasset_supply == 0 { 1 } else { default_subasset_supply };

            Badges::<T>::insert(
                id,
                Badge {
                    id,
                    uri,
                    arbitrary_bytes,
                    manager,
                    permissions,
                    freeze_ranges: Vec::new(),
                    next_subasset_id: 0,
                    subasset_supplys: Vec::new(),
                    default_subasset_supply,
                    standard,
                },
            );
            Self::deposit_event(Event::BadgeCreated { badge_id: id, manager });
            Ok(())
        }

        /// Allocates new sub-badge IDs. For each `(supply, count)` pair,
        /// `count` fresh IDs are created carrying `supply` units per ID
        /// (0 means the badge default), credited to the manager.
        #[pallet::call_index(1)]
        #[pallet::weight(10_000)]
        pub fn create_sub_badges(
            origin: OriginFor<T>,
            badge_id: u64,
            supplys: Vec<u64>,
            amounts: Vec<u64>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_create_subbadges, Error::<T>::PermissionDenied);
            ensure!(
                !supplys.is_empty() && supplys.len() == amounts.len(),
                Error::<T>::LengthMismatch
            );

            let mut manager_bal = BalanceStore::<T>::get(badge_id, actor).unwrap_or_default();
            let mut created = Vec::with_capacity(supplys.len());
            for (supply, count) in supplys.iter().zip(amounts.iter()) {
                ensure!(*count > 0, Error::<T>::InvalidAmount);
                let supply = if *supply == 0 { badge.default_subasset_supply } else { *supply };
                let start = badge.next_subasset_id;
                let end = start.checked_add(count - 1).ok_or(Error::<T>::Overflow)?;
                badge.next_subasset_id = end.checked_add(1).ok_or(Error::<T>::Overflow)?;
                let range = IdRange::new(start, end);
                ledger::add_balance(&mut badge.subasset_supplys, &range, supply)
                    .map_err(|e| Error::<T>::from(e))?;
                ledger::add_balance(&mut manager_bal.balances, &range, supply)
                    .map_err(|e| Error::<T>::from(e))?;
                created.push((range, supply));
            }
            BalanceStore::<T>::insert(badge_id, actor, manager_bal);
            Badges::<T>::insert(badge_id, badge);
            for (range, supply) in created {
                Self::deposit_event(Event::SubBadgesCreated { badge_id, range, supply });
            }
            Ok(())
        }

        /// Directly moves `amount` units per ID of `range` from `from` to
        /// `to`. This is the forceful path: the badge must permit forceful
        /// transfers, and a caller other than `from` spends approval.
        #[pallet::call_index(2)]
        #[pallet::weight(10_000)]
        pub fn transfer_badge(
            origin: OriginFor<T>,
            from: T::AccountId,
            to: T::AccountId,
            badge_id: u64,
            range: IdRange,
            amount: u64,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let from_n = Self::account_number_or_assign(&from);
            let to_n = Self::account_number_or_assign(&to);
            let badge = Self::try_badge(badge_id)?;
            ensure!(badge.permissions.can_forceful_transfer, Error::<T>::PermissionDenied);
            Self::ensure_transfer_allowed(&badge, from_n, actor)?;

            // Approval consumption and the two-sided balance update commit
            // together or not at all.
            frame_support::storage::with_storage_layer::<(), sp_runtime::DispatchError, _>(|| {
                if actor != from_n {
                    Self::consume_approval(badge_id, from_n, actor, &range, amount)?;
                }
                Self::do_transfer(badge_id, from_n, to_n, &range, amount)?;
                Self::deposit_event(Event::Transferred {
                    badge_id,
                    from: from_n,
                    to: to_n,
                    range,
                    amount,
                });
                Ok(())
            })
        }

        /// Creates a mirrored pending-transfer pair instead of settling.
        /// With `send_request` the caller offers to send to `counterparty`;
        /// otherwise the caller asks to receive from `counterparty`.
        #[pallet::call_index(3)]
        #[pallet::weight(10_000)]
        pub fn request_transfer_badge(
            origin: OriginFor<T>,
            counterparty: T::AccountId,
            badge_id: u64,
            range: IdRange,
            amount: u64,
            expiration_time: u64,
            cant_cancel_before_time: u64,
            send_request: bool,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            ensure!(counterparty != who, Error::<T>::SelfTransfer);
            let actor = Self::account_number_or_assign(&who);
            let other = Self::account_number_or_assign(&counterparty);
            let (from_n, to_n) = if send_request { (actor, other) } else { (other, actor) };
            let badge = Self::try_badge(badge_id)?;

            ranges::validate(&range).map_err(|e| Error::<T>::from(e))?;
            ensure!(amount > 0, Error::<T>::InvalidAmount);
            if expiration_time != 0 {
                ensure!(
                    cant_cancel_before_time <= expiration_time,
                    Error::<T>::InvalidExpiration
                );
            }
            Self::ensure_transfer_allowed(&badge, from_n, actor)?;

            let mut from_bal = BalanceStore::<T>::get(badge_id, from_n).unwrap_or_default();
            let mut to_bal = BalanceStore::<T>::get(badge_id, to_n).unwrap_or_default();
            let (from_nonce, to_nonce) = pending::link_pair(
                &mut from_bal,
                &mut to_bal,
                from_n,
                to_n,
                range,
                amount,
                send_request,
                expiration_time,
                cant_cancel_before_time,
            );
            BalanceStore::<T>::insert(badge_id, from_n, from_bal);
            BalanceStore::<T>::insert(badge_id, to_n, to_bal);
            Self::deposit_event(Event::TransferRequested {
                badge_id,
                from: from_n,
                to: to_n,
                range,
                amount,
                from_nonce,
                to_nonce,
            });
            Ok(())
        }

        /// Handles every pending transfer of the caller whose nonce falls
        /// in `nonce_range`. Accepting records consent; settlement happens
        /// once both sides have consented, or immediately under
        /// `forceful_accept` provided the sending side has consented.
        /// Declining removes the mirrored pair (the initiator may only
        /// cancel once the no-cancel window has passed). Expired entries
        /// are pruned from both queues as they are encountered.
        #[pallet::call_index(4)]
        #[pallet::weight(10_000)]
        pub fn handle_pending_transfer(
            origin: OriginFor<T>,
            badge_id: u64,
            nonce_range: IdRange,
            accept: bool,
            forceful_accept: bool,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            ranges::validate(&nonce_range).map_err(|e| Error::<T>::from(e))?;
            let badge = Self::try_badge(badge_id)?;
            let actor = AccountNumbers::<T>::get(&who).ok_or(Error::<T>::NonceNotFound)?;
            let record = BalanceStore::<T>::get(badge_id, actor).ok_or(Error::<T>::NonceNotFound)?;
            let nonces = pending::nonces_in(&record.pending, &nonce_range);
            ensure!(!nonces.is_empty(), Error::<T>::NonceNotFound);

            let now = Self::now();
            // Queue edits, consent marks and settlements below commit as
            // one unit; any hard failure discards the whole batch.
            frame_support::storage::with_storage_layer::<(), sp_runtime::DispatchError, _>(|| {
                let mut live = 0u32;
                for nonce in nonces {
                    let actor_bal = match BalanceStore::<T>::get(badge_id, actor) {
                        Some(b) => b,
                        None => break,
                    };
                    let rec = match pending::find(&actor_bal.pending, nonce) {
                        Some(i) => actor_bal.pending[i].clone(),
                        None => continue,
                    };

                    if !accept {
                        if pending::initiator(&rec) == actor && !pending::is_expired(&rec, now) {
                            ensure!(
                                now >= rec.cant_cancel_before_time,
                                Error::<T>::CannotCancelYet
                            );
                        }
                        Self::unlink_pair(badge_id, actor, &rec);
                        Self::deposit_event(Event::PendingTransferClosed {
                            badge_id,
                            account: actor,
                            nonce,
                        });
                        live += 1;
                        continue;
                    }

                    if pending::is_expired(&rec, now) {
                        Self::unlink_pair(badge_id, actor, &rec);
                        Self::deposit_event(Event::PendingTransferExpired {
                            badge_id,
                            account: actor,
                            nonce,
                        });
                        continue;
                    }

                    // Record this side's consent on its own queue record.
                    BalanceStore::<T>::mutate(badge_id, actor, |maybe| {
                        if let Some(b) = maybe {
                            if let Some(i) = pending::find(&b.pending, nonce) {
                                b.pending[i].approved_by = Some(actor);
                            }
                        }
                    });

                    let other = pending::counterparty_of(&rec, actor);
                    let other_bal = BalanceStore::<T>::get(badge_id, other)
                        .ok_or(Error::<T>::NonceNotFound)?;
                    let other_idx = pending::find(&other_bal.pending, rec.other_nonce)
                        .ok_or(Error::<T>::NonceNotFound)?;
                    let other_consented = other_bal.pending[other_idx].approved_by.is_some();
                    // This side just consented, so "both sides" reduces to
                    // the counterparty; the sending side's consent likewise.
                    let from_consented = rec.from == actor || other_consented;

                    let settle = if forceful_accept {
                        ensure!(from_consented, Error::<T>::TransferNotApproved);
                        true
                    } else {
                        other_consented
                    };

                    if settle {
                        Self::ensure_transfer_allowed(&badge, rec.from, actor)?;
                        Self::unlink_pair(badge_id, actor, &rec);
                        Self::do_transfer(
                            badge_id,
                            rec.from,
                            rec.to,
                            &rec.subbadge_range,
                            rec.amount,
                        )?;
                        Self::deposit_event(Event::PendingTransferSettled {
                            badge_id,
                            from: rec.from,
                            to: rec.to,
                            range: rec.subbadge_range,
                            amount: rec.amount,
                        });
                    } else {
                        Self::deposit_event(Event::PendingTransferApproved {
                            badge_id,
                            account: actor,
                            nonce,
                        });
                    }
                    live += 1;
                }
                ensure!(live > 0, Error::<T>::TransferExpired);
                Ok(())
            })
        }

        /// Overwrites (never accumulates) the amount `address` may move out
        /// of the caller's holdings over `range`; amount 0 revokes.
        #[pallet::call_index(5)]
        #[pallet::weight(10_000)]
        pub fn set_approval(
            origin: OriginFor<T>,
            address: T::AccountId,
            badge_id: u64,
            range: IdRange,
            amount: u64,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let owner = Self::account_number_or_assign(&who);
            let approved = Self::account_number_or_assign(&address);
            Self::try_badge(badge_id)?;

            BalanceStore::<T>::try_mutate(badge_id, owner, |maybe| -> DispatchResult {
                let b = maybe.get_or_insert_with(Default::default);
                ledger::set_approval(&mut b.approvals, approved, &range, amount)
                    .map_err(|e| Error::<T>::from(e))?;
                Ok(())
            })?;
            Self::deposit_event(Event::ApprovalSet { badge_id, owner, approved, range, amount });
            Ok(())
        }

        /// Manager claws badges back from a holder. Requires the revoke
        /// capability; the freeze gate does not apply to revocation.
        #[pallet::call_index(6)]
        #[pallet::weight(10_000)]
        pub fn revoke_badge(
            origin: OriginFor<T>,
            badge_id: u64,
            from: T::AccountId,
            range: IdRange,
            amount: u64,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_revoke, Error::<T>::PermissionDenied);

            let from_n = Self::account_number_or_assign(&from);
            Self::do_transfer(badge_id, from_n, badge.manager, &range, amount)?;
            Self::deposit_event(Event::Revoked { badge_id, from: from_n, range, amount });
            Ok(())
        }

        /// Adds (or removes) a range of account numbers to the badge's
        /// freeze ranges. With `frozen_by_default` set, presence in the
        /// ranges unfreezes instead.
        #[pallet::call_index(7)]
        #[pallet::weight(10_000)]
        pub fn freeze_address(
            origin: OriginFor<T>,
            badge_id: u64,
            range: IdRange,
            frozen: bool,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_freeze, Error::<T>::PermissionDenied);

            if frozen {
                ranges::insert_merging(&mut badge.freeze_ranges, range)
                    .map_err(|e| Error::<T>::from(e))?;
            } else {
                ranges::remove_present(&mut badge.freeze_ranges, &range)
                    .map_err(|e| Error::<T>::from(e))?;
            }
            Badges::<T>::insert(badge_id, badge);
            Self::deposit_event(Event::FreezeRangesUpdated { badge_id, range, frozen });
            Ok(())
        }

        #[pallet::call_index(8)]
        #[pallet::weight(10_000)]
        pub fn update_uris(origin: OriginFor<T>, badge_id: u64, uri: Vec<u8>) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_update_uris, Error::<T>::PermissionDenied);

            badge.uri = uri.try_into().map_err(|_| Error::<T>::UriTooLong)?;
            Badges::<T>::insert(badge_id, badge);
            Self::deposit_event(Event::UrisUpdated { badge_id });
            Ok(())
        }

        #[pallet::call_index(9)]
        #[pallet::weight(10_000)]
        pub fn update_permissions(
            origin: OriginFor<T>,
            badge_id: u64,
            permissions: Permissions,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;

            badge.permissions = permissions;
            Badges::<T>::insert(badge_id, badge);
            Self::deposit_event(Event::PermissionsUpdated { badge_id });
            Ok(())
        }

        /// Updates the free-form bytes; shares the URI-update capability.
        #[pallet::call_index(10)]
        #[pallet::weight(10_000)]
        pub fn update_bytes(
            origin: OriginFor<T>,
            badge_id: u64,
            arbitrary_bytes: Vec<u8>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_update_uris, Error::<T>::PermissionDenied);

            badge.arbitrary_bytes =
                arbitrary_bytes.try_into().map_err(|_| Error::<T>::BytesTooLong)?;
            Badges::<T>::insert(badge_id, badge);
            Self::deposit_event(Event::BytesUpdated { badge_id });
            Ok(())
        }

        /// Hands the manager role to `to`, who must have a standing
        /// request (see `request_transfer_manager`).
        #[pallet::call_index(11)]
        #[pallet::weight(10_000)]
        pub fn transfer_manager(
            origin: OriginFor<T>,
            badge_id: u64,
            to: T::AccountId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let mut badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;
            ensure!(badge.permissions.can_manager_transfer, Error::<T>::PermissionDenied);

            let to_n = Self::account_number_or_assign(&to);
            ensure!(
                ManagerTransferRequests::<T>::contains_key(badge_id, to_n),
                Error::<T>::ManagerTransferNotRequested
            );
            ManagerTransferRequests::<T>::remove(badge_id, to_n);
            let from = badge.manager;
            badge.manager = to_n;
            Badges::<T>::insert(badge_id, badge);
            Self::deposit_event(Event::ManagerTransferred { badge_id, from, to: to_n });
            Ok(())
        }

        /// Volunteers the caller to take over as manager (or withdraws the
        /// offer). Idempotent in both directions.
        #[pallet::call_index(12)]
        #[pallet::weight(10_000)]
        pub fn request_transfer_manager(
            origin: OriginFor<T>,
            badge_id: u64,
            active: bool,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            Self::try_badge(badge_id)?;

            if active {
                ManagerTransferRequests::<T>::insert(badge_id, actor, ());
            } else {
                ManagerTransferRequests::<T>::remove(badge_id, actor);
            }
            Self::deposit_event(Event::ManagerTransferRequested { badge_id, account: actor, active });
            Ok(())
        }

        /// Destroys the badge class record. Balance records survive until
        /// pruned.
        #[pallet::call_index(13)]
        #[pallet::weight(10_000)]
        pub fn self_destruct_badge(origin: OriginFor<T>, badge_id: u64) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let actor = Self::account_number_or_assign(&who);
            let badge = Self::try_badge(badge_id)?;
            Self::ensure_manager(&badge, actor)?;

            Badges::<T>::remove(badge_id);
            let _ = ManagerTransferRequests::<T>::clear_prefix(badge_id, u32::MAX, None);
            log::info!(
                target: "pallet-badges",
                "badge {badge_id} self-destructed; balance records remain until pruned"
            );
            Self::deposit_event(Event::BadgeSelfDestructed { badge_id });
            Ok(())
        }

        /// Removes balance records of destroyed badges. Anyone may prune.
        /// An empty address list prunes every record of the badge.
        #[pallet::call_index(14)]
        #[pallet::weight(10_000)]
        pub fn prune_balances(
            origin: OriginFor<T>,
            badge_ids: Vec<u64>,
            addresses: Vec<u64>,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            for badge_id in badge_ids {
                ensure!(badge_id < NextBadgeId::<T>::get(), Error::<T>::BadgeNotFound);
                ensure!(!Badges::<T>::contains_key(badge_id), Error::<T>::BadgeStillExists);
                let removed = if addresses.is_empty() {
                    BalanceStore::<T>::drain_prefix(badge_id).count() as u32
                } else {
                    let mut removed = 0u32;
                    for account in &addresses {
                        if BalanceStore::<T>::take(badge_id, account).is_some() {
                            removed = removed.saturating_add(1);
                        }
                    }
                    removed
                };
                log::debug!(
                    target: "pallet-badges",
                    "pruned {removed} balance records of destroyed badge {badge_id}"
                );
                Self::deposit_event(Event::BalancesPruned { badge_id, removed });
            }
            Ok(())
        }
    }

    impl<T: Config> Pallet<T> {
        fn now() -> u64 {
            T::TimeProvider::now().as_secs()
        }

        /// Looks up the compact number for `who`, assigning the next free
        /// one on first touch.
        fn account_number_or_assign(who: &T::AccountId) -> u64 {
            if let Some(n) = AccountNumbers::<T>::get(who) {
                return n;
            }
            let n = NextAccountNumber::<T>::get();
            NextAccountNumber::<T>::put(n.saturating_add(1));
            AccountNumbers::<T>::insert(who, n);
            AccountByNumber::<T>::insert(n, who);
            Self::deposit_event(Event::AccountRegistered { account: who.clone(), number: n });
            n
        }

        fn try_badge(badge_id: u64) -> Result<Badge, Error<T>> {
            Badges::<T>::get(badge_id).ok_or(Error::<T>::BadgeNotFound)
        }

        fn ensure_manager(badge: &Badge, actor: u64) -> Result<(), Error<T>> {
            ensure!(badge.manager == actor, Error::<T>::NotManager);
            Ok(())
        }

        /// Effective frozen state: the default flipped by presence in the
        /// badge's freeze ranges.
        pub fn is_address_frozen(badge: &Badge, account: u64) -> bool {
            badge.permissions.frozen_by_default ^ ranges::contains(&badge.freeze_ranges, account)
        }

        /// Gate run before every ledger or queue mutation: the sending
        /// side must not be frozen, unless the manager acts under the
        /// forceful-transfer capability.
        fn ensure_transfer_allowed(badge: &Badge, from: u64, actor: u64) -> Result<(), Error<T>> {
            if Self::is_address_frozen(badge, from) {
                let manager_override =
                    actor == badge.manager && badge.permissions.can_forceful_transfer;
                ensure!(manager_override, Error::<T>::AddressFrozen);
            }
            Ok(())
        }

        /// Spends `actor`'s approval on `owner`'s holdings, atomically with
        /// the enclosing dispatch.
        fn consume_approval(
            badge_id: u64,
            owner: u64,
            actor: u64,
            range: &IdRange,
            amount: u64,
        ) -> DispatchResult {
            BalanceStore::<T>::try_mutate(badge_id, owner, |maybe| -> DispatchResult {
                let b = maybe.as_mut().ok_or(Error::<T>::InsufficientApproval)?;
                ledger::consume_approval(&mut b.approvals, actor, range, amount).map_err(
                    |e| match e {
                        LedgerError::InsufficientBalance => Error::<T>::InsufficientApproval,
                        other => Error::<T>::from(other),
                    },
                )?;
                Ok(())
            })
        }

        /// Moves `amount` per ID of `range` between two ledger records.
        /// Either both sides update or neither does; a self-transfer only
        /// validates coverage.
        fn do_transfer(
            badge_id: u64,
            from: u64,
            to: u64,
            range: &IdRange,
            amount: u64,
        ) -> DispatchResult {
            ranges::validate(range).map_err(|e| Error::<T>::from(e))?;
            ensure!(amount > 0, Error::<T>::InvalidAmount);
            if from == to {
                let bal = BalanceStore::<T>::get(badge_id, from)
                    .ok_or(Error::<T>::InsufficientBalance)?;
                let held = ledger::min_amount_in_range(&bal.balances, range)
                    .map_err(|e| Error::<T>::from(e))?;
                ensure!(held >= amount, Error::<T>::InsufficientBalance);
                return Ok(());
            }
            let mut from_bal =
                BalanceStore::<T>::get(badge_id, from).ok_or(Error::<T>::InsufficientBalance)?;
            ledger::subtract_balance(&mut from_bal.balances, range, amount)
                .map_err(|e| Error::<T>::from(e))?;
            let mut to_bal = BalanceStore::<T>::get(badge_id, to).unwrap_or_default();
            ledger::add_balance(&mut to_bal.balances, range, amount)
                .map_err(|e| Error::<T>::from(e))?;
            BalanceStore::<T>::insert(badge_id, from, from_bal);
            BalanceStore::<T>::insert(badge_id, to, to_bal);
            Ok(())
        }

        /// Deletes both mirrored records of a pending transfer.
        fn unlink_pair(badge_id: u64, owner: u64, rec: &PendingTransfer) {
            BalanceStore::<T>::mutate(badge_id, owner, |maybe| {
                if let Some(b) = maybe {
                    pending::remove(&mut b.pending, rec.this_nonce);
                }
            });
            let other = pending::counterparty_of(rec, owner);
            BalanceStore::<T>::mutate(badge_id, other, |maybe| {
                if let Some(b) = maybe {
                    pending::remove(&mut b.pending, rec.other_nonce);
                }
            });
        }

        /// Smallest per-ID amount `account` holds across `range`; 0 when
        /// the record or any ID is missing.
        pub fn balance_in_range(badge_id: u64, account: u64, range: &IdRange) -> u64 {
            BalanceStore::<T>::get(badge_id, account)
                .map_or(0, |b| ledger::min_amount_in_range(&b.balances, range).unwrap_or(0))
        }
    }
}
