//! Benchmarking setup for pallet-badges

use super::*;

use crate::types::{IdRange, Permissions};
#[allow(unused)]
use crate::Pallet as Badges;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;

fn all_permissions() -> Permissions {
    Permissions {
        can_manager_transfer: true,
        can_update_uris: true,
        can_forceful_transfer: true,
        can_create_subbadges: true,
        can_revoke: true,
        can_freeze: true,
        frozen_by_default: false,
    }
}

/// Creates a badge managed by `manager` with 1000 sub-badges of supply 1,
/// returning its ID.
fn seed_badge<T: Config>(manager: &T::AccountId) -> u64 {
    Badges::<T>::create_badge(
        RawOrigin::Signed(manager.clone()).into(),
        Vec::new(),
        Vec::new(),
        all_permissions(),
        0,
        0,
    )
    .expect("badge creation");
    let badge_id = NextBadgeId::<T>::get() - 1;
    Badges::<T>::create_sub_badges(
        RawOrigin::Signed(manager.clone()).into(),
        badge_id,
        sp_std::vec![1],
        sp_std::vec![1000],
    )
    .expect("sub-badge creation");
    badge_id
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn create_badge() {
        let caller: T::AccountId = whitelisted_caller();

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller),
            Vec::new(),
            Vec::new(),
            all_permissions(),
            0,
            0,
        );

        assert_eq!(NextBadgeId::<T>::get(), 1);
    }

    #[benchmark]
    fn create_sub_badges() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller),
            badge_id,
            sp_std::vec![2],
            sp_std::vec![1000],
        );

        assert_eq!(Badges::<T>::badges(badge_id).expect("badge").next_subasset_id, 2000);
    }

    #[benchmark]
    fn transfer_badge() {
        let caller: T::AccountId = whitelisted_caller();
        let recipient: T::AccountId = account("recipient", 0, 0);
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller.clone()),
            caller.clone(),
            recipient.clone(),
            badge_id,
            IdRange::new(0, 99),
            1,
        );

        let recipient_number =
            AccountNumbers::<T>::get(&recipient).expect("recipient registered");
        assert_eq!(
            Badges::<T>::balance_in_range(badge_id, recipient_number, &IdRange::new(0, 99)),
            1
        );
    }

    #[benchmark]
    fn request_transfer_badge() {
        let caller: T::AccountId = whitelisted_caller();
        let recipient: T::AccountId = account("recipient", 0, 0);
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller.clone()),
            recipient,
            badge_id,
            IdRange::new(0, 99),
            1,
            0,
            0,
            true,
        );

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert_eq!(
            BalanceStore::<T>::get(badge_id, caller_number).expect("record").pending.len(),
            1
        );
    }

    #[benchmark]
    fn handle_pending_transfer() {
        let caller: T::AccountId = whitelisted_caller();
        let manager: T::AccountId = account("manager", 0, 0);
        let badge_id = seed_badge::<T>(&manager);
        Badges::<T>::request_transfer_badge(
            RawOrigin::Signed(manager.clone()).into(),
            caller.clone(),
            badge_id,
            IdRange::new(0, 99),
            1,
            0,
            0,
            true,
        )
        .expect("request");

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller.clone()),
            badge_id,
            IdRange::new(0, 0),
            true,
            true,
        );

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert_eq!(
            Badges::<T>::balance_in_range(badge_id, caller_number, &IdRange::new(0, 99)),
            1
        );
    }

    #[benchmark]
    fn set_approval() {
        let caller: T::AccountId = whitelisted_caller();
        let spender: T::AccountId = account("spender", 0, 0);
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller.clone()),
            spender,
            badge_id,
            IdRange::new(0, 999),
            1,
        );

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert_eq!(
            BalanceStore::<T>::get(badge_id, caller_number).expect("record").approvals.len(),
            1
        );
    }

    #[benchmark]
    fn revoke_badge() {
        let caller: T::AccountId = whitelisted_caller();
        let holder: T::AccountId = account("holder", 0, 0);
        let badge_id = seed_badge::<T>(&caller);
        Badges::<T>::transfer_badge(
            RawOrigin::Signed(caller.clone()).into(),
            caller.clone(),
            holder.clone(),
            badge_id,
            IdRange::new(0, 99),
            1,
        )
        .expect("transfer");

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller.clone()),
            badge_id,
            holder,
            IdRange::new(0, 99),
            1,
        );

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert_eq!(
            Badges::<T>::balance_in_range(badge_id, caller_number, &IdRange::new(0, 999)),
            1
        );
    }

    #[benchmark]
    fn freeze_address() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller),
            badge_id,
            IdRange::new(0, 1000),
            true,
        );

        assert!(!Badges::<T>::badges(badge_id).expect("badge").freeze_ranges.is_empty());
    }

    #[benchmark]
    fn update_uris() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), badge_id, sp_std::vec![0u8; 256]);

        assert_eq!(Badges::<T>::badges(badge_id).expect("badge").uri.len(), 256);
    }

    #[benchmark]
    fn update_permissions() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);
        let mut permissions = all_permissions();
        permissions.can_revoke = false;

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), badge_id, permissions);

        assert!(!Badges::<T>::badges(badge_id).expect("badge").permissions.can_revoke);
    }

    #[benchmark]
    fn update_bytes() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), badge_id, sp_std::vec![0u8; 256]);

        assert_eq!(
            Badges::<T>::badges(badge_id).expect("badge").arbitrary_bytes.len(),
            256
        );
    }

    #[benchmark]
    fn transfer_manager() {
        let caller: T::AccountId = whitelisted_caller();
        let successor: T::AccountId = account("successor", 0, 0);
        let badge_id = seed_badge::<T>(&caller);
        Badges::<T>::request_transfer_manager(
            RawOrigin::Signed(successor.clone()).into(),
            badge_id,
            true,
        )
        .expect("request");

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), badge_id, successor.clone());

        let successor_number =
            AccountNumbers::<T>::get(&successor).expect("successor registered");
        assert_eq!(Badges::<T>::badges(badge_id).expect("badge").manager, successor_number);
    }

    #[benchmark]
    fn request_transfer_manager() {
        let caller: T::AccountId = whitelisted_caller();
        let manager: T::AccountId = account("manager", 0, 0);
        let badge_id = seed_badge::<T>(&manager);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller.clone()), badge_id, true);

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert!(ManagerTransferRequests::<T>::contains_key(badge_id, caller_number));
    }

    #[benchmark]
    fn self_destruct_badge() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), badge_id);

        assert!(Badges::<T>::badges(badge_id).is_none());
    }

    #[benchmark]
    fn prune_balances() {
        let caller: T::AccountId = whitelisted_caller();
        let badge_id = seed_badge::<T>(&caller);
        Badges::<T>::self_destruct_badge(RawOrigin::Signed(caller.clone()).into(), badge_id)
            .expect("self destruct");

        #[extrinsic_call]
        _(RawOrigin::Signed(caller.clone()), sp_std::vec![badge_id], Vec::new());

        let caller_number = AccountNumbers::<T>::get(&caller).expect("caller registered");
        assert!(BalanceStore::<T>::get(badge_id, caller_number).is_none());
    }

    impl_benchmark_test_suite!(Badges, crate::mock::new_test_ext(), crate::mock::Test);
}
