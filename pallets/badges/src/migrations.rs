//! Storage migrations for pallet-badges.
//!
//! Migrations are versioned through the pallet's `StorageVersion` and run
//! exactly once: each checks the on-chain version before touching storage
//! and bumps it afterwards, so re-runs are no-ops. New schema changes get a
//! new `vN` module here and a bump of `STORAGE_VERSION` in `lib.rs`, wired
//! into the runtime's `Executive` migration tuple.

use frame_support::{pallet_prelude::*, traits::OnRuntimeUpgrade};
use sp_std::marker::PhantomData;

use crate::{Config, Pallet};

/// Migration to version 1 (initial release).
///
/// No storage predates v1, so this only sets the on-chain version and
/// pins down the pattern subsequent migrations follow.
pub mod v1 {
    use super::*;

    pub struct MigrateToV1<T>(PhantomData<T>);

    impl<T: Config> OnRuntimeUpgrade for MigrateToV1<T> {
        fn on_runtime_upgrade() -> Weight {
            let on_chain_version = Pallet::<T>::on_chain_storage_version();

            if on_chain_version < 1 {
                log::info!(
                    target: "pallet-badges",
                    "Running migration v0 -> v1 (no-op for initial release)"
                );
                StorageVersion::new(1).put::<Pallet<T>>();
                T::DbWeight::get().reads_writes(1, 1)
            } else {
                log::info!(
                    target: "pallet-badges",
                    "Storage already at v{on_chain_version:?}, skipping v1 migration"
                );
                T::DbWeight::get().reads(1)
            }
        }

        #[cfg(feature = "try-runtime")]
        fn pre_upgrade() -> Result<sp_std::vec::Vec<u8>, sp_runtime::TryRuntimeError> {
            Ok(Pallet::<T>::on_chain_storage_version().encode())
        }

        #[cfg(feature = "try-runtime")]
        fn post_upgrade(state: sp_std::vec::Vec<u8>) -> Result<(), sp_runtime::TryRuntimeError> {
            let pre_version: u16 = Decode::decode(&mut &state[..])
                .map_err(|_| sp_runtime::TryRuntimeError::Other("Failed to decode pre-state"))?;
            if pre_version < 1 {
                frame_support::ensure!(
                    Pallet::<T>::on_chain_storage_version() >= 1,
                    sp_runtime::TryRuntimeError::Other("Migration to v1 did not complete")
                );
            }
            Ok(())
        }
    }
}
