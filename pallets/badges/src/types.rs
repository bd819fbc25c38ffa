//! Data model for the badge ledger.
//!
//! Ownership over large sub-badge ID spaces is tracked as compressed
//! inclusive ranges instead of one balance entry per ID. The same range
//! primitive is reused for sub-badge IDs, account numbers and
//! pending-transfer nonces.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{traits::ConstU32, BoundedVec};
use scale_info::TypeInfo;
use sp_runtime::RuntimeDebug;
use sp_std::prelude::*;

/// Metadata blobs stored on a badge (URI and free-form bytes).
pub type MetadataOf = BoundedVec<u8, ConstU32<256>>;

/// Inclusive run of consecutive IDs, `start <= end`.
///
/// Range sets built from these are kept canonical: sorted by `start`,
/// mutually disjoint and never adjacent.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    RuntimeDebug,
)]
pub struct IdRange {
    pub start: u64,
    pub end: u64,
}

impl IdRange {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.start <= id && id <= self.end
    }
}

/// A canonical range set annotated with how many units are held per ID in
/// the set. An owner holding different amounts of different ID sets of the
/// same badge carries one object per distinct amount.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug, Default)]
pub struct BalanceObject {
    pub amount: u64,
    pub id_ranges: Vec<IdRange>,
}

/// Units account number `address` may move out of the approving owner's
/// holdings, scoped by ID range.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct Approval {
    pub address: u64,
    pub approval_amounts: Vec<BalanceObject>,
}

/// One side of a mirrored pending transfer.
///
/// Both parties hold a record for the same proposed movement, each keyed by
/// its own queue nonce (`this_nonce`) and pointing at the counterparty's
/// record via `other_nonce`.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct PendingTransfer {
    pub subbadge_range: IdRange,
    pub this_nonce: u64,
    pub other_nonce: u64,
    pub amount: u64,
    /// True when the sender initiated (an offer to send); false when the
    /// recipient initiated (a request to receive).
    pub send_request: bool,
    pub to: u64,
    pub from: u64,
    /// `Some(n)` once the owner of this queue side has consented, recorded
    /// by account number. The initiating side starts out consented.
    pub approved_by: Option<u64>,
    /// Unix seconds after which the record is dead; 0 means no expiry.
    pub expiration_time: u64,
    /// Unix seconds before which the initiator may not cancel.
    pub cant_cancel_before_time: u64,
}

/// Named capabilities gating manager actions and transfer behavior for a
/// badge class.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    RuntimeDebug,
    Default,
)]
pub struct Permissions {
    pub can_manager_transfer: bool,
    pub can_update_uris: bool,
    pub can_forceful_transfer: bool,
    pub can_create_subbadges: bool,
    pub can_revoke: bool,
    pub can_freeze: bool,
    pub frozen_by_default: bool,
}

/// Class-level badge record.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct Badge {
    pub id: u64,
    pub uri: MetadataOf,
    pub arbitrary_bytes: MetadataOf,
    /// Account number of the managing account.
    pub manager: u64,
    pub permissions: Permissions,
    /// Account numbers whose effective frozen state is flipped relative to
    /// `permissions.frozen_by_default`.
    pub freeze_ranges: Vec<IdRange>,
    pub next_subasset_id: u64,
    /// Per-ID total supply, range-compressed like balances.
    pub subasset_supplys: Vec<BalanceObject>,
    pub default_subasset_supply: u64,
    pub standard: u64,
}

/// Per-(badge, account) ledger record: held ranges, approvals granted to
/// other accounts, and this side's pending-transfer queue. Created lazily
/// on the first balance-affecting event.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug, Default)]
pub struct BadgeBalance {
    pub balances: Vec<BalanceObject>,
    /// Next nonce to assign in `pending`; strictly increasing.
    pub pending_nonce: u64,
    pub pending: Vec<PendingTransfer>,
    pub approvals: Vec<Approval>,
}
