//! Pending-transfer queue records.
//!
//! A proposed movement lives as two mirrored records, one in each party's
//! queue, each keyed by its own side's strictly increasing nonce and
//! pointing at the counterparty's record. The pair is created, consented to
//! and deleted together; there is no shared mutable record.

use crate::types::{BadgeBalance, IdRange, PendingTransfer};
use sp_std::prelude::*;

/// Index of the record with nonce `nonce`. Queues are appended in nonce
/// order, so binary search applies.
pub fn find(pending: &[PendingTransfer], nonce: u64) -> Option<usize> {
    pending.binary_search_by_key(&nonce, |p| p.this_nonce).ok()
}

pub fn remove(pending: &mut Vec<PendingTransfer>, nonce: u64) {
    if let Some(i) = find(pending, nonce) {
        pending.remove(i);
    }
}

/// Own-side nonces falling inside `range`, in queue order.
pub fn nonces_in(pending: &[PendingTransfer], range: &IdRange) -> Vec<u64> {
    pending
        .iter()
        .map(|p| p.this_nonce)
        .filter(|n| range.contains(*n))
        .collect()
}

/// The party who created the pair: the sender for a send offer, the
/// recipient for a receive request.
pub fn initiator(p: &PendingTransfer) -> u64 {
    if p.send_request {
        p.from
    } else {
        p.to
    }
}

pub fn counterparty_of(p: &PendingTransfer, owner: u64) -> u64 {
    if p.from == owner {
        p.to
    } else {
        p.from
    }
}

pub fn is_expired(p: &PendingTransfer, now: u64) -> bool {
    p.expiration_time != 0 && now >= p.expiration_time
}

/// Allocates one nonce on each side and appends the mirrored pair. The
/// initiating side's record starts out consented. Returns the two nonces,
/// sender side first.
#[allow(clippy::too_many_arguments)]
pub fn link_pair(
    from_side: &mut BadgeBalance,
    to_side: &mut BadgeBalance,
    from: u64,
    to: u64,
    subbadge_range: IdRange,
    amount: u64,
    send_request: bool,
    expiration_time: u64,
    cant_cancel_before_time: u64,
) -> (u64, u64) {
    let from_nonce = from_side.pending_nonce;
    let to_nonce = to_side.pending_nonce;
    from_side.pending_nonce = from_nonce.saturating_add(1);
    to_side.pending_nonce = to_nonce.saturating_add(1);
    from_side.pending.push(PendingTransfer {
        subbadge_range,
        this_nonce: from_nonce,
        other_nonce: to_nonce,
        amount,
        send_request,
        to,
        from,
        approved_by: send_request.then_some(from),
        expiration_time,
        cant_cancel_before_time,
    });
    to_side.pending.push(PendingTransfer {
        subbadge_range,
        this_nonce: to_nonce,
        other_nonce: from_nonce,
        amount,
        send_request,
        to,
        from,
        approved_by: (!send_request).then_some(to),
        expiration_time,
        cant_cancel_before_time,
    });
    (from_nonce, to_nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(send_request: bool) -> (BadgeBalance, BadgeBalance, u64, u64) {
        let mut a = BadgeBalance::default();
        let mut b = BadgeBalance::default();
        let (fa, fb) = link_pair(
            &mut a,
            &mut b,
            10,
            20,
            IdRange::new(0, 9),
            1,
            send_request,
            0,
            0,
        );
        (a, b, fa, fb)
    }

    #[test]
    fn link_pair_mirrors_and_cross_references() {
        let (a, b, na, nb) = pair(true);
        assert_eq!((na, nb), (0, 0));
        assert_eq!(a.pending.len(), 1);
        assert_eq!(b.pending.len(), 1);
        assert_eq!(a.pending[0].other_nonce, b.pending[0].this_nonce);
        assert_eq!(b.pending[0].other_nonce, a.pending[0].this_nonce);
        assert_eq!((a.pending_nonce, b.pending_nonce), (1, 1));
    }

    #[test]
    fn initiating_side_starts_consented() {
        let (a, b, ..) = pair(true);
        assert_eq!(a.pending[0].approved_by, Some(10));
        assert_eq!(b.pending[0].approved_by, None);
        assert_eq!(initiator(&a.pending[0]), 10);

        let (a, b, ..) = pair(false);
        assert_eq!(a.pending[0].approved_by, None);
        assert_eq!(b.pending[0].approved_by, Some(20));
        assert_eq!(initiator(&a.pending[0]), 20);
    }

    #[test]
    fn find_and_nonce_ranges() {
        let mut a = BadgeBalance::default();
        let mut b = BadgeBalance::default();
        for _ in 0..4 {
            link_pair(&mut a, &mut b, 10, 20, IdRange::new(0, 9), 1, true, 0, 0);
        }
        assert_eq!(find(&a.pending, 2), Some(2));
        assert_eq!(find(&a.pending, 9), None);
        assert_eq!(nonces_in(&a.pending, &IdRange::new(1, 2)), vec![1, 2]);
        remove(&mut a.pending, 2);
        assert_eq!(find(&a.pending, 2), None);
        assert_eq!(nonces_in(&a.pending, &IdRange::new(0, 9)), vec![0, 1, 3]);
    }

    #[test]
    fn expiry_honors_zero_as_never() {
        let mut p = pair(true).0.pending.remove(0);
        assert!(!is_expired(&p, u64::MAX));
        p.expiration_time = 100;
        assert!(!is_expired(&p, 99));
        assert!(is_expired(&p, 100));
    }
}
