//! Range-compressed balance arithmetic.
//!
//! A holder's balances are a list of [`BalanceObject`]s forming an amount
//! partition of the owned ID space: each ID lives in at most one object,
//! every object carries a distinct per-ID amount, and the list is sorted by
//! amount. The same arithmetic backs holdings, per-ID supply tracking and
//! approval allowances.

use crate::ranges::{self, RangeError};
use crate::types::{Approval, BalanceObject, IdRange};
use sp_std::prelude::*;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LedgerError {
    /// Zero amounts denote absence, not a balance.
    InvalidAmount,
    /// Some ID in the requested range holds less than required.
    InsufficientBalance,
    Overflow,
    Range(RangeError),
}

impl From<RangeError> for LedgerError {
    fn from(e: RangeError) -> Self {
        LedgerError::Range(e)
    }
}

/// Amount held at a single ID; 0 when absent.
pub fn amount_for_id(objects: &[BalanceObject], id: u64) -> u64 {
    objects
        .iter()
        .find(|o| ranges::contains(&o.id_ranges, id))
        .map_or(0, |o| o.amount)
}

/// Decomposes `query` into maximal runs of constant per-ID amount, in ID
/// order. Gaps come back with amount 0, so the result always covers the
/// whole query range.
pub fn segments(
    objects: &[BalanceObject],
    query: &IdRange,
) -> Result<Vec<(IdRange, u64)>, LedgerError> {
    ranges::validate(query)?;
    let mut hits: Vec<(IdRange, u64)> = Vec::new();
    for o in objects {
        for r in &o.id_ranges {
            if let Some(overlap) = ranges::intersect(r, query) {
                hits.push((overlap, o.amount));
            }
        }
    }
    hits.sort_unstable_by_key(|(r, _)| r.start);

    let mut out = Vec::with_capacity(hits.len() + 1);
    let mut cursor = Some(query.start);
    for (r, amount) in hits {
        let c = match cursor {
            Some(c) => c,
            None => break,
        };
        if r.start > c {
            out.push((IdRange::new(c, r.start - 1), 0));
        }
        out.push((r, amount));
        cursor = r.end.checked_add(1);
    }
    if let Some(c) = cursor {
        if c <= query.end {
            out.push((IdRange::new(c, query.end), 0));
        }
    }
    Ok(out)
}

/// Smallest per-ID amount held anywhere in `query`; a transfer over the
/// whole range cannot exceed this.
pub fn min_amount_in_range(objects: &[BalanceObject], query: &IdRange) -> Result<u64, LedgerError> {
    Ok(segments(objects, query)?
        .into_iter()
        .map(|(_, amount)| amount)
        .min()
        .unwrap_or(0))
}

fn remove_segment(
    objects: &mut Vec<BalanceObject>,
    seg: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    let idx = objects
        .iter()
        .position(|o| o.amount == amount)
        .ok_or(LedgerError::InsufficientBalance)?;
    ranges::remove_exact(&mut objects[idx].id_ranges, seg)?;
    if objects[idx].id_ranges.is_empty() {
        objects.remove(idx);
    }
    Ok(())
}

fn insert_segment(
    objects: &mut Vec<BalanceObject>,
    seg: IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    let idx = objects.partition_point(|o| o.amount < amount);
    if idx < objects.len() && objects[idx].amount == amount {
        ranges::insert_distinct(&mut objects[idx].id_ranges, seg)?;
    } else {
        objects.insert(
            idx,
            BalanceObject {
                amount,
                id_ranges: sp_std::vec![seg],
            },
        );
    }
    Ok(())
}

/// Adds `amount` to every ID of `range`.
pub fn add_balance(
    objects: &mut Vec<BalanceObject>,
    range: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    let segs = segments(objects, range)?;
    let mut planned = Vec::with_capacity(segs.len());
    for (seg, held) in segs {
        let new = held.checked_add(amount).ok_or(LedgerError::Overflow)?;
        planned.push((seg, held, new));
    }
    for (seg, held, new) in planned {
        if held > 0 {
            remove_segment(objects, &seg, held)?;
        }
        insert_segment(objects, seg, new)?;
    }
    Ok(())
}

/// Subtracts `amount` from every ID of `range`. Fails before touching
/// anything when any ID holds less than `amount`.
pub fn subtract_balance(
    objects: &mut Vec<BalanceObject>,
    range: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    let segs = segments(objects, range)?;
    let mut planned = Vec::with_capacity(segs.len());
    for (seg, held) in segs {
        let new = held
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance)?;
        planned.push((seg, held, new));
    }
    for (seg, held, new) in planned {
        remove_segment(objects, &seg, held)?;
        if new > 0 {
            insert_segment(objects, seg, new)?;
        }
    }
    Ok(())
}

/// Overwrites the amount for every ID of `range`; 0 clears. Prior content
/// of the range is discarded, not accumulated.
pub fn set_amount_for_range(
    objects: &mut Vec<BalanceObject>,
    range: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    ranges::validate(range)?;
    for o in objects.iter_mut() {
        ranges::remove_present(&mut o.id_ranges, range)?;
    }
    objects.retain(|o| !o.id_ranges.is_empty());
    if amount > 0 {
        insert_segment(objects, *range, amount)?;
    }
    Ok(())
}

/// Overwrite-style approval grant for `address`; amount 0 revokes the
/// covered range. Entries are kept sorted by approved account number.
pub fn set_approval(
    approvals: &mut Vec<Approval>,
    address: u64,
    range: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    match approvals.iter().position(|a| a.address == address) {
        Some(i) => {
            set_amount_for_range(&mut approvals[i].approval_amounts, range, amount)?;
            if approvals[i].approval_amounts.is_empty() {
                approvals.remove(i);
            }
        }
        None if amount > 0 => {
            ranges::validate(range)?;
            let idx = approvals.partition_point(|a| a.address < address);
            approvals.insert(
                idx,
                Approval {
                    address,
                    approval_amounts: sp_std::vec![BalanceObject {
                        amount,
                        id_ranges: sp_std::vec![*range],
                    }],
                },
            );
        }
        None => ranges::validate(range)?,
    }
    Ok(())
}

/// Decrements `address`'s allowance over `range` by `amount`; fails with no
/// partial effect when coverage is insufficient.
pub fn consume_approval(
    approvals: &mut Vec<Approval>,
    address: u64,
    range: &IdRange,
    amount: u64,
) -> Result<(), LedgerError> {
    let i = approvals
        .iter()
        .position(|a| a.address == address)
        .ok_or(LedgerError::InsufficientBalance)?;
    subtract_balance(&mut approvals[i].approval_amounts, range, amount)?;
    if approvals[i].approval_amounts.is_empty() {
        approvals.remove(i);
    }
    Ok(())
}
