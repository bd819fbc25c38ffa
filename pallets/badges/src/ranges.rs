//! Canonical ID-range sets.
//!
//! A set is a `Vec<IdRange>` sorted ascending by `start`, with the ranges
//! mutually disjoint and never adjacent (adjacent runs are merged). Every
//! mutation re-establishes canonical form; equality and overlap checks rely
//! on it.

use crate::types::IdRange;
use sp_std::prelude::*;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RangeError {
    /// `start > end`.
    InvalidRange,
    /// Insertion would union ranges that must stay distinct.
    Overlap,
    /// Removal of a range the set does not fully cover.
    NotFullyOwned,
}

pub fn validate(range: &IdRange) -> Result<(), RangeError> {
    if range.start > range.end {
        return Err(RangeError::InvalidRange);
    }
    Ok(())
}

/// Index of the range containing `id`, if any. O(log n).
pub fn search(ranges: &[IdRange], id: u64) -> Option<usize> {
    let idx = ranges.partition_point(|r| r.start <= id);
    if idx == 0 {
        return None;
    }
    (ranges[idx - 1].end >= id).then(|| idx - 1)
}

pub fn contains(ranges: &[IdRange], id: u64) -> bool {
    search(ranges, id).is_some()
}

pub fn intersect(a: &IdRange, b: &IdRange) -> Option<IdRange> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start <= end).then(|| IdRange::new(start, end))
}

pub fn overlaps_any(ranges: &[IdRange], range: &IdRange) -> bool {
    ranges.iter().any(|r| intersect(r, range).is_some())
}

/// Number of IDs of `ranges` falling inside `query`. Returns `u128`: the
/// full `u64` domain holds 2^64 IDs, one more than `u64::MAX`.
pub fn count_in(ranges: &[IdRange], query: &IdRange) -> u128 {
    ranges
        .iter()
        .filter_map(|r| intersect(r, query))
        .map(|o| (o.end - o.start) as u128 + 1)
        .sum()
}

/// True when every ID of `query` is present in `ranges`.
pub fn covers(ranges: &[IdRange], query: &IdRange) -> bool {
    let mut cursor = query.start;
    for r in ranges {
        if r.end < cursor {
            continue;
        }
        if r.start > cursor {
            return false;
        }
        if r.end >= query.end {
            return true;
        }
        // r.end < query.end <= u64::MAX, so the increment cannot overflow.
        cursor = r.end + 1;
    }
    false
}

/// Inserts `range`, merging with any overlapping or adjacent run.
pub fn insert_merging(ranges: &mut Vec<IdRange>, range: IdRange) -> Result<(), RangeError> {
    validate(&range)?;
    let mut out = Vec::with_capacity(ranges.len() + 1);
    let mut merged = range;
    let mut placed = false;
    for r in ranges.drain(..) {
        if r.end < merged.start && merged.start - r.end > 1 {
            out.push(r);
        } else if r.start > merged.end && r.start - merged.end > 1 {
            if !placed {
                out.push(merged);
                placed = true;
            }
            out.push(r);
        } else {
            merged = IdRange::new(merged.start.min(r.start), merged.end.max(r.end));
        }
    }
    if !placed {
        out.push(merged);
    }
    *ranges = out;
    debug_assert!(is_canonical(ranges));
    Ok(())
}

/// Inserts `range` but refuses to union with existing content. Adjacent
/// runs still merge; within one set merging adjacency is always sound,
/// the guard exists so distinct per-ID amounts can never be aliased
/// together by an overlapping insert.
pub fn insert_distinct(ranges: &mut Vec<IdRange>, range: IdRange) -> Result<(), RangeError> {
    validate(&range)?;
    if overlaps_any(ranges, &range) {
        return Err(RangeError::Overlap);
    }
    insert_merging(ranges, range)
}

/// Removes whatever part of `range` is present, splitting partially
/// overlapped runs.
pub fn remove_present(ranges: &mut Vec<IdRange>, range: &IdRange) -> Result<(), RangeError> {
    validate(range)?;
    let mut out = Vec::with_capacity(ranges.len() + 1);
    for r in ranges.drain(..) {
        if r.end < range.start || r.start > range.end {
            out.push(r);
            continue;
        }
        if r.start < range.start {
            out.push(IdRange::new(r.start, range.start - 1));
        }
        if r.end > range.end {
            out.push(IdRange::new(range.end + 1, r.end));
        }
    }
    *ranges = out;
    debug_assert!(is_canonical(ranges));
    Ok(())
}

/// Removes exactly `range`; the set must fully cover it.
pub fn remove_exact(ranges: &mut Vec<IdRange>, range: &IdRange) -> Result<(), RangeError> {
    validate(range)?;
    if !covers(ranges, range) {
        return Err(RangeError::NotFullyOwned);
    }
    remove_present(ranges, range)
}

/// Canonical-form contract: sorted, disjoint, non-adjacent.
pub fn is_canonical(ranges: &[IdRange]) -> bool {
    ranges.iter().all(|r| r.start <= r.end)
        && ranges
            .windows(2)
            .all(|w| w[0].end < w[1].start && w[1].start - w[0].end > 1)
}
