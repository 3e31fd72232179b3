use chrono::NaiveDate;

use crate::model::*;

use super::slots::SLOT_MINUTES;

/// Day view: each slot is probed as `[slot, slot + 30)` and is unavailable if it
/// overlaps any booking on `date`. Bookings on other dates are ignored.
pub fn availability(date: NaiveDate, slots: &[ClockTime], bookings: &[Booking]) -> Vec<Slot> {
    let mut taken: Vec<Span> = bookings
        .iter()
        .filter(|b| b.date == date && b.duration > 0)
        .map(Booking::span)
        .collect();
    taken.sort_by_key(|s| s.start);
    let taken = merge_overlapping(&taken);

    slots
        .iter()
        .map(|&time| {
            let probe = Span::of(time, SLOT_MINUTES);
            Slot {
                time,
                available: !overlaps_any(&taken, &probe),
            }
        })
        .collect()
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// `disjoint` must be sorted and non-overlapping.
fn overlaps_any(disjoint: &[Span], probe: &Span) -> bool {
    // Spans at or after this index start at or after probe.end and cannot overlap.
    let right = disjoint.partition_point(|s| s.start < probe.end);
    right > 0 && disjoint[right - 1].overlaps(probe)
}
