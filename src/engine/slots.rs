use crate::model::{ClockTime, Minutes};

/// First bookable start of the business day.
pub const DAY_OPENS: ClockTime = ClockTime::hm(8, 0);

/// Last half-hour mark before midnight.
pub const LAST_EVENING_SLOT: ClockTime = ClockTime::hm(23, 30);

/// Spacing between bookable starts, and the probe width used for availability.
pub const SLOT_MINUTES: Minutes = 30;

/// Bookable start times for a day: every half hour from 08:00 through 23:30, then
/// `00:00` for the midnight-start slot attributed to the same day.
pub fn daily_slots() -> Vec<ClockTime> {
    let mut slots: Vec<ClockTime> = (DAY_OPENS.minutes()..=LAST_EVENING_SLOT.minutes())
        .step_by(SLOT_MINUTES as usize)
        .map(ClockTime::from_minutes)
        .collect();
    slots.push(ClockTime::MIDNIGHT);
    slots
}
