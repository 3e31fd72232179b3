use crate::model::Minutes;

/// Max byte length of a requester name.
pub const MAX_NAME_LEN: usize = 200;

/// Max byte length of a phone number.
pub const MAX_PHONE_LEN: usize = 32;

/// Longest bookable duration: one full day.
pub const MAX_DURATION_MINUTES: Minutes = 24 * 60;

/// Size of the unfiltered admin listing.
pub const RECENT_BOOKINGS_LIMIT: usize = 500;

/// Per-subscriber notification buffer. A subscriber this far behind misses events.
pub const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// Max concurrently subscribed observers.
pub const MAX_SUBSCRIBERS: usize = 1024;
