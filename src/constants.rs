// Timing constants for playback tracking. The tracker and the start
// confirmation both wake at TICK_INTERVAL so cancellation is observed
// within one tick.

use std::time::Duration;

/// Polling cadence of the tracker loop and the settle wait
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Settle time per overlapping start notification (multiplied by start number)
pub const START_SETTLE_SECS: u64 = 5;

pub const DEFAULT_POPUP_OFFSET_SECS: u64 = 30;

pub const DEFAULT_PLAYED_LIMIT: u32 = 3;

/// Only notifications whose method ends with this are external data
pub const ADDON_DATA_METHOD: &str = "upnext_data";

/// Title used for a synthesised next item when a plugin only sends the current one
pub const NEXT_PLACEHOLDER_TITLE: &str = "Next";

/// Queue holds at most the playing entry and the one about to play
pub const MAX_QUEUE_ENTRIES: usize = 2;

/// Capacity of the notification broadcast channel
pub const NOTIFICATION_BUS_CAPACITY: usize = 64;
