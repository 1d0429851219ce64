use crate::config::Settings;
use crate::constants::MAX_QUEUE_ENTRIES;
use crate::models::{AddonData, Item};
use std::time::Duration;
use tracing::{debug, warn};

/// An item this session put into the video playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub file: String,
    /// 0-based playlist position it was queued at
    pub position: usize,
    pub played: bool,
}

/// Watch state of the playing item, captured at start and committed once the
/// item is confirmed finished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentItem {
    pub item: Option<Item>,
    pub episode_id: Option<i32>,
    pub playcount: u32,
}

impl CurrentItem {
    pub fn from_item(item: Item) -> Self {
        Self {
            episode_id: item.episode_id(),
            playcount: item.playcount(),
            item: Some(item),
        }
    }
}

/// Session state shared by the router, start confirmation and tracker.
///
/// `reset()` returns everything to defaults except the settings snapshot.
#[derive(Debug, Clone)]
pub struct TrackingState {
    pub settings: Settings,
    tracking: bool,
    tracked_file: Option<String>,
    /// File the tracker last fired for
    pub last_file: Option<String>,
    /// Start confirmations observed; 0 when none is in flight
    pub starting: u32,
    pub ended: bool,
    pub playing_next: bool,
    pub addon_data: Option<AddonData>,
    queue: Vec<QueueEntry>,
    pub popup_time: Duration,
    pub detect_time: Option<Duration>,
    pub played_in_a_row: u32,
    pub current_item: CurrentItem,
}

impl TrackingState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tracking: false,
            tracked_file: None,
            last_file: None,
            starting: 0,
            ended: false,
            playing_next: false,
            addon_data: None,
            queue: Vec::new(),
            popup_time: Duration::ZERO,
            detect_time: None,
            played_in_a_row: 1,
            current_item: CurrentItem::default(),
        }
    }

    pub fn reset(&mut self) {
        debug!("Resetting tracking state");
        *self = Self::new(self.settings.clone());
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn tracked_file(&self) -> Option<&str> {
        self.tracked_file.as_deref()
    }

    pub fn start_tracking(&mut self, file: &str) {
        self.tracking = true;
        self.tracked_file = Some(file.to_string());
    }

    pub fn stop_tracking(&mut self) {
        self.tracking = false;
        self.tracked_file = None;
    }

    /// Check the "tracking implies a tracked file" invariant, resetting if it
    /// does not hold. Returns false after a reset.
    pub fn ensure_consistent(&mut self) -> bool {
        if self.tracking && self.tracked_file.as_deref().is_none_or(str::is_empty) {
            warn!("Tracking enabled without a tracked file, resetting");
            self.reset();
            return false;
        }
        true
    }

    pub fn is_disabled(&self) -> bool {
        !self.settings.enabled
    }

    /// Whether the next prompt should ask "still watching?" instead
    pub fn still_watching(&self) -> bool {
        self.settings.played_limit > 0 && self.played_in_a_row >= self.settings.played_limit
    }

    /// Compute popup and detect thresholds for a video of length `total`.
    /// `cue` is an optional earlier detection point from plugin data or the
    /// library's credits marker.
    pub fn set_popup_time(&mut self, total: Duration, cue: Option<Duration>) {
        self.popup_time = popup_time(total, self.settings.popup_offset());
        self.detect_time = detect_time(self.popup_time, cue);
        debug!(
            "Popup time {:?}, detect time {:?} for total {:?}",
            self.popup_time, self.detect_time, total
        );
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    /// Remember an item queued at `position`. Refuses a file already queued.
    pub fn enqueue(&mut self, file: &str, position: usize) -> bool {
        if self.queue.iter().any(|entry| entry.file == file) {
            return false;
        }

        self.queue.push(QueueEntry {
            file: file.to_string(),
            position,
            played: false,
        });
        if self.queue.len() > MAX_QUEUE_ENTRIES {
            self.queue.remove(0);
        }
        true
    }

    /// Flag a queued file as started
    pub fn mark_played(&mut self, file: &str) {
        for entry in self.queue.iter_mut().filter(|entry| entry.file == file) {
            entry.played = true;
        }
    }

    /// Clear the queue, returning entries queued but never played
    pub fn reset_queue(&mut self) -> Vec<QueueEntry> {
        std::mem::take(&mut self.queue)
            .into_iter()
            .filter(|entry| !entry.played)
            .collect()
    }
}

/// `total - offset`, clamped to `[0, total]`
pub fn popup_time(total: Duration, offset: Duration) -> Duration {
    total.saturating_sub(offset)
}

/// A cue point is only kept when it comes before the popup
pub fn detect_time(popup_time: Duration, cue: Option<Duration>) -> Option<Duration> {
    cue.filter(|cue| *cue < popup_time)
}
