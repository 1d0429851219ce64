use crate::models::MediaType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value mirrored from the host plus an override flag. While forced, host
/// updates are ignored until the flag is cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forced<T> {
    value: T,
    forced: bool,
}

impl<T> Forced<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            forced: false,
        }
    }

    /// Host-reported update. Returns false if dropped because the field is forced.
    pub fn update(&mut self, value: T) -> bool {
        if self.forced {
            return false;
        }
        self.value = value;
        true
    }

    /// Unconditional write that also sets or clears the override
    pub fn set(&mut self, value: T, force: bool) {
        self.value = value;
        self.forced = force;
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn release(&mut self) {
        self.forced = false;
    }
}

impl<T: Copy> Forced<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

/// What the host player reports on a poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerReading {
    pub playing: bool,
    pub paused: bool,
    pub playing_file: Option<String>,
    pub next_file: Option<String>,
    pub elapsed: Duration,
    pub total: Duration,
    pub speed: f64,
    pub media_type: MediaType,
    pub external_player: bool,
}

/// Debounced, force-overridable mirror of live playback facts. Owned by the
/// session and written only from the notification/tracker tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub playing: Forced<bool>,
    pub paused: Forced<bool>,
    pub playing_file: Forced<String>,
    pub next_file: Forced<Option<String>>,
    pub elapsed: Forced<Duration>,
    pub total: Forced<Duration>,
    pub speed: Forced<f64>,
    pub media_type: Forced<MediaType>,
    pub external_player: Forced<bool>,
}

/// Read-only copy handed to callers and the next-item workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub playing: bool,
    pub paused: bool,
    pub playing_file: String,
    pub next_file: Option<String>,
    pub elapsed: Duration,
    pub total: Duration,
    pub speed: f64,
    pub media_type: MediaType,
    pub external_player: bool,
}

impl PlayerSnapshot {
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed)
    }
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            speed: Forced::new(1.0),
            ..Self::default()
        }
    }

    /// Apply a host reading field by field, skipping forced fields
    pub fn refresh(&mut self, reading: PlayerReading) {
        self.playing.update(reading.playing);
        self.paused.update(reading.paused);
        self.playing_file
            .update(reading.playing_file.unwrap_or_default());
        self.next_file.update(reading.next_file);
        self.total.update(reading.total);
        self.elapsed.update(reading.elapsed);
        self.speed.update(reading.speed);
        self.media_type.update(reading.media_type);
        self.external_player.update(reading.external_player);
    }

    /// Drop every override so the host is authoritative again
    pub fn release_all(&mut self) {
        self.playing.release();
        self.paused.release();
        self.playing_file.release();
        self.next_file.release();
        self.elapsed.release();
        self.total.release();
        self.speed.release();
        self.media_type.release();
        self.external_player.release();
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let total = self.total.value();
        let mut elapsed = self.elapsed.value();
        if !total.is_zero() && elapsed > total {
            elapsed = total;
        }

        PlayerSnapshot {
            playing: self.playing.value(),
            paused: self.paused.value(),
            playing_file: self.playing_file.get().clone(),
            next_file: self.next_file.get().clone(),
            elapsed,
            total,
            speed: self.speed.value(),
            media_type: self.media_type.value(),
            external_player: self.external_player.value(),
        }
    }
}
