use super::state::PlayerReading;
use crate::models::{Item, PayloadEncoding};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// What to start when handing off to the next item
#[derive(Debug, Clone, PartialEq)]
pub enum PlayTarget {
    /// Library episode by id
    Episode(i32),
    /// Direct file or plugin URL
    File(String),
    /// Advance the active video playlist
    PlaylistNext,
    /// Pass the plugin's own play info back to it, in the encoding it used
    AddonCallback {
        id: String,
        play_info: Value,
        encoding: PayloadEncoding,
    },
}

/// Boundary to the host media player
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Current playback facts as reported by the host
    async fn read(&self) -> PlayerReading;

    /// Description of the playing item, if the host has one
    async fn now_playing(&self) -> Option<Item>;

    async fn open(&self, target: PlayTarget, resume: bool) -> Result<()>;
    async fn seek(&self, position: Duration) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}
