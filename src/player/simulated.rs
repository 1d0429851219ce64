use super::state::PlayerReading;
use super::traits::{PlayTarget, PlayerBackend};
use crate::models::{Item, MediaType};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct Playback {
    item: Option<Item>,
    media_type: MediaType,
    total: Duration,
    paused: bool,
    /// Position at `since`
    position: Duration,
    since: Option<Instant>,
}

impl Playback {
    fn elapsed(&self) -> Duration {
        let running = match (self.since, self.paused) {
            (Some(since), false) => since.elapsed(),
            _ => Duration::ZERO,
        };
        (self.position + running).min(self.total)
    }
}

/// In-process player whose clock is tokio time. Used by the demo command and
/// by tests running on a paused clock.
#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    playback: Mutex<Option<Playback>>,
    opened: Mutex<Vec<PlayTarget>>,
    seeks: Mutex<Vec<Duration>>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `item` from the beginning
    pub async fn play(&self, item: Item, total: Duration) {
        debug!("Simulated playback of {}", item.file());
        *self.playback.lock().await = Some(Playback {
            media_type: item.media_type(),
            item: Some(item),
            total,
            paused: false,
            position: Duration::ZERO,
            since: Some(Instant::now()),
        });
    }

    pub async fn set_paused(&self, paused: bool) {
        if let Some(playback) = self.playback.lock().await.as_mut()
            && playback.paused != paused
        {
            playback.position = playback.elapsed();
            playback.since = Some(Instant::now());
            playback.paused = paused;
        }
    }

    /// Targets requested through `open`, oldest first
    pub async fn opened(&self) -> Vec<PlayTarget> {
        self.opened.lock().await.clone()
    }

    pub async fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().await.clone()
    }
}

#[async_trait]
impl PlayerBackend for SimulatedPlayer {
    async fn read(&self) -> PlayerReading {
        match self.playback.lock().await.as_ref() {
            Some(playback) => PlayerReading {
                playing: true,
                paused: playback.paused,
                playing_file: playback.item.as_ref().map(|i| i.file().to_string()),
                next_file: None,
                elapsed: playback.elapsed(),
                total: playback.total,
                speed: if playback.paused { 0.0 } else { 1.0 },
                media_type: playback.media_type,
                external_player: false,
            },
            None => PlayerReading::default(),
        }
    }

    async fn now_playing(&self) -> Option<Item> {
        self.playback
            .lock()
            .await
            .as_ref()
            .and_then(|playback| playback.item.clone())
    }

    async fn open(&self, target: PlayTarget, _resume: bool) -> Result<()> {
        debug!("Simulated player asked to open {:?}", target);
        self.opened.lock().await.push(target);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.seeks.lock().await.push(position);
        if let Some(playback) = self.playback.lock().await.as_mut() {
            playback.position = position.min(playback.total);
            playback.since = Some(Instant::now());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        *self.playback.lock().await = None;
        Ok(())
    }
}
