use crate::config::Settings;
use crate::player::{PlayerBackend, PlayerSnapshot, PlayerState};
use crate::services::handoff::NextItemWorkflow;
use crate::services::library::LibraryGateway;
use crate::services::tracker::Tracker;
use crate::state::TrackingState;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything one service lifetime shares: tracking state, the player
/// mirror, the collaborators and the shutdown signal. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    pub state: Arc<RwLock<TrackingState>>,
    pub player_state: Arc<RwLock<PlayerState>>,
    pub player: Arc<dyn PlayerBackend>,
    pub library: Arc<dyn LibraryGateway>,
    workflow: Arc<dyn NextItemWorkflow>,
    tracker: Arc<Tracker>,
    shutdown: CancellationToken,
    config_path: Option<Arc<PathBuf>>,
}

impl Session {
    pub fn new(
        settings: Settings,
        player: Arc<dyn PlayerBackend>,
        library: Arc<dyn LibraryGateway>,
        workflow: Arc<dyn NextItemWorkflow>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(TrackingState::new(settings))),
            player_state: Arc::new(RwLock::new(PlayerState::new())),
            player,
            library,
            workflow,
            tracker: Arc::new(Tracker::new()),
            shutdown: CancellationToken::new(),
            config_path: None,
        }
    }

    /// Reload settings from this file on settings-changed notifications
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(Arc::new(path));
        self
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn workflow(&self) -> Arc<dyn NextItemWorkflow> {
        self.workflow.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Pull a fresh reading from the host into the mirror and snapshot it
    pub async fn refresh_player(&self) -> PlayerSnapshot {
        let reading = self.player.read().await;
        let mut player_state = self.player_state.write().await;
        player_state.refresh(reading);
        player_state.snapshot()
    }

    pub async fn player_snapshot(&self) -> PlayerSnapshot {
        self.player_state.read().await.snapshot()
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    /// Re-read the settings file into the state snapshot. Without a config
    /// path the current snapshot is kept.
    pub async fn reload_settings(&self) -> Result<Settings> {
        let Some(path) = &self.config_path else {
            debug!("No config path, keeping current settings");
            return Ok(self.settings().await);
        };

        let settings = Settings::load_from(path)
            .with_context(|| format!("Failed to reload settings from {:?}", path))?;
        self.state.write().await.settings = settings.clone();
        Ok(settings)
    }

    /// Stop everything. The tracker and any start confirmation still waiting
    /// observe the cancelled token.
    pub async fn shutdown(&self) {
        info!("Session shutting down");
        self.shutdown.cancel();
        self.tracker.terminate().await;
    }
}
