use super::event_bus::NotificationSubscriber;
use super::types::Notification;
use crate::constants::ADDON_DATA_METHOD;
use crate::models::AddonData;
use crate::services::session::Session;
use crate::services::video_check::{StartOutcome, track_playback};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Maps host notifications onto session state transitions
pub struct EventRouter {
    session: Session,
}

impl EventRouter {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Handle one notification. Start confirmations run in the background;
    /// their handle is returned so callers can wait on the outcome.
    pub async fn dispatch(&self, notification: Notification) -> Option<JoinHandle<StartOutcome>> {
        trace!("Dispatching {}", notification.as_str());

        match notification {
            Notification::PlaybackStarted => {
                self.release_transient().await;
                Some(self.confirm_start(None))
            }
            Notification::PlaybackStopped
            | Notification::PlaybackEnded
            | Notification::PlaybackError => {
                self.on_stop().await;
                None
            }
            Notification::Paused => {
                self.session.player_state.write().await.paused.update(true);
                None
            }
            Notification::Resumed => {
                self.session.player_state.write().await.paused.update(false);
                None
            }
            Notification::SpeedChanged { speed } => {
                self.session.player_state.write().await.speed.update(speed);
                self.restart_tracker().await;
                None
            }
            Notification::AvChanged | Notification::ScreensaverDeactivated => {
                self.restart_tracker().await;
                None
            }
            Notification::SettingsChanged => {
                self.on_settings_changed().await;
                None
            }
            Notification::ExternalData {
                sender,
                method,
                payload,
            } => self.on_external_data(&sender, &method, &payload),
        }
    }

    /// Consume notifications until shutdown or the bus closes
    pub async fn run(&self, mut subscriber: NotificationSubscriber) {
        let shutdown = self.session.shutdown_token();
        info!("Notification router started");

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = subscriber.recv() => received,
            };

            match received {
                Ok(event) => {
                    trace!(id = %event.id, "Received {}", event.notification.as_str());
                    self.dispatch(event.notification).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Router lagged behind, {} notifications dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!("Notification router stopped");
    }

    fn confirm_start(&self, data: Option<AddonData>) -> JoinHandle<StartOutcome> {
        tokio::spawn(track_playback(self.session.clone(), data))
    }

    /// A new playback invalidates pinned position facts
    async fn release_transient(&self) {
        let mut player_state = self.session.player_state.write().await;
        player_state.elapsed.release();
        player_state.total.release();
        player_state.next_file.release();
        player_state.playing_file.release();
    }

    async fn on_stop(&self) {
        let pending = {
            let mut state = self.session.state.write().await;
            // A handoff in flight stops the old item; only the flag is ours
            if state.playing_next {
                debug!("Playback stopped during next item handoff");
                state.playing_next = false;
                return;
            }
            let pending = state.reset_queue();
            state.reset();
            pending
        };

        self.session.tracker().stop().await;

        for entry in pending.iter().rev() {
            debug!("Dequeuing unplayed {}", entry.file);
            if let Err(e) = self.session.library.dequeue_item(entry.position).await {
                warn!("Failed to dequeue {}: {:#}", entry.file, e);
            }
        }
    }

    async fn restart_tracker(&self) {
        if self.session.state.read().await.is_tracking() {
            debug!("Resuming interrupted tracking");
            self.session.tracker().start(&self.session).await;
        }
    }

    async fn on_settings_changed(&self) {
        let settings = match self.session.reload_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Keeping previous settings: {:#}", e);
                return;
            }
        };
        debug!("Settings reloaded");

        if !settings.enabled {
            info!("Up Next disabled, stopping tracking");
            self.session.tracker().terminate().await;
            self.session.state.write().await.reset();
        }
    }

    fn on_external_data(
        &self,
        sender: &str,
        method: &str,
        payload: &str,
    ) -> Option<JoinHandle<StartOutcome>> {
        if !method.ends_with(ADDON_DATA_METHOD) {
            return None;
        }

        match AddonData::decode(sender, payload) {
            Ok(data) => {
                debug!("Plugin data received from {}", data.id);
                Some(self.confirm_start(Some(data)))
            }
            Err(e) if e.is_quiet() => {
                trace!("Plugin data from {} ignored: {}", sender, e);
                None
            }
            Err(e) => {
                warn!("Plugin data error - {} sent {}: {}", sender, payload, e);
                None
            }
        }
    }
}
