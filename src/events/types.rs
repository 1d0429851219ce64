use serde::{Deserialize, Serialize};

/// Host lifecycle notification, wrapped with an id and receive time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: String,
    pub notification: Notification,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl NotificationEvent {
    pub fn new(notification: Notification) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            notification,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Notifications delivered by the host player runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Notification {
    // Playback lifecycle
    PlaybackStarted,
    PlaybackStopped,
    PlaybackEnded,
    PlaybackError,
    Paused,
    Resumed,
    SpeedChanged { speed: f64 },
    AvChanged,

    // Environment
    ScreensaverDeactivated,
    SettingsChanged,

    /// Data sent by another plugin
    ExternalData {
        sender: String,
        method: String,
        payload: String,
    },
}

impl Notification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notification::PlaybackStarted => "playback.started",
            Notification::PlaybackStopped => "playback.stopped",
            Notification::PlaybackEnded => "playback.ended",
            Notification::PlaybackError => "playback.error",
            Notification::Paused => "playback.paused",
            Notification::Resumed => "playback.resumed",
            Notification::SpeedChanged { .. } => "playback.speed_changed",
            Notification::AvChanged => "playback.av_changed",
            Notification::ScreensaverDeactivated => "screensaver.deactivated",
            Notification::SettingsChanged => "settings.changed",
            Notification::ExternalData { .. } => "external.data",
        }
    }
}
