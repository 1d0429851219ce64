use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How the just-finished item's watch state is committed on handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MarkWatched {
    Off,
    /// Only bump the play count if the host has not already done so
    #[default]
    MirrorHost,
    /// Reset the play count to zero, marking the item unwatched
    AlwaysReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DemoSeek {
    #[default]
    Off,
    Popup,
    Detect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub enable_playlist: bool,

    /// Seconds before the end of the video at which the prompt appears
    #[serde(default = "default_popup_offset")]
    pub popup_offset_secs: u64,

    /// Items auto-played in a row before asking "still watching?". 0 disables.
    #[serde(default = "default_played_limit")]
    pub played_limit: u32,

    #[serde(default)]
    pub mark_watched: MarkWatched,

    #[serde(default)]
    pub unwatched_only: bool,

    #[serde(default = "default_true")]
    pub next_season: bool,

    #[serde(default)]
    pub random: bool,

    #[serde(default = "default_true")]
    pub auto_play: bool,

    #[serde(default)]
    pub demo_mode: bool,

    #[serde(default)]
    pub demo_seek: DemoSeek,

    #[serde(default = "default_demo_lead")]
    pub demo_seek_lead_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let settings = Settings::default();
            settings.save()?;
            Ok(settings)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let settings: Settings =
            toml::from_str(&contents).context("Failed to parse config file")?;
        info!("Settings loaded successfully");
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Settings saved to {:?}", path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("upnext").join("config.toml"))
    }

    pub fn popup_offset(&self) -> Duration {
        Duration::from_secs(self.popup_offset_secs)
    }

    pub fn demo_seek_lead(&self) -> Duration {
        Duration::from_secs(self.demo_seek_lead_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            enable_playlist: false,
            popup_offset_secs: default_popup_offset(),
            played_limit: default_played_limit(),
            mark_watched: MarkWatched::default(),
            unwatched_only: false,
            next_season: default_true(),
            random: false,
            auto_play: default_true(),
            demo_mode: false,
            demo_seek: DemoSeek::default(),
            demo_seek_lead_secs: default_demo_lead(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_popup_offset() -> u64 {
    crate::constants::DEFAULT_POPUP_OFFSET_SECS
}
fn default_played_limit() -> u32 {
    crate::constants::DEFAULT_PLAYED_LIMIT
}
fn default_demo_lead() -> u64 {
    15
}
