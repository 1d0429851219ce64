pub mod addon_data;

pub use addon_data::{AddonData, PayloadEncoding};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Library and plugins mark unknown ids/numbers with -1
const UNDEFINED: i64 = -1;

/// Media type reported by the player for the playing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Episode,
    Movie,
    Other,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub position: Duration,
    pub total: Duration,
}

impl Resume {
    pub fn is_set(&self) -> bool {
        !self.position.is_zero()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub premiered: String,
    pub plot: String,
    pub art: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Option<i32>,
    pub tvshow_id: Option<i32>,
    pub show_title: String,
    pub title: String,
    /// Empty when unknown, never a sentinel number
    pub season: String,
    pub episode: String,
    pub file: String,
    pub resume: Resume,
    pub runtime: Duration,
    pub art: HashMap<String, String>,
    pub playcount: u32,
    pub first_aired: String,
    pub plot: String,
    pub rating: f32,
    /// Start of end credits, used as an early detection cue
    pub credits_start: Option<Duration>,
}

impl Episode {
    pub fn season_number(&self) -> Option<i32> {
        self.season.parse().ok()
    }

    pub fn episode_number(&self) -> Option<i32> {
        self.episode.parse().ok()
    }

    /// "S01E02" style label, just the episode when the season is unknown
    pub fn season_episode_label(&self) -> String {
        match (self.season_number(), self.episode.is_empty()) {
            (Some(season), false) => match self.episode_number() {
                Some(episode) => format!("S{season:02}E{episode:02}"),
                None => format!("S{season:02}E{}", self.episode),
            },
            _ => self.episode.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Option<i32>,
    pub set_id: Option<i32>,
    pub set_title: String,
    pub title: String,
    pub file: String,
    pub resume: Resume,
    pub runtime: Duration,
    pub art: HashMap<String, String>,
    pub playcount: u32,
    pub premiered: String,
    pub plot: String,
    pub rating: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generic {
    pub id: Option<i32>,
    pub title: String,
    pub file: String,
    pub resume: Resume,
    pub runtime: Duration,
    pub art: HashMap<String, String>,
    pub playcount: u32,
    pub first_aired: String,
}

/// Canonical item record. Library results and plugin-supplied data are both
/// normalized into this before anything downstream looks at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Episode(Episode),
    Movie(Movie),
    Generic(Generic),
}

impl Item {
    pub fn title(&self) -> &str {
        match self {
            Item::Episode(e) => &e.title,
            Item::Movie(m) => &m.title,
            Item::Generic(g) => &g.title,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Item::Episode(e) => &e.file,
            Item::Movie(m) => &m.file,
            Item::Generic(g) => &g.file,
        }
    }

    pub fn set_file(&mut self, file: String) {
        match self {
            Item::Episode(e) => e.file = file,
            Item::Movie(m) => m.file = file,
            Item::Generic(g) => g.file = file,
        }
    }

    pub fn playcount(&self) -> u32 {
        match self {
            Item::Episode(e) => e.playcount,
            Item::Movie(m) => m.playcount,
            Item::Generic(g) => g.playcount,
        }
    }

    pub fn runtime(&self) -> Duration {
        match self {
            Item::Episode(e) => e.runtime,
            Item::Movie(m) => m.runtime,
            Item::Generic(g) => g.runtime,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Item::Episode(_) => MediaType::Episode,
            Item::Movie(_) => MediaType::Movie,
            Item::Generic(_) => MediaType::Other,
        }
    }

    /// Library id of an episode, if this item is one
    pub fn episode_id(&self) -> Option<i32> {
        match self {
            Item::Episode(e) => e.id,
            _ => None,
        }
    }

    pub fn as_episode(&self) -> Option<&Episode> {
        match self {
            Item::Episode(e) => Some(e),
            _ => None,
        }
    }

    /// Build an item from a dict-shaped video description (playlist entry or
    /// plugin data). Shape decides the variant: a `tvshowid` key or
    /// `media_type = "episode"` makes an episode, `setid` or `"movie"` a movie.
    pub fn from_json(value: &Map<String, Value>) -> Item {
        let media_type = str_field(value, "media_type")
            .or_else(|| str_field(value, "type"))
            .unwrap_or_default();

        let title = str_field(value, "title")
            .filter(|t| !t.is_empty())
            .or_else(|| str_field(value, "label"))
            .unwrap_or_default();
        let file = str_field(value, "file").unwrap_or_default();
        let resume = resume_field(value);
        let runtime = secs_field(value, "runtime");
        let art = art_field(value);
        let playcount = int_field(value, "playcount").unwrap_or(0).max(0) as u32;

        if value.contains_key("tvshowid") || media_type == "episode" {
            return Item::Episode(Episode {
                id: id_field(value, "episodeid").or_else(|| id_field(value, "id")),
                tvshow_id: id_field(value, "tvshowid"),
                show_title: str_field(value, "showtitle").unwrap_or_default(),
                title,
                season: number_label(value, "season"),
                episode: number_label(value, "episode"),
                file,
                resume,
                runtime,
                art,
                playcount,
                first_aired: str_field(value, "firstaired").unwrap_or_default(),
                plot: str_field(value, "plot").unwrap_or_default(),
                rating: float_field(value, "rating") as f32,
                credits_start: None,
            });
        }

        if value.contains_key("setid") || media_type == "movie" {
            return Item::Movie(Movie {
                id: id_field(value, "movieid").or_else(|| id_field(value, "id")),
                set_id: id_field(value, "setid"),
                set_title: str_field(value, "set").unwrap_or_default(),
                title,
                file,
                resume,
                runtime,
                art,
                playcount,
                premiered: str_field(value, "premiered")
                    .or_else(|| str_field(value, "firstaired"))
                    .unwrap_or_default(),
                plot: str_field(value, "plot").unwrap_or_default(),
                rating: float_field(value, "rating") as f32,
            });
        }

        Item::Generic(Generic {
            id: id_field(value, "id"),
            title,
            file,
            resume,
            runtime,
            art,
            playcount,
            first_aired: str_field(value, "firstaired").unwrap_or_default(),
        })
    }

    /// Placeholder derived from a sibling item when a plugin only sends one
    /// of current/next. Identifiers become undefined and display details are
    /// blanked.
    pub fn placeholder_from(source: &Item, title: &str) -> Item {
        match source {
            Item::Episode(e) => Item::Episode(Episode {
                id: None,
                tvshow_id: e.tvshow_id,
                show_title: e.show_title.clone(),
                title: title.to_string(),
                file: e.file.clone(),
                ..Episode::default()
            }),
            Item::Movie(m) => Item::Movie(Movie {
                id: None,
                set_id: m.set_id,
                set_title: m.set_title.clone(),
                title: title.to_string(),
                file: m.file.clone(),
                ..Movie::default()
            }),
            Item::Generic(g) => Item::Generic(Generic {
                id: None,
                title: title.to_string(),
                file: g.file.clone(),
                ..Generic::default()
            }),
        }
    }
}

/// Split a file into (directory with trailing separator, filename). Handles
/// both local paths and URLs, and either separator.
pub fn split_file(file: &str) -> (String, String) {
    match file.rfind(['/', '\\']) {
        Some(idx) => (file[..=idx].to_string(), file[idx + 1..].to_string()),
        None => (String::new(), file.to_string()),
    }
}

fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer that may arrive as a number or a numeric string
fn int_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id_field(map: &Map<String, Value>, key: &str) -> Option<i32> {
    int_field(map, key)
        .filter(|id| *id != UNDEFINED)
        .and_then(|id| i32::try_from(id).ok())
}

fn float_field(map: &Map<String, Value>, key: &str) -> f64 {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn secs_field(map: &Map<String, Value>, key: &str) -> Duration {
    let secs = float_field(map, key);
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Season/episode as a display string; missing, empty or -1 become ''
fn number_label(map: &Map<String, Value>, key: &str) -> String {
    match int_field(map, key) {
        Some(n) if n != UNDEFINED => n.to_string(),
        Some(_) => String::new(),
        None => match map.get(key) {
            // Non-numeric labels such as "Special" are kept as-is
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
    }
}

fn resume_field(map: &Map<String, Value>) -> Resume {
    match map.get("resume") {
        Some(Value::Object(resume)) => Resume {
            position: secs_field(resume, "position"),
            total: secs_field(resume, "total"),
        },
        _ => Resume::default(),
    }
}

fn art_field(map: &Map<String, Value>) -> HashMap<String, String> {
    match map.get("art") {
        Some(Value::Object(art)) => art
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => HashMap::new(),
    }
}
