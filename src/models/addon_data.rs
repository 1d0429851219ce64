use super::Item;
use crate::constants::NEXT_PLACEHOLDER_TITLE;
use crate::utils::{UpNextError, UpNextResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

const CURRENT_KEYS: [&str; 2] = ["current_video", "current_episode"];
const NEXT_KEYS: [&str; 2] = ["next_video", "next_episode"];

/// How the plugin wrapped its payload. Echoed back when handing `play_info`
/// to the plugin so it can decode its own data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Json,
    Base64,
    Hex,
}

/// Next/current item information supplied by an external content source.
/// Takes precedence over library resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonData {
    /// Session tag, `{sender}_play_action`
    pub id: String,
    pub current_item: Item,
    pub next_item: Item,
    pub play_url: Option<String>,
    pub play_info: Option<Value>,
    pub encoding: PayloadEncoding,
    /// Absolute elapsed time at which the plugin wants detection to start
    pub notification_time: Option<Duration>,
    /// Same cue expressed as time before the end
    pub notification_offset: Option<Duration>,
}

impl AddonData {
    pub fn session_id(sender: &str) -> String {
        let sender = sender.strip_suffix(".SIGNAL").unwrap_or(sender);
        format!("{sender}_play_action")
    }

    /// Decode a sender-tagged payload into validated addon data
    pub fn decode(sender: &str, payload: &str) -> UpNextResult<Self> {
        let (value, encoding) = decode_payload(payload)?;
        Self::from_mapping(Self::session_id(sender), value, encoding)
    }

    pub fn from_mapping(
        id: String,
        mut data: Map<String, Value>,
        encoding: PayloadEncoding,
    ) -> UpNextResult<Self> {
        let current = take_video(&mut data, &CURRENT_KEYS)?;
        let next = take_video(&mut data, &NEXT_KEYS)?;

        let play_url = data
            .get("play_url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        let play_info = data.get("play_info").filter(|v| !v.is_null()).cloned();

        if play_url.is_none() && play_info.is_none() {
            return Err(UpNextError::malformed(
                "payload has neither play_url nor play_info",
            ));
        }

        let (current_item, next_item) = match (current, next) {
            (Some(current), Some(next)) => (current, next),
            (Some(current), None) => {
                let next = Item::placeholder_from(&current, NEXT_PLACEHOLDER_TITLE);
                (current, next)
            }
            (None, Some(next)) => {
                let current = Item::placeholder_from(&next, "");
                (current, next)
            }
            (None, None) => {
                return Err(UpNextError::malformed(
                    "payload has neither current_video nor next_video",
                ));
            }
        };

        Ok(Self {
            id,
            current_item,
            next_item,
            play_url,
            play_info,
            encoding,
            notification_time: secs(&data, "notification_time"),
            notification_offset: secs(&data, "notification_offset"),
        })
    }

    /// Detection cue as an absolute elapsed time for a video of `total` length
    pub fn cue_point(&self, total: Duration) -> Option<Duration> {
        self.notification_time
            .filter(|t| *t <= total)
            .or_else(|| self.notification_offset.map(|o| total.saturating_sub(o)))
    }
}

/// Unwrap a notification payload. Plugins send a JSON mapping, optionally
/// wrapped in a one-element array, optionally as a base64/hex encoded string.
pub fn decode_payload(payload: &str) -> UpNextResult<(Map<String, Value>, PayloadEncoding)> {
    let value = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(mut items)) => {
            if items.is_empty() {
                return Err(UpNextError::malformed("payload is an empty list"));
            }
            items.swap_remove(0)
        }
        Ok(value) => value,
        Err(_) => Value::String(payload.trim().to_string()),
    };

    match value {
        Value::Object(map) => Ok((map, PayloadEncoding::Json)),
        Value::String(encoded) => decode_string(&encoded),
        other => Err(UpNextError::malformed(format!(
            "payload is not a mapping: {other}"
        ))),
    }
}

fn decode_string(encoded: &str) -> UpNextResult<(Map<String, Value>, PayloadEncoding)> {
    if let Ok(bytes) = STANDARD.decode(encoded)
        && let Ok(Value::Object(map)) = serde_json::from_slice(&bytes)
    {
        return Ok((map, PayloadEncoding::Base64));
    }

    if let Ok(bytes) = hex::decode(encoded)
        && let Ok(Value::Object(map)) = serde_json::from_slice(&bytes)
    {
        return Ok((map, PayloadEncoding::Hex));
    }

    Err(UpNextError::malformed("payload string is not encoded JSON"))
}

fn take_video(data: &mut Map<String, Value>, keys: &[&str]) -> UpNextResult<Option<Item>> {
    for key in keys {
        match data.remove(*key) {
            Some(Value::Object(video)) => return Ok(Some(Item::from_json(&video))),
            Some(Value::Null) | None => continue,
            Some(_) => {
                return Err(UpNextError::malformed(format!("{key} is not a mapping")));
            }
        }
    }
    Ok(None)
}

fn secs(data: &Map<String, Value>, key: &str) -> Option<Duration> {
    data.get(key)
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
}
