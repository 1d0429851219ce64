pub mod episodes;
pub mod tvshows;

use sea_orm::prelude::Json;
use std::collections::HashMap;

// Re-export entities for convenience
pub use episodes::{
    ActiveModel as EpisodeActiveModel, Entity as EpisodeEntity, Model as EpisodeModel,
};
pub use tvshows::{ActiveModel as TvShowActiveModel, Entity as TvShowEntity, Model as TvShowModel};

/// Art references are stored as a JSON object of kind -> url
pub(crate) fn art_map(art: Option<&Json>) -> HashMap<String, String> {
    art.and_then(|a| a.as_object())
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn art_json(art: &HashMap<String, String>) -> Option<Json> {
    if art.is_empty() {
        None
    } else {
        serde_json::to_value(art).ok()
    }
}
