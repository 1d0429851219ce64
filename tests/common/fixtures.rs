use serde_json::json;
use std::time::Duration;
use upnext::models::{Episode, Item, Movie};

pub const SHOW_ID: i32 = 1;
pub const RUNTIME: Duration = Duration::from_secs(1800);

pub fn episode(id: i32, season: u32, number: u32) -> Episode {
    Episode {
        id: Some(id),
        tvshow_id: Some(SHOW_ID),
        show_title: "Test Show".to_string(),
        title: format!("Episode {number}"),
        season: season.to_string(),
        episode: number.to_string(),
        file: format!("/tv/Test Show/S{season:02}E{number:02}.mkv"),
        runtime: RUNTIME,
        ..Episode::default()
    }
}

pub fn movie(file: &str) -> Item {
    Item::Movie(Movie {
        id: Some(50),
        title: "Feature".to_string(),
        file: file.to_string(),
        runtime: Duration::from_secs(5400),
        ..Movie::default()
    })
}

/// Plugin payload for a stream at `file`, with play_info to be echoed back
pub fn addon_payload(file: &str) -> String {
    json!({
        "current_video": {
            "tvshowid": 7,
            "episodeid": 70,
            "title": "Stream One",
            "season": 1,
            "episode": 1,
            "file": file
        },
        "next_video": {
            "tvshowid": 7,
            "episodeid": 71,
            "title": "Stream Two",
            "season": 1,
            "episode": 2
        },
        "play_info": {"stream": 71},
        "notification_offset": 120
    })
    .to_string()
}
