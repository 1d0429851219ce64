use crate::common::fixtures::{RUNTIME, addon_payload, episode, movie};
use crate::common::{Harness, settings_with_offset};
use serde_json::json;
use std::time::Duration;
use upnext::config::{MarkWatched, Settings};
use upnext::events::Notification;
use upnext::models::{Generic, Item, PayloadEncoding};
use upnext::player::PlayTarget;
use upnext::services::{PopupKind, PromptResponse, StartOutcome, TrackerPhase, WatchStateUpdate};

async fn start_and_fire(harness: &Harness, item: Item) {
    harness.play(item).await;
    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    assert!(harness.wait_for_launches(1, RUNTIME).await);
    // Let the workflow run to completion
    tokio::time::sleep(Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_play_now_opens_next_episode_and_commits() {
    let mut current = episode(1, 1, 1);
    current.resume.position = Duration::from_secs(600);
    let harness = Harness::new(
        settings_with_offset(30),
        vec![current, episode(2, 1, 2), episode(3, 2, 1)],
        PromptResponse::PlayNow,
    );
    {
        // Third in a row: play-now still restarts the streak
        harness.session.state.write().await.played_in_a_row = 2;
    }

    let playing = harness.library.episode(1).unwrap();
    start_and_fire(&harness, Item::Episode(playing)).await;

    assert_eq!(harness.workflow.results(), vec![true]);
    let shown = harness.prompt.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].kind, PopupKind::UpNext);
    assert_eq!(shown[0].next.episode_id(), Some(2));
    assert!(!shown[0].new_season);
    assert!(shown[0].remaining <= Duration::from_secs(30));

    assert_eq!(harness.player.opened().await, vec![PlayTarget::Episode(2)]);

    {
        let state = harness.session.state.read().await;
        assert!(state.playing_next);
        assert_eq!(state.played_in_a_row, 1);
    }

    assert_eq!(
        harness.library.writes(),
        vec![(
            1,
            WatchStateUpdate {
                playcount: Some(1),
                resume: Some(Duration::ZERO),
            }
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_new_season_flag_on_last_episode() {
    let harness = Harness::new(
        settings_with_offset(30),
        vec![episode(2, 1, 2), episode(3, 2, 1)],
        PromptResponse::Cancel,
    );

    start_and_fire(&harness, Item::Episode(episode(2, 1, 2))).await;

    let shown = harness.prompt.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].next.episode_id(), Some(3));
    assert!(shown[0].new_season);
}

#[tokio::test(start_paused = true)]
async fn test_auto_play_queues_next_episode() {
    let (current, next) = (episode(1, 1, 1), episode(2, 1, 2));
    let harness = Harness::new(
        settings_with_offset(30),
        vec![current.clone(), next.clone()],
        PromptResponse::AutoPlay,
    );

    start_and_fire(&harness, Item::Episode(current.clone())).await;

    assert!(harness.player.opened().await.is_empty());
    let playlist = harness.library.playlist();
    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist[0].file(), next.file);

    {
        let state = harness.session.state.read().await;
        assert!(state.playing_next);
        assert_eq!(state.played_in_a_row, 2);
        assert_eq!(state.queue().len(), 1);
        assert_eq!(state.queue()[0].file, next.file);
        assert_eq!(state.queue()[0].position, 0);
    }

    // Host moves on to the queued file
    harness.play(Item::Episode(next.clone())).await;
    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    let state = harness.session.state.read().await;
    assert!(!state.playing_next);
    assert_eq!(state.tracked_file(), Some(next.file.as_str()));
    assert!(state.queue().is_empty());
    assert_eq!(state.played_in_a_row, 2);
    assert!(harness.library.dequeued().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_still_watching_cancel_changes_nothing() {
    let settings = Settings {
        played_limit: 2,
        ..settings_with_offset(30)
    };
    let harness = Harness::new(
        settings,
        vec![episode(1, 1, 1), episode(2, 1, 2)],
        PromptResponse::Cancel,
    );
    harness.session.state.write().await.played_in_a_row = 2;

    start_and_fire(&harness, Item::Episode(episode(1, 1, 1))).await;

    assert_eq!(harness.workflow.results(), vec![true]);
    let shown = harness.prompt.shown();
    assert_eq!(shown[0].kind, PopupKind::StillWatching);
    assert!(harness.player.opened().await.is_empty());
    assert!(harness.library.writes().is_empty());

    let state = harness.session.state.read().await;
    assert_eq!(state.played_in_a_row, 2);
    assert!(!state.playing_next);
}

#[tokio::test(start_paused = true)]
async fn test_mark_watched_off_skips_commit() {
    let settings = Settings {
        mark_watched: MarkWatched::Off,
        ..settings_with_offset(30)
    };
    let harness = Harness::new(
        settings,
        vec![episode(1, 1, 1), episode(2, 1, 2)],
        PromptResponse::PlayNow,
    );

    start_and_fire(&harness, Item::Episode(episode(1, 1, 1))).await;

    assert_eq!(harness.player.opened().await, vec![PlayTarget::Episode(2)]);
    assert!(harness.library.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_playlist_next_takes_precedence_over_library() {
    let settings = Settings {
        enable_playlist: true,
        ..settings_with_offset(30)
    };
    let current = episode(1, 1, 1);
    let harness = Harness::new(
        settings,
        vec![current.clone(), episode(2, 1, 2)],
        PromptResponse::PlayNow,
    );
    harness.library.set_playlist(
        vec![Item::Episode(current.clone()), movie("/movies/Feature.mkv")],
        Some(0),
    );

    start_and_fire(&harness, Item::Episode(current)).await;

    let shown = harness.prompt.shown();
    assert_eq!(shown[0].next.file(), "/movies/Feature.mkv");
    assert_eq!(harness.player.opened().await, vec![PlayTarget::PlaylistNext]);
}

#[tokio::test(start_paused = true)]
async fn test_plugin_data_hands_play_info_back() {
    let file = "plugin://video.example/stream/70";
    let harness = Harness::new(settings_with_offset(30), vec![], PromptResponse::PlayNow);
    harness
        .play(Item::Generic(Generic {
            title: "Stream One".to_string(),
            file: file.to_string(),
            runtime: RUNTIME,
            ..Generic::default()
        }))
        .await;

    let start = harness
        .router
        .dispatch(Notification::ExternalData {
            sender: "plugin.video.example.SIGNAL".to_string(),
            method: "Other.upnext_data".to_string(),
            payload: hex::encode(addon_payload(file)),
        })
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    {
        let state = harness.session.state.read().await;
        assert_eq!(state.popup_time, Duration::from_secs(1770));
        assert_eq!(state.detect_time, Some(Duration::from_secs(1680)));
        assert_eq!(state.current_item.episode_id, None);
    }

    assert!(harness.wait_for_launches(1, RUNTIME).await);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(harness.prompt.shown()[0].next.title(), "Stream Two");
    assert_eq!(
        harness.player.opened().await,
        vec![PlayTarget::AddonCallback {
            id: "plugin.video.example_play_action".to_string(),
            play_info: json!({"stream": 71}),
            encoding: PayloadEncoding::Hex,
        }]
    );
    assert!(harness.library.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_prompt_open_abandons_handoff() {
    let harness = Harness::with_handoff_delay(
        settings_with_offset(30),
        vec![episode(1, 1, 1), episode(2, 1, 2)],
        PromptResponse::PlayNow,
        Duration::from_secs(20),
    );
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    assert!(harness.wait_for_launches(1, RUNTIME).await);
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Fired);

    harness.router.dispatch(Notification::PlaybackStopped).await;
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(harness.workflow.results().is_empty());
    assert!(harness.prompt.shown().is_empty());
    assert!(harness.player.opened().await.is_empty());
    assert!(harness.library.writes().is_empty());

    let state = harness.session.state.read().await;
    assert!(!state.playing_next);
    assert!(!state.is_tracking());
}
