use crate::common::fixtures::{RUNTIME, episode, movie};
use crate::common::mocks::RecordingWorkflow;
use crate::common::{Harness, settings_with_offset};
use std::time::Duration;
use tempfile::TempDir;
use upnext::config::{DemoSeek, Settings};
use upnext::events::{EventRouter, Notification};
use upnext::models::Item;
use upnext::services::{PromptResponse, StartOutcome, TrackerPhase};

#[tokio::test(start_paused = true)]
async fn test_end_of_series_fires_once_at_popup_time() {
    let harness = Harness::new(
        settings_with_offset(90),
        vec![episode(1, 1, 1)],
        PromptResponse::PlayNow,
    );
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Armed);
    {
        let state = harness.session.state.read().await;
        assert!(state.is_tracking());
        assert_eq!(state.popup_time, Duration::from_secs(1710));
    }

    assert!(harness.wait_for_launches(1, RUNTIME).await);
    let launches = harness.workflow.launches();
    let fired_at = launches[0].player.elapsed;
    assert!(
        fired_at >= Duration::from_secs(1710) && fired_at <= Duration::from_secs(1712),
        "fired at {fired_at:?}"
    );
    // Tracking is already off when the workflow runs
    assert!(!launches[0].state.is_tracking());

    tokio::time::sleep(Duration::from_secs(2)).await;

    // No next episode: nothing presented, state back to defaults
    assert_eq!(harness.workflow.results(), vec![false]);
    assert!(harness.prompt.shown().is_empty());
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);

    let state = harness.session.state.read().await;
    assert!(!state.is_tracking());
    assert!(!state.playing_next);
    assert_eq!(state.starting, 0);
    assert_eq!(state.played_in_a_row, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fires_only_once_per_playback() {
    let harness = Harness::with_workflow(settings_with_offset(30), RecordingWorkflow::new(None));
    let current = episode(1, 1, 1);
    harness.play(Item::Episode(current.clone())).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    assert!(harness.wait_for_launches(1, RUNTIME).await);

    // Re-arming past the threshold, directly or via an AV change, must not fire again
    harness.session.tracker().start(&harness.session).await;
    assert!(
        harness
            .router
            .dispatch(Notification::AvChanged)
            .await
            .is_none()
    );
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(harness.workflow.launches().len(), 1);
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);
    let state = harness.session.state.read().await;
    assert!(!state.is_tracking());
    assert_eq!(state.last_file.as_deref(), Some(current.file.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_latest_start_confirmation_wins() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);
    let current = episode(1, 1, 1);
    harness.play(Item::Episode(current.clone())).await;

    let first = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.session.state.read().await.starting, 1);

    // Without data a second start is a no-op while the first is waiting
    let duplicate = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(duplicate.await.unwrap(), StartOutcome::Busy);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = harness
        .router
        .dispatch(Notification::ExternalData {
            sender: "plugin.video.example.SIGNAL".to_string(),
            method: "Other.upnext_data".to_string(),
            payload: crate::common::fixtures::addon_payload(&current.file),
        })
        .await
        .unwrap();

    assert_eq!(first.await.unwrap(), StartOutcome::Superseded);
    assert_eq!(second.await.unwrap(), StartOutcome::Tracking);

    let state = harness.session.state.read().await;
    assert_eq!(state.starting, 0);
    assert!(state.is_tracking());
    assert_eq!(
        state.addon_data.as_ref().map(|a| a.id.as_str()),
        Some("plugin.video.example_play_action")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_handoff_only_clears_flag() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);
    let current = episode(1, 1, 1);
    harness.play(Item::Episode(current.clone())).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    harness.session.state.write().await.playing_next = true;
    assert!(
        harness
            .router
            .dispatch(Notification::PlaybackStopped)
            .await
            .is_none()
    );

    let state = harness.session.state.read().await;
    assert!(!state.playing_next);
    assert!(state.is_tracking());
    assert_eq!(state.tracked_file(), Some(current.file.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_stop_resets_and_dequeues_pending_item() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);
    let (current, next) = (episode(1, 1, 1), episode(2, 1, 2));
    harness.library.set_playlist(
        vec![Item::Episode(current.clone()), Item::Episode(next.clone())],
        Some(0),
    );
    {
        let mut state = harness.session.state.write().await;
        state.start_tracking(&current.file);
        assert!(state.enqueue(&next.file, 1));
    }

    harness.router.dispatch(Notification::PlaybackStopped).await;

    assert_eq!(harness.library.dequeued(), vec![1]);
    assert_eq!(harness.library.playlist().len(), 1);
    let state = harness.session.state.read().await;
    assert!(!state.is_tracking());
    assert!(state.queue().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_library_movie_without_data_is_not_tracked() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);
    harness.play(movie("/movies/Feature.mkv")).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::NotEligible);
    assert!(!harness.session.state.read().await.is_tracking());
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_playing_aborts_confirmation() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::NotPlaying);
    assert_eq!(harness.session.state.read().await.starting, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_file_stops_tracking() {
    let harness = Harness::with_workflow(settings_with_offset(30), RecordingWorkflow::new(None));
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    // Host switched files without telling us
    harness.play(Item::Episode(episode(2, 1, 2))).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);
    assert!(!harness.session.state.read().await.is_tracking());
    assert!(harness.workflow.launches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_settle_wait() {
    let harness = Harness::new(Settings::default(), vec![], PromptResponse::Cancel);
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    harness.session.shutdown().await;

    assert_eq!(start.await.unwrap(), StartOutcome::Shutdown);
    assert!(!harness.session.state.read().await.is_tracking());
}

#[tokio::test(start_paused = true)]
async fn test_demo_mode_seeks_before_popup() {
    let settings = Settings {
        demo_mode: true,
        demo_seek: DemoSeek::Popup,
        demo_seek_lead_secs: 15,
        ..settings_with_offset(30)
    };
    let harness = Harness::with_workflow(settings, RecordingWorkflow::new(None));
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(harness.player.seeks().await, vec![Duration::from_secs(1755)]);
    assert!(harness.wait_for_launches(1, Duration::from_secs(20)).await);
}

#[tokio::test(start_paused = true)]
async fn test_disabling_in_settings_terminates_tracking() {
    let harness = Harness::with_workflow(settings_with_offset(30), RecordingWorkflow::new(None));
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let session = harness.session.clone().with_config_path(config_path.clone());
    let router = EventRouter::new(session.clone());

    harness.play(Item::Episode(episode(1, 1, 1))).await;
    let start = router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    Settings {
        enabled: false,
        ..Settings::default()
    }
    .save_to(&config_path)
    .unwrap();
    router.dispatch(Notification::SettingsChanged).await;

    assert_eq!(session.tracker().phase().await, TrackerPhase::Idle);
    {
        let state = session.state.read().await;
        assert!(!state.is_tracking());
        assert!(!state.settings.enabled);
    }

    let start = router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::NotEligible);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_running_workflow() {
    let workflow = RecordingWorkflow::new(None).with_delay(Duration::from_secs(60));
    let harness = Harness::with_workflow(settings_with_offset(30), workflow);
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);
    assert!(harness.wait_for_launches(1, RUNTIME).await);
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Fired);

    harness.session.shutdown().await;

    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);
    assert!(harness.workflow.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_screensaver_resumes_interrupted_tracking() {
    let harness = Harness::with_workflow(settings_with_offset(30), RecordingWorkflow::new(None));
    harness.play(Item::Episode(episode(1, 1, 1))).await;

    let start = harness
        .router
        .dispatch(Notification::PlaybackStarted)
        .await
        .unwrap();
    assert_eq!(start.await.unwrap(), StartOutcome::Tracking);

    // Loop halted while the session still wants tracking
    harness.session.tracker().stop().await;
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Idle);
    assert!(harness.session.state.read().await.is_tracking());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(harness.workflow.launches().is_empty());

    assert!(
        harness
            .router
            .dispatch(Notification::ScreensaverDeactivated)
            .await
            .is_none()
    );
    assert_eq!(harness.session.tracker().phase().await, TrackerPhase::Armed);

    assert!(harness.wait_for_launches(1, RUNTIME).await);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.workflow.launches().len(), 1);
}
