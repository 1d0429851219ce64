use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use upnext::config::{DemoSeek, Settings};
use upnext::constants::NOTIFICATION_BUS_CAPACITY;
use upnext::db::Database;
use upnext::db::repository::LibraryRepositoryImpl;
use upnext::events::{EventRouter, Notification, NotificationBus};
use upnext::models::{Episode, Item, MediaType, TvShow};
use upnext::player::{PlayerBackend, SimulatedPlayer};
use upnext::services::{
    LibraryGateway, PopupKind, Prompt, PromptRequest, PromptResponse, Session, TrackerPhase,
    UpNextHandoff,
};

#[derive(Parser)]
#[command(name = "upnext", version, about = "What's-next prompt for episodic playback")]
struct Cli {
    /// Settings file, defaults to the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a scripted episode against a seeded library and show the prompt
    Demo {
        #[arg(value_enum, default_value_t = DemoPopup::Upnext)]
        popup: DemoPopup,

        /// Library database file, in-memory when omitted
        #[arg(long)]
        library: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DemoPopup {
    Upnext,
    Stillwatching,
}

/// Prompt that logs what it would show and answers immediately
struct LoggingPrompt;

#[async_trait]
impl Prompt for LoggingPrompt {
    async fn show(&self, request: &PromptRequest) -> PromptResponse {
        let next = match request.next.as_episode() {
            Some(episode) => format!(
                "{} {} - {}",
                episode.show_title,
                episode.season_episode_label(),
                episode.title
            ),
            None => request.next.title().to_string(),
        };

        match request.kind {
            PopupKind::UpNext => {
                info!(
                    "Up Next: {} (in {:?}, new season: {})",
                    next, request.remaining, request.new_season
                );
                PromptResponse::PlayNow
            }
            PopupKind::StillWatching => {
                info!("Still watching? Next would be {}", next);
                PromptResponse::Cancel
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upnext=debug")),
        )
        .init();

    let cli = Cli::parse();

    let (settings, config_path) = match cli.config {
        Some(path) => (Settings::load_from(&path)?, path),
        None => (Settings::load()?, Settings::config_path()?),
    };

    match cli.command {
        Command::Demo { popup, library } => run_demo(settings, config_path, popup, library).await,
    }
}

async fn seed_library(repo: &LibraryRepositoryImpl) -> Result<(i32, Duration)> {
    let runtime = Duration::from_secs(1800);
    let show_id = repo
        .add_show(&TvShow {
            title: "Demo Show".to_string(),
            year: Some(2024),
            ..TvShow::default()
        })
        .await?;

    let mut first = None;
    for number in 1..=3 {
        let id = repo
            .add_episode(
                show_id,
                &Episode {
                    title: format!("Chapter {number}"),
                    season: "1".to_string(),
                    episode: number.to_string(),
                    file: format!("/demo/Demo Show/S01E{number:02}.mkv"),
                    runtime,
                    ..Episode::default()
                },
            )
            .await?;
        first.get_or_insert(id);
    }

    let first = first.context("Demo library is empty")?;
    Ok((first, runtime))
}

async fn run_demo(
    mut settings: Settings,
    config_path: PathBuf,
    popup: DemoPopup,
    library: Option<PathBuf>,
) -> Result<()> {
    info!("Starting Up Next demo ({:?})", popup);

    settings.demo_mode = true;
    if settings.demo_seek == DemoSeek::Off {
        settings.demo_seek = DemoSeek::Popup;
    }
    if settings.played_limit == 0 {
        settings.played_limit = 3;
    }

    let database = match &library {
        Some(path) => Database::connect(path).await?,
        None => Database::in_memory().await?,
    };
    database.migrate().await?;

    let repo = Arc::new(LibraryRepositoryImpl::new(database.get_connection()));
    let (episode_id, runtime) = seed_library(&repo).await?;
    let episode = repo
        .get_episode(episode_id)
        .await?
        .context("Seeded episode missing")?;

    let player = Arc::new(SimulatedPlayer::new());
    let workflow = Arc::new(UpNextHandoff::new(Arc::new(LoggingPrompt)));
    let session = Session::new(settings.clone(), player.clone(), repo.clone(), workflow)
        .with_config_path(config_path);

    // Pin the media type so the start check treats the demo file as an episode
    session
        .player_state
        .write()
        .await
        .media_type
        .set(MediaType::Episode, true);

    if let DemoPopup::Stillwatching = popup {
        session.state.write().await.played_in_a_row = settings.played_limit;
    }

    let bus = NotificationBus::new(NOTIFICATION_BUS_CAPACITY);
    let router = EventRouter::new(session.clone());
    let subscriber = bus.subscribe();
    let router_task = tokio::spawn(async move { router.run(subscriber).await });

    player.play(Item::Episode(episode), runtime).await;
    bus.publish(Notification::PlaybackStarted).await?;

    let finished = wait_for_handoff(&session);
    tokio::select! {
        result = tokio::time::timeout(Duration::from_secs(120), finished) => {
            if result.is_err() {
                warn!("Demo timed out before the prompt fired");
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    for target in player.opened().await {
        info!("Player asked to open {:?}", target);
    }

    player.stop().await?;
    bus.publish(Notification::PlaybackStopped).await?;
    session.shutdown().await;
    router_task.await?;

    for event in bus.get_history().await {
        let at = event.timestamp.format("%H:%M:%S");
        debug!("{} {}", at, event.notification.as_str());
    }
    let stats = bus.get_stats().await;
    info!("Demo finished, {} notifications routed", stats.total_events);
    Ok(())
}

/// Resolves once the tracker has fired and gone idle again
async fn wait_for_handoff(session: &Session) {
    let mut interval = tokio::time::interval(Duration::from_millis(250));
    loop {
        interval.tick().await;
        let fired = {
            let state = session.state.read().await;
            state.last_file.is_some() || state.playing_next
        };
        if fired && session.tracker().phase().await == TrackerPhase::Idle {
            return;
        }
    }
}
