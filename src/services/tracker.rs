use crate::config::DemoSeek;
use crate::constants::TICK_INTERVAL;
use crate::player::PlayerSnapshot;
use crate::services::handoff::HandoffRequest;
use crate::services::session::Session;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerPhase {
    #[default]
    Idle,
    Armed,
    Fired,
}

/// What a single tick decided
#[derive(Debug)]
enum Tick {
    Wait,
    Abort,
    Fire(PlayerSnapshot),
}

struct TrackerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Monitoring loop that fires the next-item workflow once per playback
pub struct Tracker {
    phase: RwLock<TrackerPhase>,
    task: Mutex<Option<TrackerTask>>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(TrackerPhase::Idle),
            task: Mutex::new(None),
        }
    }

    pub async fn phase(&self) -> TrackerPhase {
        *self.phase.read().await
    }

    /// Arm the loop for the current playback, replacing any running loop
    pub async fn start(&self, session: &Session) {
        let cancel = session.shutdown_token().child_token();

        let previous = self.task.lock().await.take();
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        *self.phase.write().await = TrackerPhase::Armed;
        debug!("Tracker armed");

        let handle = tokio::spawn(run(session.clone(), cancel.clone()));
        *self.task.lock().await = Some(TrackerTask { cancel, handle });
    }

    /// Return to idle now. No-op when idle.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            debug!("Tracker stopped");
        }
        *self.phase.write().await = TrackerPhase::Idle;
    }

    /// Stop and wait for the loop task to finish
    pub async fn terminate(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await
                && !e.is_cancelled()
            {
                warn!("Tracker task ended abnormally: {}", e);
            }
            debug!("Tracker terminated");
        }
        *self.phase.write().await = TrackerPhase::Idle;
    }

    /// Drop to idle unless this loop was replaced or stopped meanwhile
    async fn finish(&self, cancel: &CancellationToken) {
        let mut phase = self.phase.write().await;
        if !cancel.is_cancelled() {
            *phase = TrackerPhase::Idle;
        }
    }
}

async fn run(session: Session, cancel: CancellationToken) {
    demo_seek(&session).await;

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                trace!("Tracker loop cancelled");
                return;
            }
            _ = interval.tick() => {}
        }

        match tick(&session).await {
            Tick::Wait => continue,
            Tick::Abort => break,
            Tick::Fire(player) => {
                fire(&session, &cancel, player).await;
                break;
            }
        }
    }

    session.tracker().finish(&cancel).await;
}

async fn tick(session: &Session) -> Tick {
    let player = session.refresh_player().await;
    let mut state = session.state.write().await;

    if !state.is_tracking() {
        return Tick::Abort;
    }
    if !state.ensure_consistent() {
        return Tick::Abort;
    }

    if state.is_disabled() {
        state.stop_tracking();
        return Tick::Abort;
    }

    if player.external_player {
        debug!("Tracking: stopped - external player used");
        state.stop_tracking();
        return Tick::Abort;
    }

    if !player.playing {
        debug!("Tracking: stopped - no file is playing");
        state.stop_tracking();
        return Tick::Abort;
    }

    let current_file = player.playing_file.as_str();

    if state.last_file.as_deref() == Some(current_file) {
        trace!("Monitoring: old file is playing");
        return Tick::Wait;
    }

    if state.tracked_file() != Some(current_file) {
        if state.playing_next {
            trace!("Monitoring: next file already requested");
            return Tick::Wait;
        }
        debug!(file = current_file, "Tracking: stopped - unknown file playing");
        state.stop_tracking();
        return Tick::Abort;
    }

    if player.total.is_zero() {
        debug!("Tracking: stopped - zero length file");
        state.stop_tracking();
        return Tick::Abort;
    }

    if player.elapsed < state.popup_time {
        return Tick::Wait;
    }

    // Tracking off before the handoff so a second tick cannot fire again
    state.stop_tracking();
    state.last_file = Some(current_file.to_string());
    Tick::Fire(player)
}

async fn fire(session: &Session, cancel: &CancellationToken, player: PlayerSnapshot) {
    {
        let mut phase = session.tracker().phase.write().await;
        if cancel.is_cancelled() {
            return;
        }
        *phase = TrackerPhase::Fired;
    }

    info!(
        "Popup: launch - episode ({:?} runtime) ends in {:?}",
        player.total,
        player.remaining()
    );

    let request = HandoffRequest {
        state: session.state.read().await.clone(),
        player,
    };

    let shutdown = session.shutdown_token();
    let workflow = session.workflow();
    // A stop while the prompt is open abandons the handoff
    tokio::select! {
        _ = shutdown.cancelled() => debug!("Next item workflow interrupted by shutdown"),
        _ = cancel.cancelled() => debug!("Next item workflow abandoned, tracker stopped"),
        result = workflow.launch(session, request) => match result {
            Ok(true) => debug!("Next item presented"),
            Ok(false) => debug!("No next item presented"),
            Err(e) => warn!("Next item workflow failed: {:#}", e),
        },
    }
}

/// Jump close to the popup (or detect) point when demo mode asks for it
async fn demo_seek(session: &Session) {
    let (target, lead) = {
        let state = session.state.read().await;
        let settings = &state.settings;
        if !settings.demo_mode {
            return;
        }
        let target = match settings.demo_seek {
            DemoSeek::Off => return,
            DemoSeek::Popup => state.popup_time,
            DemoSeek::Detect => state.detect_time.unwrap_or(state.popup_time),
        };
        (target, settings.demo_seek_lead())
    };

    let position = target.saturating_sub(lead);
    if position.is_zero() {
        return;
    }

    debug!("Demo mode: seeking to {:?}", position);
    if let Err(e) = session.player.seek(position).await {
        warn!("Demo mode seek failed: {:#}", e);
    }
}
