pub mod handoff;
pub mod library;
pub mod session;
pub mod tracker;
pub mod video_check;

pub use handoff::{
    HandoffRequest, NextItemWorkflow, PopupKind, Prompt, PromptRequest, PromptResponse,
    UpNextHandoff,
};
pub use library::{LibraryGateway, NextEpisodeOptions, WatchCommit, WatchStateUpdate};
pub use session::Session;
pub use tracker::{Tracker, TrackerPhase};
pub use video_check::StartOutcome;
