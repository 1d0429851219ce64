pub mod tracking_state;

pub use tracking_state::{CurrentItem, QueueEntry, TrackingState};
