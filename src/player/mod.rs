pub mod simulated;
pub mod state;
pub mod traits;

pub use simulated::SimulatedPlayer;
pub use state::{Forced, PlayerReading, PlayerSnapshot, PlayerState};
pub use traits::{PlayTarget, PlayerBackend};
