//! Detects the approaching end of the playing video, prompts for what comes
//! next and hands off to it while keeping watch state in step.

pub mod config;
pub mod constants;
pub mod db;
pub mod events;
pub mod models;
pub mod player;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_utils;
