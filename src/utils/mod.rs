pub mod errors;

pub use errors::{UpNextError, UpNextResult};
