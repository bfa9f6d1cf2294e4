//! reel-core: errors and configuration shared by the Reel crates.

pub mod config;
pub mod errors;

pub use config::ReelConfig;
pub use errors::{ErrorKind, ReelError, ReelResult};
