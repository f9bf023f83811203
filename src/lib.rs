pub mod config;
pub mod error;
pub mod frame;
pub mod gaze;
pub mod server;

pub use error::{Error, Result};
