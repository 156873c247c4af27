pub mod config;
pub mod error;
pub mod http;
pub mod live;
pub mod telemetry;
pub mod yolink_api;

pub use error::{Error, Result};
