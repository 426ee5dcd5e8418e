pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod report;
pub mod store;
mod utils;

pub use backup::Backup;
pub use config::{Backend, Config};
pub use error::{Error, Result, StoreError};
