pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod output;
pub mod stats;
pub mod tasks;
pub mod timers;
pub mod users;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
