pub mod config;
pub mod cronjob;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod server;

pub use config::Settings;
pub use error::AppError;
pub use lifecycle::{Lifecycle, Readiness};
