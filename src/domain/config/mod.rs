//! Configuration domain model

pub mod app_config;

pub use app_config::{AppConfig, DEFAULT_BUCKET};
