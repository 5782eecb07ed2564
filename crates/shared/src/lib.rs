pub mod config;
mod config_env;
pub mod error;
pub mod meeting_linker;
pub mod models;
pub mod notifier;
pub mod privacy;
pub mod query;
pub mod recurrence;
pub mod repos;
pub mod rounding;
pub mod timecard;
pub mod timezone;
