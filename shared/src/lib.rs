pub mod codegen;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod models;
pub mod notifications;
pub mod security;
pub mod templates;

pub use config::Config;
pub use database::get_db_connection;
pub use error::{AppError, AppResult};
pub use models::*;
pub use notifications::{Event, Notifier};
pub use templates::StrategyTemplate;
