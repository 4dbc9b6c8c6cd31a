//! Biblioteca Library Management System
//!
//! A Rust implementation of a library loans and fines server, providing a
//! REST JSON API for borrowing books, returning them, and settling overdue
//! fines through tracked payments.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod fine;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
