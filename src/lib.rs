//! # Liftlog - Workout Tracking Server
//!
//! A REST backend where clients register, authenticate with opaque bearer
//! tokens, and manage workouts they own.
//!
//! ## Overview
//!
//! Liftlog can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `liftlog-server` binary
//! 2. **As a library** - Build the router into your own axum application
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use liftlog::{api::routes::create_router, auth::SystemClock, db::DatabaseProvider, AppState};
//! use std::sync::Arc;
//!
//! let db = DatabaseProvider::Memory.create_client().await?;
//! let state = AppState::new(Arc::from(db), Arc::new(SystemClock));
//! let app = create_router(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-db` | Local SQLite database (default) |
//! | `turso` | Remote Turso database |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Passwords, bearer tokens, request identity and ownership checks
//! - [`db`] - Database abstraction (SQLite, Turso)
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and tracing setup

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication and ownership authorization.
pub mod auth;
/// Database clients (Turso/SQLite).
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and tracing utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseClient, DatabaseProvider, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::LiftlogConfig;

use crate::auth::{AuthService, Clock};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database client
    pub db: Arc<dyn DatabaseClient>,
    /// Authentication service
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires the auth service to `db` and `clock`.
    pub fn new(db: Arc<dyn DatabaseClient>, clock: Arc<dyn Clock>) -> Self {
        let auth_service = Arc::new(AuthService::new(db.clone(), clock));

        Self { db, auth_service }
    }
}
