//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Liveness endpoint.
pub mod health;
/// Login and logout handlers.
pub mod tokens;
/// Registration and profile handlers.
pub mod users;
/// Workout CRUD handlers.
pub mod workouts;
