//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Liftlog, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::extract`](crate::api::extract) - Validated JSON body extractor
//! - [`api::openapi`](crate::api::openapi) - OpenAPI document
//!
//! # API Endpoints
//!
//! ## Users
//! - `POST /users` - Register new user
//! - `GET /users/me` - Current profile
//! - `PUT /users/me` - Update profile
//! - `PUT /users/me/password` - Change password, revoking all tokens
//!
//! ## Tokens
//! - `POST /tokens/authentication` - Login and receive a bearer token
//! - `DELETE /tokens/authentication` - Revoke all of the caller's tokens
//!
//! ## Workouts
//! - `GET /workouts/{id}` - Get a workout (public)
//! - `POST /workouts` - Create a workout
//! - `PUT /workouts/{id}` - Update a workout (owner only)
//! - `DELETE /workouts/{id}` - Delete a workout (owner only)
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Authenticated endpoints take the token from login in the `Authorization` header:
//! ```text
//! Authorization: Bearer <auth_token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

/// Validated JSON body extraction.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// OpenAPI document.
pub mod openapi;
/// Router configuration and route definitions.
pub mod routes;
