//! Persistence for users, tokens and workouts.
//!
//! - **Turso/SQLite**: libsql-backed store, in memory, on disk, or remote
//!
//! Enable remote Turso via the Cargo feature:
//! ```toml
//! liftlog-server = { version = "*", features = ["turso"] }
//! ```

pub mod traits;
pub mod turso;

pub use traits::{DatabaseClient, DatabaseProvider};
pub use turso::TursoClient;
