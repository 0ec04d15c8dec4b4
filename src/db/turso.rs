use super::traits::DatabaseClient;
use crate::auth::password::PasswordHash;
use crate::auth::tokens::{Scope, TokenFingerprint, TokenRecord};
use crate::types::{
    AppError, NewUser, ProfileUpdate, Result, User, Workout, WorkoutEntry, WorkoutInput,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, created_at, updated_at";

/// libsql-backed store.
///
/// Holds a single connection shared by every request; an in-memory database
/// only exists for the lifetime of the connection that created it. Writes take
/// the lock exclusively so multi-statement transactions never interleave with
/// other statements on the same connection. Reads share it.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
    lock: RwLock<()>,
}

fn database_error(context: &str, e: libsql::Error) -> AppError {
    AppError::Database(format!("{}: {}", context, e))
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid stored timestamp: {}", seconds)))
}

fn user_from_row(row: &Row) -> Result<User> {
    let get_err = |e: libsql::Error| AppError::Database(e.to_string());

    Ok(User {
        id: row.get::<i64>(0).map_err(get_err)?,
        username: row.get::<String>(1).map_err(get_err)?,
        email: row.get::<String>(2).map_err(get_err)?,
        password_hash: PasswordHash::from_stored(row.get::<String>(3).map_err(get_err)?),
        bio: row.get::<String>(4).map_err(get_err)?,
        created_at: timestamp(row.get::<i64>(5).map_err(get_err)?)?,
        updated_at: timestamp(row.get::<i64>(6).map_err(get_err)?)?,
    })
}

fn entry_from_row(row: &Row) -> Result<WorkoutEntry> {
    let get_err = |e: libsql::Error| AppError::Database(e.to_string());

    Ok(WorkoutEntry {
        id: row.get::<i64>(0).map_err(get_err)?,
        exercise_name: row.get::<String>(1).map_err(get_err)?,
        sets: row.get::<i64>(2).map_err(get_err)?,
        reps: row.get::<Option<i64>>(3).map_err(get_err)?,
        duration_seconds: row.get::<Option<i64>>(4).map_err(get_err)?,
        weight: row.get::<Option<f64>>(5).map_err(get_err)?,
        notes: row.get::<String>(6).map_err(get_err)?,
        order_index: row.get::<i64>(7).map_err(get_err)?,
    })
}

impl TursoClient {
    /// In-memory database. Everything is lost when the client is dropped.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| database_error("Failed to create in-memory database", e))?;

        Self::from_database(db).await
    }

    /// File-backed SQLite database at `path`, created if missing.
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| database_error("Failed to open local database", e))?;

        info!(path, "opened local database");
        Self::from_database(db).await
    }

    /// Remote Turso database.
    #[cfg(feature = "turso")]
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| database_error("Failed to connect to Turso", e))?;

        info!("connected to remote Turso database");
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| database_error("Failed to get connection", e))?;

        let client = Self {
            _db: db,
            conn,
            lock: RwLock::new(()),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        let conn = &self.conn;

        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| database_error("Failed to enable foreign keys", e))?;

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                bio TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| database_error("Failed to create users table", e))?;

        // Tokens table, keyed by fingerprint
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tokens (
                hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expiry INTEGER NOT NULL,
                scope TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| database_error("Failed to create tokens table", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tokens_user_scope ON tokens(user_id, scope)",
            (),
        )
        .await
        .map_err(|e| database_error("Failed to create tokens index", e))?;

        // Workouts table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                duration_minutes INTEGER NOT NULL DEFAULT 0,
                calories_burned INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| database_error("Failed to create workouts table", e))?;

        // Workout entries table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS workout_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL,
                exercise_name TEXT NOT NULL,
                sets INTEGER NOT NULL,
                reps INTEGER,
                duration_seconds INTEGER,
                weight REAL,
                notes TEXT NOT NULL DEFAULT '',
                order_index INTEGER NOT NULL,
                FOREIGN KEY (workout_id) REFERENCES workouts(id) ON DELETE CASCADE,
                CHECK ((reps IS NOT NULL AND duration_seconds IS NULL)
                    OR (reps IS NULL AND duration_seconds IS NOT NULL))
            )",
            (),
        )
        .await
        .map_err(|e| database_error("Failed to create workout_entries table", e))?;

        debug!("database schema ready");
        Ok(())
    }

    async fn fetch_user(&self, column: &str, value: libsql::Value) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column),
                [value],
            )
            .await
            .map_err(|e| database_error("Failed to query user", e))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Reads a workout and its entries. Caller holds the lock.
    async fn fetch_workout(&self, id: i64) -> Result<Option<Workout>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, title, description, duration_minutes, calories_burned,
                        created_at, updated_at
                 FROM workouts WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| database_error("Failed to query workout", e))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let get_err = |e: libsql::Error| AppError::Database(e.to_string());
        let mut workout = Workout {
            id: row.get::<i64>(0).map_err(get_err)?,
            user_id: row.get::<i64>(1).map_err(get_err)?,
            title: row.get::<String>(2).map_err(get_err)?,
            description: row.get::<String>(3).map_err(get_err)?,
            duration_minutes: row.get::<i64>(4).map_err(get_err)?,
            calories_burned: row.get::<i64>(5).map_err(get_err)?,
            entries: Vec::new(),
            created_at: timestamp(row.get::<i64>(6).map_err(get_err)?)?,
            updated_at: timestamp(row.get::<i64>(7).map_err(get_err)?)?,
        };

        let mut entry_rows = self
            .conn
            .query(
                "SELECT id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
                 FROM workout_entries WHERE workout_id = ?
                 ORDER BY order_index ASC, id ASC",
                [id],
            )
            .await
            .map_err(|e| database_error("Failed to query workout entries", e))?;

        while let Some(row) = entry_rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            workout.entries.push(entry_from_row(&row)?);
        }

        Ok(Some(workout))
    }

    /// Inserts the entries of `workout_id`. Runs inside the caller's transaction.
    async fn insert_entries(conn: &Connection, workout_id: i64, workout: &WorkoutInput) -> Result<()> {
        for (position, entry) in workout.entries.iter().enumerate() {
            let order_index = entry.order_index.unwrap_or(position as i64);

            conn.execute(
                "INSERT INTO workout_entries
                    (workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    workout_id,
                    entry.exercise_name.as_str(),
                    entry.sets,
                    entry.reps,
                    entry.duration_seconds,
                    entry.weight,
                    entry.notes.as_str(),
                    order_index,
                ),
            )
            .await
            .map_err(|e| database_error("Failed to insert workout entry", e))?;
        }

        Ok(())
    }

    async fn write_new_workout(
        conn: &Connection,
        owner_id: i64,
        workout: &WorkoutInput,
        now: i64,
    ) -> Result<i64> {
        let mut rows = conn
            .query(
                "INSERT INTO workouts
                    (user_id, title, description, duration_minutes, calories_burned, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
                (
                    owner_id,
                    workout.title.as_str(),
                    workout.description.as_str(),
                    workout.duration_minutes,
                    workout.calories_burned,
                    now,
                    now,
                ),
            )
            .await
            .map_err(|e| database_error("Failed to create workout", e))?;

        let id = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("Insert returned no workout id".to_string()))?
            .get::<i64>(0)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::insert_entries(conn, id, workout).await?;
        Ok(id)
    }

    async fn write_workout_update(
        conn: &Connection,
        id: i64,
        workout: &WorkoutInput,
        now: i64,
    ) -> Result<()> {
        let updated = conn
            .execute(
                "UPDATE workouts
                 SET title = ?, description = ?, duration_minutes = ?, calories_burned = ?, updated_at = ?
                 WHERE id = ?",
                (
                    workout.title.as_str(),
                    workout.description.as_str(),
                    workout.duration_minutes,
                    workout.calories_burned,
                    now,
                    id,
                ),
            )
            .await
            .map_err(|e| database_error("Failed to update workout", e))?;

        if updated == 0 {
            return Err(AppError::NotFound("workout not found".to_string()));
        }

        conn.execute("DELETE FROM workout_entries WHERE workout_id = ?", [id])
            .await
            .map_err(|e| database_error("Failed to clear workout entries", e))?;

        Self::insert_entries(conn, id, workout).await
    }
}

#[async_trait]
impl DatabaseClient for TursoClient {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let _guard = self.lock.write().await;
        let now = Utc::now().timestamp();

        let mut rows = self
            .conn
            .query(
                &format!(
                    "INSERT INTO users (username, email, password_hash, bio, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)
                     RETURNING {}",
                    USER_COLUMNS
                ),
                (
                    user.username.as_str(),
                    user.email.as_str(),
                    user.password_hash.as_str(),
                    user.bio.as_str(),
                    now,
                    now,
                ),
            )
            .await
            .map_err(|e| database_error("Failed to create user", e))?;

        let row = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("Insert returned no user row".to_string()))?;

        user_from_row(&row)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let _guard = self.lock.read().await;
        self.fetch_user("username", username.into()).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let _guard = self.lock.read().await;
        self.fetch_user("email", email.into()).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let _guard = self.lock.read().await;
        self.fetch_user("id", id.into()).await
    }

    async fn update_user_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User> {
        let _guard = self.lock.write().await;
        let now = Utc::now().timestamp();

        let updated = self
            .conn
            .execute(
                "UPDATE users SET username = ?, email = ?, bio = ?, updated_at = ? WHERE id = ?",
                (
                    update.username.as_str(),
                    update.email.as_str(),
                    update.bio.as_str(),
                    now,
                    id,
                ),
            )
            .await
            .map_err(|e| database_error("Failed to update user", e))?;

        if updated == 0 {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        self.fetch_user("id", id.into())
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    async fn update_password_hash(&self, id: i64, hash: &PasswordHash) -> Result<()> {
        let _guard = self.lock.write().await;
        let now = Utc::now().timestamp();

        let updated = self
            .conn
            .execute(
                "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
                (hash.as_str(), now, id),
            )
            .await
            .map_err(|e| database_error("Failed to update password", e))?;

        if updated == 0 {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        Ok(())
    }

    async fn insert_token(&self, token: &TokenRecord) -> Result<()> {
        let _guard = self.lock.write().await;

        self.conn
            .execute(
                "INSERT INTO tokens (hash, user_id, expiry, scope) VALUES (?, ?, ?, ?)",
                (
                    token.fingerprint.as_str(),
                    token.user_id,
                    token.expiry.timestamp(),
                    token.scope.as_str(),
                ),
            )
            .await
            .map_err(|e| database_error("Failed to insert token", e))?;

        Ok(())
    }

    async fn get_user_for_token(
        &self,
        scope: Scope,
        fingerprint: &TokenFingerprint,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let _guard = self.lock.read().await;

        let mut rows = self
            .conn
            .query(
                "SELECT u.id, u.username, u.email, u.password_hash, u.bio, u.created_at, u.updated_at
                 FROM users u
                 INNER JOIN tokens t ON t.user_id = u.id
                 WHERE t.hash = ? AND t.scope = ? AND t.expiry > ?",
                (fingerprint.as_str(), scope.as_str(), now.timestamp()),
            )
            .await
            .map_err(|e| database_error("Failed to resolve token", e))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_all_tokens_for_user(&self, user_id: i64, scope: Scope) -> Result<()> {
        let _guard = self.lock.write().await;

        let deleted = self
            .conn
            .execute(
                "DELETE FROM tokens WHERE user_id = ? AND scope = ?",
                (user_id, scope.as_str()),
            )
            .await
            .map_err(|e| database_error("Failed to delete tokens", e))?;

        debug!(user_id, deleted, "deleted tokens");
        Ok(())
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let _guard = self.lock.write().await;

        self.conn
            .execute("DELETE FROM tokens WHERE expiry <= ?", [now.timestamp()])
            .await
            .map_err(|e| database_error("Failed to delete expired tokens", e))
    }

    async fn create_workout(&self, owner_id: i64, workout: &WorkoutInput) -> Result<Workout> {
        let _guard = self.lock.write().await;
        let now = Utc::now().timestamp();

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        let id = match Self::write_new_workout(&tx, owner_id, workout, now).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit workout", e))?;

        self.fetch_workout(id)
            .await?
            .ok_or_else(|| AppError::Database("Created workout disappeared".to_string()))
    }

    async fn get_workout_by_id(&self, id: i64) -> Result<Option<Workout>> {
        let _guard = self.lock.read().await;
        self.fetch_workout(id).await
    }

    async fn get_workout_owner(&self, id: i64) -> Result<Option<i64>> {
        let _guard = self.lock.read().await;

        let mut rows = self
            .conn
            .query("SELECT user_id FROM workouts WHERE id = ?", [id])
            .await
            .map_err(|e| database_error("Failed to query workout owner", e))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(
                row.get::<i64>(0)
                    .map_err(|e| AppError::Database(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn update_workout(&self, id: i64, workout: &WorkoutInput) -> Result<Workout> {
        let _guard = self.lock.write().await;
        let now = Utc::now().timestamp();

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        if let Err(e) = Self::write_workout_update(&tx, id, workout, now).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit workout update", e))?;

        self.fetch_workout(id)
            .await?
            .ok_or_else(|| AppError::NotFound("workout not found".to_string()))
    }

    async fn delete_workout(&self, id: i64) -> Result<()> {
        let _guard = self.lock.write().await;

        let deleted = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?", [id])
            .await
            .map_err(|e| database_error("Failed to delete workout", e))?;

        if deleted == 0 {
            return Err(AppError::NotFound("workout not found".to_string()));
        }

        Ok(())
    }
}
