//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use habit_tracker_core::domain::{
    Frequency, Habit, HabitChanges, NewHabit, TrackLog, User, UserCredentials,
};
use habit_tracker_core::ports::{DatabaseService, PortError, PortResult};
use habit_tracker_core::streak::{CompletionDate, StreakResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const HABIT_COLUMNS: &str = "id, user_id, title, description, frequency, tags, reminder_time, \
                             current_streak, longest_streak, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    name: String,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct HabitRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    frequency: String,
    tags: Vec<String>,
    reminder_time: Option<NaiveTime>,
    current_streak: i32,
    longest_streak: i32,
    created_at: DateTime<Utc>,
}
impl HabitRecord {
    fn to_domain(self) -> PortResult<Habit> {
        let frequency = self
            .frequency
            .parse::<Frequency>()
            .map_err(|e| PortError::Unexpected(format!("Corrupt habit {}: {}", self.id, e)))?;
        Ok(Habit {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            frequency,
            tags: self.tags,
            reminder_time: self.reminder_time,
            current_streak: self.current_streak.max(0) as u32,
            longest_streak: self.longest_streak.max(0) as u32,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct TrackLogRecord {
    id: Uuid,
    habit_id: Uuid,
    day: NaiveDate,
    logged_at: DateTime<Utc>,
}
impl TrackLogRecord {
    fn to_domain(self) -> TrackLog {
        TrackLog {
            id: self.id,
            habit_id: self.habit_id,
            day: CompletionDate::new(self.day),
            logged_at: self.logged_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, name, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING user_id, name, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("User already exists".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_habit(&self, user_id: Uuid, habit: &NewHabit) -> PortResult<Habit> {
        let sql = format!(
            "INSERT INTO habits (id, user_id, title, description, frequency, tags, reminder_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {HABIT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, HabitRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&habit.title)
            .bind(&habit.description)
            .bind(habit.frequency.as_str())
            .bind(&habit.tags)
            .bind(habit.reminder_time)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn count_habits(&self, user_id: Uuid, tag: Option<&str>) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM habits WHERE user_id = $1 AND ($2::TEXT IS NULL OR $2 = ANY(tags))",
        )
        .bind(user_id)
        .bind(tag)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn list_habits(
        &self,
        user_id: Uuid,
        tag: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Habit>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR $2 = ANY(tags)) \
             ORDER BY created_at DESC OFFSET $3 LIMIT $4"
        );
        let records = sqlx::query_as::<_, HabitRecord>(&sql)
            .bind(user_id)
            .bind(tag)
            .bind(offset as i64)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(HabitRecord::to_domain).collect()
    }

    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<Habit> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1 AND user_id = $2");
        let record = sqlx::query_as::<_, HabitRecord>(&sql)
            .bind(habit_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Habit {} not found", habit_id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        changes: &HabitChanges,
    ) -> PortResult<Habit> {
        let sql = format!(
            "UPDATE habits SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                frequency = COALESCE($5, frequency), \
                tags = COALESCE($6::TEXT[], tags), \
                reminder_time = COALESCE($7, reminder_time) \
             WHERE id = $1 AND user_id = $2 RETURNING {HABIT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, HabitRecord>(&sql)
            .bind(habit_id)
            .bind(user_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.frequency.map(|f| f.as_str()))
            .bind(&changes.tags)
            .bind(changes.reminder_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit_id)))?;
        record.to_domain()
    }

    async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<()> {
        // Track logs go with the habit through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
            .bind(habit_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Habit {} not found", habit_id)));
        }
        Ok(())
    }

    async fn save_habit_streak(&self, habit_id: Uuid, streak: StreakResult) -> PortResult<()> {
        sqlx::query("UPDATE habits SET current_streak = $1, longest_streak = $2 WHERE id = $3")
            .bind(streak.current as i32)
            .bind(streak.longest as i32)
            .bind(habit_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn find_log_for_day(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
    ) -> PortResult<Option<TrackLog>> {
        let record = sqlx::query_as::<_, TrackLogRecord>(
            "SELECT id, habit_id, day, logged_at FROM track_logs WHERE habit_id = $1 AND day = $2",
        )
        .bind(habit_id)
        .bind(day.date())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(TrackLogRecord::to_domain))
    }

    async fn insert_track_log(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
        logged_at: DateTime<Utc>,
    ) -> PortResult<TrackLog> {
        let record = sqlx::query_as::<_, TrackLogRecord>(
            "INSERT INTO track_logs (id, habit_id, day, logged_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, habit_id, day, logged_at",
        )
        .bind(Uuid::new_v4())
        .bind(habit_id)
        .bind(day.date())
        .bind(logged_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Habit {} already tracked for {}", habit_id, day))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn find_logs_by_habit(&self, habit_id: Uuid) -> PortResult<Vec<TrackLog>> {
        let records = sqlx::query_as::<_, TrackLogRecord>(
            "SELECT id, habit_id, day, logged_at FROM track_logs WHERE habit_id = $1 ORDER BY day ASC",
        )
        .bind(habit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let logs = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(logs)
    }

    async fn find_recent_logs(&self, habit_id: Uuid, limit: u32) -> PortResult<Vec<TrackLog>> {
        let records = sqlx::query_as::<_, TrackLogRecord>(
            "SELECT id, habit_id, day, logged_at FROM track_logs WHERE habit_id = $1 \
             ORDER BY day DESC LIMIT $2",
        )
        .bind(habit_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let logs = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(logs)
    }
}
