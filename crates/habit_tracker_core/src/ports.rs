//! crates/habit_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or clocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Habit, HabitChanges, NewHabit, TrackLog, User, UserCredentials};
use crate::streak::{CompletionDate, StreakResult};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Habits ---
    async fn create_habit(&self, user_id: Uuid, habit: &NewHabit) -> PortResult<Habit>;

    async fn count_habits(&self, user_id: Uuid, tag: Option<&str>) -> PortResult<u64>;

    /// Newest first.
    async fn list_habits(
        &self,
        user_id: Uuid,
        tag: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Habit>>;

    /// Only returns the habit when `user_id` owns it.
    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<Habit>;

    async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        changes: &HabitChanges,
    ) -> PortResult<Habit>;

    /// Removes the habit together with all of its track logs.
    async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<()>;

    /// Overwrites the stored current and longest streak.
    async fn save_habit_streak(&self, habit_id: Uuid, streak: StreakResult) -> PortResult<()>;

    // --- Track Logs ---
    async fn find_log_for_day(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
    ) -> PortResult<Option<TrackLog>>;

    /// Fails with `Conflict` when the habit already has a log for `day`.
    async fn insert_track_log(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
        logged_at: DateTime<Utc>,
    ) -> PortResult<TrackLog>;

    /// All logs of a habit, oldest first.
    async fn find_logs_by_habit(&self, habit_id: Uuid) -> PortResult<Vec<TrackLog>>;

    /// The most recent `limit` logs, newest first.
    async fn find_recent_logs(&self, habit_id: Uuid, limit: u32) -> PortResult<Vec<TrackLog>>;
}

/// Supplies "now" to the tracking workflow.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
