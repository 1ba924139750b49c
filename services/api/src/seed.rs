//! services/api/src/seed.rs
//!
//! Demo data for local development: one user with one habit tracked today.

use habit_tracker_core::domain::{Habit, NewHabit};
use habit_tracker_core::ports::PortError;
use tracing::info;

use crate::error::ApiError;
use crate::web::auth::{hash_password, normalize_email};
use crate::web::state::AppState;

pub const DEMO_NAME: &str = "Test User";
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Creates the demo user and a tracked habit.
///
/// Returns `None` without touching anything when the demo user already exists.
pub async fn seed_demo_data(state: &AppState) -> Result<Option<Habit>, ApiError> {
    let password_hash =
        hash_password(DEMO_PASSWORD).map_err(|e| ApiError::PasswordHash(e.to_string()))?;

    let user = match state
        .db
        .create_user(DEMO_NAME, &normalize_email(DEMO_EMAIL), &password_hash)
        .await
    {
        Ok(user) => user,
        Err(PortError::Conflict(_)) => {
            info!(email = DEMO_EMAIL, "Demo user already present, skipping seed");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let tags = ["reading".to_string(), "self-improvement".to_string()];
    let new_habit = NewHabit::new(
        "Read a book",
        Some("Read 10 pages of a book daily"),
        "daily",
        &tags,
        None,
    )
    .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let habit = state.db.create_habit(user.user_id, &new_habit).await?;

    state.tracker.track(user.user_id, habit.id, None).await?;
    let habit = state.tracker.refresh_streak(user.user_id, habit.id).await?;

    info!(user_id = %user.user_id, habit_id = %habit.id, "Demo data seeded");
    Ok(Some(habit))
}
