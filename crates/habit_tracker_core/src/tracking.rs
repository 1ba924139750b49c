//! crates/habit_tracker_core/src/tracking.rs
//!
//! The habit-tracking workflow: record a completion, recompute the streaks from
//! the full log history, and persist them back onto the habit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::Habit;
use crate::ports::{Clock, DatabaseService, PortError};
use crate::streak::{CompletionDate, StreakCalculator, StreakResult};

/// Number of days returned by [`HabitTracker::recent_history`].
pub const HISTORY_DAYS: u32 = 7;

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Port(#[from] PortError),
    #[error("Habit already tracked for {0}")]
    AlreadyTracked(CompletionDate),
    #[error("Cannot track {day}, it is after today ({today})")]
    FutureDate {
        day: CompletionDate,
        today: CompletionDate,
    },
    #[error("Not sufficient history (need {needed} or more logs, found {found})")]
    InsufficientHistory { needed: u32, found: usize },
}

pub type TrackResult<T> = Result<T, TrackError>;

/// The result of recording one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub day: CompletionDate,
    pub streak: StreakResult,
}

/// Per-habit async locks serializing the read-compute-write of streak fields.
#[derive(Default)]
struct HabitLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl HabitLocks {
    fn for_habit(&self, habit_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        // Prune entries no task holds.
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(habit_id).or_default().clone()
    }
}

pub struct HabitTracker {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    calculator: StreakCalculator,
    locks: HabitLocks,
}

impl HabitTracker {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        clock: Arc<dyn Clock>,
        calculator: StreakCalculator,
    ) -> Self {
        Self {
            db,
            clock,
            calculator,
            locks: HabitLocks::default(),
        }
    }

    pub fn calculator(&self) -> &StreakCalculator {
        &self.calculator
    }

    /// Today in the calculator's reference zone.
    pub fn today(&self) -> CompletionDate {
        self.calculator.day_of(&self.clock.now())
    }

    /// Records a completion for `day` (today when `None`) and returns the fresh streaks.
    pub async fn track(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        day: Option<CompletionDate>,
    ) -> TrackResult<TrackOutcome> {
        let habit = self.db.get_habit(user_id, habit_id).await?;

        let today = self.today();
        let day = day.unwrap_or(today);
        if day > today {
            return Err(TrackError::FutureDate { day, today });
        }

        let lock = self.locks.for_habit(habit.id);
        let _guard = lock.lock().await;

        if self.db.find_log_for_day(habit.id, day).await?.is_some() {
            return Err(TrackError::AlreadyTracked(day));
        }

        self.db
            .insert_track_log(habit.id, day, self.calculator.start_of(day))
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => TrackError::AlreadyTracked(day),
                other => TrackError::Port(other),
            })?;

        let streak = self.recompute(&habit).await?;

        info!(
            habit_id = %habit.id,
            day = %day,
            current = streak.current,
            longest = streak.longest,
            "Habit tracked"
        );

        Ok(TrackOutcome { day, streak })
    }

    /// Recomputes the stored streaks against the current clock.
    ///
    /// A streak that lapsed since the last completion drops to zero here.
    pub async fn refresh_streak(&self, user_id: Uuid, habit_id: Uuid) -> TrackResult<Habit> {
        let mut habit = self.db.get_habit(user_id, habit_id).await?;

        let lock = self.locks.for_habit(habit.id);
        let _guard = lock.lock().await;

        let streak = self.recompute(&habit).await?;
        habit.current_streak = streak.current;
        habit.longest_streak = streak.longest;
        Ok(habit)
    }

    /// The last [`HISTORY_DAYS`] tracked days, newest first.
    pub async fn recent_history(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
    ) -> TrackResult<Vec<CompletionDate>> {
        let habit = self.db.get_habit(user_id, habit_id).await?;
        let logs = self.db.find_recent_logs(habit.id, HISTORY_DAYS).await?;

        if logs.len() < HISTORY_DAYS as usize {
            return Err(TrackError::InsufficientHistory {
                needed: HISTORY_DAYS,
                found: logs.len(),
            });
        }

        Ok(logs.into_iter().map(|log| log.day).collect())
    }

    // Caller must hold the habit's lock.
    async fn recompute(&self, habit: &Habit) -> TrackResult<StreakResult> {
        let logs = self.db.find_logs_by_habit(habit.id).await?;
        // Stored days are authoritative; never re-derive them from `logged_at`.
        let streak = StreakCalculator::compute_days(logs.iter().map(|log| log.day), self.today());

        self.db.save_habit_streak(habit.id, streak).await?;
        debug!(habit_id = %habit.id, logs = logs.len(), "Streak recomputed");
        Ok(streak)
    }
}
