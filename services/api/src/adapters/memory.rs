//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used when no
//! `DATABASE_URL` is configured and by the HTTP tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use habit_tracker_core::domain::{Habit, HabitChanges, NewHabit, TrackLog, User, UserCredentials};
use habit_tracker_core::ports::{DatabaseService, PortError, PortResult};
use habit_tracker_core::streak::{CompletionDate, StreakResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    habits: HashMap<Uuid, Habit>,
    logs: Vec<TrackLog>,
}

impl Store {
    fn owned_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<&Habit> {
        self.habits
            .get(&habit_id)
            .filter(|h| h.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit_id)))
    }

    /// A user's habits, newest first, optionally restricted to one tag.
    fn habits_of(&self, user_id: Uuid, tag: Option<&str>) -> Vec<&Habit> {
        let mut habits: Vec<&Habit> = self
            .habits
            .values()
            .filter(|h| h.user_id == user_id)
            .filter(|h| tag.map_or(true, |t| h.tags.iter().any(|ht| ht == t)))
            .collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        habits
    }

    fn logs_of(&self, habit_id: Uuid) -> Vec<TrackLog> {
        let mut logs: Vec<TrackLog> = self
            .logs
            .iter()
            .filter(|l| l.habit_id == habit_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.day);
        logs
    }
}

/// A `DatabaseService` backed by maps behind an async lock.
#[derive(Default)]
pub struct InMemoryDbAdapter {
    store: RwLock<Store>,
}

impl InMemoryDbAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDbAdapter {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.email == email) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }
        let creds = UserCredentials {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        store.users.insert(creds.user_id, creds.clone());
        Ok(User {
            user_id: creds.user_id,
            name: creds.name,
            email: creds.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.read().await;
        store
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        store
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let store = self.store.read().await;
        match store.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn create_habit(&self, user_id: Uuid, habit: &NewHabit) -> PortResult<Habit> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&user_id) {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id,
            title: habit.title.clone(),
            description: habit.description.clone(),
            frequency: habit.frequency,
            tags: habit.tags.clone(),
            reminder_time: habit.reminder_time,
            current_streak: 0,
            longest_streak: 0,
            created_at: Utc::now(),
        };
        store.habits.insert(habit.id, habit.clone());
        Ok(habit)
    }

    async fn count_habits(&self, user_id: Uuid, tag: Option<&str>) -> PortResult<u64> {
        let store = self.store.read().await;
        Ok(store.habits_of(user_id, tag).len() as u64)
    }

    async fn list_habits(
        &self,
        user_id: Uuid,
        tag: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Habit>> {
        let store = self.store.read().await;
        Ok(store
            .habits_of(user_id, tag)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<Habit> {
        let store = self.store.read().await;
        store.owned_habit(user_id, habit_id).cloned()
    }

    async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        changes: &HabitChanges,
    ) -> PortResult<Habit> {
        let mut store = self.store.write().await;
        store.owned_habit(user_id, habit_id)?;
        let habit = store
            .habits
            .get_mut(&habit_id)
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit_id)))?;
        changes.apply(habit);
        Ok(habit.clone())
    }

    async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.owned_habit(user_id, habit_id)?;
        store.habits.remove(&habit_id);
        store.logs.retain(|l| l.habit_id != habit_id);
        Ok(())
    }

    async fn save_habit_streak(&self, habit_id: Uuid, streak: StreakResult) -> PortResult<()> {
        let mut store = self.store.write().await;
        let habit = store
            .habits
            .get_mut(&habit_id)
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit_id)))?;
        habit.current_streak = streak.current;
        habit.longest_streak = streak.longest;
        Ok(())
    }

    async fn find_log_for_day(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
    ) -> PortResult<Option<TrackLog>> {
        let store = self.store.read().await;
        Ok(store
            .logs
            .iter()
            .find(|l| l.habit_id == habit_id && l.day == day)
            .cloned())
    }

    async fn insert_track_log(
        &self,
        habit_id: Uuid,
        day: CompletionDate,
        logged_at: DateTime<Utc>,
    ) -> PortResult<TrackLog> {
        let mut store = self.store.write().await;
        if !store.habits.contains_key(&habit_id) {
            return Err(PortError::NotFound(format!("Habit {} not found", habit_id)));
        }
        if store
            .logs
            .iter()
            .any(|l| l.habit_id == habit_id && l.day == day)
        {
            return Err(PortError::Conflict(format!(
                "Habit {} already tracked for {}",
                habit_id, day
            )));
        }
        let log = TrackLog {
            id: Uuid::new_v4(),
            habit_id,
            day,
            logged_at,
        };
        store.logs.push(log.clone());
        Ok(log)
    }

    async fn find_logs_by_habit(&self, habit_id: Uuid) -> PortResult<Vec<TrackLog>> {
        Ok(self.store.read().await.logs_of(habit_id))
    }

    async fn find_recent_logs(&self, habit_id: Uuid, limit: u32) -> PortResult<Vec<TrackLog>> {
        let mut logs = self.store.read().await.logs_of(habit_id);
        logs.reverse();
        logs.truncate(limit as usize);
        Ok(logs)
    }
}
