//! crates/habit_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::streak::{CompletionDate, StreakResult};

pub const MAX_TITLE_LEN: usize = 200;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Rejections produced while turning loose user input into domain values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Title must be at most {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    #[error("Unknown frequency '{0}', expected 'daily' or 'weekly'")]
    UnknownFrequency(String),
    #[error("Invalid reminder time '{0}', expected HH:MM")]
    InvalidReminderTime(String),
    #[error("Page number out of range")]
    PageOutOfRange,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(ValidationError::UnknownFrequency(other.to_string())),
        }
    }
}

/// A recurring activity owned by one user, with its last computed streaks.
#[derive(Debug, Clone)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub tags: Vec<String>,
    pub reminder_time: Option<NaiveTime>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn streak(&self) -> StreakResult {
        StreakResult {
            current: self.current_streak,
            longest: self.longest_streak,
        }
    }
}

/// A record that a habit was performed on a given day.
#[derive(Debug, Clone)]
pub struct TrackLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub day: CompletionDate,
    pub logged_at: DateTime<Utc>,
}

//=========================================================================================
// Validated Inputs
//=========================================================================================

/// A validated request to create a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub tags: Vec<String>,
    pub reminder_time: Option<NaiveTime>,
}

impl NewHabit {
    pub fn new(
        title: &str,
        description: Option<&str>,
        frequency: &str,
        tags: &[String],
        reminder_time: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: validate_title(title)?,
            description: normalize_description(description),
            frequency: frequency.parse::<Frequency>()?,
            tags: normalize_tags(tags),
            reminder_time: reminder_time.map(parse_reminder_time).transpose()?,
        })
    }
}

/// A validated partial update. `None` leaves a field unchanged.
///
/// Streak fields are absent; they only change through tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub tags: Option<Vec<String>>,
    pub reminder_time: Option<NaiveTime>,
}

impl HabitChanges {
    pub fn new(
        title: Option<&str>,
        description: Option<&str>,
        frequency: Option<&str>,
        tags: Option<&[String]>,
        reminder_time: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: title.map(validate_title).transpose()?,
            description: description.map(str::trim).map(str::to_string),
            frequency: frequency.map(str::parse::<Frequency>).transpose()?,
            tags: tags.map(normalize_tags),
            reminder_time: reminder_time.map(parse_reminder_time).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the changes to an in-memory habit.
    pub fn apply(&self, habit: &mut Habit) {
        if let Some(title) = &self.title {
            habit.title = title.clone();
        }
        if let Some(description) = &self.description {
            habit.description = Some(description.clone());
        }
        if let Some(frequency) = self.frequency {
            habit.frequency = frequency;
        }
        if let Some(tags) = &self.tags {
            habit.tags = tags.clone();
        }
        if let Some(reminder_time) = self.reminder_time {
            habit.reminder_time = Some(reminder_time);
        }
    }
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Missing("title"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn parse_reminder_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidReminderTime(value.to_string()))
}

//=========================================================================================
// Pagination
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Clamps loose query values: page is at least 1, limit is within 1..=100.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total.div_ceil(u64::from(self.limit)) as u32
    }

    /// Fails when the requested page lies past the last one of a non-empty set.
    pub fn check_in_range(&self, total: u64) -> Result<(), ValidationError> {
        if total > 0 && self.page > self.total_pages(total) {
            return Err(ValidationError::PageOutOfRange);
        }
        Ok(())
    }
}
