pub mod domain;
pub mod ports;
pub mod streak;
pub mod tracking;

pub use domain::{
    Frequency, Habit, HabitChanges, NewHabit, PageRequest, TrackLog, User, UserCredentials,
    ValidationError,
};
pub use ports::{Clock, DatabaseService, FixedClock, PortError, PortResult};
pub use streak::{CompletionDate, StreakCalculator, StreakError, StreakResult};
pub use tracking::{HabitTracker, TrackError, TrackOutcome, TrackResult, HISTORY_DAYS};
