//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::rate_limit::RateLimiter;
use habit_tracker_core::ports::{Clock, DatabaseService};
use habit_tracker_core::streak::StreakCalculator;
use habit_tracker_core::tracking::HabitTracker;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tracker: Arc<HabitTracker>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the tracking workflow and rate limiter around a store and a clock.
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self {
        let calculator = StreakCalculator::new(config.streak_timezone);
        let tracker = Arc::new(HabitTracker::new(db.clone(), clock, calculator));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window,
        ));

        Self {
            db,
            config,
            tracker,
            rate_limiter,
        }
    }
}
