//! services/api/src/web/rest.rs
//!
//! The health endpoint and the master definition for the OpenAPI specification.

use crate::web::{auth, habits};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        habits::create_habit_handler,
        habits::list_habits_handler,
        habits::get_habit_handler,
        habits::update_habit_handler,
        habits::delete_habit_handler,
        habits::track_habit_handler,
        habits::habit_history_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::AuthResponse,
            habits::CreateHabitRequest,
            habits::UpdateHabitRequest,
            habits::TrackRequest,
            habits::HabitResponse,
            habits::HabitListResponse,
            habits::PaginationResponse,
            habits::TrackResponse,
            habits::HistoryResponse,
            habits::MessageResponse,
        )
    ),
    tags(
        (name = "Habit Tracker API", description = "Habits, daily completions, and streaks.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /api - Liveness probe
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "The API is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "API is running..."
}
