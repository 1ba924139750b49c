//! services/api/src/web/habits.rs
//!
//! Habit CRUD, completion tracking, and history endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{port_rejection, track_rejection, validation_rejection, Rejection};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use habit_tracker_core::domain::{Habit, HabitChanges, NewHabit, PageRequest};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateHabitRequest {
    pub title: String,
    pub description: Option<String>,
    /// `daily` or `weekly`.
    pub frequency: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Local time as `HH:MM`.
    pub reminder_time: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateHabitRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reminder_time: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListHabitsQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, 1 to 100.
    pub limit: Option<u32>,
    /// Only habits carrying this tag.
    pub tag: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct TrackRequest {
    /// RFC 3339 timestamp or `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HabitResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub tags: Vec<String>,
    pub reminder_time: Option<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Habit> for HabitResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            title: habit.title,
            description: habit.description,
            frequency: habit.frequency.as_str().to_string(),
            tags: habit.tags,
            reminder_time: habit.reminder_time.map(|t| t.format("%H:%M").to_string()),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            created_at: habit.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginationResponse {
    pub total_habits: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub limit_per_page: u32,
}

#[derive(Serialize, ToSchema)]
pub struct HabitListResponse {
    pub habits: Vec<HabitResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Serialize, ToSchema)]
pub struct TrackResponse {
    pub message: String,
    pub date: String,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub total_logs: usize,
    pub last_7_days: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/habits - Create a habit
#[utoipa::path(
    post,
    path = "/api/habits",
    request_body = CreateHabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitResponse),
        (status = 400, description = "Invalid habit"),
        (status = 401, description = "Not authorized")
    )
)]
pub async fn create_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateHabitRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let new_habit = NewHabit::new(
        &req.title,
        req.description.as_deref(),
        &req.frequency,
        &req.tags,
        req.reminder_time.as_deref(),
    )
    .map_err(validation_rejection)?;

    let habit = state
        .db
        .create_habit(user_id, &new_habit)
        .await
        .map_err(|e| port_rejection(e, "create habit"))?;

    info!(habit_id = %habit.id, user_id = %user_id, "Habit created");
    Ok((StatusCode::CREATED, Json(HabitResponse::from(habit))))
}

/// GET /api/habits - List the caller's habits, newest first
#[utoipa::path(
    get,
    path = "/api/habits",
    params(ListHabitsQuery),
    responses(
        (status = 200, description = "A page of habits", body = HabitListResponse),
        (status = 400, description = "Page number out of range"),
        (status = 401, description = "Not authorized")
    )
)]
pub async fn list_habits_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<ListHabitsQuery>,
) -> Result<Json<HabitListResponse>, Rejection> {
    let page = PageRequest::new(query.page, query.limit);
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let total = state
        .db
        .count_habits(user_id, tag)
        .await
        .map_err(|e| port_rejection(e, "count habits"))?;
    page.check_in_range(total).map_err(validation_rejection)?;

    let habits = state
        .db
        .list_habits(user_id, tag, page.offset(), page.limit)
        .await
        .map_err(|e| port_rejection(e, "list habits"))?;

    Ok(Json(HabitListResponse {
        habits: habits.into_iter().map(HabitResponse::from).collect(),
        pagination: PaginationResponse {
            total_habits: total,
            total_pages: page.total_pages(total),
            current_page: page.page,
            limit_per_page: page.limit,
        },
    }))
}

/// GET /api/habits/{id} - Fetch one habit with streaks evaluated against today
#[utoipa::path(
    get,
    path = "/api/habits/{id}",
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "The habit", body = HabitResponse),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn get_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> Result<Json<HabitResponse>, Rejection> {
    let habit = state
        .tracker
        .refresh_streak(user_id, habit_id)
        .await
        .map_err(|e| track_rejection(e, "load habit"))?;
    Ok(Json(habit.into()))
}

/// PUT /api/habits/{id} - Update a habit's details
#[utoipa::path(
    put,
    path = "/api/habits/{id}",
    params(("id" = Uuid, Path, description = "Habit id")),
    request_body = UpdateHabitRequest,
    responses(
        (status = 200, description = "The updated habit", body = HabitResponse),
        (status = 400, description = "Invalid changes"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn update_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<Json<HabitResponse>, Rejection> {
    let changes = HabitChanges::new(
        req.title.as_deref(),
        req.description.as_deref(),
        req.frequency.as_deref(),
        req.tags.as_deref(),
        req.reminder_time.as_deref(),
    )
    .map_err(validation_rejection)?;

    let habit = state
        .db
        .update_habit(user_id, habit_id, &changes)
        .await
        .map_err(|e| port_rejection(e, "update habit"))?;
    Ok(Json(habit.into()))
}

/// DELETE /api/habits/{id} - Delete a habit and its logs
#[utoipa::path(
    delete,
    path = "/api/habits/{id}",
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Habit deleted", body = MessageResponse),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn delete_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, Rejection> {
    state
        .db
        .delete_habit(user_id, habit_id)
        .await
        .map_err(|e| port_rejection(e, "delete habit"))?;

    info!(habit_id = %habit_id, "Habit deleted");
    Ok(Json(MessageResponse {
        message: "Habit deleted".to_string(),
    }))
}

/// POST /api/habits/{id}/track - Record a completion and recompute streaks
#[utoipa::path(
    post,
    path = "/api/habits/{id}/track",
    params(("id" = Uuid, Path, description = "Habit id")),
    request_body(content = TrackRequest, description = "Optional day to record"),
    responses(
        (status = 201, description = "Habit tracked", body = TrackResponse),
        (status = 400, description = "Already tracked, future, or malformed date"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn track_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
    body: Option<Json<TrackRequest>>,
) -> Result<impl IntoResponse, Rejection> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let calculator = state.tracker.calculator();

    let day = req
        .date
        .as_deref()
        .map(|raw| calculator.parse_completion(raw))
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        .map(|ts| calculator.day_of(&ts));

    let outcome = state
        .tracker
        .track(user_id, habit_id, day)
        .await
        .map_err(|e| track_rejection(e, "track habit"))?;

    Ok((
        StatusCode::CREATED,
        Json(TrackResponse {
            message: "Habit tracked successfully".to_string(),
            date: outcome.day.to_string(),
            current_streak: outcome.streak.current,
            longest_streak: outcome.streak.longest,
        }),
    ))
}

/// GET /api/habits/{id}/history - The last seven tracked days
#[utoipa::path(
    get,
    path = "/api/habits/{id}/history",
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Recent history", body = HistoryResponse),
        (status = 400, description = "Not sufficient history"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn habit_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(habit_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, Rejection> {
    let days = state
        .tracker
        .recent_history(user_id, habit_id)
        .await
        .map_err(|e| track_rejection(e, "load history"))?;

    Ok(Json(HistoryResponse {
        total_logs: days.len(),
        last_7_days: days.iter().map(ToString::to_string).collect(),
    }))
}
