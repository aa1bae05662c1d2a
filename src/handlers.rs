use crate::commands::{Command, Outcome};
use crate::errors::AppError;
use crate::models::{
    AppData, Bmi, DashboardResponse, MealDay, MealInput, ProfileInput, WaterRequest, WaterStatus,
    WorkoutDay, WorkoutInput,
};
use crate::state::AppState;
use crate::stats::build_dashboard;
use crate::views::{self, Tab, TabResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::Serialize;
use tokio::task;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    #[serde(flatten)]
    pub data: AppData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_persist_error: Option<String>,
}

pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let store = state.store.lock().await;
    Json(StateResponse {
        data: store.data().clone(),
        last_persist_error: store.last_persist_error().map(str::to_string),
    })
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let store = state.store.lock().await;
    Json(build_dashboard(store.data()))
}

pub async fn get_bmi(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Bmi>>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(store.bmi(&id)?))
}

pub async fn get_water(State(state): State<AppState>) -> Result<Json<WaterStatus>, AppError> {
    let store = state.store.lock().await;
    let user = store.require_current()?;
    Ok(Json(store.water(&user)?))
}

pub async fn get_meals_today(State(state): State<AppState>) -> Result<Json<MealDay>, AppError> {
    let store = state.store.lock().await;
    let user = store.require_current()?;
    Ok(Json(store.daily_meal_totals(&user, today())?))
}

pub async fn get_workouts_today(
    State(state): State<AppState>,
) -> Result<Json<WorkoutDay>, AppError> {
    let store = state.store.lock().await;
    let user = store.require_current()?;
    Ok(Json(store.daily_workout_totals(&user, today())?))
}

pub async fn open_tab(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<TabResponse>, AppError> {
    let tab: Tab = tab.parse().map_err(AppError::bad_request)?;
    let store = state.store.lock().await;
    Ok(Json(views::open_tab(store.data(), tab)))
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<Outcome>), AppError> {
    let outcome = apply(&state, Command::CreateProfile(input)).await?;
    Ok((StatusCode::CREATED, outcome))
}

pub async fn clear_profiles(State(state): State<AppState>) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::ClearAll).await
}

pub async fn select_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::SelectUser { id }).await
}

pub async fn set_water(
    State(state): State<AppState>,
    Json(payload): Json<WaterRequest>,
) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::SetWater { index: payload.index }).await
}

pub async fn reset_water(State(state): State<AppState>) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::ResetWater).await
}

pub async fn add_meal(
    State(state): State<AppState>,
    Json(input): Json<MealInput>,
) -> Result<(StatusCode, Json<Outcome>), AppError> {
    let outcome = apply(&state, Command::AddMeal(input)).await?;
    Ok((StatusCode::CREATED, outcome))
}

pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::DeleteMeal { id }).await
}

pub async fn add_workout(
    State(state): State<AppState>,
    Json(input): Json<WorkoutInput>,
) -> Result<(StatusCode, Json<Outcome>), AppError> {
    let outcome = apply(&state, Command::AddWorkout(input)).await?;
    Ok((StatusCode::CREATED, outcome))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    apply(&state, Command::DeleteWorkout { id }).await
}

pub async fn run_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<Outcome>, AppError> {
    apply(&state, command).await
}

async fn apply(state: &AppState, command: Command) -> Result<Json<Outcome>, AppError> {
    let mut store = state.store.lock().await;
    // Persisting writes the storage file synchronously.
    let outcome = task::block_in_place(|| command.dispatch(&mut *store))?;
    Ok(Json(outcome))
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}
