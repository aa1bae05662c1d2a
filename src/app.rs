use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(handlers::get_state))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route(
            "/api/profiles",
            post(handlers::create_profile).delete(handlers::clear_profiles),
        )
        .route("/api/profiles/:id/select", post(handlers::select_user))
        .route("/api/profiles/:id/bmi", get(handlers::get_bmi))
        .route("/api/water", get(handlers::get_water).post(handlers::set_water))
        .route("/api/water/reset", post(handlers::reset_water))
        .route("/api/meals", post(handlers::add_meal))
        .route("/api/meals/today", get(handlers::get_meals_today))
        .route("/api/meals/:id", delete(handlers::delete_meal))
        .route("/api/workouts", post(handlers::add_workout))
        .route("/api/workouts/today", get(handlers::get_workouts_today))
        .route("/api/workouts/:id", delete(handlers::delete_workout))
        .route("/api/tabs/:tab", get(handlers::open_tab))
        .route("/api/commands", post(handlers::run_command))
        .with_state(state)
}
