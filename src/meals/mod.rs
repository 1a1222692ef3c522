mod dto;
pub mod handlers;
pub mod metrics;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::meal_routes(state)
}
