use crate::state::AppState;
use axum::Router;

mod dto;
pub mod gate;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod session;

/// Registration and login; both establish identity, so neither is gated.
pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
