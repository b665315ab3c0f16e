pub mod cart;
mod dto;
pub mod handlers;
pub mod planner;
mod prompt;
pub mod repo;
pub mod repo_types;
pub mod slot;
pub mod suggestion;
pub mod synthesizer;
pub mod week;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::meal_routes())
        .merge(handlers::cron_routes())
}
