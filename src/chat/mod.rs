pub mod dto;
pub mod engine;
pub mod handlers;
pub mod repo_types;
pub mod responders;

use crate::state::AppState;
use axum::Router;

pub use engine::DialogueEngine;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::chat_routes())
}
