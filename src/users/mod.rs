use crate::state::AppState;
use axum::Router;

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
mod repo_types;
pub mod search;

pub use repo_types::{NewUser, User};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
