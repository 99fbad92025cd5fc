//! Router assembly.

pub mod apps;
pub mod common;

pub use apps::apps_routes;
pub use common::common_routes_with_ready;

use crate::state::AppState;
use axum::Router;

/// Common routes plus the apps collection mounted at `/{base_path}`.
pub fn app_router(state: AppState, base_path: &str) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(apps_routes(state, base_path))
}
