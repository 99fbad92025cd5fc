//! Hosted apps routes: `/{base}` for the collection, `/{base}/:id` for one record.

use crate::handlers::apps::{
    create, delete as delete_handler, delete_matching, list, read, update, update_matching,
};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT_BYTES: usize = 64 * 1024;

pub fn apps_routes(state: AppState, base_path: &str) -> Router {
    Router::new()
        .route(
            &format!("/{}", base_path),
            get(list).post(create).patch(update_matching).delete(delete_matching),
        )
        .route(
            &format!("/{}/:id", base_path),
            get(read).patch(update).delete(delete_handler),
        )
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(state)
}
