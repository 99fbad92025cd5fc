//! Shared application state for all routes.

use crate::service::HostedAppsProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<HostedAppsProvider>,
}

impl AppState {
    pub fn new(provider: HostedAppsProvider) -> Self {
        AppState {
            provider: Arc::new(provider),
        }
    }
}
