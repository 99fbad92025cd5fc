//! Hosted apps: an address-routed CRUD facade over the `apps` table.
//!
//! Callers name either the whole collection (`content://<authority>/hosted_apps`)
//! or one record (`.../hosted_apps/<id>`). [`HostedAppsProvider`] classifies the
//! address, validates projections and values, builds parameterized SQL, runs it
//! through a [`Storage`] and publishes a [`ChangeEvent`] after every mutation.

pub mod address;
pub mod config;
pub mod cursor;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod record;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use address::{AddressKind, AddressMatcher, ContentType};
pub use config::ProviderConfig;
pub use cursor::{Cursor, RowSet};
pub use error::{ConfigError, ErrorCategory, ProviderError};
pub use notify::{ChangeEvent, ChangeKind, ChangeNotifier, ChangeWatch};
pub use record::{AppRecord, NewApp};
pub use routes::{app_router, apps_routes, common_routes_with_ready};
pub use service::HostedAppsProvider;
pub use sql::{ContentValues, Selection};
pub use state::AppState;
pub use store::{SqliteStorage, Storage};
