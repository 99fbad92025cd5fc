//! HostedAppsProvider: address-routed CRUD using the safe SQL builder.

mod provider;
mod validation;
pub use provider::HostedAppsProvider;
pub use validation::RequestValidator;
