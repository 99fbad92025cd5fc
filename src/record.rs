//! Typed view of one row of the apps table.

use crate::schema::{COLUMN_DESCRIPTION, COLUMN_NAME, COLUMN_PACKAGE, COLUMN_VENDOR};
use crate::sql::ContentValues;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four caller-supplied fields of a new record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApp {
    pub name: String,
    pub package: String,
    pub vendor: String,
    pub description: String,
}

impl NewApp {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        vendor: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        NewApp {
            name: name.into(),
            package: package.into(),
            vendor: vendor.into(),
            description: description.into(),
        }
    }

    pub fn to_values(&self) -> ContentValues {
        [
            (COLUMN_NAME, &self.name),
            (COLUMN_PACKAGE, &self.package),
            (COLUMN_VENDOR, &self.vendor),
            (COLUMN_DESCRIPTION, &self.description),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: i64,
    pub name: String,
    pub package: String,
    pub vendor: String,
    pub description: String,
}

impl AppRecord {
    pub fn fields(&self) -> NewApp {
        NewApp::new(&self.name, &self.package, &self.vendor, &self.description)
    }
}
