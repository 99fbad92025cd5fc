//! The `apps` table: column names, DDL, and the version-driven create/upgrade lifecycle.

use crate::error::ProviderError;
use crate::store::Storage;

pub const TABLE_NAME: &str = "apps";
pub const COLUMN_ID: &str = "id";
pub const COLUMN_NAME: &str = "name";
pub const COLUMN_PACKAGE: &str = "package";
pub const COLUMN_VENDOR: &str = "vendor";
pub const COLUMN_DESCRIPTION: &str = "description";

/// Every column, in table order. Default projection.
pub const COLUMNS: [&str; 5] = [
    COLUMN_ID,
    COLUMN_NAME,
    COLUMN_PACKAGE,
    COLUMN_VENDOR,
    COLUMN_DESCRIPTION,
];

/// Bumping this drops and recreates the table on next `open`.
pub const DATABASE_VERSION: i64 = 1;

pub fn is_column(name: &str) -> bool {
    COLUMNS.contains(&name)
}

pub fn create_statement() -> String {
    format!(
        "CREATE TABLE {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT NOT NULL, {} TEXT NOT NULL, {} TEXT NOT NULL, {} TEXT NOT NULL)",
        TABLE_NAME, COLUMN_ID, COLUMN_NAME, COLUMN_PACKAGE, COLUMN_VENDOR, COLUMN_DESCRIPTION
    )
}

pub async fn create(storage: &dyn Storage) -> Result<(), ProviderError> {
    storage.create_table(&create_statement()).await?;
    tracing::info!(table = TABLE_NAME, "table created");
    Ok(())
}

/// Destructive: drops the table and every row in it, then recreates it.
pub async fn upgrade(
    storage: &dyn Storage,
    old_version: i64,
    new_version: i64,
) -> Result<(), ProviderError> {
    tracing::warn!(
        table = TABLE_NAME,
        old_version,
        new_version,
        "upgrading database, which will destroy all old data"
    );
    storage.drop_table(TABLE_NAME).await?;
    create(storage).await
}

/// Brings a storage instance to `DATABASE_VERSION`: creates on a fresh store,
/// upgrades an older one, refuses to downgrade.
pub async fn open(storage: &dyn Storage) -> Result<(), ProviderError> {
    let current = storage.schema_version().await?;
    match current {
        0 => create(storage).await?,
        v if v < DATABASE_VERSION => upgrade(storage, v, DATABASE_VERSION).await?,
        v if v > DATABASE_VERSION => {
            return Err(ProviderError::Schema(format!(
                "cannot downgrade database from version {} to {}",
                v, DATABASE_VERSION
            )))
        }
        _ => return Ok(()),
    }
    storage.set_schema_version(DATABASE_VERSION).await
}
