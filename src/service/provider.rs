//! HostedAppsProvider: address-routed CRUD over the apps table.

use crate::address::{AddressKind, AddressMatcher, ContentType};
use crate::config::ProviderConfig;
use crate::cursor::Cursor;
use crate::error::ProviderError;
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::schema::COLUMNS;
use crate::service::RequestValidator;
use crate::sql::{self, effective_selection, ContentValues, Selection};
use crate::store::Storage;
use std::sync::Arc;

pub struct HostedAppsProvider {
    storage: Arc<dyn Storage>,
    matcher: AddressMatcher,
    notifier: ChangeNotifier,
}

impl HostedAppsProvider {
    pub fn new(storage: Arc<dyn Storage>, matcher: AddressMatcher, notifier: ChangeNotifier) -> Self {
        HostedAppsProvider {
            storage,
            matcher,
            notifier,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &ProviderConfig) -> Self {
        Self::new(
            storage,
            AddressMatcher::new(&config.authority, &config.base_path),
            ChangeNotifier::new(config.notify_capacity),
        )
    }

    pub fn matcher(&self) -> &AddressMatcher {
        &self.matcher
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn collection_address(&self) -> &str {
        self.matcher.collection_address()
    }

    pub fn get_type(&self, address: &str) -> Result<ContentType, ProviderError> {
        self.matcher.get_type(address)
    }

    /// Id implied by the address: `None` for the collection, `Some(id)` for an item.
    fn target_id(&self, address: &str) -> Result<Option<i64>, ProviderError> {
        match self.matcher.classify(address) {
            AddressKind::Collection => Ok(None),
            AddressKind::Item(id) => Ok(Some(id)),
            AddressKind::Invalid => Err(ProviderError::UnknownAddress(address.to_string())),
        }
    }

    /// Rows at `address` matching `selection`, projected and ordered. An item
    /// address yields zero or one row. The cursor watches `address` for changes.
    pub async fn query(
        &self,
        address: &str,
        projection: Option<&[&str]>,
        selection: Option<&Selection>,
        sort_order: Option<&str>,
    ) -> Result<Cursor, ProviderError> {
        let id = self.target_id(address)?;
        let columns: &[&str] = match projection {
            Some(p) if !p.is_empty() => {
                RequestValidator::check_projection(p)?;
                p
            }
            _ => &COLUMNS,
        };
        let order = match sort_order {
            Some(s) => RequestValidator::normalize_sort_order(s)?,
            None => None,
        };
        let predicate = effective_selection(id, selection)?;
        let q = sql::select(columns, predicate.as_ref(), order.as_deref());

        // Subscribe before reading so a write racing this query is not missed.
        let watch = self.notifier.watch(address);
        let rows = self.storage.select(columns, &q).await?;
        Ok(Cursor::new(rows, watch))
    }

    /// Inserts one record through the collection address and returns its item address.
    pub async fn insert(&self, address: &str, values: &ContentValues) -> Result<String, ProviderError> {
        match self.matcher.classify(address) {
            AddressKind::Collection => {}
            AddressKind::Item(_) => {
                return Err(ProviderError::UnsupportedOperation {
                    operation: "insert",
                    address: address.to_string(),
                })
            }
            AddressKind::Invalid => return Err(ProviderError::UnknownAddress(address.to_string())),
        }
        RequestValidator::check_values(values)?;
        let q = sql::insert(values);
        let id = self.storage.insert(&q).await?;
        let item = self.matcher.item_address(id);
        self.notifier
            .notify_change(self.matcher.collection_address(), &item, ChangeKind::Insert, 1);
        Ok(item)
    }

    /// Returns the affected-row count; observers are notified even when it is 0.
    pub async fn update(
        &self,
        address: &str,
        values: &ContentValues,
        selection: Option<&Selection>,
    ) -> Result<u64, ProviderError> {
        let id = self.target_id(address)?;
        RequestValidator::check_update_values(values)?;
        let predicate = effective_selection(id, selection)?;
        let q = sql::update(values, predicate.as_ref());
        let count = self.storage.update(&q).await?;
        self.notifier
            .notify_change(self.matcher.collection_address(), address, ChangeKind::Update, count);
        Ok(count)
    }

    /// Returns the affected-row count; observers are notified even when it is 0.
    pub async fn delete(&self, address: &str, selection: Option<&Selection>) -> Result<u64, ProviderError> {
        let id = self.target_id(address)?;
        let predicate = effective_selection(id, selection)?;
        let q = sql::delete(predicate.as_ref());
        let count = self.storage.delete(&q).await?;
        self.notifier
            .notify_change(self.matcher.collection_address(), address, ChangeKind::Delete, count);
        Ok(count)
    }
}
