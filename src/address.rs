//! Resource addresses: `content://<authority>/<base_path>` names the collection,
//! `content://<authority>/<base_path>/<id>` names one record.

use crate::error::ProviderError;

pub const SCHEME: &str = "content://";

/// Result of classifying an address. Produced once per call and matched by every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    Collection,
    Item(i64),
    Invalid,
}

/// MIME-style tag returned by `get_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Dir,
    Item,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Dir => "vnd.hosted-apps.dir/hosted_apps",
            ContentType::Item => "vnd.hosted-apps.item/hosted_app",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct AddressMatcher {
    collection: String,
}

impl AddressMatcher {
    pub fn new(authority: &str, base_path: &str) -> Self {
        AddressMatcher {
            collection: format!("{}{}/{}", SCHEME, authority, base_path),
        }
    }

    pub fn collection_address(&self) -> &str {
        &self.collection
    }

    pub fn item_address(&self, id: i64) -> String {
        format!("{}/{}", self.collection, id)
    }

    pub fn classify(&self, address: &str) -> AddressKind {
        let Some(rest) = address.strip_prefix(self.collection.as_str()) else {
            return AddressKind::Invalid;
        };
        if rest.is_empty() {
            return AddressKind::Collection;
        }
        let Some(segment) = rest.strip_prefix('/') else {
            return AddressKind::Invalid;
        };
        parse_id_segment(segment).map_or(AddressKind::Invalid, AddressKind::Item)
    }

    pub fn get_type(&self, address: &str) -> Result<ContentType, ProviderError> {
        match self.classify(address) {
            AddressKind::Collection => Ok(ContentType::Dir),
            AddressKind::Item(_) => Ok(ContentType::Item),
            AddressKind::Invalid => Err(ProviderError::UnknownAddress(address.to_string())),
        }
    }
}

/// ASCII digits only; signs, whitespace and values outside i64 are rejected.
fn parse_id_segment(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
