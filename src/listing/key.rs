//! Cache key derivation.

use sha2::{Digest, Sha256};

use crate::models::PropertyId;

/// Namespace shared by every cached listing page.
pub const LIST_NAMESPACE: &str = "properties:list:";

/// Namespace of single-property entries.
pub const ITEM_NAMESPACE: &str = "property:";

/// Key for a listing page, derived from the raw query string exactly as
/// received. Parameter order matters: `a=1&b=2` and `b=2&a=1` are
/// different entries.
pub fn list_key(raw_query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_query.as_bytes());
    format!("{}{:x}", LIST_NAMESPACE, hasher.finalize())
}

pub fn item_key(id: PropertyId) -> String {
    format!("{}{}", ITEM_NAMESPACE, id)
}
