//! Listing query layer.
//!
//! Turns a raw listing query into a typed filter and page, serves results
//! through a read-through cache, and invalidates cached pages on every
//! successful write.

mod filter;
mod key;
mod pagination;
mod service;

pub use filter::{Equality, ListField, ListingFilter, NumericField, Predicate, TextField};
pub use key::{item_key, list_key, ITEM_NAMESPACE, LIST_NAMESPACE};
pub use pagination::Page;
pub use service::{CachePolicy, ListingService};
