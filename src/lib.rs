//! # itemadapter
//!
//! Uniform mutable-mapping access to heterogeneous item objects.
//!
//! Scraped-data pipelines handle items of very different shapes: plain
//! maps, structs with a static field table, runtime-built field sets,
//! validating models and crawler items with a declared schema over a
//! separate value store. [`ItemAdapter`] wraps any of them behind one
//! mapping surface (get, set, delete, contains, iterate, export), while
//! [`AdapterRegistry`] decides which representation handler serves a given
//! object. Class-level declarations additionally drive [JSON Schema]
//! derivation without instantiating anything.
//!
//! [JSON Schema]: https://json-schema.org/

pub mod adapter;
pub mod errors;
pub mod item_adapter;
pub mod registry;
pub mod schema;
pub mod utils;
pub mod value;

#[cfg(test)]
pub(crate) mod fixtures;

pub use adapter::{
    register_builder_item, register_crawler_item, register_declared_item, register_mapping_item,
    register_model_item, AdapterStrategy, BuilderItem, CrawlerItem, DeclaredItem, MappingItem,
    ModelItem,
};
pub use errors::{AdapterError, Result};
pub use item_adapter::ItemAdapter;
pub use registry::AdapterRegistry;
pub use schema::hint::TypeHint;
pub use utils::{get_field_meta_from_class, is_item};
pub use value::{FieldMeta, FieldValue, ItemObject};

/// Crate version, matching `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
