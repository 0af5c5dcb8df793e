//! Adapter strategies: one handler per item representation kind.
//!
//! Each handler is a stateless strategy object implementing
//! [`AdapterStrategy`]: a capability probe (does this class/instance belong
//! to my kind?) plus the field accessor for that kind. All type-specific
//! knowledge lives here; the facade never inspects item types itself.

pub(crate) mod class_table;

pub mod builder;
pub mod crawler;
pub mod declared;
pub mod mapping;
pub mod model;

use std::any::TypeId;

use serde_json::{Map, Value};

use crate::errors::Result;
use crate::schema::SchemaState;
use crate::value::{FieldMeta, FieldValue, ItemObject};

pub use builder::{register_builder_item, BuilderAdapter, BuilderItem, FieldSpec, FieldSpecSet};
pub use crawler::{
    register_crawler_item, BaseCrawlerItem, CrawlerAdapter, CrawlerItem, FieldDescriptor,
};
pub use declared::{register_declared_item, DeclaredAdapter, DeclaredItem, FieldDef};
pub use mapping::{register_mapping_item, MappingAdapter, MappingItem};
pub use model::{register_model_item, Extra, ModelAdapter, ModelConfig, ModelField, ModelItem};

// ---------------------------------------------------------------------------
// Shared declaration types
// ---------------------------------------------------------------------------

/// Default declared for a field.
#[derive(Debug, Clone, Default)]
pub enum FieldDefault {
    /// No default: the field is required.
    #[default]
    Required,
    /// A literal default value.
    Value(FieldValue),
    /// A default produced at construction time; the field is optional but
    /// the schema carries no `default` literal for it.
    Factory,
}

impl FieldDefault {
    /// True when no default of any form is declared.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// True for factory defaults.
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory)
    }

    /// The literal default value, if one is declared.
    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Why a typed item rejected a `set_field` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    /// The name is not among the declared fields.
    Undeclared,
    /// The declared field cannot represent the given value.
    Incompatible {
        /// Human-readable description of what the field expects.
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// AdapterStrategy
// ---------------------------------------------------------------------------

/// The shared contract implemented by every representation handler.
///
/// Handlers are stateless; all per-class knowledge comes from their kind's
/// class table and all per-instance state from the passed [`ItemObject`].
pub trait AdapterStrategy: Send + Sync {
    /// Short identifier used in log output.
    fn name(&self) -> &'static str;

    /// Class-level capability probe.
    fn is_item_class(&self, class: TypeId) -> bool;

    /// Instance-level capability probe. Defaults to the class probe on the
    /// instance's class; kinds needing heavier instance checks override it.
    fn is_item(&self, item: &ItemObject) -> bool {
        self.is_item_class(item.class())
    }

    /// Read a field value.
    fn get(&self, item: &ItemObject, field: &str) -> Result<FieldValue>;

    /// Write a field value.
    fn set(&self, item: &ItemObject, field: &str, value: FieldValue) -> Result<()>;

    /// Remove a field, where the representation allows removal.
    fn delete(&self, item: &ItemObject, field: &str) -> Result<()>;

    /// True if the field currently resolves on the instance.
    fn contains(&self, item: &ItemObject, field: &str) -> bool;

    /// Names yielded by iteration, in representation order (insertion order
    /// for mappings, declaration order for schema kinds).
    fn iter_names(&self, item: &ItemObject) -> Vec<String>;

    /// Field-name view reported by the facade. Identical to [`iter_names`]
    /// for every kind except crawler items, which report declared
    /// descriptors rather than populated keys.
    ///
    /// [`iter_names`]: AdapterStrategy::iter_names
    fn field_names(&self, item: &ItemObject) -> Vec<String> {
        self.iter_names(item)
    }

    /// Number of names yielded by iteration.
    fn len(&self, item: &ItemObject) -> usize {
        self.iter_names(item).len()
    }

    /// Declared metadata for one field of a class. Empty for kinds without
    /// a metadata concept and for unknown fields; never an error.
    fn field_meta_from_class(&self, _class: TypeId, _field: &str) -> FieldMeta {
        FieldMeta::new()
    }

    /// Declared field names of a class in declaration order, or `None` for
    /// kinds without an upfront schema (plain mappings).
    fn field_names_from_class(&self, _class: TypeId) -> Option<Vec<String>> {
        None
    }

    /// Derive the JSON Schema object node for a class of this kind.
    fn json_schema(&self, class: TypeId, state: &mut SchemaState<'_>) -> Map<String, Value>;
}
