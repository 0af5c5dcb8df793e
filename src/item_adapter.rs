//! The facade: one mutable-mapping surface over every item kind.
//!
//! An [`ItemAdapter`] binds a wrapped object to the first registry handler
//! that accepts it, then forwards every mapping operation to that handler.
//! The wrapped object is shared, not copied: writes through the adapter are
//! visible to every other holder of the same [`ItemObject`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use log::trace;
use serde_json::{Map, Value};

use crate::adapter::AdapterStrategy;
use crate::errors::{AdapterError, Result};
use crate::registry::{self, AdapterRegistry};
use crate::value::{FieldMeta, FieldValue, ItemObject};

/// Uniform mutable-mapping access to a wrapped item.
pub struct ItemAdapter {
    item: ItemObject,
    handler: Arc<dyn AdapterStrategy>,
    registry: AdapterRegistry,
}

impl ItemAdapter {
    /// Wrap an item using the process-wide default registry.
    pub fn new(item: ItemObject) -> Result<Self> {
        let registry = registry::global().read().clone();
        Self::with_registry(item, &registry)
    }

    /// Wrap an item resolving against an explicit registry. The registry is
    /// snapshotted: later changes to it do not affect this adapter.
    pub fn with_registry(item: ItemObject, registry: &AdapterRegistry) -> Result<Self> {
        let handler = registry
            .find_handler(&item)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: item.type_name().to_string(),
            })?;
        trace!(
            "adapting {} through the {} handler",
            item.type_name(),
            handler.name()
        );
        Ok(Self {
            item,
            handler,
            registry: registry.clone(),
        })
    }

    /// The wrapped item. Cloning the returned handle shares the same object.
    pub fn item(&self) -> &ItemObject {
        &self.item
    }

    /// The registry this adapter resolved against.
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Mapping operations
    // -----------------------------------------------------------------------

    /// Read a field value.
    pub fn get(&self, field: &str) -> Result<FieldValue> {
        self.handler.get(&self.item, field)
    }

    /// Read a field value, `None` when the field is absent.
    pub fn get_opt(&self, field: &str) -> Option<FieldValue> {
        self.get(field).ok()
    }

    /// Read a field value, falling back to `default` when absent.
    pub fn get_or(&self, field: &str, default: impl Into<FieldValue>) -> FieldValue {
        self.get(field).unwrap_or_else(|_| default.into())
    }

    /// Write a field value.
    pub fn set(&self, field: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.handler.set(&self.item, field, value.into())
    }

    /// Remove a field, where the wrapped kind supports removal.
    pub fn delete(&self, field: &str) -> Result<()> {
        self.handler.delete(&self.item, field)
    }

    /// True when the field currently resolves on the item.
    pub fn contains(&self, field: &str) -> bool {
        self.handler.contains(&self.item, field)
    }

    /// Names yielded by iteration, in representation order.
    pub fn keys(&self) -> Vec<String> {
        self.handler.iter_names(&self.item)
    }

    /// The field-name view. Matches [`keys`] for every kind except crawler
    /// items, which report their declared descriptors here.
    ///
    /// [`keys`]: ItemAdapter::keys
    pub fn field_names(&self) -> Vec<String> {
        self.handler.field_names(&self.item)
    }

    /// Values for the iterated names, in iteration order.
    pub fn values(&self) -> Vec<FieldValue> {
        self.keys()
            .iter()
            .filter_map(|name| self.get(name).ok())
            .collect()
    }

    /// `(name, value)` pairs for the iterated names. Nested items stay
    /// wrapped; use [`as_dict`] for a deep export.
    ///
    /// [`as_dict`]: ItemAdapter::as_dict
    pub fn items(&self) -> Vec<(String, FieldValue)> {
        self.keys()
            .iter()
            .filter_map(|name| self.get(name).ok().map(|value| (name.clone(), value)))
            .collect()
    }

    /// Number of iterated names.
    pub fn len(&self) -> usize {
        self.handler.len(&self.item)
    }

    /// True when iteration yields no names.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export the item as a plain ordered map, recursively converting
    /// nested items (also inside lists and maps) to plain maps.
    pub fn as_dict(&self) -> Result<IndexMap<String, FieldValue>> {
        let mut out = IndexMap::new();
        for name in self.keys() {
            let value = self.get(&name)?;
            out.insert(name, export_value(value, &self.registry)?);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Class-level views
    // -----------------------------------------------------------------------

    /// True when some default-registry handler accepts the wrapped object.
    pub fn is_item(item: &ItemObject) -> bool {
        registry::global().read().is_item(item)
    }

    /// True when some default-registry handler accepts the class.
    pub fn is_item_class<T: 'static>() -> bool {
        registry::global()
            .read()
            .is_item_class(std::any::TypeId::of::<T>())
    }

    /// Declared metadata for one field of an item class, per the default
    /// registry.
    pub fn get_field_meta_from_class<T: 'static>(field: &str) -> Result<FieldMeta> {
        registry::global().read().field_meta_from_class::<T>(field)
    }

    /// Declared field names of an item class, per the default registry.
    pub fn field_names_from_class<T: 'static>() -> Result<Option<Vec<String>>> {
        registry::global().read().field_names_from_class::<T>()
    }

    /// Derive a JSON Schema document for an item class, per the default
    /// registry.
    pub fn json_schema<T: 'static>() -> Result<Map<String, Value>> {
        registry::global().read().json_schema::<T>()
    }

    /// Declared metadata for one field of the wrapped item's class.
    pub fn field_meta(&self, field: &str) -> FieldMeta {
        self.handler.field_meta_from_class(self.item.class(), field)
    }
}

/// Deep-convert one value: nested items become plain maps, containers are
/// walked, everything else passes through.
fn export_value(value: FieldValue, registry: &AdapterRegistry) -> Result<FieldValue> {
    match value {
        FieldValue::Item(object) => {
            let adapter = ItemAdapter::with_registry(object, registry)?;
            Ok(FieldValue::Map(adapter.as_dict()?))
        }
        FieldValue::List(values) => Ok(FieldValue::List(
            values
                .into_iter()
                .map(|value| export_value(value, registry))
                .collect::<Result<_>>()?,
        )),
        FieldValue::Map(map) => Ok(FieldValue::Map(
            map.into_iter()
                .map(|(key, value)| Ok((key, export_value(value, registry)?)))
                .collect::<Result<_>>()?,
        )),
        other => Ok(other),
    }
}

impl PartialEq for ItemAdapter {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl Eq for ItemAdapter {}

impl Hash for ItemAdapter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.hash(state);
    }
}

impl ItemAdapter {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ItemAdapter for {}(", self.item.type_name())?;
        for (i, (name, value)) in self.items().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")>")
    }
}

impl fmt::Debug for ItemAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_repr(f)
    }
}

impl fmt::Display for ItemAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_repr(f)
    }
}
