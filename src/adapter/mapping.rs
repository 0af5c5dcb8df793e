//! Plain-mapping items: anything that stores fields as a key-value map.
//!
//! This kind has no upfront schema: any key can be inserted, removed or
//! overwritten, and iteration reflects whatever the backing map currently
//! holds. `IndexMap`, `HashMap` and `BTreeMap` keyed by `String` are
//! registered out of the box; other map types opt in through
//! [`register_mapping_item`].

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::adapter::class_table::ClassTable;
use crate::adapter::AdapterStrategy;
use crate::errors::{AdapterError, Result};
use crate::schema::SchemaState;
use crate::value::{FieldValue, ItemObject};

/// Boundary contract for map-backed item types.
pub trait MappingItem: Any + Send + Sync {
    /// Clone out the value stored under `key`, if present.
    fn get_value(&self, key: &str) -> Option<FieldValue>;
    /// Insert or overwrite `key`.
    fn set_value(&mut self, key: &str, value: FieldValue);
    /// Remove `key`, returning the removed value.
    fn remove_value(&mut self, key: &str) -> Option<FieldValue>;
    /// Key presence test.
    fn contains_key(&self, key: &str) -> bool;
    /// Current keys, in the backing map's iteration order.
    fn keys(&self) -> Vec<String>;
    /// Number of stored entries.
    fn len(&self) -> usize;
    /// True when no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MappingItem for IndexMap<String, FieldValue> {
    fn get_value(&self, key: &str) -> Option<FieldValue> {
        self.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: FieldValue) {
        self.insert(key.to_string(), value);
    }

    fn remove_value(&mut self, key: &str) -> Option<FieldValue> {
        // shift_remove keeps the remaining insertion order intact.
        self.shift_remove(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        IndexMap::contains_key(self, key)
    }

    fn keys(&self) -> Vec<String> {
        IndexMap::keys(self).cloned().collect()
    }

    fn len(&self) -> usize {
        IndexMap::len(self)
    }
}

impl MappingItem for HashMap<String, FieldValue> {
    fn get_value(&self, key: &str) -> Option<FieldValue> {
        self.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: FieldValue) {
        self.insert(key.to_string(), value);
    }

    fn remove_value(&mut self, key: &str) -> Option<FieldValue> {
        self.remove(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        HashMap::contains_key(self, key)
    }

    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).cloned().collect()
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

impl MappingItem for BTreeMap<String, FieldValue> {
    fn get_value(&self, key: &str) -> Option<FieldValue> {
        self.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: FieldValue) {
        self.insert(key.to_string(), value);
    }

    fn remove_value(&mut self, key: &str) -> Option<FieldValue> {
        self.remove(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
}

// ---------------------------------------------------------------------------
// Class table
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MappingVtable {
    get: fn(&dyn Any, &str) -> Option<FieldValue>,
    set: fn(&mut dyn Any, &str, FieldValue),
    remove: fn(&mut dyn Any, &str) -> Option<FieldValue>,
    contains: fn(&dyn Any, &str) -> bool,
    keys: fn(&dyn Any) -> Vec<String>,
    len: fn(&dyn Any) -> usize,
}

fn vtable_for<T: MappingItem>() -> MappingVtable {
    MappingVtable {
        get: |any, key| any.downcast_ref::<T>().and_then(|map| map.get_value(key)),
        set: |any, key, value| {
            if let Some(map) = any.downcast_mut::<T>() {
                map.set_value(key, value);
            }
        },
        remove: |any, key| any.downcast_mut::<T>().and_then(|map| map.remove_value(key)),
        contains: |any, key| any.downcast_ref::<T>().is_some_and(|map| map.contains_key(key)),
        keys: |any| any.downcast_ref::<T>().map(MappingItem::keys).unwrap_or_default(),
        len: |any| any.downcast_ref::<T>().map_or(0, MappingItem::len),
    }
}

static CLASSES: Lazy<ClassTable<MappingVtable>> = Lazy::new(|| {
    let table = ClassTable::default();
    table.insert(
        TypeId::of::<IndexMap<String, FieldValue>>(),
        "IndexMap<String, FieldValue>",
        vtable_for::<IndexMap<String, FieldValue>>(),
    );
    table.insert(
        TypeId::of::<HashMap<String, FieldValue>>(),
        "HashMap<String, FieldValue>",
        vtable_for::<HashMap<String, FieldValue>>(),
    );
    table.insert(
        TypeId::of::<BTreeMap<String, FieldValue>>(),
        "BTreeMap<String, FieldValue>",
        vtable_for::<BTreeMap<String, FieldValue>>(),
    );
    table
});

/// Register a custom map-backed item type.
pub fn register_mapping_item<T: MappingItem>() {
    CLASSES.insert(
        TypeId::of::<T>(),
        std::any::type_name::<T>(),
        vtable_for::<T>(),
    );
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Handler for the plain-mapping representation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingAdapter;

impl MappingAdapter {
    fn vtable(&self, item: &ItemObject) -> Result<MappingVtable> {
        CLASSES
            .get(item.class())
            .map(|entry| entry.vtable)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: item.type_name().to_string(),
            })
    }
}

impl AdapterStrategy for MappingAdapter {
    fn name(&self) -> &'static str {
        "mapping"
    }

    fn is_item_class(&self, class: TypeId) -> bool {
        CLASSES.contains(class)
    }

    fn get(&self, item: &ItemObject, field: &str) -> Result<FieldValue> {
        let vt = self.vtable(item)?;
        item.with(|any| (vt.get)(any, field))
            .ok_or_else(|| AdapterError::MissingField {
                field: field.to_string(),
            })
    }

    fn set(&self, item: &ItemObject, field: &str, value: FieldValue) -> Result<()> {
        let vt = self.vtable(item)?;
        item.with_mut(|any| (vt.set)(any, field, value));
        Ok(())
    }

    fn delete(&self, item: &ItemObject, field: &str) -> Result<()> {
        let vt = self.vtable(item)?;
        item.with_mut(|any| (vt.remove)(any, field))
            .map(|_| ())
            .ok_or_else(|| AdapterError::MissingField {
                field: field.to_string(),
            })
    }

    fn contains(&self, item: &ItemObject, field: &str) -> bool {
        match self.vtable(item) {
            Ok(vt) => item.with(|any| (vt.contains)(any, field)),
            Err(_) => false,
        }
    }

    fn iter_names(&self, item: &ItemObject) -> Vec<String> {
        match self.vtable(item) {
            Ok(vt) => item.with(|any| (vt.keys)(any)),
            Err(_) => Vec::new(),
        }
    }

    fn len(&self, item: &ItemObject) -> usize {
        match self.vtable(item) {
            Ok(vt) => item.with(|any| (vt.len)(any)),
            Err(_) => 0,
        }
    }

    fn json_schema(&self, _class: TypeId, _state: &mut SchemaState<'_>) -> Map<String, Value> {
        // Mappings accept any keys; nothing more can be said statically.
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemObject {
        let mut map = IndexMap::new();
        map.insert("name".to_string(), FieldValue::from("mug"));
        map.insert("count".to_string(), FieldValue::from(3i64));
        ItemObject::new(map)
    }

    #[test]
    fn test_emptiness_tracks_len() {
        let mut map = IndexMap::<String, FieldValue>::new();
        assert!(MappingItem::is_empty(&map));
        map.set_value("k", 1i64.into());
        assert!(!MappingItem::is_empty(&map));
        assert_eq!(MappingItem::len(&map), 1);
    }

    #[test]
    fn test_probe() {
        let adapter = MappingAdapter;
        assert!(adapter.is_item(&sample()));
        assert!(adapter.is_item_class(TypeId::of::<HashMap<String, FieldValue>>()));
        assert!(adapter.is_item_class(TypeId::of::<BTreeMap<String, FieldValue>>()));
        assert!(!adapter.is_item(&ItemObject::new(42i64)));
    }

    #[test]
    fn test_get_set_delete() {
        let adapter = MappingAdapter;
        let item = sample();

        assert_eq!(adapter.get(&item, "name").unwrap(), "mug".into());
        adapter.set(&item, "name", "cup".into()).unwrap();
        adapter.set(&item, "color", "blue".into()).unwrap();
        assert_eq!(adapter.get(&item, "color").unwrap(), "blue".into());

        adapter.delete(&item, "color").unwrap();
        assert!(matches!(
            adapter.get(&item, "color"),
            Err(AdapterError::MissingField { .. })
        ));
        assert!(matches!(
            adapter.delete(&item, "color"),
            Err(AdapterError::MissingField { .. })
        ));
    }

    #[test]
    fn test_iteration_is_live_and_ordered() {
        let adapter = MappingAdapter;
        let item = sample();
        assert_eq!(adapter.iter_names(&item), vec!["name", "count"]);

        adapter.set(&item, "color", "blue".into()).unwrap();
        assert_eq!(adapter.iter_names(&item), vec!["name", "count", "color"]);
        assert_eq!(adapter.len(&item), 3);
    }

    #[test]
    fn test_no_class_level_schema() {
        let adapter = MappingAdapter;
        assert!(adapter
            .field_names_from_class(TypeId::of::<IndexMap<String, FieldValue>>())
            .is_none());
        assert!(adapter
            .field_meta_from_class(TypeId::of::<IndexMap<String, FieldValue>>(), "name")
            .is_empty());
    }
}
