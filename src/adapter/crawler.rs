//! Crawler items: declared field descriptors over a separate value store.
//!
//! A crawler item declares its fields as descriptors but keeps populated
//! values in a distinct ordered map, so a declared field can exist without a
//! value. Iteration walks the populated store; the field-name view reports
//! the declared descriptors instead. A type may also act as an inert marker
//! base ([`BaseCrawlerItem`]) that carries no store at all and is never
//! treated as a live item.

use std::any::{Any, TypeId};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::adapter::class_table::ClassTable;
use crate::adapter::AdapterStrategy;
use crate::errors::{AdapterError, Result};
use crate::schema::{base_schema, extra_from_meta, set_default, update_prop_from_hint, update_required, SchemaState};
use crate::value::{FieldMeta, FieldValue, ItemObject};

use crate::schema::hint::TypeHint;

/// One declared field of a crawler item.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    metadata: FieldMeta,
    hint: Option<TypeHint>,
    description: Option<&'static str>,
}

impl FieldDescriptor {
    /// Declare a field by name, with no metadata or type information.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            metadata: FieldMeta::new(),
            hint: None,
            description: None,
        }
    }

    /// Attach arbitrary declared metadata.
    pub fn with_metadata(mut self, metadata: FieldMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a type hint.
    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared metadata.
    pub fn metadata(&self) -> &FieldMeta {
        &self.metadata
    }
}

/// Boundary contract for crawler item types.
pub trait CrawlerItem: Any + Send + Sync {
    /// The declared field descriptors, in declaration order.
    fn fields() -> &'static [FieldDescriptor]
    where
        Self: Sized;

    /// Class-level JSON Schema overrides.
    fn schema_extra() -> FieldMeta
    where
        Self: Sized,
    {
        FieldMeta::new()
    }

    /// The populated value store. `None` marks an inert base type that
    /// declares the shape but never holds values.
    fn values(&self) -> Option<&IndexMap<String, FieldValue>>;

    /// Mutable access to the populated value store.
    fn values_mut(&mut self) -> Option<&mut IndexMap<String, FieldValue>>;
}

/// Inert marker base: registered as a crawler class but holding no store,
/// so instances are never treated as items.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCrawlerItem;

impl CrawlerItem for BaseCrawlerItem {
    fn fields() -> &'static [FieldDescriptor] {
        &[]
    }

    fn values(&self) -> Option<&IndexMap<String, FieldValue>> {
        None
    }

    fn values_mut(&mut self) -> Option<&mut IndexMap<String, FieldValue>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Class table
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct CrawlerVtable {
    fields: fn() -> &'static [FieldDescriptor],
    schema_extra: fn() -> FieldMeta,
    values: for<'a> fn(&'a dyn Any) -> Option<&'a IndexMap<String, FieldValue>>,
    values_mut: for<'a> fn(&'a mut dyn Any) -> Option<&'a mut IndexMap<String, FieldValue>>,
}

fn vtable_for<T: CrawlerItem>() -> CrawlerVtable {
    CrawlerVtable {
        fields: T::fields,
        schema_extra: T::schema_extra,
        values: |any| any.downcast_ref::<T>().and_then(CrawlerItem::values),
        values_mut: |any| any.downcast_mut::<T>().and_then(CrawlerItem::values_mut),
    }
}

static CLASSES: Lazy<ClassTable<CrawlerVtable>> = Lazy::new(|| {
    let table = ClassTable::default();
    table.insert(
        TypeId::of::<BaseCrawlerItem>(),
        "BaseCrawlerItem",
        vtable_for::<BaseCrawlerItem>(),
    );
    table
});

/// Register a crawler item type.
pub fn register_crawler_item<T: CrawlerItem>() {
    CLASSES.insert(TypeId::of::<T>(), std::any::type_name::<T>(), vtable_for::<T>());
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Handler for the crawler representation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlerAdapter;

impl CrawlerAdapter {
    fn vtable(&self, class: TypeId, type_name: &str) -> Result<CrawlerVtable> {
        CLASSES
            .get(class)
            .map(|entry| entry.vtable)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: type_name.to_string(),
            })
    }

    fn declared(vt: &CrawlerVtable, field: &str) -> bool {
        (vt.fields)().iter().any(|def| def.name == field)
    }
}

impl AdapterStrategy for CrawlerAdapter {
    fn name(&self) -> &'static str {
        "crawler"
    }

    fn is_item_class(&self, class: TypeId) -> bool {
        CLASSES.contains(class)
    }

    // Inert base instances declare the shape but hold no values, so the
    // class probe alone is not enough here.
    fn is_item(&self, item: &ItemObject) -> bool {
        match CLASSES.get(item.class()) {
            Some(entry) => item.with(|any| (entry.vtable.values)(any).is_some()),
            None => false,
        }
    }

    fn get(&self, item: &ItemObject, field: &str) -> Result<FieldValue> {
        let vt = self.vtable(item.class(), item.type_name())?;
        let stored = item.with(|any| {
            (vt.values)(any)
                .map(|values| values.get(field).cloned())
                .ok_or_else(|| AdapterError::InertItem {
                    type_name: item.type_name().to_string(),
                })
        })?;
        stored.ok_or_else(|| AdapterError::MissingField {
            field: field.to_string(),
        })
    }

    fn set(&self, item: &ItemObject, field: &str, value: FieldValue) -> Result<()> {
        let vt = self.vtable(item.class(), item.type_name())?;
        if !Self::declared(&vt, field) {
            return Err(AdapterError::UndeclaredField {
                item_type: item.type_name().to_string(),
                field: field.to_string(),
            });
        }
        item.with_mut(|any| match (vt.values_mut)(any) {
            Some(values) => {
                values.insert(field.to_string(), value);
                Ok(())
            }
            None => Err(AdapterError::InertItem {
                type_name: item.type_name().to_string(),
            }),
        })
    }

    fn delete(&self, item: &ItemObject, field: &str) -> Result<()> {
        let vt = self.vtable(item.class(), item.type_name())?;
        if !Self::declared(&vt, field) {
            return Err(AdapterError::UndeclaredField {
                item_type: item.type_name().to_string(),
                field: field.to_string(),
            });
        }
        item.with_mut(|any| match (vt.values_mut)(any) {
            Some(values) => values
                .shift_remove(field)
                .map(|_| ())
                .ok_or_else(|| AdapterError::MissingField {
                    field: field.to_string(),
                }),
            None => Err(AdapterError::InertItem {
                type_name: item.type_name().to_string(),
            }),
        })
    }

    fn contains(&self, item: &ItemObject, field: &str) -> bool {
        match self.vtable(item.class(), item.type_name()) {
            Ok(vt) => item.with(|any| {
                (vt.values)(any).is_some_and(|values| values.contains_key(field))
            }),
            Err(_) => false,
        }
    }

    // Iteration walks the populated store, not the declaration.
    fn iter_names(&self, item: &ItemObject) -> Vec<String> {
        match self.vtable(item.class(), item.type_name()) {
            Ok(vt) => item.with(|any| {
                (vt.values)(any)
                    .map(|values| values.keys().cloned().collect())
                    .unwrap_or_default()
            }),
            Err(_) => Vec::new(),
        }
    }

    // The field-name view reports the declaration instead.
    fn field_names(&self, item: &ItemObject) -> Vec<String> {
        match self.vtable(item.class(), item.type_name()) {
            Ok(vt) => (vt.fields)().iter().map(|def| def.name.to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn field_meta_from_class(&self, class: TypeId, field: &str) -> FieldMeta {
        let Some(entry) = CLASSES.get(class) else {
            return FieldMeta::new();
        };
        (entry.vtable.fields)()
            .iter()
            .find(|def| def.name == field)
            .map(|def| def.metadata.clone())
            .unwrap_or_default()
    }

    fn field_names_from_class(&self, class: TypeId) -> Option<Vec<String>> {
        let entry = CLASSES.get(class)?;
        Some(
            (entry.vtable.fields)()
                .iter()
                .map(|def| def.name.to_string())
                .collect(),
        )
    }

    fn json_schema(&self, class: TypeId, state: &mut SchemaState<'_>) -> Map<String, Value> {
        let Some(entry) = CLASSES.get(class) else {
            return base_schema(&FieldMeta::new());
        };
        let mut schema = base_schema(&(entry.vtable.schema_extra)());
        let fields = (entry.vtable.fields)();
        if fields.is_empty() {
            return schema;
        }

        // Seed properties from the declared metadata overrides first, so the
        // required list can be settled before derived keywords land.
        let mut props = Map::new();
        for def in fields {
            props.insert(
                def.name.to_string(),
                Value::Object(extra_from_meta(&def.metadata)),
            );
        }
        schema.insert("properties".to_string(), Value::Object(props));
        update_required(&mut schema, &Default::default());

        if let Some(props) = schema.get_mut("properties").and_then(Value::as_object_mut) {
            for def in fields {
                let Some(prop) = props.get_mut(def.name).and_then(Value::as_object_mut) else {
                    continue;
                };
                if let Some(hint) = &def.hint {
                    update_prop_from_hint(prop, hint, state);
                }
                if let Some(description) = def.description {
                    set_default(prop, "description", json!(description));
                }
            }
        }
        schema
    }
}
