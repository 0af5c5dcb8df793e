//! Declared items: structs with a static, compile-time field table.
//!
//! A declared item publishes its fields as an ordered `&'static [FieldDef]`
//! and stores values in same-named struct fields. The field set is fixed at
//! declaration time: undeclared fields cannot be set and declared fields
//! cannot be removed.

use std::any::{Any, TypeId};
use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::adapter::class_table::ClassTable;
use crate::adapter::{AdapterStrategy, FieldDefault, SetError};
use crate::errors::{AdapterError, Result};
use crate::schema::hint::TypeHint;
use crate::schema::{
    base_schema, extra_from_meta, set_default, update_prop_from_hint, update_required,
    SchemaState,
};
use crate::value::{FieldMeta, FieldValue, ItemObject};
use once_cell::sync::Lazy;

/// One declared field: name, static type, metadata and default.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: &'static str,
    hint: TypeHint,
    metadata: FieldMeta,
    default: FieldDefault,
    description: Option<&'static str>,
}

impl FieldDef {
    /// Declare a field with the given name and type hint.
    pub fn new(name: &'static str, hint: TypeHint) -> Self {
        Self {
            name,
            hint,
            metadata: FieldMeta::new(),
            default: FieldDefault::Required,
            description: None,
        }
    }

    /// Attach a literal default value.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Mark the field as defaulted by a constructor-time factory.
    pub fn with_factory_default(mut self) -> Self {
        self.default = FieldDefault::Factory;
        self
    }

    /// Attach arbitrary declared metadata.
    pub fn with_metadata(mut self, metadata: FieldMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type hint.
    pub fn hint(&self) -> &TypeHint {
        &self.hint
    }

    /// Declared metadata.
    pub fn metadata(&self) -> &FieldMeta {
        &self.metadata
    }

    /// Declared default.
    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    /// Declared description, if any.
    pub fn description(&self) -> Option<&'static str> {
        self.description
    }
}

/// Boundary contract for declared item types.
pub trait DeclaredItem: Any + Send + Sync {
    /// The ordered field table, fixed at declaration time.
    fn declared_fields() -> &'static [FieldDef]
    where
        Self: Sized;

    /// Class-level JSON Schema overrides.
    fn schema_extra() -> FieldMeta
    where
        Self: Sized,
    {
        FieldMeta::new()
    }

    /// Read a declared field; `None` when the name is not declared.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Write a declared field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> std::result::Result<(), SetError>;
}

// ---------------------------------------------------------------------------
// Class table
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct DeclaredVtable {
    fields: fn() -> &'static [FieldDef],
    schema_extra: fn() -> FieldMeta,
    get: fn(&dyn Any, &str) -> Option<FieldValue>,
    set: fn(&mut dyn Any, &str, FieldValue) -> std::result::Result<(), SetError>,
}

static CLASSES: Lazy<ClassTable<DeclaredVtable>> = Lazy::new(ClassTable::default);

/// Register a declared item type.
pub fn register_declared_item<T: DeclaredItem>() {
    CLASSES.insert(
        TypeId::of::<T>(),
        std::any::type_name::<T>(),
        DeclaredVtable {
            fields: T::declared_fields,
            schema_extra: T::schema_extra,
            get: |any, name| any.downcast_ref::<T>().and_then(|item| item.field(name)),
            set: |any, name, value| match any.downcast_mut::<T>() {
                Some(item) => item.set_field(name, value),
                None => Err(SetError::Undeclared),
            },
        },
    );
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Handler for the declared (static field table) representation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredAdapter;

impl DeclaredAdapter {
    fn vtable(&self, class: TypeId, type_name: &str) -> Result<DeclaredVtable> {
        CLASSES
            .get(class)
            .map(|entry| entry.vtable)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: type_name.to_string(),
            })
    }
}

impl AdapterStrategy for DeclaredAdapter {
    fn name(&self) -> &'static str {
        "declared"
    }

    fn is_item_class(&self, class: TypeId) -> bool {
        CLASSES.contains(class)
    }

    fn get(&self, item: &ItemObject, field: &str) -> Result<FieldValue> {
        let vt = self.vtable(item.class(), item.type_name())?;
        item.with(|any| (vt.get)(any, field))
            .ok_or_else(|| AdapterError::MissingField {
                field: field.to_string(),
            })
    }

    fn set(&self, item: &ItemObject, field: &str, value: FieldValue) -> Result<()> {
        let vt = self.vtable(item.class(), item.type_name())?;
        item.with_mut(|any| (vt.set)(any, field, value))
            .map_err(|err| set_error_to_adapter_error(err, item.type_name(), field))
    }

    fn delete(&self, item: &ItemObject, _field: &str) -> Result<()> {
        Err(AdapterError::RemovalNotSupported {
            item_type: item.type_name().to_string(),
        })
    }

    fn contains(&self, item: &ItemObject, field: &str) -> bool {
        match self.vtable(item.class(), item.type_name()) {
            Ok(vt) => (vt.fields)().iter().any(|def| def.name == field),
            Err(_) => false,
        }
    }

    fn iter_names(&self, item: &ItemObject) -> Vec<String> {
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

        let mut props = Map::new();
        let mut factory_fields = HashSet::new();
        for def in fields {
            let mut prop = extra_from_meta(&def.metadata);
            match &def.default {
                FieldDefault::Factory => {
                    factory_fields.insert(def.name.to_string());
                }
                FieldDefault::Value(value) => {
                    if let Some(json) = value.to_json() {
                        set_default(&mut prop, "default", json);
                    }
                }
                FieldDefault::Required => {}
            }
            update_prop_from_hint(&mut prop, &def.hint, state);
            props.insert(def.name.to_string(), Value::Object(prop));
        }
        schema.insert("properties".to_string(), Value::Object(props));
        update_required(&mut schema, &factory_fields);
        apply_descriptions(&mut schema, fields);
        schema
    }
}

pub(crate) fn set_error_to_adapter_error(
    err: SetError,
    item_type: &str,
    field: &str,
) -> AdapterError {
    match err {
        SetError::Undeclared => AdapterError::UndeclaredField {
            item_type: item_type.to_string(),
            field: field.to_string(),
        },
        SetError::Incompatible { expected } => AdapterError::IncompatibleValue {
            item_type: item_type.to_string(),
            field: field.to_string(),
            expected,
        },
    }
}

/// Attach declared descriptions to properties that have none yet.
fn apply_descriptions(schema: &mut Map<String, Value>, fields: &[FieldDef]) {
    let Some(props) = schema.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };
    for def in fields {
        let Some(description) = def.description else {
            continue;
        };
        if let Some(prop) = props.get_mut(def.name).and_then(Value::as_object_mut) {
            set_default(prop, "description", json!(description));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{register_fixtures, Price};

    fn price_item() -> ItemObject {
        register_fixtures();
        ItemObject::new(Price::new(42, "UYU"))
    }

    #[test]
    fn test_probe() {
        let item = price_item();
        let adapter = DeclaredAdapter;
        assert!(adapter.is_item(&item));
        assert!(adapter.is_item_class(TypeId::of::<Price>()));
        assert!(!adapter.is_item(&ItemObject::new(1i64)));
    }

    #[test]
    fn test_get_and_set_declared_fields() {
        let adapter = DeclaredAdapter;
        let item = price_item();

        assert_eq!(adapter.get(&item, "value").unwrap(), FieldValue::Int(42));
        adapter.set(&item, "value", 7i64.into()).unwrap();
        assert_eq!(adapter.get(&item, "value").unwrap(), FieldValue::Int(7));
    }

    #[test]
    fn test_undeclared_field_rejected() {
        let adapter = DeclaredAdapter;
        let item = price_item();

        assert!(matches!(
            adapter.get(&item, "tax"),
            Err(AdapterError::MissingField { .. })
        ));
        assert!(matches!(
            adapter.set(&item, "tax", 1i64.into()),
            Err(AdapterError::UndeclaredField { .. })
        ));
    }

    #[test]
    fn test_incompatible_value_rejected() {
        let adapter = DeclaredAdapter;
        let item = price_item();
        assert!(matches!(
            adapter.set(&item, "value", "not a number".into()),
            Err(AdapterError::IncompatibleValue { .. })
        ));
    }

    #[test]
    fn test_delete_not_supported() {
        let adapter = DeclaredAdapter;
        let item = price_item();
        assert!(matches!(
            adapter.delete(&item, "value"),
            Err(AdapterError::RemovalNotSupported { .. })
        ));
    }

    #[test]
    fn test_declaration_order_iteration() {
        let adapter = DeclaredAdapter;
        let item = price_item();
        assert_eq!(adapter.iter_names(&item), vec!["value", "currency"]);
        assert_eq!(adapter.len(&item), 2);
        assert_eq!(
            adapter.field_names_from_class(TypeId::of::<Price>()),
            Some(vec!["value".to_string(), "currency".to_string()])
        );
    }

    #[test]
    fn test_field_meta_never_errors() {
        register_fixtures();
        let adapter = DeclaredAdapter;
        let meta = adapter.field_meta_from_class(TypeId::of::<Price>(), "currency");
        assert_eq!(meta.get("serializer"), Some(&json!("upper")));
        assert!(adapter
            .field_meta_from_class(TypeId::of::<Price>(), "unknown")
            .is_empty());
    }
}
