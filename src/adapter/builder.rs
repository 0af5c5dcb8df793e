//! Builder items: field sets assembled at runtime through a fluent builder.
//!
//! Functionally a sibling of the declared kind, but introspection goes
//! through a [`FieldSpecSet`] built with chained calls instead of a static
//! table, and field specs may carry value constraints that surface in
//! derived schemas.

use std::any::{Any, TypeId};
use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::adapter::class_table::ClassTable;
use crate::adapter::declared::set_error_to_adapter_error;
use crate::adapter::{AdapterStrategy, FieldDefault, SetError};
use crate::errors::{AdapterError, Result};
use crate::schema::constraints::{apply_constraints, Constraint};
use crate::schema::hint::TypeHint;
use crate::schema::{
    base_schema, extra_from_meta, set_default, update_prop_from_hint, update_required,
    SchemaState,
};
use crate::value::{FieldMeta, FieldValue, ItemObject};

/// One field under construction. Finished specs live in a [`FieldSpecSet`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    hint: TypeHint,
    metadata: FieldMeta,
    default: FieldDefault,
    description: Option<&'static str>,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// Start a field spec with no type information.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hint: TypeHint::Any,
            metadata: FieldMeta::new(),
            default: FieldDefault::Required,
            description: None,
            constraints: Vec::new(),
        }
    }

    /// Set the declared type.
    pub fn hint(mut self, hint: TypeHint) -> Self {
        self.hint = hint;
        self
    }

    /// Set a literal default value.
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Mark the field as defaulted by a factory.
    pub fn default_factory(mut self) -> Self {
        self.default = FieldDefault::Factory;
        self
    }

    /// Replace the declared metadata wholesale.
    pub fn metadata(mut self, metadata: FieldMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add one metadata entry.
    pub fn meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Attach a description.
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Inclusive lower bound.
    pub fn ge(mut self, bound: f64) -> Self {
        self.constraints.push(Constraint::Ge(bound));
        self
    }

    /// Exclusive lower bound.
    pub fn gt(mut self, bound: f64) -> Self {
        self.constraints.push(Constraint::Gt(bound));
        self
    }

    /// Inclusive upper bound.
    pub fn le(mut self, bound: f64) -> Self {
        self.constraints.push(Constraint::Le(bound));
        self
    }

    /// Exclusive upper bound.
    pub fn lt(mut self, bound: f64) -> Self {
        self.constraints.push(Constraint::Lt(bound));
        self
    }

    /// Restrict the value to a closed set of literals.
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.constraints.push(Constraint::OneOf(values));
        self
    }

    /// Minimum length (strings) or element count (collections).
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.push(Constraint::MinLength(len));
        self
    }

    /// Maximum length (strings) or element count (collections).
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.push(Constraint::MaxLength(len));
        self
    }

    /// Require the value to match a regular expression.
    pub fn pattern(mut self, pattern: &'static str) -> Self {
        self.constraints.push(Constraint::Pattern(pattern));
        self
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared metadata.
    pub fn metadata_map(&self) -> &FieldMeta {
        &self.metadata
    }

    /// Declared default.
    pub fn default_decl(&self) -> &FieldDefault {
        &self.default
    }
}

/// An ordered, named collection of finished field specs.
#[derive(Debug, Clone, Default)]
pub struct FieldSpecSet {
    specs: Vec<FieldSpec>,
}

impl FieldSpecSet {
    /// Start an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field spec.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|spec| spec.name.to_string()).collect()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True when no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Boundary contract for builder item types.
pub trait BuilderItem: Any + Send + Sync {
    /// The built field-spec set for this type.
    fn builder_fields() -> &'static FieldSpecSet
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
struct BuilderVtable {
    fields: fn() -> &'static FieldSpecSet,
    schema_extra: fn() -> FieldMeta,
    get: fn(&dyn Any, &str) -> Option<FieldValue>,
    set: fn(&mut dyn Any, &str, FieldValue) -> std::result::Result<(), SetError>,
}

static CLASSES: Lazy<ClassTable<BuilderVtable>> = Lazy::new(ClassTable::default);

/// Register a builder item type.
pub fn register_builder_item<T: BuilderItem>() {
    CLASSES.insert(
        TypeId::of::<T>(),
        std::any::type_name::<T>(),
        BuilderVtable {
            fields: T::builder_fields,
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

/// Handler for the builder representation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderAdapter;

impl BuilderAdapter {
    fn vtable(&self, class: TypeId, type_name: &str) -> Result<BuilderVtable> {
        CLASSES
            .get(class)
            .map(|entry| entry.vtable)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: type_name.to_string(),
            })
    }
}

impl AdapterStrategy for BuilderAdapter {
    fn name(&self) -> &'static str {
        "builder"
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
            Ok(vt) => (vt.fields)().get(field).is_some(),
            Err(_) => false,
        }
    }

    fn iter_names(&self, item: &ItemObject) -> Vec<String> {
        match self.vtable(item.class(), item.type_name()) {
            Ok(vt) => (vt.fields)().names(),
            Err(_) => Vec::new(),
        }
    }

    fn field_meta_from_class(&self, class: TypeId, field: &str) -> FieldMeta {
        let Some(entry) = CLASSES.get(class) else {
            return FieldMeta::new();
        };
        (entry.vtable.fields)()
            .get(field)
            .map(|spec| spec.metadata.clone())
            .unwrap_or_default()
    }

    fn field_names_from_class(&self, class: TypeId) -> Option<Vec<String>> {
        CLASSES.get(class).map(|entry| (entry.vtable.fields)().names())
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
        for spec in fields.iter() {
            let mut prop = extra_from_meta(&spec.metadata);
            match &spec.default {
                FieldDefault::Factory => {
                    factory_fields.insert(spec.name.to_string());
                }
                FieldDefault::Value(value) => {
                    if let Some(json) = value.to_json() {
                        set_default(&mut prop, "default", json);
                    }
                }
                FieldDefault::Required => {}
            }
            update_prop_from_hint(&mut prop, &spec.hint, state);
            apply_constraints(&mut prop, &spec.constraints, spec.hint.is_string());
            if let Some(description) = spec.description {
                set_default(&mut prop, "description", json!(description));
            }
            props.insert(spec.name.to_string(), Value::Object(prop));
        }
        schema.insert("properties".to_string(), Value::Object(props));
        update_required(&mut schema, &factory_fields);
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{register_fixtures, Profile};

    fn profile_item() -> ItemObject {
        register_fixtures();
        ItemObject::new(Profile::new("ana", 33))
    }

    #[test]
    fn test_probe_and_round_trip() {
        let adapter = BuilderAdapter;
        let item = profile_item();

        assert!(adapter.is_item(&item));
        assert_eq!(adapter.get(&item, "username").unwrap(), "ana".into());
        adapter.set(&item, "age", 34i64.into()).unwrap();
        assert_eq!(adapter.get(&item, "age").unwrap(), FieldValue::Int(34));
    }

    #[test]
    fn test_declared_names_are_fixed() {
        let adapter = BuilderAdapter;
        let item = profile_item();
        assert_eq!(adapter.iter_names(&item), vec!["username", "age", "tags"]);
        assert!(matches!(
            adapter.set(&item, "nickname", "an".into()),
            Err(AdapterError::UndeclaredField { .. })
        ));
        assert!(matches!(
            adapter.delete(&item, "age"),
            Err(AdapterError::RemovalNotSupported { .. })
        ));
    }

    #[test]
    fn test_schema_carries_constraints_and_required() {
        register_fixtures();
        let adapter = BuilderAdapter;
        let registry = crate::registry::AdapterRegistry::with_defaults();
        let mut state = SchemaState::new(&registry, TypeId::of::<Profile>());
        let schema = adapter.json_schema(TypeId::of::<Profile>(), &mut state);

        let props = schema.get("properties").and_then(Value::as_object).unwrap();
        assert_eq!(
            props.get("username"),
            Some(&json!({"type": "string", "minLength": 1, "maxLength": 64}))
        );
        assert_eq!(
            props.get("age"),
            Some(&json!({
                "type": "integer",
                "minimum": 0.0,
                "description": "age in full years",
            }))
        );
        // Factory-defaulted fields are optional but carry no default literal.
        assert_eq!(schema.get("required"), Some(&json!(["username", "age"])));
    }

    #[test]
    fn test_spec_set_lookup() {
        register_fixtures();
        let fields = Profile::builder_fields();
        assert_eq!(fields.len(), 3);
        assert!(fields.get("username").is_some());
        assert!(fields.get("missing").is_none());
    }
}
