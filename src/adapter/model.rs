//! Model items: validating types with per-field declarations and a
//! class-level configuration.
//!
//! Models are the richest declaration kind: each field carries an
//! annotation, optional default, presentation metadata (title, description,
//! examples, deprecation) and validation constraints, and the class itself
//! declares how unknown fields are treated through [`Extra`].

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
    set_default, update_prop_from_hint, update_required, SchemaState, JSON_SCHEMA_EXTRA_KEY,
};
use crate::value::{FieldMeta, FieldValue, ItemObject};

/// How a model treats fields outside its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extra {
    /// Unknown fields are rejected; schemas carry `additionalProperties: false`.
    #[default]
    Forbid,
    /// Unknown fields are silently dropped on construction.
    Ignore,
    /// Unknown fields are accepted and stored.
    Allow,
}

/// Class-level model configuration.
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    extra: Extra,
    schema_extra: FieldMeta,
}

impl ModelConfig {
    /// Configuration with the given unknown-field policy.
    pub fn new(extra: Extra) -> Self {
        Self {
            extra,
            schema_extra: FieldMeta::new(),
        }
    }

    /// Attach class-level JSON Schema overrides.
    pub fn with_schema_extra(mut self, schema_extra: FieldMeta) -> Self {
        self.schema_extra = schema_extra;
        self
    }

    /// The unknown-field policy.
    pub fn extra(&self) -> Extra {
        self.extra
    }

    /// Class-level JSON Schema overrides.
    pub fn schema_extra(&self) -> &FieldMeta {
        &self.schema_extra
    }
}

/// One declared model field.
#[derive(Debug, Clone)]
pub struct ModelField {
    name: &'static str,
    annotation: TypeHint,
    default: FieldDefault,
    description: Option<&'static str>,
    title: Option<&'static str>,
    examples: Vec<Value>,
    deprecated: bool,
    constraints: Vec<Constraint>,
    schema_extra: FieldMeta,
}

impl ModelField {
    /// Declare a field with the given name and annotation.
    pub fn new(name: &'static str, annotation: TypeHint) -> Self {
        Self {
            name,
            annotation,
            default: FieldDefault::Required,
            description: None,
            title: None,
            examples: Vec::new(),
            deprecated: false,
            constraints: Vec::new(),
            schema_extra: FieldMeta::new(),
        }
    }

    /// Attach a literal default value.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Mark the field as defaulted by a factory.
    pub fn with_factory_default(mut self) -> Self {
        self.default = FieldDefault::Factory;
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Attach a display title.
    pub fn with_title(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    /// Attach example values.
    pub fn with_examples(mut self, examples: Vec<Value>) -> Self {
        self.examples = examples;
        self
    }

    /// Mark the field deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Attach a validation constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Attach field-level JSON Schema overrides.
    pub fn with_schema_extra(mut self, schema_extra: FieldMeta) -> Self {
        self.schema_extra = schema_extra;
        self
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared annotation.
    pub fn annotation(&self) -> &TypeHint {
        &self.annotation
    }

    /// Declared default.
    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    /// The field declaration rendered as a metadata map, the shape reported
    /// by class-level metadata lookups.
    pub fn meta(&self) -> FieldMeta {
        let mut meta = FieldMeta::new();
        if let Some(description) = self.description {
            meta.insert("description".to_string(), json!(description));
        }
        if let Some(title) = self.title {
            meta.insert("title".to_string(), json!(title));
        }
        if !self.examples.is_empty() {
            meta.insert("examples".to_string(), Value::Array(self.examples.clone()));
        }
        if self.deprecated {
            meta.insert("deprecated".to_string(), json!(true));
        }
        if let Some(value) = self.default.value().and_then(FieldValue::to_json) {
            meta.insert("default".to_string(), value);
        }
        if !self.schema_extra.is_empty() {
            meta.insert(
                JSON_SCHEMA_EXTRA_KEY.to_string(),
                Value::Object(self.schema_extra.clone()),
            );
        }
        meta
    }
}

/// Boundary contract for model item types.
pub trait ModelItem: Any + Send + Sync {
    /// The declared field list, in declaration order.
    fn model_fields() -> &'static [ModelField]
    where
        Self: Sized;

    /// Class-level configuration.
    fn model_config() -> ModelConfig
    where
        Self: Sized,
    {
        ModelConfig::default()
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
struct ModelVtable {
    fields: fn() -> &'static [ModelField],
    config: fn() -> ModelConfig,
    get: fn(&dyn Any, &str) -> Option<FieldValue>,
    set: fn(&mut dyn Any, &str, FieldValue) -> std::result::Result<(), SetError>,
}

static CLASSES: Lazy<ClassTable<ModelVtable>> = Lazy::new(ClassTable::default);

/// Register a model item type.
pub fn register_model_item<T: ModelItem>() {
    CLASSES.insert(
        TypeId::of::<T>(),
        std::any::type_name::<T>(),
        ModelVtable {
            fields: T::model_fields,
            config: T::model_config,
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

/// Handler for the model representation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAdapter;

impl ModelAdapter {
    fn vtable(&self, class: TypeId, type_name: &str) -> Result<ModelVtable> {
        CLASSES
            .get(class)
            .map(|entry| entry.vtable)
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: type_name.to_string(),
            })
    }
}

impl AdapterStrategy for ModelAdapter {
    fn name(&self) -> &'static str {
        "model"
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
            .map(ModelField::meta)
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
            let mut schema = Map::new();
            schema.insert("type".to_string(), json!("object"));
            return schema;
        };
        let config = (entry.vtable.config)();
        let mut schema = config.schema_extra().clone();
        set_default(&mut schema, "type", json!("object"));
        // Only a forbidding model pins down its property set.
        if config.extra() == Extra::Forbid {
            set_default(&mut schema, "additionalProperties", json!(false));
        }

        let fields = (entry.vtable.fields)();
        if fields.is_empty() {
            return schema;
        }

        let mut props = Map::new();
        let mut factory_fields = HashSet::new();
        for def in fields {
            let mut prop = def.schema_extra.clone();
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
            update_prop_from_hint(&mut prop, &def.annotation, state);
            apply_constraints(&mut prop, &def.constraints, def.annotation.is_string());
            if let Some(description) = def.description {
                set_default(&mut prop, "description", json!(description));
            }
            if let Some(title) = def.title {
                set_default(&mut prop, "title", json!(title));
            }
            if !def.examples.is_empty() {
                set_default(&mut prop, "examples", Value::Array(def.examples.clone()));
            }
            if def.deprecated {
                set_default(&mut prop, "deprecated", json!(true));
            }
            props.insert(def.name.to_string(), Value::Object(prop));
        }
        schema.insert("properties".to_string(), Value::Object(props));
        update_required(&mut schema, &factory_fields);
        schema
    }
}
