//! JSON Schema derivation from class-level field declarations.
//!
//! Schema documents are built purely from static declarations; no item is
//! ever instantiated. All maps are insertion-ordered, so repeated
//! derivations of the same class are byte-identical.
//!
//! Merge policy, everywhere: explicit overrides win over computed structure.
//! Field-level `json_schema_extra` seeds each property map and class-level
//! extras seed the object node before any derived keyword is filled in with
//! `entry().or_insert()` semantics.

pub mod constraints;
pub mod hint;

use std::any::TypeId;
use std::collections::HashSet;

use log::trace;
use serde_json::{json, Map, Value};

use crate::registry::AdapterRegistry;
use crate::value::FieldMeta;
use hint::{ClassRef, TypeHint};

pub use constraints::{is_ecma_pattern, Constraint};

/// Metadata key holding explicit JSON Schema overrides for a field or class.
pub const JSON_SCHEMA_EXTRA_KEY: &str = "json_schema_extra";

// ---------------------------------------------------------------------------
// Derivation state
// ---------------------------------------------------------------------------

/// Tracks the classes currently being expanded so self-referential and
/// mutually-referential declarations terminate with a bare object node
/// instead of recursing forever.
pub struct SchemaState<'a> {
    registry: &'a AdapterRegistry,
    expanding: HashSet<TypeId>,
}

impl<'a> SchemaState<'a> {
    /// State for a derivation rooted at `root`.
    pub fn new(registry: &'a AdapterRegistry, root: TypeId) -> Self {
        let mut expanding = HashSet::new();
        expanding.insert(root);
        Self {
            registry,
            expanding,
        }
    }

    /// The registry the derivation was started from.
    pub fn registry(&self) -> &'a AdapterRegistry {
        self.registry
    }
}

// ---------------------------------------------------------------------------
// Map helpers
// ---------------------------------------------------------------------------

/// Insert `value` under `key` unless the key is already present.
pub(crate) fn set_default(map: &mut Map<String, Value>, key: &str, value: Value) {
    if !map.contains_key(key) {
        map.insert(key.to_string(), value);
    }
}

/// Object-node skeleton: a copy of the class-level schema extras with
/// `type: object` and `additionalProperties: false` filled in underneath.
pub(crate) fn base_schema(class_extra: &FieldMeta) -> Map<String, Value> {
    let mut schema = class_extra.clone();
    set_default(&mut schema, "type", json!("object"));
    set_default(&mut schema, "additionalProperties", json!(false));
    schema
}

/// Extract the `json_schema_extra` object from a field's metadata.
pub(crate) fn extra_from_meta(meta: &FieldMeta) -> Map<String, Value> {
    meta.get(JSON_SCHEMA_EXTRA_KEY)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Fill in the `required` list from the property maps: a field is required
/// unless its final property carries a `default` key or the field is listed
/// in `optional` (declared default factories). A pre-existing `required`
/// override is left untouched.
pub(crate) fn update_required(schema: &mut Map<String, Value>, optional: &HashSet<String>) {
    if schema.contains_key("required") {
        return;
    }
    let required: Vec<Value> = match schema.get("properties").and_then(Value::as_object) {
        Some(props) => props
            .iter()
            .filter(|(name, data)| {
                !optional.contains(name.as_str())
                    && !data
                        .as_object()
                        .is_some_and(|prop| prop.contains_key("default"))
            })
            .map(|(name, _)| Value::String(name.clone()))
            .collect(),
        None => return,
    };
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
}

// ---------------------------------------------------------------------------
// Property derivation
// ---------------------------------------------------------------------------

/// Fill `prop` with the JSON Schema keywords derived from `hint`. Keys
/// already present (explicit overrides) are never overwritten.
pub(crate) fn update_prop_from_hint(
    prop: &mut Map<String, Value>,
    hint: &TypeHint,
    state: &mut SchemaState<'_>,
) {
    match hint {
        TypeHint::Any => {}
        TypeHint::String | TypeHint::Integer | TypeHint::Number | TypeHint::Boolean
        | TypeHint::Null => {
            if let Some(simple) = hint.simple_type() {
                set_default(prop, "type", json!(simple));
            }
        }
        TypeHint::Array(element) => update_prop_from_array(prop, element, false, state),
        TypeHint::Set(element) => update_prop_from_array(prop, element, true, state),
        TypeHint::Map(value_type) => {
            set_default(prop, "type", json!("object"));
            match prop.get("additionalProperties") {
                Some(Value::Object(existing)) => {
                    let mut props = existing.clone();
                    update_prop_from_hint(&mut props, value_type, state);
                    prop.insert("additionalProperties".to_string(), Value::Object(props));
                }
                // A non-object override (e.g. `false`) stands as given.
                Some(_) => {}
                None => {
                    let mut props = Map::new();
                    update_prop_from_hint(&mut props, value_type, state);
                    prop.insert("additionalProperties".to_string(), Value::Object(props));
                }
            }
        }
        TypeHint::Union(members) => update_prop_from_union(prop, members, state),
        TypeHint::Option(inner) => {
            let members = vec![(**inner).clone(), TypeHint::Null];
            update_prop_from_union(prop, &members, state);
        }
        TypeHint::Enum(values) => update_prop_from_enum(prop, values),
        TypeHint::Item(class) => update_prop_from_item(prop, *class, state),
    }
}

fn update_prop_from_array(
    prop: &mut Map<String, Value>,
    element: &TypeHint,
    unique: bool,
    state: &mut SchemaState<'_>,
) {
    set_default(prop, "type", json!("array"));
    if unique {
        set_default(prop, "uniqueItems", json!(true));
    }
    match prop.get("items") {
        Some(Value::Object(existing)) => {
            let mut items = existing.clone();
            update_prop_from_hint(&mut items, element, state);
            prop.insert("items".to_string(), Value::Object(items));
        }
        // A non-object override stands as given.
        Some(_) => {}
        None => {
            let mut items = Map::new();
            update_prop_from_hint(&mut items, element, state);
            // Untyped arrays carry no items sub-schema at all.
            if !items.is_empty() {
                prop.insert("items".to_string(), Value::Object(items));
            }
        }
    }
}

/// Flatten nested unions and options into one member list, deduplicated in
/// declaration order.
fn flatten_union(members: &[TypeHint], out: &mut Vec<TypeHint>) {
    for member in members {
        match member {
            TypeHint::Union(inner) => flatten_union(inner, out),
            TypeHint::Option(inner) => {
                flatten_union(std::slice::from_ref(inner.as_ref()), out);
                if !out.contains(&TypeHint::Null) {
                    out.push(TypeHint::Null);
                }
            }
            other => {
                if !out.contains(other) {
                    out.push(other.clone());
                }
            }
        }
    }
}

fn update_prop_from_union(
    prop: &mut Map<String, Value>,
    members: &[TypeHint],
    state: &mut SchemaState<'_>,
) {
    let mut flat = Vec::new();
    flatten_union(members, &mut flat);
    // An integer alternative is redundant next to a number alternative.
    if flat.contains(&TypeHint::Number) {
        flat.retain(|hint| *hint != TypeHint::Integer);
    }
    let simple: Vec<&'static str> = flat.iter().filter_map(TypeHint::simple_type).collect();
    let complex: Vec<&TypeHint> = flat
        .iter()
        .filter(|hint| hint.simple_type().is_none())
        .collect();

    if complex.is_empty() {
        set_default(prop, "type", json!(simple));
        return;
    }
    if prop.contains_key("anyOf") {
        return;
    }
    let mut any_of: Vec<Value> = Vec::new();
    if !simple.is_empty() {
        let type_value = if simple.len() > 1 {
            json!(simple)
        } else {
            json!(simple[0])
        };
        any_of.push(json!({ "type": type_value }));
    }
    for member in complex {
        let mut sub = Map::new();
        update_prop_from_hint(&mut sub, member, state);
        any_of.push(Value::Object(sub));
    }
    prop.insert("anyOf".to_string(), Value::Array(any_of));
}

fn update_prop_from_enum(prop: &mut Map<String, Value>, values: &[Value]) {
    set_default(prop, "enum", Value::Array(values.to_vec()));
    let mut kinds: Vec<&'static str> = Vec::new();
    for value in values {
        let kind = match value {
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Null => "null",
            // Structured literals contribute no type keyword.
            Value::Array(_) | Value::Object(_) => continue,
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.contains(&"number") {
        kinds.retain(|kind| *kind != "integer");
    }
    match kinds.len() {
        0 => {}
        1 => set_default(prop, "type", json!(kinds[0])),
        _ => set_default(prop, "type", json!(kinds)),
    }
}

fn update_prop_from_item(
    prop: &mut Map<String, Value>,
    class: ClassRef,
    state: &mut SchemaState<'_>,
) {
    if !state.registry.is_item_class(class.id()) {
        return;
    }
    if state.expanding.contains(&class.id()) {
        trace!(
            "schema recursion on {}: emitting bare object node",
            class.name()
        );
        set_default(prop, "type", json!("object"));
        return;
    }
    let Some(handler) = state.registry.find_handler_for_class(class.id()) else {
        return;
    };
    state.expanding.insert(class.id());
    let subschema = handler.json_schema(class.id(), state);
    state.expanding.remove(&class.id());
    for (key, value) in subschema {
        set_default(prop, &key, value);
    }
}
