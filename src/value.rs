//! Dynamic value currency and the shared item handle.
//!
//! Field values read through an adapter are [`FieldValue`]s: scalars, lists,
//! maps, or nested items. Nested items are carried as [`ItemObject`] handles
//! so that reads preserve identity and writes reach the one shared object.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Number, Value};

/// Field metadata: arbitrary JSON keys declared alongside a field.
pub type FieldMeta = Map<String, Value>;

// ---------------------------------------------------------------------------
// ItemObject
// ---------------------------------------------------------------------------

/// Shared handle to an item of any registered representation.
///
/// Clones are cheap and refer to the same wrapped object; mutating through
/// any clone mutates the one object. Equality and hashing are pointer
/// identity, never structural.
#[derive(Clone)]
pub struct ItemObject {
    inner: Arc<RwLock<Box<dyn Any + Send + Sync>>>,
    class: TypeId,
    type_name: &'static str,
}

impl ItemObject {
    /// Wrap a value into a shared handle.
    pub fn new<T: Any + Send + Sync>(item: T) -> Self {
        Self {
            class: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            inner: Arc::new(RwLock::new(Box::new(item))),
        }
    }

    /// `TypeId` of the wrapped object, captured at construction.
    pub fn class(&self) -> TypeId {
        self.class
    }

    /// Unqualified type name of the wrapped object.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if the wrapped object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.class == TypeId::of::<T>()
    }

    /// Run `f` with shared access to the wrapped object.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Any) -> R) -> R {
        let guard = self.inner.read();
        let any: &dyn Any = &**guard;
        f(any)
    }

    /// Run `f` with exclusive access to the wrapped object.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn Any) -> R) -> R {
        let mut guard = self.inner.write();
        let any: &mut dyn Any = &mut **guard;
        f(any)
    }

    /// Run `f` against the wrapped object downcast to `T`.
    pub fn downcast_with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.with(|any| any.downcast_ref::<T>().map(f))
    }

    /// Run `f` against the wrapped object downcast to `&mut T`.
    pub fn downcast_with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.with_mut(|any| any.downcast_mut::<T>().map(f))
    }

    /// True if both handles refer to the same wrapped object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for ItemObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemObject<{}>", self.type_name)
    }
}

impl PartialEq for ItemObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ItemObject {}

impl Hash for ItemObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

/// `std::any::type_name` with the module path of the outer type removed.
/// Generic arguments are kept as-is; the split must not look inside them.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single dynamic field value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Absent / null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<FieldValue>),
    /// Insertion-ordered string-keyed map.
    Map(IndexMap<String, FieldValue>),
    /// A nested item in its native representation.
    Item(ItemObject),
}

impl FieldValue {
    /// Short label used in error messages and debug output.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Item(_) => "item",
        }
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float content; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list content, if this is a list.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Borrow the map content, if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the nested item handle, if this is an item.
    pub fn as_item(&self) -> Option<&ItemObject> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    /// Convert a JSON value into a dynamic field value.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(values) => Self::List(values.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Best-effort conversion to JSON. Returns `None` when the value (or any
    /// nested part of it) is an item handle, which has no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Int(n) => Some(Value::Number(Number::from(*n))),
            Self::Float(n) => Number::from_f64(*n).map(Value::Number),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::List(values) => values
                .iter()
                .map(Self::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Self::Map(map) => map
                .iter()
                .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                .collect::<Option<Map<_, _>>>()
                .map(Value::Object),
            Self::Item(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
            Self::Item(item) => write!(f, "{item:?}"),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Item(a), Self::Item(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(values: Vec<FieldValue>) -> Self {
        Self::List(values)
    }
}

impl From<IndexMap<String, FieldValue>> for FieldValue {
    fn from(map: IndexMap<String, FieldValue>) -> Self {
        Self::Map(map)
    }
}

impl From<HashMap<String, FieldValue>> for FieldValue {
    fn from(map: HashMap<String, FieldValue>) -> Self {
        Self::Map(map.into_iter().collect())
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self::Map(map.into_iter().collect())
    }
}

impl From<ItemObject> for FieldValue {
    fn from(item: ItemObject) -> Self {
        Self::Item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_object_identity() {
        let a = ItemObject::new(IndexMap::<String, FieldValue>::new());
        let b = a.clone();
        let c = ItemObject::new(IndexMap::<String, FieldValue>::new());
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_item_object_shared_mutation() {
        let a = ItemObject::new(IndexMap::<String, FieldValue>::new());
        let b = a.clone();
        a.downcast_with_mut(|m: &mut IndexMap<String, FieldValue>| {
            m.insert("k".into(), 1i64.into());
        })
        .unwrap();
        let len = b
            .downcast_with(|m: &IndexMap<String, FieldValue>| m.len())
            .unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn test_type_name_is_short() {
        let obj = ItemObject::new(IndexMap::<String, FieldValue>::new());
        assert!(obj.type_name().starts_with("IndexMap"));
    }

    #[test]
    fn test_json_round_trip() {
        let value = FieldValue::from_json(json!({
            "name": "mug",
            "price": 9.5,
            "count": 3,
            "tags": ["kitchen", "ceramic"],
            "in_stock": true,
            "notes": null,
        }));
        let back = value.to_json().unwrap();
        assert_eq!(back["name"], json!("mug"));
        assert_eq!(back["count"], json!(3));
        assert_eq!(back["tags"], json!(["kitchen", "ceramic"]));
    }

    #[test]
    fn test_item_values_have_no_json_form() {
        let item = ItemObject::new(IndexMap::<String, FieldValue>::new());
        let value = FieldValue::List(vec![1i64.into(), FieldValue::Item(item)]);
        assert!(value.to_json().is_none());
    }

    #[test]
    fn test_number_widening() {
        assert_eq!(FieldValue::Int(4).as_float(), Some(4.0));
        assert_eq!(FieldValue::Float(4.5).as_int(), None);
    }
}
