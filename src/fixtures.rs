//! Shared item types exercising every representation kind, used by tests
//! across the crate.

use std::sync::Once;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::adapter::{
    register_builder_item, register_crawler_item, register_declared_item, register_model_item,
    BuilderItem, CrawlerItem, DeclaredItem, FieldDef, FieldDescriptor, FieldSpec, FieldSpecSet,
    ModelConfig, ModelField, ModelItem, SetError,
};
use crate::adapter::model::Extra;
use crate::schema::hint::TypeHint;
use crate::value::{FieldMeta, FieldValue, ItemObject};

static INIT: Once = Once::new();

/// Register every fixture type. Safe to call any number of times.
pub(crate) fn register_fixtures() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        register_declared_item::<Price>();
        register_declared_item::<Product>();
        register_declared_item::<TreeNode>();
        register_builder_item::<Profile>();
        register_model_item::<Review>();
        register_crawler_item::<PageItem>();
    });
}

// ---------------------------------------------------------------------------
// Declared fixtures
// ---------------------------------------------------------------------------

/// Declared item with two scalar fields.
#[derive(Debug, Clone)]
pub(crate) struct Price {
    pub(crate) value: i64,
    pub(crate) currency: String,
}

impl Price {
    pub(crate) fn new(value: i64, currency: &str) -> Self {
        Self {
            value,
            currency: currency.to_string(),
        }
    }
}

static PRICE_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    let mut currency_meta = FieldMeta::new();
    currency_meta.insert("serializer".to_string(), json!("upper"));
    vec![
        FieldDef::new("value", TypeHint::Integer),
        FieldDef::new("currency", TypeHint::String).with_metadata(currency_meta),
    ]
});

impl DeclaredItem for Price {
    fn declared_fields() -> &'static [FieldDef] {
        &PRICE_FIELDS
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "value" => Some(FieldValue::Int(self.value)),
            "currency" => Some(self.currency.clone().into()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetError> {
        match name {
            "value" => match value.as_int() {
                Some(int) => {
                    self.value = int;
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "integer" }),
            },
            "currency" => match value.as_str() {
                Some(text) => {
                    self.currency = text.to_string();
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "string" }),
            },
            _ => Err(SetError::Undeclared),
        }
    }
}

/// Declared item holding a nested item field.
#[derive(Debug, Clone)]
pub(crate) struct Product {
    pub(crate) name: String,
    pub(crate) price: ItemObject,
}

impl Product {
    pub(crate) fn new(name: &str, price: Price) -> Self {
        Self {
            name: name.to_string(),
            price: ItemObject::new(price),
        }
    }
}

static PRODUCT_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("name", TypeHint::String),
        FieldDef::new("price", TypeHint::item::<Price>()),
    ]
});

impl DeclaredItem for Product {
    fn declared_fields() -> &'static [FieldDef] {
        &PRODUCT_FIELDS
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(self.name.clone().into()),
            "price" => Some(FieldValue::Item(self.price.clone())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetError> {
        match name {
            "name" => match value.as_str() {
                Some(text) => {
                    self.name = text.to_string();
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "string" }),
            },
            "price" => match value {
                FieldValue::Item(item) => {
                    self.price = item;
                    Ok(())
                }
                _ => Err(SetError::Incompatible { expected: "item" }),
            },
            _ => Err(SetError::Undeclared),
        }
    }
}

/// Self-referential declared item, for schema recursion coverage.
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub(crate) label: String,
    pub(crate) children: Vec<ItemObject>,
}

impl TreeNode {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            children: Vec::new(),
        }
    }
}

static TREE_NODE_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("label", TypeHint::String),
        FieldDef::new("children", TypeHint::array(TypeHint::item::<TreeNode>()))
            .with_factory_default(),
    ]
});

impl DeclaredItem for TreeNode {
    fn declared_fields() -> &'static [FieldDef] {
        &TREE_NODE_FIELDS
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "label" => Some(self.label.clone().into()),
            "children" => Some(FieldValue::List(
                self.children.iter().cloned().map(FieldValue::Item).collect(),
            )),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetError> {
        match name {
            "label" => match value.as_str() {
                Some(text) => {
                    self.label = text.to_string();
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "string" }),
            },
            "children" => match value {
                FieldValue::List(values) => {
                    let mut children = Vec::with_capacity(values.len());
                    for value in values {
                        match value {
                            FieldValue::Item(item) => children.push(item),
                            _ => return Err(SetError::Incompatible { expected: "list of items" }),
                        }
                    }
                    self.children = children;
                    Ok(())
                }
                _ => Err(SetError::Incompatible { expected: "list of items" }),
            },
            _ => Err(SetError::Undeclared),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder fixture
// ---------------------------------------------------------------------------

/// Builder item with a constrained numeric field and a factory-defaulted
/// collection.
#[derive(Debug, Clone)]
pub(crate) struct Profile {
    pub(crate) username: String,
    pub(crate) age: i64,
    pub(crate) tags: Vec<String>,
}

impl Profile {
    pub(crate) fn new(username: &str, age: i64) -> Self {
        Self {
            username: username.to_string(),
            age,
            tags: Vec::new(),
        }
    }
}

static PROFILE_FIELDS: Lazy<FieldSpecSet> = Lazy::new(|| {
    FieldSpecSet::new()
        .field(
            FieldSpec::new("username")
                .hint(TypeHint::String)
                .min_length(1)
                .max_length(64),
        )
        .field(
            FieldSpec::new("age")
                .hint(TypeHint::Integer)
                .ge(0.0)
                .description("age in full years"),
        )
        .field(
            FieldSpec::new("tags")
                .hint(TypeHint::array(TypeHint::String))
                .default_factory(),
        )
});

impl BuilderItem for Profile {
    fn builder_fields() -> &'static FieldSpecSet {
        &PROFILE_FIELDS
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "username" => Some(self.username.clone().into()),
            "age" => Some(FieldValue::Int(self.age)),
            "tags" => Some(FieldValue::List(
                self.tags.iter().map(|tag| tag.as_str().into()).collect(),
            )),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetError> {
        match name {
            "username" => match value.as_str() {
                Some(text) => {
                    self.username = text.to_string();
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "string" }),
            },
            "age" => match value.as_int() {
                Some(int) => {
                    self.age = int;
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "integer" }),
            },
            "tags" => match value {
                FieldValue::List(values) => {
                    let mut tags = Vec::with_capacity(values.len());
                    for value in &values {
                        match value.as_str() {
                            Some(text) => tags.push(text.to_string()),
                            None => {
                                return Err(SetError::Incompatible { expected: "list of strings" })
                            }
                        }
                    }
                    self.tags = tags;
                    Ok(())
                }
                _ => Err(SetError::Incompatible { expected: "list of strings" }),
            },
            _ => Err(SetError::Undeclared),
        }
    }
}

// ---------------------------------------------------------------------------
// Model fixture
// ---------------------------------------------------------------------------

/// Model item with constrained fields and a forbidding configuration.
#[derive(Debug, Clone)]
pub(crate) struct Review {
    pub(crate) text: String,
    pub(crate) stars: i64,
}

impl Review {
    pub(crate) fn new(text: &str, stars: i64) -> Self {
        Self {
            text: text.to_string(),
            stars,
        }
    }
}

static REVIEW_FIELDS: Lazy<Vec<ModelField>> = Lazy::new(|| {
    use crate::schema::Constraint;
    vec![
        ModelField::new("text", TypeHint::String).with_title("Review text"),
        ModelField::new("stars", TypeHint::Integer)
            .with_description("star rating, 1 to 5")
            .with_constraint(Constraint::Ge(1.0))
            .with_constraint(Constraint::Le(5.0)),
    ]
});

impl ModelItem for Review {
    fn model_fields() -> &'static [ModelField] {
        &REVIEW_FIELDS
    }

    fn model_config() -> ModelConfig {
        ModelConfig::new(Extra::Forbid)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "text" => Some(self.text.clone().into()),
            "stars" => Some(FieldValue::Int(self.stars)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetError> {
        match name {
            "text" => match value.as_str() {
                Some(text) => {
                    self.text = text.to_string();
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "string" }),
            },
            "stars" => match value.as_int() {
                Some(int) => {
                    self.stars = int;
                    Ok(())
                }
                None => Err(SetError::Incompatible { expected: "integer" }),
            },
            _ => Err(SetError::Undeclared),
        }
    }
}

// ---------------------------------------------------------------------------
// Crawler fixture
// ---------------------------------------------------------------------------

/// Crawler item with three declared descriptors and a live value store.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageItem {
    values: IndexMap<String, FieldValue>,
}

impl PageItem {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

static PAGE_FIELDS: Lazy<Vec<FieldDescriptor>> = Lazy::new(|| {
    let mut url_meta = FieldMeta::new();
    url_meta.insert("serializer".to_string(), json!("canonical"));
    vec![
        FieldDescriptor::new("url")
            .with_metadata(url_meta)
            .with_hint(TypeHint::String),
        FieldDescriptor::new("title")
            .with_hint(TypeHint::String)
            .with_description("page title"),
        FieldDescriptor::new("tags").with_hint(TypeHint::array(TypeHint::String)),
    ]
});

impl CrawlerItem for PageItem {
    fn fields() -> &'static [FieldDescriptor] {
        &PAGE_FIELDS
    }

    fn values(&self) -> Option<&IndexMap<String, FieldValue>> {
        Some(&self.values)
    }

    fn values_mut(&mut self) -> Option<&mut IndexMap<String, FieldValue>> {
        Some(&mut self.values)
    }
}
