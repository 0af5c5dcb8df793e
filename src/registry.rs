//! Handler registry: the ordered list of representation kinds.
//!
//! The registry owns an ordered sequence of [`AdapterStrategy`] handlers and
//! resolves each wrapped object to the first handler whose probe accepts it.
//! A process-wide default registry is available through [`global`]; scoped
//! registries can be built, reordered and passed around independently of it.

use std::any::TypeId;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::adapter::{
    AdapterStrategy, BuilderAdapter, CrawlerAdapter, DeclaredAdapter, MappingAdapter,
    ModelAdapter,
};
use crate::errors::{AdapterError, Result};
use crate::schema::hint::ClassRef;
use crate::schema::SchemaState;
use crate::value::{short_type_name, FieldMeta, ItemObject};

/// An ordered collection of representation handlers.
///
/// Resolution is strictly first-match-wins in registry order, for instance
/// probes and class probes alike.
#[derive(Clone)]
pub struct AdapterRegistry {
    handlers: VecDeque<Arc<dyn AdapterStrategy>>,
}

impl AdapterRegistry {
    /// An empty registry with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: VecDeque::new(),
        }
    }

    /// The stock registry: crawler, mapping, declared, builder, model.
    pub fn with_defaults() -> Self {
        Self::from_handlers([
            Arc::new(CrawlerAdapter) as Arc<dyn AdapterStrategy>,
            Arc::new(MappingAdapter),
            Arc::new(DeclaredAdapter),
            Arc::new(BuilderAdapter),
            Arc::new(ModelAdapter),
        ])
    }

    /// A registry with exactly the given handlers, in order.
    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn AdapterStrategy>>) -> Self {
        Self {
            handlers: handlers.into_iter().collect(),
        }
    }

    /// Prepend a handler; it is probed before all current handlers.
    pub fn register_front(&mut self, handler: Arc<dyn AdapterStrategy>) {
        debug!("registering handler {} at front", handler.name());
        self.handlers.push_front(handler);
    }

    /// Append a handler; it is probed after all current handlers.
    pub fn register_back(&mut self, handler: Arc<dyn AdapterStrategy>) {
        debug!("registering handler {} at back", handler.name());
        self.handlers.push_back(handler);
    }

    /// Insert a handler at an arbitrary probe position.
    pub fn insert(&mut self, index: usize, handler: Arc<dyn AdapterStrategy>) {
        let index = index.min(self.handlers.len());
        debug!("registering handler {} at position {index}", handler.name());
        self.handlers.insert(index, handler);
    }

    /// Handlers in probe order.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn AdapterStrategy>> {
        self.handlers.iter()
    }

    /// First handler accepting the wrapped object.
    pub fn find_handler(&self, item: &ItemObject) -> Option<Arc<dyn AdapterStrategy>> {
        self.handlers
            .iter()
            .find(|handler| handler.is_item(item))
            .cloned()
    }

    /// First handler accepting the class.
    pub fn find_handler_for_class(&self, class: TypeId) -> Option<Arc<dyn AdapterStrategy>> {
        self.handlers
            .iter()
            .find(|handler| handler.is_item_class(class))
            .cloned()
    }

    /// True when some handler accepts the wrapped object.
    pub fn is_item(&self, item: &ItemObject) -> bool {
        self.handlers.iter().any(|handler| handler.is_item(item))
    }

    /// True when some handler accepts the class.
    pub fn is_item_class(&self, class: TypeId) -> bool {
        self.handlers
            .iter()
            .any(|handler| handler.is_item_class(class))
    }

    /// Declared metadata for one field of an item class. Empty when the
    /// class declares no metadata for the field or does not declare the
    /// field at all; an error only when the class is not an item class.
    pub fn field_meta_from_class<T: 'static>(&self, field: &str) -> Result<FieldMeta> {
        let handler = self.handler_for::<T>()?;
        Ok(handler.field_meta_from_class(TypeId::of::<T>(), field))
    }

    /// Declared field names of an item class, or `None` for kinds without
    /// an upfront declaration.
    pub fn field_names_from_class<T: 'static>(&self) -> Result<Option<Vec<String>>> {
        let handler = self.handler_for::<T>()?;
        Ok(handler.field_names_from_class(TypeId::of::<T>()))
    }

    /// Derive a JSON Schema document for an item class.
    pub fn json_schema<T: 'static>(&self) -> Result<Map<String, Value>> {
        self.json_schema_for(ClassRef::of::<T>())
    }

    pub(crate) fn json_schema_for(&self, class: ClassRef) -> Result<Map<String, Value>> {
        let handler =
            self.find_handler_for_class(class.id())
                .ok_or_else(|| AdapterError::NoAdapter {
                    type_name: class.name().to_string(),
                })?;
        debug!("deriving schema for {} via {} handler", class.name(), handler.name());
        let mut state = SchemaState::new(self, class.id());
        Ok(handler.json_schema(class.id(), &mut state))
    }

    fn handler_for<T: 'static>(&self) -> Result<Arc<dyn AdapterStrategy>> {
        self.find_handler_for_class(TypeId::of::<T>())
            .ok_or_else(|| AdapterError::NoAdapter {
                type_name: short_type_name::<T>().to_string(),
            })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|handler| handler.name()))
            .finish()
    }
}

static GLOBAL: Lazy<RwLock<AdapterRegistry>> =
    Lazy::new(|| RwLock::new(AdapterRegistry::with_defaults()));

/// The process-wide default registry, used by facade constructors that are
/// not given an explicit one.
pub fn global() -> &'static RwLock<AdapterRegistry> {
    &GLOBAL
}
