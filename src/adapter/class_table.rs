//! `TypeId`-keyed class tables backing per-kind item registration.
//!
//! Registration replaces the structural probing a dynamic runtime would do:
//! a class belongs to a representation kind exactly when its `TypeId` is in
//! that kind's table. Tables live behind `Lazy` statics and are mutable
//! through explicit register calls at any point; callers serialize
//! registration against concurrent lookups themselves.

use std::any::TypeId;
use std::collections::HashMap;

use log::debug;
use parking_lot::RwLock;

/// One registered class: its display name plus the kind-specific vtable.
#[derive(Clone)]
pub(crate) struct ClassEntry<V: Clone> {
    pub(crate) type_name: &'static str,
    pub(crate) vtable: V,
}

/// Concurrent `TypeId -> vtable` map.
pub(crate) struct ClassTable<V: Clone> {
    classes: RwLock<HashMap<TypeId, ClassEntry<V>>>,
}

impl<V: Clone> Default for ClassTable<V> {
    fn default() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> ClassTable<V> {
    /// Register or replace a class. Re-registration is idempotent and safe.
    pub(crate) fn insert(&self, class: TypeId, type_name: &'static str, vtable: V) {
        let replaced = self
            .classes
            .write()
            .insert(class, ClassEntry { type_name, vtable })
            .is_some();
        if replaced {
            debug!("re-registered item class {type_name}");
        } else {
            debug!("registered item class {type_name}");
        }
    }

    pub(crate) fn contains(&self, class: TypeId) -> bool {
        self.classes.read().contains_key(&class)
    }

    pub(crate) fn get(&self, class: TypeId) -> Option<ClassEntry<V>> {
        self.classes.read().get(&class).cloned()
    }
}
