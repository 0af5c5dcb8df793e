//! Free-function conveniences over the process-wide default registry.

use serde_json::{Map, Value};

use crate::errors::Result;
use crate::registry;
use crate::value::{FieldMeta, ItemObject};

/// True when the default registry can adapt the wrapped object.
pub fn is_item(item: &ItemObject) -> bool {
    registry::global().read().is_item(item)
}

/// True when the default registry can adapt instances of `T`.
pub fn is_item_class<T: 'static>() -> bool {
    registry::global()
        .read()
        .is_item_class(std::any::TypeId::of::<T>())
}

/// Declared metadata for one field of an item class.
pub fn get_field_meta_from_class<T: 'static>(field: &str) -> Result<FieldMeta> {
    registry::global().read().field_meta_from_class::<T>(field)
}

/// Declared field names of an item class, or `None` for kinds without an
/// upfront declaration.
pub fn get_field_names_from_class<T: 'static>() -> Result<Option<Vec<String>>> {
    registry::global().read().field_names_from_class::<T>()
}

/// Derive a JSON Schema document for an item class.
pub fn get_json_schema<T: 'static>() -> Result<Map<String, Value>> {
    registry::global().read().json_schema::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdapterError;
    use crate::fixtures::{register_fixtures, Price};
    use crate::value::FieldValue;
    use indexmap::IndexMap;

    #[test]
    fn test_is_item() {
        register_fixtures();
        assert!(is_item(&ItemObject::new(Price::new(1, "EUR"))));
        assert!(is_item(&ItemObject::new(
            IndexMap::<String, FieldValue>::new()
        )));
        assert!(!is_item(&ItemObject::new("not an item".to_string())));
        assert!(is_item_class::<Price>());
    }

    #[test]
    fn test_class_lookups_require_an_item_class() {
        register_fixtures();
        assert!(get_field_meta_from_class::<Price>("value").is_ok());
        assert!(matches!(
            get_field_meta_from_class::<u32>("value"),
            Err(AdapterError::NoAdapter { .. })
        ));
        assert!(matches!(
            get_json_schema::<u32>(),
            Err(AdapterError::NoAdapter { .. })
        ));
    }

    #[test]
    fn test_field_names_lookup() {
        register_fixtures();
        let names = get_field_names_from_class::<Price>().unwrap();
        assert_eq!(names, Some(vec!["value".to_string(), "currency".to_string()]));
    }
}
