//! Error types for adapter construction and field access.
//!
//! Every failure is raised synchronously at the offending operation; there
//! are no retried or deferred error paths in this crate.

use thiserror::Error;

/// Errors raised by the facade, the registry and the per-kind accessors.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No registered handler matched the wrapped object.
    #[error("no adapter found for objects of type: {type_name}")]
    NoAdapter {
        /// Type name of the unsupported object.
        type_name: String,
    },

    /// The requested key is not present on the item.
    #[error("missing field: {field}")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// The field is not among the item class's declared fields.
    #[error("{item_type} does not support field: {field}")]
    UndeclaredField {
        /// Type name of the item.
        item_type: String,
        /// Name of the undeclared field.
        field: String,
    },

    /// Declared fields cannot be removed once defined.
    #[error("{item_type} does not support field removal")]
    RemovalNotSupported {
        /// Type name of the item.
        item_type: String,
    },

    /// A typed field cannot hold the given dynamic value.
    #[error("field {field} of {item_type} cannot hold the given value: expected {expected}")]
    IncompatibleValue {
        /// Type name of the item.
        item_type: String,
        /// Name of the rejected field.
        field: String,
        /// Human-readable description of the expected value shape.
        expected: &'static str,
    },

    /// Field access through an inert marker type that carries no storage.
    #[error("{type_name} is an inert item base and provides no field access")]
    InertItem {
        /// Type name of the marker.
        type_name: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AdapterError::NoAdapter {
            type_name: "Widget".into(),
        };
        assert_eq!(err.to_string(), "no adapter found for objects of type: Widget");

        let err = AdapterError::UndeclaredField {
            item_type: "Profile".into(),
            field: "nickname".into(),
        };
        assert_eq!(err.to_string(), "Profile does not support field: nickname");

        let err = AdapterError::MissingField { field: "url".into() };
        assert_eq!(err.to_string(), "missing field: url");
    }
}
