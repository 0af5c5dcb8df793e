//! Declared value constraints and their JSON Schema form.
//!
//! Constraints are attached to builder and model field declarations. They
//! are never enforced by this crate; they only surface in derived schemas.

use serde_json::{json, Value};

use crate::schema::set_default;

/// Substrings that mark a regular expression as incompatible with the
/// ECMA-262 dialect JSON Schema requires. Patterns containing any of these
/// are silently left out of the schema.
const UNSUPPORTED_PATTERN_SUBSTRINGS: &[&str] = &[
    "(?P<", // named groups
    "(?<=", // lookbehind
    "(?<!", // negative lookbehind
    "(?>",  // atomic group
    "\\A",  // start of string
    "\\Z",  // end of string
    "(?i)", // inline flags (case-insensitive, etc.)
    "(?m)", // multiline
    "(?s)", // dotall
    "(?x)", // verbose
    "(?#",  // comments
];

/// True if `pattern` can be carried into a JSON Schema `pattern` keyword.
pub fn is_ecma_pattern(pattern: &str) -> bool {
    !UNSUPPORTED_PATTERN_SUBSTRINGS
        .iter()
        .any(|sub| pattern.contains(sub))
}

/// A single declared constraint on a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive lower bound.
    Ge(f64),
    /// Exclusive lower bound.
    Gt(f64),
    /// Inclusive upper bound.
    Le(f64),
    /// Exclusive upper bound.
    Lt(f64),
    /// Value must be one of the listed literals.
    OneOf(Vec<Value>),
    /// Minimum string length, or minimum element count for collections.
    MinLength(usize),
    /// Maximum string length, or maximum element count for collections.
    MaxLength(usize),
    /// Regular expression the value must match.
    Pattern(&'static str),
}

/// Fold constraints into a property map. Existing keys win: an explicit
/// override in the field's schema extra always takes precedence over the
/// derived keyword. `string_field` selects length vs item-count keywords.
pub(crate) fn apply_constraints(
    prop: &mut serde_json::Map<String, Value>,
    constraints: &[Constraint],
    string_field: bool,
) {
    for constraint in constraints {
        match constraint {
            Constraint::Ge(bound) => set_default(prop, "minimum", json!(bound)),
            Constraint::Gt(bound) => set_default(prop, "exclusiveMinimum", json!(bound)),
            Constraint::Le(bound) => set_default(prop, "maximum", json!(bound)),
            Constraint::Lt(bound) => set_default(prop, "exclusiveMaximum", json!(bound)),
            Constraint::OneOf(values) => set_default(prop, "enum", Value::Array(values.clone())),
            Constraint::MinLength(len) => {
                let key = if string_field { "minLength" } else { "minItems" };
                set_default(prop, key, json!(len));
            }
            Constraint::MaxLength(len) => {
                let key = if string_field { "maxLength" } else { "maxItems" };
                set_default(prop, key, json!(len));
            }
            Constraint::Pattern(pattern) => {
                if is_ecma_pattern(pattern) {
                    set_default(prop, "pattern", json!(pattern));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_pattern_gate() {
        assert!(is_ecma_pattern(r"^[a-z]+$"));
        assert!(is_ecma_pattern(r"\bword\b"));
        assert!(!is_ecma_pattern(r"(?P<name>\d+)"));
        assert!(!is_ecma_pattern(r"(?i)case"));
        assert!(!is_ecma_pattern(r"\Astart"));
    }

    #[test]
    fn test_length_keywords_follow_field_type() {
        let constraints = [Constraint::MinLength(1), Constraint::MaxLength(8)];

        let mut prop = Map::new();
        apply_constraints(&mut prop, &constraints, true);
        assert_eq!(prop.get("minLength"), Some(&json!(1)));
        assert_eq!(prop.get("maxLength"), Some(&json!(8)));

        let mut prop = Map::new();
        apply_constraints(&mut prop, &constraints, false);
        assert_eq!(prop.get("minItems"), Some(&json!(1)));
        assert_eq!(prop.get("maxItems"), Some(&json!(8)));
    }

    #[test]
    fn test_existing_keys_win() {
        let mut prop = Map::new();
        prop.insert("minimum".into(), json!(10.0));
        apply_constraints(&mut prop, &[Constraint::Ge(0.0)], false);
        assert_eq!(prop.get("minimum"), Some(&json!(10.0)));
    }

    #[test]
    fn test_unsupported_pattern_is_dropped() {
        let mut prop = Map::new();
        apply_constraints(&mut prop, &[Constraint::Pattern(r"(?P<x>a)")], true);
        assert!(prop.get("pattern").is_none());
    }
}
