//! Key and value-type checks for configuration tables
//!
//! Compares a parsed TOML table with a reference table before
//! deserialization so a bad config file reports every missing key,
//! unknown key and mistyped value at once instead of the first serde
//! error.

use std::collections::BTreeSet;

use toml::{Table, Value};
use tracing::warn;

/// Schema check errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing and/or invalid key in {location} (missing: {missing:?}, invalid: {invalid:?})")]
    Keys {
        location: String,
        missing: Vec<String>,
        invalid: Vec<String>,
    },

    #[error("incorrect type for property value(s) in {location}: {}", format_mismatches(.mismatches))]
    ValueTypes {
        location: String,
        mismatches: Vec<(String, &'static str)>,
    },

    #[error("{location}: expected a mapping")]
    NotATable { location: String },

    #[error("missing section '{0}'")]
    MissingSection(String),
}

fn format_mismatches(mismatches: &[(String, &'static str)]) -> String {
    mismatches
        .iter()
        .map(|(key, expected)| format!("'{}' should be '{}'", key, expected))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable name of a TOML value's type.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Integer(_) | Value::Float(_) => "number",
        Value::Boolean(_) => "true/false",
        Value::Datetime(_) => "datetime",
        Value::Array(_) => "sequence",
        Value::Table(_) => "mapping",
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    type_name(a) == type_name(b)
}

/// Check that `table` has exactly the keys of `reference`, with values of
/// the same types.
///
/// Key problems are reported before type problems; only keys present in
/// both tables are type-checked.
pub fn check_keys_and_value_types(
    table: &Table,
    reference: &Table,
    location: &str,
) -> Result<(), SchemaError> {
    let ref_keys: BTreeSet<&String> = reference.keys().collect();
    let keys: BTreeSet<&String> = table.keys().collect();

    let missing: Vec<String> = ref_keys.difference(&keys).map(|k| k.to_string()).collect();
    let invalid: Vec<String> = keys.difference(&ref_keys).map(|k| k.to_string()).collect();

    if !missing.is_empty() {
        warn!(location, keys = ?missing, "missing keys");
    }
    if !invalid.is_empty() {
        warn!(location, keys = ?invalid, "invalid keys");
    }

    let mut mismatches = Vec::new();
    for (key, expected) in reference {
        let Some(actual) = table.get(key) else {
            continue;
        };
        if !same_type(actual, expected) {
            let expected_name = type_name(expected);
            warn!(location, key = %key, expected = expected_name, "wrong value type");
            mismatches.push((key.clone(), expected_name));
        }
    }

    if !missing.is_empty() || !invalid.is_empty() {
        return Err(SchemaError::Keys {
            location: location.to_string(),
            missing,
            invalid,
        });
    }
    if !mismatches.is_empty() {
        return Err(SchemaError::ValueTypes {
            location: location.to_string(),
            mismatches,
        });
    }
    Ok(())
}

/// Extract a sub-table of a parsed document, or fail naming the location.
pub fn table_at<'a>(value: &'a Value, location: &str) -> Result<&'a Table, SchemaError> {
    value.as_table().ok_or_else(|| SchemaError::NotATable {
        location: location.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> Table {
        src.parse::<Table>().unwrap()
    }

    fn reference() -> Table {
        table(
            r#"
            host = ""
            port = 0
            verify = true
            "#,
        )
    }

    #[test]
    fn test_matching_table() {
        let t = table(
            r#"
            host = "vcd.example.com"
            port = 443
            verify = false
            "#,
        );
        assert!(check_keys_and_value_types(&t, &reference(), "vcd").is_ok());
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        let t = table(
            r#"
            host = "vcd.example.com"
            verify = false
            colour = "blue"
            "#,
        );
        match check_keys_and_value_types(&t, &reference(), "vcd") {
            Err(SchemaError::Keys {
                missing, invalid, ..
            }) => {
                assert_eq!(missing, vec!["port".to_string()]);
                assert_eq!(invalid, vec!["colour".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_value_type() {
        let t = table(
            r#"
            host = "vcd.example.com"
            port = "443"
            verify = "yes"
            "#,
        );
        match check_keys_and_value_types(&t, &reference(), "vcd") {
            Err(SchemaError::ValueTypes { mismatches, .. }) => {
                assert_eq!(
                    mismatches,
                    vec![
                        ("port".to_string(), "number"),
                        ("verify".to_string(), "true/false"),
                    ]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_float_and_integer_are_both_numbers() {
        let t = table(
            r#"
            host = "h"
            port = 1.5
            verify = true
            "#,
        );
        assert!(check_keys_and_value_types(&t, &reference(), "vcd").is_ok());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&Value::Array(vec![])), "sequence");
        assert_eq!(type_name(&Value::Table(Table::new())), "mapping");
    }
}
