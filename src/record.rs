//! Flat records, the unit of storage in the record store.
//!
//! A record maps field names to scalar values, references to other records,
//! lists, or null. Cross-record edges are symbolic key lookups, never owning
//! pointers, so reference cycles between entities carry no lifetime cost.

use std::collections::BTreeMap;

use serde_json::Number;

use crate::key::IdentityKey;

/// Field name under which every record stores its entity type tag.
pub const TYPENAME_FIELD: &str = "__typename";

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Number(Number),
    String(String),
}

impl ScalarValue {
    /// Render the scalar as an identity-key segment.
    pub fn as_key_segment(&self) -> String {
        match self {
            ScalarValue::Bool(value) => value.to_string(),
            ScalarValue::Number(value) => value.to_string(),
            ScalarValue::String(value) => value.clone(),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(Number::from(value))
    }
}

/// A single stored field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Scalar(ScalarValue),
    /// Symbolic edge to another record. May dangle after eviction; a
    /// dangling reference reads as a miss, never a crash.
    Reference(IdentityKey),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Shorthand for a string scalar field.
    pub fn string(value: impl Into<String>) -> Self {
        FieldValue::Scalar(ScalarValue::String(value.into()))
    }

    /// Shorthand for a reference field.
    pub fn reference(key: impl Into<IdentityKey>) -> Self {
        FieldValue::Reference(key.into())
    }
}

/// Flat field map stored per identity key.
///
/// Owned exclusively by the record store; readers always receive clones or
/// denormalized views, never live handles into the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entity type tag, if the record carries a well-formed one.
    pub fn typename(&self) -> Option<&str> {
        match self.fields.get(TYPENAME_FIELD) {
            Some(FieldValue::Scalar(ScalarValue::String(typename))) => Some(typename),
            _ => None,
        }
    }

    /// Field-wise, non-destructive merge.
    ///
    /// Every field present in `incoming` overwrites; every field absent
    /// (because the triggering query did not request it) is left untouched.
    /// Returns true if any field actually changed value.
    pub fn merge_from(&mut self, incoming: &Record) -> bool {
        let mut changed = false;
        for (name, value) in &incoming.fields {
            match self.fields.get(name) {
                Some(existing) if existing == value => {}
                _ => {
                    self.fields.insert(name.clone(), value.clone());
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, FieldValue)]) -> Record {
        let mut record = Record::new();
        for (name, value) in fields {
            record.set(*name, value.clone());
        }
        record
    }

    #[test]
    fn merge_overwrites_present_fields() {
        let mut existing = record(&[("name", FieldValue::string("R2-D2"))]);
        let incoming = record(&[("name", FieldValue::string("Artoo"))]);

        assert!(existing.merge_from(&incoming));
        assert_eq!(existing.get("name"), Some(&FieldValue::string("Artoo")));
    }

    #[test]
    fn merge_preserves_absent_fields() {
        let mut existing = record(&[
            ("id", FieldValue::string("1")),
            ("name", FieldValue::string("Luke")),
        ]);
        let incoming = record(&[
            ("id", FieldValue::string("1")),
            ("episode", FieldValue::string("EMPIRE")),
        ]);

        assert!(existing.merge_from(&incoming));

        assert_eq!(existing.get("name"), Some(&FieldValue::string("Luke")));
        assert_eq!(existing.get("episode"), Some(&FieldValue::string("EMPIRE")));
        assert_eq!(existing.len(), 3);
    }

    #[test]
    fn merge_reports_unchanged_when_values_equal() {
        let mut existing = record(&[("id", FieldValue::string("1"))]);
        let incoming = record(&[("id", FieldValue::string("1"))]);

        assert!(!existing.merge_from(&incoming));
    }

    #[test]
    fn merge_treats_null_as_a_value() {
        let mut existing = record(&[("home", FieldValue::string("Tatooine"))]);
        let incoming = record(&[("home", FieldValue::Null)]);

        assert!(existing.merge_from(&incoming));
        assert_eq!(existing.get("home"), Some(&FieldValue::Null));
    }

    #[test]
    fn typename_requires_string_scalar() {
        let tagged = record(&[(TYPENAME_FIELD, FieldValue::string("Hero"))]);
        assert_eq!(tagged.typename(), Some("Hero"));

        let untagged = record(&[("id", FieldValue::string("1"))]);
        assert_eq!(untagged.typename(), None);

        let malformed = record(&[(TYPENAME_FIELD, FieldValue::Null)]);
        assert_eq!(malformed.typename(), None);
    }

    #[test]
    fn scalar_key_segments() {
        assert_eq!(ScalarValue::from("1000").as_key_segment(), "1000");
        assert_eq!(ScalarValue::from(42i64).as_key_segment(), "42");
        assert_eq!(ScalarValue::from(true).as_key_segment(), "true");
    }
}
