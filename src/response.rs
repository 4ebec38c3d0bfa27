//! Hierarchical response trees.
//!
//! The transient object graph callers send and receive. Trees are parsed
//! from transport bytes, flattened into records on write, and rebuilt by the
//! denormalizer on read; the store never retains one.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::TransportError;
use crate::record::{ScalarValue, TYPENAME_FIELD};

/// A node in a hierarchical response tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Null,
    Scalar(ScalarValue),
    Object(ResponseObject),
    List(Vec<ResponseValue>),
}

/// An object node, tagged with its entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseObject {
    typename: String,
    fields: BTreeMap<String, ResponseValue>,
}

impl ResponseObject {
    pub fn new(typename: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion, for constructing trees by hand.
    pub fn with_field(mut self, name: impl Into<String>, value: ResponseValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: ResponseValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ResponseValue> {
        self.fields.get(name)
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ResponseValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a response body into a tagged tree.
    ///
    /// Every object node must carry a `__typename` tag; anything else is a
    /// malformed payload.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| TransportError::malformed(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Convert an already-parsed JSON value into a tagged tree.
    pub fn from_json_value(value: Value) -> Result<Self, TransportError> {
        let Value::Object(map) = value else {
            return Err(TransportError::malformed("object node is not a JSON object"));
        };

        let mut typename = None;
        let mut object_fields = BTreeMap::new();
        for (name, value) in map {
            if name == TYPENAME_FIELD {
                match value {
                    Value::String(tag) => typename = Some(tag),
                    _ => {
                        return Err(TransportError::malformed(
                            "__typename tag is not a string",
                        ));
                    }
                }
            } else {
                object_fields.insert(name, convert_value(value)?);
            }
        }

        let Some(typename) = typename else {
            return Err(TransportError::malformed(
                "object node is missing its __typename tag",
            ));
        };

        Ok(Self {
            typename,
            fields: object_fields,
        })
    }
}

fn convert_value(value: Value) -> Result<ResponseValue, TransportError> {
    Ok(match value {
        Value::Null => ResponseValue::Null,
        Value::Bool(value) => ResponseValue::Scalar(ScalarValue::Bool(value)),
        Value::Number(value) => ResponseValue::Scalar(ScalarValue::Number(value)),
        Value::String(value) => ResponseValue::Scalar(ScalarValue::String(value)),
        Value::Array(items) => ResponseValue::List(
            items
                .into_iter()
                .map(convert_value)
                .collect::<Result<_, _>>()?,
        ),
        object @ Value::Object(_) => {
            ResponseValue::Object(ResponseObject::from_json_value(object)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_nested_objects_and_lists() {
        let body = json!({
            "__typename": "Hero",
            "id": "1",
            "name": "Luke",
            "friends": [
                {"__typename": "Hero", "id": "2", "name": "Han"},
                {"__typename": "Droid", "id": "3", "name": "R2-D2"}
            ]
        })
        .to_string();

        let tree = ResponseObject::from_json_bytes(body.as_bytes()).expect("valid payload");

        assert_eq!(tree.typename(), "Hero");
        assert_eq!(
            tree.get("name"),
            Some(&ResponseValue::Scalar(ScalarValue::from("Luke")))
        );

        let Some(ResponseValue::List(friends)) = tree.get("friends") else {
            panic!("friends should parse as a list");
        };
        assert_eq!(friends.len(), 2);
        let ResponseValue::Object(droid) = &friends[1] else {
            panic!("friend should parse as an object");
        };
        assert_eq!(droid.typename(), "Droid");
    }

    #[test]
    fn missing_typename_is_malformed() {
        let body = json!({"id": "1", "name": "Luke"}).to_string();

        let err = ResponseObject::from_json_bytes(body.as_bytes()).unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }

    #[test]
    fn missing_typename_on_nested_object_is_malformed() {
        let body = json!({
            "__typename": "Hero",
            "id": "1",
            "droid": {"id": "3"}
        })
        .to_string();

        let err = ResponseObject::from_json_bytes(body.as_bytes()).unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }

    #[test]
    fn non_object_root_is_malformed() {
        let err = ResponseObject::from_json_bytes(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = ResponseObject::from_json_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }

    #[test]
    fn scalar_kinds_round_trip() {
        let body = json!({
            "__typename": "Probe",
            "active": true,
            "count": 7,
            "label": "alpha",
            "missing": null
        })
        .to_string();

        let tree = ResponseObject::from_json_bytes(body.as_bytes()).expect("valid payload");

        assert_eq!(
            tree.get("active"),
            Some(&ResponseValue::Scalar(ScalarValue::Bool(true)))
        );
        assert_eq!(
            tree.get("count"),
            Some(&ResponseValue::Scalar(ScalarValue::from(7i64)))
        );
        assert_eq!(tree.get("missing"), Some(&ResponseValue::Null));
    }
}
