//! Response normalization: hierarchical trees into flat records.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::key::IdentityKey;
use crate::record::{FieldValue, Record, ScalarValue, TYPENAME_FIELD};
use crate::resolver::KeyResolver;
use crate::response::{ResponseObject, ResponseValue};

/// The flat output of normalizing one response tree: every reachable object
/// as a record, plus the key the tree's root landed under.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    root_key: IdentityKey,
    records: BTreeMap<IdentityKey, Record>,
}

impl NormalizedDocument {
    pub fn root_key(&self) -> &IdentityKey {
        &self.root_key
    }

    pub fn records(&self) -> impl Iterator<Item = (&IdentityKey, &Record)> {
        self.records.iter()
    }

    pub fn record(&self, key: &IdentityKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Flatten a response tree into identity-keyed records.
///
/// Depth-first: children are normalized before their parent record is
/// finalized, so every reference a record carries points at a key that
/// already exists in the document. Object fields become references, lists
/// of objects become lists of references, and objects the resolver cannot
/// identify key under a synthesized path rooted at `root_path`. An entity
/// occurring more than once in one response merges into a single record.
pub fn normalize(
    root: &ResponseObject,
    resolver: &KeyResolver,
    root_path: &str,
) -> NormalizedDocument {
    let mut records = BTreeMap::new();
    let root_key = visit_object(root, resolver, root_path, &mut records);
    NormalizedDocument { root_key, records }
}

fn visit_object(
    object: &ResponseObject,
    resolver: &KeyResolver,
    path: &str,
    records: &mut BTreeMap<IdentityKey, Record>,
) -> IdentityKey {
    let key = resolver
        .resolve(object)
        .unwrap_or_else(|| IdentityKey::new(path));

    let mut record = Record::new();
    record.set(
        TYPENAME_FIELD,
        FieldValue::Scalar(ScalarValue::String(object.typename().to_string())),
    );
    for (name, value) in object.fields() {
        let field_path = format!("{path}.{name}");
        record.set(name, visit_value(value, resolver, &field_path, records));
    }

    match records.entry(key.clone()) {
        Entry::Occupied(mut occupied) => {
            occupied.get_mut().merge_from(&record);
        }
        Entry::Vacant(vacant) => {
            vacant.insert(record);
        }
    }
    key
}

fn visit_value(
    value: &ResponseValue,
    resolver: &KeyResolver,
    path: &str,
    records: &mut BTreeMap<IdentityKey, Record>,
) -> FieldValue {
    match value {
        ResponseValue::Null => FieldValue::Null,
        ResponseValue::Scalar(scalar) => FieldValue::Scalar(scalar.clone()),
        ResponseValue::Object(object) => {
            FieldValue::Reference(visit_object(object, resolver, path, records))
        }
        ResponseValue::List(items) => FieldValue::List(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    visit_value(item, resolver, &format!("{path}.{index}"), records)
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tree(body: serde_json::Value) -> ResponseObject {
        ResponseObject::from_json_value(body).expect("test payload should be well-formed")
    }

    #[test]
    fn flat_identifiable_object() {
        let root = tree(json!({"__typename": "Hero", "id": "1", "name": "Luke"}));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        assert_eq!(document.root_key(), &IdentityKey::entity("Hero", "1"));
        assert_eq!(document.len(), 1);

        let record = document.record(document.root_key()).expect("root record");
        assert_eq!(record.get("name"), Some(&FieldValue::string("Luke")));
        assert_eq!(record.typename(), Some("Hero"));
    }

    #[test]
    fn nested_object_becomes_reference() {
        let root = tree(json!({
            "__typename": "Hero",
            "id": "1",
            "droid": {"__typename": "Droid", "id": "3", "name": "R2-D2"}
        }));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        assert_eq!(document.len(), 2);
        let hero = document.record(&IdentityKey::entity("Hero", "1")).expect("hero");
        assert_eq!(
            hero.get("droid"),
            Some(&FieldValue::reference(IdentityKey::entity("Droid", "3")))
        );
        assert!(document.record(&IdentityKey::entity("Droid", "3")).is_some());
    }

    #[test]
    fn list_of_objects_becomes_list_of_references() {
        let root = tree(json!({
            "__typename": "Hero",
            "id": "1",
            "friends": [
                {"__typename": "Hero", "id": "2", "name": "Han"},
                {"__typename": "Hero", "id": "4", "name": "Leia"}
            ]
        }));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        let hero = document.record(&IdentityKey::entity("Hero", "1")).expect("hero");
        assert_eq!(
            hero.get("friends"),
            Some(&FieldValue::List(vec![
                FieldValue::reference(IdentityKey::entity("Hero", "2")),
                FieldValue::reference(IdentityKey::entity("Hero", "4")),
            ]))
        );
        assert_eq!(document.len(), 3);
    }

    #[test]
    fn non_identifiable_nodes_key_under_paths() {
        let root = tree(json!({
            "__typename": "Hero",
            "id": "1",
            "stats": {"__typename": "Stats", "height": 172}
        }));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        let hero = document.record(&IdentityKey::entity("Hero", "1")).expect("hero");
        assert_eq!(
            hero.get("stats"),
            Some(&FieldValue::reference(IdentityKey::new("query:hero.stats")))
        );
        assert!(document.record(&IdentityKey::new("query:hero.stats")).is_some());
    }

    #[test]
    fn path_keys_number_list_elements() {
        let root = tree(json!({
            "__typename": "Hero",
            "id": "1",
            "appearances": [
                {"__typename": "Appearance", "film": "ANH"},
                {"__typename": "Appearance", "film": "ESB"}
            ]
        }));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        let hero = document.record(&IdentityKey::entity("Hero", "1")).expect("hero");
        assert_eq!(
            hero.get("appearances"),
            Some(&FieldValue::List(vec![
                FieldValue::reference(IdentityKey::new("query:hero.appearances.0")),
                FieldValue::reference(IdentityKey::new("query:hero.appearances.1")),
            ]))
        );
    }

    #[test]
    fn duplicate_entity_merges_within_one_response() {
        let root = tree(json!({
            "__typename": "Hero",
            "id": "1",
            "friend": {"__typename": "Hero", "id": "2", "name": "Han"},
            "rival": {"__typename": "Hero", "id": "2", "ship": "Falcon"}
        }));
        let document = normalize(&root, &KeyResolver::id(), "query:hero");

        let han = document.record(&IdentityKey::entity("Hero", "2")).expect("han");
        assert_eq!(han.get("name"), Some(&FieldValue::string("Han")));
        assert_eq!(han.get("ship"), Some(&FieldValue::string("Falcon")));
    }

    #[test]
    fn none_resolver_keys_everything_by_path() {
        let root = tree(json!({"__typename": "Hero", "id": "1", "name": "Luke"}));
        let document = normalize(&root, &KeyResolver::None, "query:hero");

        assert_eq!(document.root_key(), &IdentityKey::new("query:hero"));
    }
}
