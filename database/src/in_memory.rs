//! A document engine living in the process memory
//!
//! It understands the subset of the MongoDB query language the service relies on:
//! equality filters, `$set` (with positional array paths), `$push` and `$pull`.
//! Positional `$set` follows the server semantics: setting past the end of an array
//! backfills the gap with `null` entries, up to the same index limit as the server.

use std::time::Duration;

use dashmap::DashMap;
use mongodb::bson::Bson;
use mongodb::bson::Document;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use crate::DatabaseError;
use crate::UpdateOutcome;

#[derive(Debug, Default)]
pub(crate) struct InMemoryEngine {
    collections: DashMap<String, Vec<Document>>,
    latency: Option<Duration>,
}

impl InMemoryEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every operation sleeps for `latency` before touching the data
    #[cfg(any(test, feature = "testing"))]
    pub(crate) fn with_latency(latency: Duration) -> Self {
        Self {
            collections: DashMap::new(),
            latency: Some(latency),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    pub(crate) async fn find(
        &self,
        namespace: &str,
        filter: &Document,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.simulate_latency().await;
        Ok(self
            .collections
            .get(namespace)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| matches(document, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    pub(crate) async fn find_one(
        &self,
        namespace: &str,
        filter: &Document,
    ) -> Result<Option<Document>, DatabaseError> {
        self.simulate_latency().await;
        Ok(self.collections.get(namespace).and_then(|documents| {
            documents
                .iter()
                .find(|document| matches(document, filter))
                .cloned()
        }))
    }

    pub(crate) async fn insert_one(
        &self,
        namespace: &str,
        document: Document,
    ) -> Result<Bson, DatabaseError> {
        self.simulate_latency().await;
        let (id, document) = match document.get("_id") {
            Some(id) => (id.clone(), document),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                let mut with_id = doc! { "_id": id.clone() };
                with_id.extend(document);
                (id, with_id)
            }
        };
        let mut documents = self.collections.entry(namespace.to_owned()).or_default();
        if documents
            .iter()
            .any(|existing| existing.get("_id").is_some_and(|other| values_equal(other, &id)))
        {
            return Err(DatabaseError::DuplicateKey(id));
        }
        documents.push(document);
        Ok(id)
    }

    pub(crate) async fn update_one(
        &self,
        namespace: &str,
        filter: &Document,
        update: &Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        self.simulate_latency().await;
        let Some(mut documents) = self.collections.get_mut(namespace) else {
            return Ok(UpdateOutcome::default());
        };
        let Some(target) = documents
            .iter_mut()
            .find(|document| matches(document, filter))
        else {
            return Ok(UpdateOutcome::default());
        };
        // Work on a copy so that a failing operator leaves the document untouched
        let mut updated = target.clone();
        apply_update(&mut updated, update)?;
        let modified = updated != *target;
        if modified {
            *target = updated;
        }
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    pub(crate) async fn delete_one(
        &self,
        namespace: &str,
        filter: &Document,
    ) -> Result<u64, DatabaseError> {
        self.simulate_latency().await;
        let Some(mut documents) = self.collections.get_mut(namespace) else {
            return Ok(0);
        };
        match documents.iter().position(|document| matches(document, filter)) {
            Some(position) => {
                documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(f64::from(*value)),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

/// Equality as the server sees it: numbers compare by value whatever their BSON type
fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (numeric(left), numeric(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| match (document.get(field), expected) {
            (None, Bson::Null) => true,
            (None, _) => false,
            (Some(actual), expected) => values_equal(actual, expected),
        })
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), DatabaseError> {
    for (operator, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| DatabaseError::InvalidUpdate {
                operator: operator.clone(),
                path: String::new(),
                reason: format!("expected a document, got {fields}"),
            })?;
        for (path, value) in fields {
            let result = match operator.as_str() {
                "$set" => {
                    let segments = path.split('.').collect::<Vec<_>>();
                    set_in_document(document, &segments, value.clone())
                }
                "$push" => push(document, path, value.clone()),
                "$pull" => pull(document, path, value),
                _ => return Err(DatabaseError::UnsupportedOperator(operator.clone())),
            };
            result.map_err(|reason| DatabaseError::InvalidUpdate {
                operator: operator.clone(),
                path: path.clone(),
                reason,
            })?;
        }
    }
    Ok(())
}

fn set_in_document(document: &mut Document, segments: &[&str], value: Bson) -> Result<(), String> {
    let Some((head, rest)) = segments.split_first() else {
        return Err("empty field path".to_owned());
    };
    if rest.is_empty() {
        document.insert(*head, value);
        return Ok(());
    }
    match document.get_mut(*head) {
        Some(child) => set_in_value(child, head, rest, value),
        None => {
            let mut child = Document::new();
            set_in_document(&mut child, rest, value)?;
            document.insert(*head, child);
            Ok(())
        }
    }
}

fn set_in_value(target: &mut Bson, name: &str, segments: &[&str], value: Bson) -> Result<(), String> {
    match target {
        Bson::Document(child) => set_in_document(child, segments, value),
        Bson::Array(items) => set_in_array(items, segments, value),
        other => Err(format!(
            "cannot create field '{}' in element {{{name}: {other}}}",
            segments.first().copied().unwrap_or_default()
        )),
    }
}

/// Highest array index a positional `$set` may create, as enforced by MongoDB
pub(crate) const MAX_BACKFILL_INDEX: usize = 1_500_000;

fn set_in_array(items: &mut Vec<Bson>, segments: &[&str], value: Bson) -> Result<(), String> {
    let Some((head, rest)) = segments.split_first() else {
        return Err("empty field path".to_owned());
    };
    let index = head
        .parse::<usize>()
        .map_err(|_| format!("cannot create field '{head}' in an array"))?;
    if index >= items.len() {
        if index > MAX_BACKFILL_INDEX {
            return Err(format!(
                "can't backfill array to larger than {MAX_BACKFILL_INDEX} elements"
            ));
        }
        items.resize(index, Bson::Null);
        if rest.is_empty() {
            items.push(value);
        } else {
            let mut child = Document::new();
            set_in_document(&mut child, rest, value)?;
            items.push(child.into());
        }
        return Ok(());
    }
    let slot = &mut items[index];
    if rest.is_empty() {
        *slot = value;
        Ok(())
    } else {
        set_in_value(slot, head, rest, value)
    }
}

fn push(document: &mut Document, field: &str, value: Bson) -> Result<(), String> {
    match document.get_mut(field) {
        None => {
            document.insert(field, vec![value]);
            Ok(())
        }
        Some(Bson::Array(items)) => {
            items.push(value);
            Ok(())
        }
        Some(other) => Err(format!(
            "the field '{field}' must be an array but is of type {:?}",
            other.element_type()
        )),
    }
}

fn pull(document: &mut Document, field: &str, condition: &Bson) -> Result<(), String> {
    match document.get_mut(field) {
        None => Ok(()),
        Some(Bson::Array(items)) => {
            items.retain(|item| match (item, condition) {
                (Bson::Document(item), Bson::Document(condition)) => !matches(item, condition),
                (item, condition) => !values_equal(item, condition),
            });
            Ok(())
        }
        Some(_) => Err("cannot apply $pull to a non-array value".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const NAMESPACE: &str = "test.blogs";

    async fn engine_with(document: Document) -> (InMemoryEngine, Bson) {
        let engine = InMemoryEngine::new();
        let id = engine
            .insert_one(NAMESPACE, document)
            .await
            .expect("insertion should succeed");
        (engine, id)
    }

    #[tokio::test]
    async fn insert_generates_an_object_id_first() {
        let (engine, id) = engine_with(doc! { "title": "T" }).await;
        assert!(matches!(id, Bson::ObjectId(_)));
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id.clone() })
            .await
            .unwrap()
            .expect("document should be found");
        assert_eq!(stored.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(stored.get_str("title").unwrap(), "T");
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let id = ObjectId::new();
        let (engine, _) = engine_with(doc! { "_id": id }).await;
        let result = engine.insert_one(NAMESPACE, doc! { "_id": id }).await;
        assert!(matches!(result, Err(DatabaseError::DuplicateKey(_))));
    }

    #[rstest]
    #[case::same_type(doc! { "userId": 42_i64 }, 1)]
    #[case::int32_against_int64(doc! { "userId": 42_i32 }, 1)]
    #[case::double(doc! { "userId": 42.0 }, 1)]
    #[case::other_value(doc! { "userId": 43_i64 }, 0)]
    #[case::missing_field(doc! { "status": 1 }, 0)]
    #[case::null_matches_missing(doc! { "status": Bson::Null }, 1)]
    #[tokio::test]
    async fn find_compares_numbers_by_value(#[case] filter: Document, #[case] expected: usize) {
        let (engine, _) = engine_with(doc! { "userId": 42_i64 }).await;
        let found = engine.find(NAMESPACE, &filter).await.unwrap();
        assert_eq!(found.len(), expected);
    }

    #[tokio::test]
    async fn find_on_unknown_collection_is_empty() {
        let engine = InMemoryEngine::new();
        assert!(engine.find("test.nothing", &doc! {}).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn positional_set_backfills_with_null() {
        let (engine, id) = engine_with(doc! {
            "votes": [{ "isUpvote": true }, { "isUpvote": true }],
        })
        .await;
        let outcome = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id.clone() },
                &doc! { "$set": { "votes.5.isUpvote": false } },
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome {
                matched: 1,
                modified: 1
            }
        );
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.get_array("votes").unwrap(),
            &vec![
                Bson::Document(doc! { "isUpvote": true }),
                Bson::Document(doc! { "isUpvote": true }),
                Bson::Null,
                Bson::Null,
                Bson::Null,
                Bson::Document(doc! { "isUpvote": false }),
            ]
        );
    }

    #[rstest]
    #[case::past_the_limit(MAX_BACKFILL_INDEX + 1)]
    #[case::huge(usize::MAX)]
    #[tokio::test]
    async fn positional_set_refuses_to_backfill_too_far(#[case] index: usize) {
        let (engine, id) = engine_with(doc! { "votes": [{ "isUpvote": true }] }).await;
        let mut set = Document::new();
        set.insert(format!("votes.{index}.isUpvote"), false);
        let result = engine
            .update_one(NAMESPACE, &doc! { "_id": id.clone() }, &doc! { "$set": set })
            .await;
        assert!(matches!(result, Err(DatabaseError::InvalidUpdate { .. })));
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_array("votes").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn positional_set_into_null_entry_fails_and_keeps_document() {
        let (engine, id) = engine_with(doc! { "comments": [Bson::Null] }).await;
        let result = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id.clone() },
                &doc! { "$set": { "title": "changed", "comments.0.text": "hello" } },
            )
            .await;
        assert!(matches!(result, Err(DatabaseError::InvalidUpdate { .. })));
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert!(stored.get("title").is_none());
    }

    #[tokio::test]
    async fn set_with_same_value_is_matched_but_not_modified() {
        let (engine, id) = engine_with(doc! { "title": "T" }).await;
        let outcome = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id },
                &doc! { "$set": { "title": "T" } },
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome {
                matched: 1,
                modified: 0
            }
        );
    }

    #[tokio::test]
    async fn update_without_match_reports_nothing() {
        let (engine, _) = engine_with(doc! { "title": "T" }).await;
        let outcome = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": ObjectId::new() },
                &doc! { "$set": { "title": "T2" } },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
    }

    #[tokio::test]
    async fn push_creates_missing_array() {
        let (engine, id) = engine_with(doc! { "title": "T" }).await;
        engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id.clone() },
                &doc! { "$push": { "votes": { "isUpvote": true } } },
            )
            .await
            .unwrap();
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_array("votes").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn push_onto_scalar_fails() {
        let (engine, id) = engine_with(doc! { "votes": 3 }).await;
        let result = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id },
                &doc! { "$push": { "votes": { "isUpvote": true } } },
            )
            .await;
        assert!(matches!(result, Err(DatabaseError::InvalidUpdate { .. })));
    }

    #[tokio::test]
    async fn pull_removes_matching_sub_documents() {
        let kept = ObjectId::new();
        let removed = ObjectId::new();
        let (engine, id) = engine_with(doc! {
            "comments": [{ "_id": kept, "text": "a" }, { "_id": removed, "text": "b" }],
        })
        .await;
        let outcome = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id.clone() },
                &doc! { "$pull": { "comments": { "_id": removed } } },
            )
            .await
            .unwrap();
        assert_eq!(outcome.modified, 1);
        let stored = engine
            .find_one(NAMESPACE, &doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.get_array("comments").unwrap(),
            &vec![Bson::Document(doc! { "_id": kept, "text": "a" })]
        );
    }

    #[tokio::test]
    async fn unknown_operator_is_rejected() {
        let (engine, id) = engine_with(doc! { "count": 1 }).await;
        let result = engine
            .update_one(
                NAMESPACE,
                &doc! { "_id": id },
                &doc! { "$inc": { "count": 1 } },
            )
            .await;
        assert!(matches!(result, Err(DatabaseError::UnsupportedOperator(op)) if op == "$inc"));
    }

    #[tokio::test]
    async fn delete_removes_only_the_first_match() {
        let engine = InMemoryEngine::new();
        for _ in 0..2 {
            engine
                .insert_one(NAMESPACE, doc! { "status": 1 })
                .await
                .unwrap();
        }
        assert_eq!(
            engine.delete_one(NAMESPACE, &doc! { "status": 1 }).await.unwrap(),
            1
        );
        assert_eq!(engine.find(NAMESPACE, &doc! {}).await.unwrap().len(), 1);
        assert_eq!(
            engine.delete_one(NAMESPACE, &doc! { "status": 2 }).await.unwrap(),
            0
        );
    }
}
