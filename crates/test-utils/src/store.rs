//! # Memory Store
//!
//! A `DocumentStore` that keeps collections in memory and evaluates compiled
//! queries the way a document database would.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use support_store::{
    Cmp, Condition, Direction, Document, DocumentStore, FilterTree, ID_FIELD, Id, Query,
    QueryOptions, StoreError, Test, Value,
};
use tokio::sync::RwLock;

/// In-memory document store. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    latency: Option<Duration>,
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct Collections {
    documents: HashMap<String, Vec<Document>>,
    unique: HashMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before touching data.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the store going away (`true`) or coming back (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// The number of store calls that reached the data.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Insert `documents` into `collection` directly, bypassing unique
    /// indexes.
    pub async fn seed(&self, collection: &str, documents: impl IntoIterator<Item = Json>) {
        let mut inner = self.inner.write().await;
        let stored = inner.documents.entry(collection.to_string()).or_default();
        stored.extend(documents.into_iter().filter_map(|doc| match doc {
            Json::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Every document in `collection`, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner.read().await.documents.get(collection).cloned().unwrap_or_default()
    }

    async fn enter(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()).into());
        }
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn ensure_unique(&self, collection: &str, field: &str) -> Result<()> {
        self.enter().await?;
        let mut inner = self.inner.write().await;
        inner.unique.entry(collection.to_string()).or_default().insert(field.to_string());
        Ok(())
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        self.enter().await?;
        let inner = self.inner.read().await;
        let Some(stored) = inner.documents.get(collection) else {
            return Ok(vec![]);
        };

        let found = stored.iter().filter(|doc| selects(&query.filter, doc)).cloned().collect();
        Ok(paginate(found, &query.options))
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        self.enter().await?;
        let mut inner = self.inner.write().await;
        inner.check_unique(collection, &document, None)?;
        inner.documents.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &Id, document: Document) -> Result<bool> {
        self.enter().await?;
        let mut inner = self.inner.write().await;

        let id = Json::String(id.to_string());
        let Some(position) = inner
            .documents
            .get(collection)
            .and_then(|docs| docs.iter().position(|doc| doc.get(ID_FIELD) == Some(&id)))
        else {
            return Ok(false);
        };
        inner.check_unique(collection, &document, Some(position))?;

        let docs =
            inner.documents.get_mut(collection).ok_or_else(|| anyhow!("missing {collection}"))?;
        docs[position] = document;
        Ok(true)
    }
}

impl Collections {
    // Identity is always unique. `skip` is the position of the document being
    // replaced.
    fn check_unique(
        &self, collection: &str, document: &Document, skip: Option<usize>,
    ) -> Result<()> {
        let Some(stored) = self.documents.get(collection) else {
            return Ok(());
        };
        let declared = self.unique.get(collection);
        let fields =
            std::iter::once(ID_FIELD).chain(declared.into_iter().flatten().map(String::as_str));

        for field in fields {
            let Some(value) = document.get(field) else {
                continue;
            };
            let duplicate = stored
                .iter()
                .enumerate()
                .any(|(i, doc)| Some(i) != skip && doc.get(field) == Some(value));
            if duplicate {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn selects(tree: &FilterTree, document: &Document) -> bool {
    match tree {
        FilterTree::All => true,
        FilterTree::And(children) => children.iter().all(|child| selects(child, document)),
        FilterTree::Or(children) => children.iter().any(|child| selects(child, document)),
        FilterTree::Condition(condition) => check(condition, document),
    }
}

fn check(condition: &Condition, document: &Document) -> bool {
    let field = lookup(document, &condition.column);
    let any = |pred: &dyn Fn(&Json) -> bool| field.is_some_and(|f| candidates(f).any(pred));

    match &condition.test {
        Test::Exists(exists) => field.is_some() == *exists,
        Test::In(values) => any(&|c| values.iter().any(|v| equal(c, v))),
        Test::NotIn(values) => !any(&|c| values.iter().any(|v| equal(c, v))),
        Test::Compare(Cmp::Eq, value) => any(&|c| equal(c, value)),
        Test::Compare(Cmp::Ne, value) => !any(&|c| equal(c, value)),
        Test::Compare(cmp, value) => any(&|c| {
            let ordering = compare(c, value);
            match cmp {
                Cmp::Gt => ordering == Some(Ordering::Greater),
                Cmp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                Cmp::Lt => ordering == Some(Ordering::Less),
                Cmp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                Cmp::Eq | Cmp::Ne => false,
            }
        }),
    }
}

// Dotted paths descend into nested objects. A null field is absent, matching
// `Test::Exists`.
fn lookup<'a>(document: &'a Document, column: &str) -> Option<&'a Json> {
    let mut parts = column.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    (!current.is_null()).then_some(current)
}

// Array fields match when any element matches.
fn candidates(field: &Json) -> Box<dyn Iterator<Item = &Json> + '_> {
    match field {
        Json::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn equal(field: &Json, value: &Value) -> bool {
    compare(field, value) == Some(Ordering::Equal)
}

// Stored JSON is read as the kind of the value it is tested against, so a
// string field holds an identity or timestamp only when compared with one.
// Mixed kinds never compare.
fn compare(field: &Json, value: &Value) -> Option<Ordering> {
    let field = match (field, value) {
        (Json::String(s), Value::Id(_)) => Value::Id(Id::parse(s).ok()?),
        (Json::String(s), Value::Timestamp(_)) => Value::Timestamp(timestamp(s)?),
        _ => serde_json::from_value(field.clone()).ok()?,
    };
    field.compare(value)
}

fn timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|ts| ts.with_timezone(&Utc))
}

// Timestamps are stored as RFC 3339 strings and sort as instants.
fn order(a: &Json, b: &Json) -> Ordering {
    if let (Json::String(a), Json::String(b)) = (a, b) {
        return match (timestamp(a), timestamp(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        };
    }
    serde_json::from_value::<Value>(b.clone())
        .ok()
        .and_then(|b| compare(a, &b))
        .unwrap_or(Ordering::Equal)
}

// Sort, then skip, then limit. Missing fields sort first.
fn paginate(mut found: Vec<Document>, options: &QueryOptions) -> Vec<Document> {
    if !options.sort.is_empty() {
        found.sort_by(|a, b| {
            for sort in &options.sort {
                let ordering = match (lookup(a, &sort.column), lookup(b, &sort.column)) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(a), Some(b)) => order(a, b),
                };
                let ordering = match sort.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    let skip = usize::try_from(options.skip.unwrap_or_default()).unwrap_or(usize::MAX);
    let limit = options.limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
    found.into_iter().skip(skip).take(limit).collect()
}
