//! The storage contract and its in-memory implementation.
//!
//! `MemoryStore` keeps every document in one ordered map behind a `RwLock`.
//! A commit stages the whole batch on a copy of the map and swaps it in only
//! if every op validated, so readers never observe a partially applied
//! batch and a failed commit leaves the store untouched.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::batch::{WriteBatch, WriteOp};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;
use crate::query::{Direction, Query, QueryScope};

/// A document read back from the store, together with its address.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: DocPath,
    pub doc: Document,
}

/// The storage operations the business logic is written against.
pub trait DocumentStore: Send + Sync {
    /// Reads one document, or `None` if it does not exist.
    fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    /// Runs a read query and returns matching snapshots.
    fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>>;

    /// Applies a write batch atomically. On error, nothing was applied.
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocPath, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents (test/diagnostic helper).
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<DocPath, Document>> {
        self.docs.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        Ok(self.read_guard().get(path).cloned())
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>> {
        let docs = self.read_guard();

        let mut matches: Vec<Snapshot> = docs
            .iter()
            .filter(|(path, _)| match &query.scope {
                QueryScope::Collection(collection) => path.parent() == *collection,
                QueryScope::Group(name) => path.parent().name() == name,
            })
            .filter(|(_, doc)| {
                query
                    .filters
                    .iter()
                    .all(|(field, expected)| doc.get(field) == Some(expected))
            })
            .map(|(path, doc)| Snapshot {
                path: path.clone(),
                doc: doc.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            matches.sort_by(|a, b| {
                let ordering = compare_fields(a.doc.get(field), b.doc.get(field))
                    .then_with(|| a.path.cmp(&b.path));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(cursor) = &query.start_after {
            match matches.iter().position(|s| s.path == *cursor) {
                Some(idx) => {
                    matches.drain(..=idx);
                }
                None => matches.clear(),
            }
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        Ok(matches)
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);

        // Stage on a copy so later ops in the batch see earlier ones, and a
        // failure anywhere discards the whole staged state.
        let mut staged = docs.clone();
        let op_count = batch.len();

        for op in batch.into_ops() {
            apply_op(&mut staged, op)?;
        }

        *docs = staged;
        tracing::debug!(ops = op_count, "committed write batch");
        Ok(())
    }
}

fn apply_op(staged: &mut BTreeMap<DocPath, Document>, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Create { path, doc } => {
            if staged.contains_key(&path) {
                return Err(StoreError::AlreadyExists(path));
            }
            staged.insert(path, doc);
        }
        WriteOp::Set { path, doc } => {
            staged.insert(path, doc);
        }
        WriteOp::Update { path, fields } => {
            let doc = staged
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            doc.merge(fields);
        }
        WriteOp::Increment { path, field, by } => {
            let doc = staged
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            let current = match doc.get(&field) {
                Some(Value::Number(n)) => n.as_f64().and_then(Decimal::from_f64),
                _ => None,
            }
            .ok_or_else(|| StoreError::FieldNotNumeric {
                path: path.clone(),
                field: field.clone(),
            })?;

            let next = current
                .checked_add(by)
                .and_then(|d| d.to_f64())
                .and_then(serde_json::Number::from_f64)
                .ok_or(StoreError::NumberRange)?;
            doc.set(&field, Value::Number(next));
        }
        WriteOp::Delete { path } => {
            if staged.remove(&path).is_none() {
                return Err(StoreError::NotFound(path));
            }
        }
    }
    Ok(())
}

/// Orders JSON scalars for `order_by`: absent < null < bool < number <
/// string < everything else. RFC 3339 timestamps are strings, so they order
/// chronologically.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
