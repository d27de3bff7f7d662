use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::path::DocPath;

/// One write in an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Creates a document; fails the batch if the path is already occupied.
    Create { path: DocPath, doc: Document },
    /// Creates or replaces a document.
    Set { path: DocPath, doc: Document },
    /// Merges top-level fields into an existing document; fails the batch
    /// if the document is absent.
    Update {
        path: DocPath,
        fields: Map<String, Value>,
    },
    /// Adds `by` to a numeric field of an existing document. A negative
    /// `by` decrements. Fails the batch if the document is absent or the
    /// field is not a number.
    Increment {
        path: DocPath,
        field: String,
        by: Decimal,
    },
    /// Deletes a document; fails the batch if it is absent.
    Delete { path: DocPath },
}

/// An ordered set of writes applied together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, path: DocPath, doc: Document) -> Self {
        self.ops.push(WriteOp::Create { path, doc });
        self
    }

    pub fn set(mut self, path: DocPath, doc: Document) -> Self {
        self.ops.push(WriteOp::Set { path, doc });
        self
    }

    pub fn update(mut self, path: DocPath, fields: Map<String, Value>) -> Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn increment(mut self, path: DocPath, field: impl Into<String>, by: Decimal) -> Self {
        self.ops.push(WriteOp::Increment {
            path,
            field: field.into(),
            by,
        });
        self
    }

    pub fn delete(mut self, path: DocPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    /// Appends already-built ops (used when composing a batch from several
    /// services).
    pub fn extend(mut self, ops: impl IntoIterator<Item = WriteOp>) -> Self {
        self.ops.extend(ops);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
