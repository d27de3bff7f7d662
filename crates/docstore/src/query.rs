use serde_json::Value;

use crate::path::{CollectionPath, DocPath};

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// What a query ranges over.
#[derive(Debug, Clone)]
pub enum QueryScope {
    /// One concrete collection.
    Collection(CollectionPath),
    /// Every collection with this terminal name, regardless of parent
    /// (a collection-group scan, used for cross-tenant admin views).
    Group(String),
}

/// A read query: equality filters, optional ordering, limit, and a
/// start-after cursor for pagination.
///
/// Filters match top-level fields by strict JSON equality. When no ordering
/// is requested, results come back in document-path order, which is stable
/// across calls and therefore safe to paginate.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) scope: QueryScope,
    pub(crate) filters: Vec<(String, Value)>,
    pub(crate) order_by: Option<(String, Direction)>,
    pub(crate) limit: Option<usize>,
    pub(crate) start_after: Option<DocPath>,
}

impl Query {
    /// A query over one collection.
    pub fn collection(path: CollectionPath) -> Self {
        Self {
            scope: QueryScope::Collection(path),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }

    /// A collection-group query over every collection named `name`.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            scope: QueryScope::Group(name.into()),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }

    /// Adds an equality filter on a top-level field.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Orders results by a top-level field. Documents missing the field
    /// sort first in ascending order.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Caps the number of returned documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resumes after the given document (cursor pagination). The cursor
    /// document must still exist; a stale cursor yields an empty page.
    pub fn start_after(mut self, path: DocPath) -> Self {
        self.start_after = Some(path);
        self
    }
}
