//! Typed document addressing.
//!
//! Documents live in collections, and collections nest under documents:
//! `organizations/{org}/invoices/{invoice}/items/{item}`. The two path types
//! here keep the alternation honest at construction time — a
//! `CollectionPath` always has an odd number of segments, a `DocPath` an
//! even number — so the rest of the crate never needs to re-validate
//! addresses.

use crate::error::{StoreError, StoreResult};

fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(StoreError::InvalidSegment(segment.to_owned()));
    }
    Ok(())
}

/// Path to a collection: `organizations/{org}/invoices`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Creates a top-level collection path.
    pub fn top(name: impl AsRef<str>) -> StoreResult<Self> {
        let name = name.as_ref();
        validate_segment(name)?;
        Ok(Self {
            segments: vec![name.to_owned()],
        })
    }

    /// Appends a document id, producing a document path.
    pub fn doc(&self, id: impl AsRef<str>) -> StoreResult<DocPath> {
        let id = id.as_ref();
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_owned());
        Ok(DocPath { segments })
    }

    /// The collection's own name (the last segment).
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Path to a single addressed document: `organizations/{org}/invoices/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Appends a subcollection name, producing a collection path.
    pub fn collection(&self, name: impl AsRef<str>) -> StoreResult<CollectionPath> {
        let name = name.as_ref();
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(CollectionPath { segments })
    }

    /// The collection this document belongs to.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// The document's own id (the last segment).
    pub fn doc_id(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
