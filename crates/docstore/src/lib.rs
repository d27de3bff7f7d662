//! # Wardbook Docstore
//!
//! Document-store client for the wardbook system.
//!
//! This crate provides the storage contract the business logic is written
//! against, and an in-memory implementation of it:
//! - Addressed documents (`DocPath`) organised into nested collections
//! - Read queries with equality filters, ordering, limits, cursor pagination
//!   and collection-group scans
//! - Atomic write batches: a `WriteBatch` either fully applies or not at
//!   all, with no intermediate state visible to readers
//!
//! **No business concerns**: invoices, admissions and facilities belong in
//! `wardbook-core`. This crate only knows about documents and batches.

pub mod batch;
pub mod document;
pub mod error;
pub mod path;
pub mod query;
pub mod store;

pub use batch::{WriteBatch, WriteOp};
pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use path::{CollectionPath, DocPath};
pub use query::{Direction, Query, QueryScope};
pub use store::{DocumentStore, MemoryStore, Snapshot};
