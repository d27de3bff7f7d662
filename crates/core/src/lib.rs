//! # Wardbook Core
//!
//! Core business logic for the wardbook admissions and billing system.
//!
//! This crate owns the three cooperating components and the one protocol
//! that ties them together:
//! - **Facility/Bed Registry**: wards and cabins with embedded bed maps
//! - **Invoice Ledger**: per-patient invoices whose stored total always
//!   equals the sum of their line items
//! - **Admission Lifecycle**: admit and discharge, each applied as a single
//!   atomic write batch across admission, bed, and invoice documents
//!
//! Notifications are a best-effort side effect dispatched after a
//! lifecycle transition commits; their failure never rolls a transition
//! back.
//!
//! **No API concerns**: HTTP servers and request/response shapes belong in
//! `api-rest`. Storage mechanics belong in `wardbook-docstore`.

pub mod admission;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod facility;
pub mod invoice;
pub mod notification;
pub(crate) mod paths;
pub mod services;

pub use admission::{Admission, AdmissionStatus, StayLength};
pub use config::CoreConfig;
pub use context::OrgContext;
pub use error::{WardError, WardResult};
pub use facility::{Bed, BedStatus, Facility};
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus};
pub use notification::Notification;
pub use services::admissions::{AdmissionsService, AdmitOutcome, AdmitRequest, DischargeOutcome};
pub use services::ledger::{LedgerService, NewItem};
pub use services::notify::{Dispatcher, InboxSink, NotificationSink};
pub use services::registry::{NewFacility, RegistryService};
