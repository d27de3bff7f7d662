//! Core services: the facility registry, the invoice ledger, the admission
//! lifecycle that coordinates them, and best-effort notification dispatch.

pub mod admissions;
pub mod ledger;
pub mod notify;
pub mod registry;
