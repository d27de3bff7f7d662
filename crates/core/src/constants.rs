//! Collection and field names shared by the core services.

/// Top-level tenant collection.
pub const ORGANIZATIONS_COLLECTION: &str = "organizations";
/// Per-organization facilities collection.
pub const FACILITIES_COLLECTION: &str = "facilities";
/// Per-organization admissions collection.
pub const ADMISSIONS_COLLECTION: &str = "admissions";
/// Per-organization invoices collection.
pub const INVOICES_COLLECTION: &str = "invoices";
/// Subcollection of line items under an invoice.
pub const INVOICE_ITEMS_COLLECTION: &str = "items";
/// Per-organization index mapping patient id to their draft-or-open invoice.
pub const INVOICE_INDEX_COLLECTION: &str = "invoice_index";
/// Top-level users collection (notification inboxes live under it).
pub const USERS_COLLECTION: &str = "users";
/// Per-user notification inbox subcollection.
pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// Persisted field names used by partial updates and increments. These must
/// stay in sync with the `#[serde(rename_all = "camelCase")]` shapes.
pub const FIELD_TOTAL_AMOUNT: &str = "totalAmount";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_DISCHARGE_DATE: &str = "dischargeDate";
pub const FIELD_COST_PER_DAY: &str = "costPerDay";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_ADMISSION_DATE: &str = "admissionDate";
pub const FIELD_PATIENT_ID: &str = "patientId";

/// Default payment horizon for newly created invoices.
pub const DEFAULT_INVOICE_DUE_DAYS: i64 = 30;
