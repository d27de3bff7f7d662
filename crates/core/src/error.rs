use crate::facility::BedStatus;
use crate::invoice::InvoiceStatus;
use wardbook_docstore::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("facility not found: {0}")]
    FacilityNotFound(String),
    #[error("admission not found: {0}")]
    AdmissionNotFound(String),
    #[error("invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("invoice item not found: {0}")]
    InvoiceItemNotFound(String),
    #[error("bed {bed_id} not found in facility {facility}")]
    BedNotFound { facility: String, bed_id: String },
    #[error("bed {bed_id} is not available (currently {status})")]
    BedUnavailable { bed_id: String, status: BedStatus },
    #[error("bed {bed_id} is not occupied")]
    BedNotOccupied { bed_id: String },
    #[error("admission {0} is already discharged")]
    AlreadyDischarged(String),
    #[error("admission {0} has no cost-per-day on record; discharge cannot be billed")]
    MissingDischargeRate(String),
    #[error("invoice items can only change while the invoice is draft (status: {0})")]
    InvoiceNotEditable(InvoiceStatus),
    #[error("invoice cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },
    #[error("invalid monetary amount: {0}")]
    Money(#[from] wardbook_types::MoneyError),
    #[error("storage read failed: {0}")]
    Store(StoreError),
    /// The atomic batch was rejected; nothing was applied and the same
    /// action can safely be retried.
    #[error("atomic commit failed: {0}")]
    Commit(StoreError),
}

pub type WardResult<T> = std::result::Result<T, WardError>;
