use crate::path::DocPath;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
    #[error("document not found: {0}")]
    NotFound(DocPath),
    #[error("document already exists: {0}")]
    AlreadyExists(DocPath),
    #[error("value does not serialize to a JSON object")]
    NotAnObject,
    #[error("field {field:?} of {path} is not a number")]
    FieldNotNumeric { path: DocPath, field: String },
    #[error("numeric value is not representable")]
    NumberRange,
    #[error("failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
