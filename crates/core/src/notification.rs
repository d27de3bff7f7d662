use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wardbook_types::NonEmptyText;

/// One entry in a user's append-only inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: NonEmptyText,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(title: NonEmptyText, body: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            title,
            body: body.into(),
            created_at,
            read: false,
        }
    }
}
