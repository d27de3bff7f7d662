//! Invoice and line-item shapes.
//!
//! The ledger invariant lives here in type form: an item's `total_cost` is
//! computed once at creation (`quantity × unit_cost`) and stored, so later
//! price-catalogue changes never retroactively alter historical items. The
//! pairing of item writes with `totalAmount` adjustments is the
//! `LedgerService`'s job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wardbook_types::{Money, NonEmptyText};

use crate::error::{WardError, WardResult};

/// Invoice lifecycle state. Draft is editable, open is finalized awaiting
/// payment, paid and void are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Open => "open",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Void)
    }

    /// Valid transitions: draft→open, open→paid, draft→void, open→void.
    pub fn can_transition_to(self, to: InvoiceStatus) -> bool {
        matches!(
            (self, to),
            (InvoiceStatus::Draft, InvoiceStatus::Open)
                | (InvoiceStatus::Open, InvoiceStatus::Paid)
                | (InvoiceStatus::Draft, InvoiceStatus::Void)
                | (InvoiceStatus::Open, InvoiceStatus::Void)
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A patient's running bill within one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub patient_id: String,
    pub organization_id: String,
    pub status: InvoiceStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl Invoice {
    /// A fresh draft invoice with a zero total.
    pub fn draft(
        patient_id: impl Into<String>,
        organization_id: impl Into<String>,
        created_at: DateTime<Utc>,
        due_days: i64,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            organization_id: organization_id.into(),
            status: InvoiceStatus::Draft,
            total_amount: Money::zero(),
            created_at,
            due_date: created_at + Duration::days(due_days),
        }
    }
}

/// One line item of an invoice (subcollection `items`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub name: NonEmptyText,
    pub quantity: u32,
    pub unit_cost: Money,
    pub total_cost: Money,
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Builds an item, computing and storing `total_cost` now.
    pub fn new(
        name: NonEmptyText,
        quantity: u32,
        unit_cost: Money,
        created_at: DateTime<Utc>,
    ) -> WardResult<Self> {
        if quantity == 0 {
            return Err(WardError::InvalidInput(
                "invoice item quantity must be at least 1".into(),
            ));
        }
        let total_cost = unit_cost.times(quantity)?;
        Ok(Self {
            name,
            quantity,
            unit_cost,
            total_cost,
            created_at,
        })
    }
}

/// Index entry mapping a patient to their sole draft-or-open invoice.
///
/// The entry's document id is the patient id, which makes invoice
/// find-or-create an idempotent keyed operation instead of a
/// query-then-create race: two concurrent creates collide on this path and
/// the loser's whole batch fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIndex {
    pub invoice_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use InvoiceStatus::*;
        assert!(Draft.can_transition_to(Open));
        assert!(Open.can_transition_to(Paid));
        assert!(Draft.can_transition_to(Void));
        assert!(Open.can_transition_to(Void));

        assert!(!Draft.can_transition_to(Paid));
        assert!(!Open.can_transition_to(Draft));
        assert!(!Paid.can_transition_to(Void));
        assert!(!Void.can_transition_to(Open));

        assert!(Paid.is_terminal());
        assert!(Void.is_terminal());
        assert!(!Draft.is_terminal());
    }

    #[test]
    fn item_total_is_quantity_times_unit_cost() {
        let item = InvoiceItem::new(
            NonEmptyText::new("Ward A stay").unwrap(),
            2,
            Money::from_major(1500),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(item.total_cost, Money::from_major(3000));
    }

    #[test]
    fn item_rejects_zero_quantity() {
        let err = InvoiceItem::new(
            NonEmptyText::new("x").unwrap(),
            0,
            Money::from_major(10),
            Utc::now(),
        );
        assert!(matches!(err, Err(WardError::InvalidInput(_))));
    }

    #[test]
    fn draft_invoice_starts_empty_with_due_date() {
        let now = Utc::now();
        let invoice = Invoice::draft("p1", "org-1", now, 30);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.total_amount.is_zero());
        assert_eq!(invoice.due_date, now + Duration::days(30));
    }
}
