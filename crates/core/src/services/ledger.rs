//! Invoice Ledger.
//!
//! Owns `Invoice` documents and their `items` subcollection, and maintains
//! the invariant that a stored `totalAmount` always equals the sum of the
//! items' `totalCost`: every item create or delete is paired, in the same
//! atomic batch, with a `totalAmount` increment or decrement.
//!
//! Find-or-create of a patient's draft-or-open invoice goes through the
//! `invoice_index` collection keyed by patient id, so two concurrent
//! creates collide on one document path instead of racing a query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use wardbook_docstore::{Direction, Document, DocumentStore, Query, WriteBatch, WriteOp};
use wardbook_types::{Money, NonEmptyText};

use crate::config::CoreConfig;
use crate::constants::{FIELD_CREATED_AT, FIELD_PATIENT_ID, FIELD_STATUS, FIELD_TOTAL_AMOUNT};
use crate::context::OrgContext;
use crate::error::{WardError, WardResult};
use crate::invoice::{Invoice, InvoiceIndex, InvoiceItem, InvoiceStatus};
use crate::paths;

/// Input for adding a line item to a draft invoice.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: NonEmptyText,
    pub quantity: u32,
    pub unit_cost: Money,
}

/// Invoice ledger operations.
#[derive(Clone)]
pub struct LedgerService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl LedgerService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Reads one invoice.
    pub fn get(&self, ctx: &OrgContext, invoice_id: &str) -> WardResult<Invoice> {
        let path = paths::invoice(ctx.organization_id(), invoice_id)?;
        let doc = self
            .store
            .get(&path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::InvoiceNotFound(invoice_id.to_owned()))?;
        doc.deserialize_as().map_err(WardError::Store)
    }

    /// Lists an invoice's items in creation order.
    pub fn items(&self, ctx: &OrgContext, invoice_id: &str) -> WardResult<Vec<(String, InvoiceItem)>> {
        // Reading items for a missing invoice should be a NotFound, not an
        // empty list.
        self.get(ctx, invoice_id)?;

        let collection = paths::invoice_items(ctx.organization_id(), invoice_id)?;
        let snapshots = self
            .store
            .query(&Query::collection(collection).order_by(FIELD_CREATED_AT, Direction::Asc))
            .map_err(WardError::Store)?;

        snapshots
            .into_iter()
            .map(|snapshot| {
                let item = snapshot.doc.deserialize_as().map_err(WardError::Store)?;
                Ok((snapshot.path.doc_id().to_owned(), item))
            })
            .collect()
    }

    /// Lists a patient's invoices within the calling organization.
    pub fn list_for_patient(
        &self,
        ctx: &OrgContext,
        patient_id: &str,
    ) -> WardResult<Vec<(String, Invoice)>> {
        let collection = paths::invoices(ctx.organization_id())?;
        let snapshots = self
            .store
            .query(
                &Query::collection(collection)
                    .filter(FIELD_PATIENT_ID, patient_id)
                    .order_by(FIELD_CREATED_AT, Direction::Desc),
            )
            .map_err(WardError::Store)?;

        snapshots
            .into_iter()
            .map(|snapshot| {
                let invoice = snapshot.doc.deserialize_as().map_err(WardError::Store)?;
                Ok((snapshot.path.doc_id().to_owned(), invoice))
            })
            .collect()
    }

    /// Adds a line item to a draft invoice.
    ///
    /// The item create and the `totalAmount` increment commit together.
    /// Returns the new item's id.
    pub fn add_item(&self, ctx: &OrgContext, invoice_id: &str, item: NewItem) -> WardResult<String> {
        let invoice = self.get(ctx, invoice_id)?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(WardError::InvoiceNotEditable(invoice.status));
        }

        let item = InvoiceItem::new(item.name, item.quantity, item.unit_cost, Utc::now())?;
        let (item_id, ops) = self.append_item_ops(ctx, invoice_id, &item)?;

        self.store
            .commit(WriteBatch::new().extend(ops))
            .map_err(WardError::Commit)?;

        tracing::info!(
            invoice = invoice_id,
            item = %item_id,
            total_cost = %item.total_cost,
            actor = ctx.actor_id(),
            "added invoice item"
        );
        Ok(item_id)
    }

    /// Removes a line item from a draft invoice.
    ///
    /// The item delete and the `totalAmount` decrement commit together.
    pub fn remove_item(&self, ctx: &OrgContext, invoice_id: &str, item_id: &str) -> WardResult<()> {
        let invoice = self.get(ctx, invoice_id)?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(WardError::InvoiceNotEditable(invoice.status));
        }

        let item_path = paths::invoice_item(ctx.organization_id(), invoice_id, item_id)?;
        let item: InvoiceItem = self
            .store
            .get(&item_path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::InvoiceItemNotFound(item_id.to_owned()))?
            .deserialize_as()
            .map_err(WardError::Store)?;

        let invoice_path = paths::invoice(ctx.organization_id(), invoice_id)?;
        let batch = WriteBatch::new().delete(item_path).increment(
            invoice_path,
            FIELD_TOTAL_AMOUNT,
            -item.total_cost.amount(),
        );

        self.store.commit(batch).map_err(WardError::Commit)?;

        tracing::info!(
            invoice = invoice_id,
            item = item_id,
            actor = ctx.actor_id(),
            "removed invoice item"
        );
        Ok(())
    }

    /// Moves an invoice to a new status.
    ///
    /// Valid transitions: draft→open, open→paid, draft→void, open→void.
    /// Transitions into a terminal status also retire the patient's
    /// invoice-index entry in the same batch, freeing the slot for a future
    /// draft.
    pub fn transition(
        &self,
        ctx: &OrgContext,
        invoice_id: &str,
        to: InvoiceStatus,
    ) -> WardResult<()> {
        let invoice = self.get(ctx, invoice_id)?;
        if !invoice.status.can_transition_to(to) {
            return Err(WardError::InvalidStatusTransition {
                from: invoice.status,
                to,
            });
        }

        let invoice_path = paths::invoice(ctx.organization_id(), invoice_id)?;
        let mut fields = serde_json::Map::new();
        fields.insert(
            FIELD_STATUS.to_owned(),
            serde_json::to_value(to).map_err(|e| WardError::Store(e.into()))?,
        );
        let mut batch = WriteBatch::new().update(invoice_path, fields);

        if to.is_terminal() {
            let index_path = paths::invoice_index(ctx.organization_id(), &invoice.patient_id)?;
            let index: Option<InvoiceIndex> = self
                .store
                .get(&index_path)
                .map_err(WardError::Store)?
                .map(|doc| doc.deserialize_as())
                .transpose()
                .map_err(WardError::Store)?;
            if index.is_some_and(|idx| idx.invoice_id == invoice_id) {
                batch = batch.delete(index_path);
            }
        }

        self.store.commit(batch).map_err(WardError::Commit)?;

        tracing::info!(
            invoice = invoice_id,
            from = %invoice.status,
            to = %to,
            actor = ctx.actor_id(),
            "invoice status changed"
        );
        Ok(())
    }

    /// Audit helper: recomputes the sum of the items and compares it with
    /// the stored `totalAmount`.
    pub fn verify_total(&self, ctx: &OrgContext, invoice_id: &str) -> WardResult<bool> {
        let invoice = self.get(ctx, invoice_id)?;
        let items = self.items(ctx, invoice_id)?;
        let sum: Decimal = items
            .iter()
            .map(|(_, item)| item.total_cost.amount())
            .sum();
        Ok(sum == invoice.total_amount.amount())
    }

    /// Resolves the patient's draft-or-open invoice, or stages the creation
    /// of a fresh draft (invoice plus index entry) for the caller's batch.
    ///
    /// Returns the invoice id and the ops to prepend; the ops are empty when
    /// an invoice already exists. Nothing is written here — the caller owns
    /// the commit.
    pub(crate) fn open_invoice_ops(
        &self,
        ctx: &OrgContext,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> WardResult<(String, Vec<WriteOp>)> {
        let index_path = paths::invoice_index(ctx.organization_id(), patient_id)?;

        if let Some(doc) = self.store.get(&index_path).map_err(WardError::Store)? {
            let index: InvoiceIndex = doc.deserialize_as().map_err(WardError::Store)?;
            return Ok((index.invoice_id, Vec::new()));
        }

        let invoice_id = Uuid::new_v4().to_string();
        let invoice = Invoice::draft(
            patient_id,
            ctx.organization_id(),
            now,
            self.cfg.invoice_due_days(),
        );
        let index = InvoiceIndex {
            invoice_id: invoice_id.clone(),
        };

        let ops = vec![
            WriteOp::Create {
                path: paths::invoice(ctx.organization_id(), &invoice_id)?,
                doc: Document::from_serialize(&invoice).map_err(WardError::Store)?,
            },
            WriteOp::Create {
                path: index_path,
                doc: Document::from_serialize(&index).map_err(WardError::Store)?,
            },
        ];
        Ok((invoice_id, ops))
    }

    /// Stages an item create paired with the matching total increment.
    pub(crate) fn append_item_ops(
        &self,
        ctx: &OrgContext,
        invoice_id: &str,
        item: &InvoiceItem,
    ) -> WardResult<(String, Vec<WriteOp>)> {
        let item_id = Uuid::new_v4().to_string();
        let ops = vec![
            WriteOp::Create {
                path: paths::invoice_item(ctx.organization_id(), invoice_id, &item_id)?,
                doc: Document::from_serialize(item).map_err(WardError::Store)?,
            },
            WriteOp::Increment {
                path: paths::invoice(ctx.organization_id(), invoice_id)?,
                field: FIELD_TOTAL_AMOUNT.to_owned(),
                by: item.total_cost.amount(),
            },
        ];
        Ok((item_id, ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wardbook_docstore::MemoryStore;

    fn ctx() -> OrgContext {
        OrgContext::new(
            NonEmptyText::new("org-1").unwrap(),
            NonEmptyText::new("user-1").unwrap(),
            NonEmptyText::new("Billing Clerk").unwrap(),
        )
    }

    fn ledger() -> LedgerService {
        LedgerService::new(
            Arc::new(CoreConfig::default()),
            Arc::new(MemoryStore::new()),
        )
    }

    fn draft_invoice(ledger: &LedgerService, ctx: &OrgContext, patient: &str) -> String {
        let (invoice_id, ops) = ledger.open_invoice_ops(ctx, patient, Utc::now()).unwrap();
        ledger
            .store
            .commit(WriteBatch::new().extend(ops))
            .unwrap();
        invoice_id
    }

    fn item(name: &str, quantity: u32, unit: u64) -> NewItem {
        NewItem {
            name: NonEmptyText::new(name).unwrap(),
            quantity,
            unit_cost: Money::from_major(unit),
        }
    }

    #[test]
    fn add_and_remove_items_keep_total_in_sync() {
        let ledger = ledger();
        let ctx = ctx();
        let invoice_id = draft_invoice(&ledger, &ctx, "p1");

        let first = ledger.add_item(&ctx, &invoice_id, item("Admission", 1, 1500)).unwrap();
        assert!(ledger.verify_total(&ctx, &invoice_id).unwrap());
        assert_eq!(
            ledger.get(&ctx, &invoice_id).unwrap().total_amount,
            Money::from_major(1500)
        );

        ledger.add_item(&ctx, &invoice_id, item("Stay", 2, 1500)).unwrap();
        assert!(ledger.verify_total(&ctx, &invoice_id).unwrap());
        assert_eq!(
            ledger.get(&ctx, &invoice_id).unwrap().total_amount,
            Money::from_major(4500)
        );

        ledger.remove_item(&ctx, &invoice_id, &first).unwrap();
        assert!(ledger.verify_total(&ctx, &invoice_id).unwrap());
        assert_eq!(
            ledger.get(&ctx, &invoice_id).unwrap().total_amount,
            Money::from_major(3000)
        );
        assert_eq!(ledger.items(&ctx, &invoice_id).unwrap().len(), 1);
    }

    #[test]
    fn items_come_back_in_creation_order() {
        let ledger = ledger();
        let ctx = ctx();
        let invoice_id = draft_invoice(&ledger, &ctx, "p1");

        for name in ["first", "second", "third"] {
            ledger.add_item(&ctx, &invoice_id, item(name, 1, 10)).unwrap();
            // Creation timestamps must differ for the ordering to be
            // observable.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let names: Vec<String> = ledger
            .items(&ctx, &invoice_id)
            .unwrap()
            .into_iter()
            .map(|(_, item)| item.name.to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn items_of_missing_invoice_is_not_found() {
        let ledger = ledger();
        let err = ledger.items(&ctx(), "nope").unwrap_err();
        assert!(matches!(err, WardError::InvoiceNotFound(_)));
    }

    #[test]
    fn non_draft_invoices_reject_item_edits() {
        let ledger = ledger();
        let ctx = ctx();
        let invoice_id = draft_invoice(&ledger, &ctx, "p1");
        let item_id = ledger.add_item(&ctx, &invoice_id, item("Admission", 1, 100)).unwrap();

        ledger.transition(&ctx, &invoice_id, InvoiceStatus::Open).unwrap();

        let err = ledger
            .add_item(&ctx, &invoice_id, item("Late", 1, 100))
            .unwrap_err();
        assert!(matches!(err, WardError::InvoiceNotEditable(InvoiceStatus::Open)));

        let err = ledger.remove_item(&ctx, &invoice_id, &item_id).unwrap_err();
        assert!(matches!(err, WardError::InvoiceNotEditable(InvoiceStatus::Open)));
    }

    #[test]
    fn invalid_transitions_are_rejected_and_terminal_states_stick() {
        let ledger = ledger();
        let ctx = ctx();
        let invoice_id = draft_invoice(&ledger, &ctx, "p1");

        let err = ledger
            .transition(&ctx, &invoice_id, InvoiceStatus::Paid)
            .unwrap_err();
        assert!(matches!(err, WardError::InvalidStatusTransition { .. }));

        ledger.transition(&ctx, &invoice_id, InvoiceStatus::Open).unwrap();
        ledger.transition(&ctx, &invoice_id, InvoiceStatus::Paid).unwrap();

        for to in [InvoiceStatus::Draft, InvoiceStatus::Open, InvoiceStatus::Void] {
            let err = ledger.transition(&ctx, &invoice_id, to).unwrap_err();
            assert!(matches!(err, WardError::InvalidStatusTransition { .. }));
        }
    }

    #[test]
    fn terminal_transition_retires_the_index_entry() {
        let ledger = ledger();
        let ctx = ctx();
        let first = draft_invoice(&ledger, &ctx, "p1");

        // While draft/open, find-or-create resolves to the same invoice.
        let (resolved, ops) = ledger.open_invoice_ops(&ctx, "p1", Utc::now()).unwrap();
        assert_eq!(resolved, first);
        assert!(ops.is_empty());

        ledger.transition(&ctx, &first, InvoiceStatus::Open).unwrap();
        ledger.transition(&ctx, &first, InvoiceStatus::Paid).unwrap();

        // Paid retires the index, so the next resolution stages a new draft.
        let (next, ops) = ledger.open_invoice_ops(&ctx, "p1", Utc::now()).unwrap();
        assert_ne!(next, first);
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn concurrent_invoice_creates_collide_on_the_index() {
        let ledger = ledger();
        let ctx = ctx();

        // Two racing resolutions both observe an absent index and stage a
        // fresh draft each.
        let (first, first_ops) = ledger.open_invoice_ops(&ctx, "p1", Utc::now()).unwrap();
        let (second, second_ops) = ledger.open_invoice_ops(&ctx, "p1", Utc::now()).unwrap();
        assert_ne!(first, second);

        ledger
            .store
            .commit(WriteBatch::new().extend(first_ops))
            .unwrap();

        // The loser's whole batch is rejected on the index path and applies
        // nothing.
        let err = ledger
            .store
            .commit(WriteBatch::new().extend(second_ops))
            .unwrap_err();
        assert!(matches!(
            err,
            wardbook_docstore::StoreError::AlreadyExists(_)
        ));
        assert!(ledger.get(&ctx, &first).is_ok());
        assert!(matches!(
            ledger.get(&ctx, &second).unwrap_err(),
            WardError::InvoiceNotFound(_)
        ));

        // A retry resolves to the winner instead of creating anything.
        let (resolved, ops) = ledger.open_invoice_ops(&ctx, "p1", Utc::now()).unwrap();
        assert_eq!(resolved, first);
        assert!(ops.is_empty());
    }

    #[test]
    fn list_for_patient_scopes_by_patient() {
        let ledger = ledger();
        let ctx = ctx();
        let mine = draft_invoice(&ledger, &ctx, "p1");
        let _other = draft_invoice(&ledger, &ctx, "p2");

        let invoices = ledger.list_for_patient(&ctx, "p1").unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].0, mine);
    }

    proptest! {
        /// After every add or remove, the stored total equals the sum of
        /// the remaining items' stored totals.
        #[test]
        fn total_matches_item_sum_under_any_edit_sequence(
            edits in proptest::collection::vec((1u32..5, 1u64..2_000, any::<bool>()), 1..15)
        ) {
            let ledger = ledger();
            let ctx = ctx();
            let invoice_id = draft_invoice(&ledger, &ctx, "p1");
            let mut live_items: Vec<String> = Vec::new();

            for (quantity, unit, remove_oldest) in edits {
                let id = ledger
                    .add_item(&ctx, &invoice_id, item("charge", quantity, unit))
                    .unwrap();
                live_items.push(id);
                prop_assert!(ledger.verify_total(&ctx, &invoice_id).unwrap());

                if remove_oldest && live_items.len() > 1 {
                    let oldest = live_items.remove(0);
                    ledger.remove_item(&ctx, &invoice_id, &oldest).unwrap();
                    prop_assert!(ledger.verify_total(&ctx, &invoice_id).unwrap());
                }
            }
        }
    }
}
