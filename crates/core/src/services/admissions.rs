//! Admission Lifecycle.
//!
//! Orchestrates admit and discharge. Each transition is one atomic batch
//! covering the admission record, the facility's bed map, and the invoice
//! ledger (invoice, index, line item, running total): either every one of
//! those documents changes, or none do. The invoice resolution read happens
//! before the batch, but creation is keyed by the invoice index, so a
//! concurrent duplicate fails the whole commit instead of leaving two
//! drafts.
//!
//! Notifications are enqueued only after a successful commit and can never
//! fail a transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use wardbook_docstore::{Direction, Document, DocumentStore, Query, WriteBatch};
use wardbook_types::{Money, NonEmptyText};

use crate::admission::{Admission, AdmissionStatus, StayLength};
use crate::constants::{ADMISSIONS_COLLECTION, FIELD_ADMISSION_DATE, FIELD_DISCHARGE_DATE, FIELD_STATUS};
use crate::context::OrgContext;
use crate::error::{WardError, WardResult};
use crate::invoice::InvoiceItem;
use crate::notification::Notification;
use crate::paths;
use crate::services::ledger::LedgerService;
use crate::services::notify::Dispatcher;

/// Input for admitting a patient to a bed.
#[derive(Debug, Clone)]
pub struct AdmitRequest {
    pub patient_id: NonEmptyText,
    pub patient_name: NonEmptyText,
    pub facility_id: NonEmptyText,
    pub bed_id: NonEmptyText,
}

/// What an admit produced.
#[derive(Debug, Clone)]
pub struct AdmitOutcome {
    pub admission_id: String,
    pub invoice_id: String,
}

/// What a discharge produced. `additional_charge` and `invoice_id` are
/// `None` when the stay fit inside the day already billed at admission.
#[derive(Debug, Clone)]
pub struct DischargeOutcome {
    pub additional_days: i64,
    pub additional_charge: Option<Money>,
    pub invoice_id: Option<String>,
}

/// Admission lifecycle operations.
#[derive(Clone)]
pub struct AdmissionsService {
    store: Arc<dyn DocumentStore>,
    ledger: LedgerService,
    dispatcher: Arc<Dispatcher>,
}

impl AdmissionsService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ledger: LedgerService,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            store,
            ledger,
            dispatcher,
        }
    }

    /// Admits a patient to an available bed.
    ///
    /// One atomic batch: create the admission (with the facility's current
    /// rate snapshotted onto it), mark the bed occupied, resolve or create
    /// the patient's draft invoice, and append the first-day admission
    /// charge paired with the total increment.
    pub fn admit(&self, ctx: &OrgContext, request: AdmitRequest) -> WardResult<AdmitOutcome> {
        self.admit_at(ctx, request, Utc::now())
    }

    /// [`Self::admit`] with an explicit admission timestamp.
    pub fn admit_at(
        &self,
        ctx: &OrgContext,
        request: AdmitRequest,
        now: DateTime<Utc>,
    ) -> WardResult<AdmitOutcome> {
        let facility_id = request.facility_id.as_str();
        let bed_id = request.bed_id.as_str();
        let patient_id = request.patient_id.as_str();

        let facility_path = paths::facility(ctx.organization_id(), facility_id)?;
        let mut facility: crate::facility::Facility = self
            .store
            .get(&facility_path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::FacilityNotFound(facility_id.to_owned()))?
            .deserialize_as()
            .map_err(WardError::Store)?;

        let rate = facility.cost_per_day;
        facility.occupy(bed_id, patient_id, request.patient_name.as_str())?;

        let admission_id = uuid::Uuid::new_v4().to_string();
        let admission = Admission {
            patient_id: patient_id.to_owned(),
            patient_name: request.patient_name.as_str().to_owned(),
            organization_id: ctx.organization_id().to_owned(),
            facility_id: facility_id.to_owned(),
            facility_name: facility.name.as_str().to_owned(),
            bed_id: bed_id.to_owned(),
            facility_cost_per_day: Some(rate),
            admission_date: now,
            discharge_date: None,
            status: AdmissionStatus::Admitted,
        };

        let (invoice_id, invoice_ops) = self.ledger.open_invoice_ops(ctx, patient_id, now)?;
        let label = NonEmptyText::new(format!("Admission: {} ({})", facility.name, bed_id))
            .map_err(|e| WardError::InvalidInput(e.to_string()))?;
        let item = InvoiceItem::new(label, 1, rate, now)?;
        let (_, item_ops) = self.ledger.append_item_ops(ctx, &invoice_id, &item)?;

        // Built up front: once the batch commits, only the infallible
        // enqueue is left.
        let notification = Notification::new(
            NonEmptyText::new("Admitted").map_err(|e| WardError::InvalidInput(e.to_string()))?,
            format!("You have been admitted to {} (bed {bed_id})", facility.name),
            now,
        );

        let batch = WriteBatch::new()
            .create(
                paths::admission(ctx.organization_id(), &admission_id)?,
                Document::from_serialize(&admission).map_err(WardError::Store)?,
            )
            .set(
                facility_path,
                Document::from_serialize(&facility).map_err(WardError::Store)?,
            )
            .extend(invoice_ops)
            .extend(item_ops);

        self.store.commit(batch).map_err(WardError::Commit)?;

        tracing::info!(
            admission = %admission_id,
            patient = patient_id,
            facility = facility_id,
            bed = bed_id,
            invoice = %invoice_id,
            actor = ctx.actor_id(),
            "patient admitted"
        );

        self.dispatcher.enqueue(patient_id, notification);

        Ok(AdmitOutcome {
            admission_id,
            invoice_id,
        })
    }

    /// Discharges an admitted patient.
    ///
    /// One atomic batch: mark the admission discharged, free the bed, and —
    /// when the stay ran past the day billed at admission — append the
    /// additional-day charge to the patient's draft-or-open invoice,
    /// creating one if none exists. A charge is never silently skipped.
    ///
    /// Rejected before any write when the admission has no rate snapshot to
    /// bill against.
    pub fn discharge(&self, ctx: &OrgContext, admission_id: &str) -> WardResult<DischargeOutcome> {
        self.discharge_at(ctx, admission_id, Utc::now())
    }

    /// [`Self::discharge`] with an explicit discharge timestamp.
    pub fn discharge_at(
        &self,
        ctx: &OrgContext,
        admission_id: &str,
        now: DateTime<Utc>,
    ) -> WardResult<DischargeOutcome> {
        let admission = self.get(ctx, admission_id)?;
        if admission.status == AdmissionStatus::Discharged {
            return Err(WardError::AlreadyDischarged(admission_id.to_owned()));
        }
        let rate = admission
            .facility_cost_per_day
            .ok_or_else(|| WardError::MissingDischargeRate(admission_id.to_owned()))?;

        let facility_path = paths::facility(ctx.organization_id(), &admission.facility_id)?;
        let mut facility: crate::facility::Facility = self
            .store
            .get(&facility_path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::FacilityNotFound(admission.facility_id.clone()))?
            .deserialize_as()
            .map_err(WardError::Store)?;
        facility.release(&admission.bed_id)?;

        let stay = StayLength::between(admission.admission_date, now);

        let mut fields = serde_json::Map::new();
        fields.insert(
            FIELD_STATUS.to_owned(),
            serde_json::to_value(AdmissionStatus::Discharged)
                .map_err(|e| WardError::Store(e.into()))?,
        );
        fields.insert(
            FIELD_DISCHARGE_DATE.to_owned(),
            serde_json::to_value(now).map_err(|e| WardError::Store(e.into()))?,
        );

        let mut batch = WriteBatch::new()
            .update(paths::admission(ctx.organization_id(), admission_id)?, fields)
            .set(
                facility_path,
                Document::from_serialize(&facility).map_err(WardError::Store)?,
            );

        let mut billed_invoice = None;
        let mut additional_charge = None;
        if stay.additional_days > 0 {
            let quantity = u32::try_from(stay.additional_days)
                .map_err(|_| WardError::InvalidInput("stay is too long to bill".into()))?;
            let label = NonEmptyText::new(format!(
                "{} stay x {} day(s)",
                admission.facility_name, stay.additional_days
            ))
            .map_err(|e| WardError::InvalidInput(e.to_string()))?;
            let item = InvoiceItem::new(label, quantity, rate, now)?;

            let (invoice_id, invoice_ops) =
                self.ledger.open_invoice_ops(ctx, &admission.patient_id, now)?;
            let (_, item_ops) = self.ledger.append_item_ops(ctx, &invoice_id, &item)?;

            batch = batch.extend(invoice_ops).extend(item_ops);
            additional_charge = Some(item.total_cost);
            billed_invoice = Some(invoice_id);
        }

        let notification = Notification::new(
            NonEmptyText::new("Discharged").map_err(|e| WardError::InvalidInput(e.to_string()))?,
            format!("You have been discharged from {}", admission.facility_name),
            now,
        );

        self.store.commit(batch).map_err(WardError::Commit)?;

        tracing::info!(
            admission = admission_id,
            patient = %admission.patient_id,
            total_days = stay.total_days,
            additional_days = stay.additional_days,
            actor = ctx.actor_id(),
            "patient discharged"
        );

        self.dispatcher
            .enqueue(admission.patient_id.clone(), notification);

        Ok(DischargeOutcome {
            additional_days: stay.additional_days,
            additional_charge,
            invoice_id: billed_invoice,
        })
    }

    /// Reads one admission.
    pub fn get(&self, ctx: &OrgContext, admission_id: &str) -> WardResult<Admission> {
        let path = paths::admission(ctx.organization_id(), admission_id)?;
        let doc = self
            .store
            .get(&path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::AdmissionNotFound(admission_id.to_owned()))?;
        doc.deserialize_as().map_err(WardError::Store)
    }

    /// Lists the organization's admissions, optionally filtered by status,
    /// in admission-date order with cursor pagination.
    pub fn list(
        &self,
        ctx: &OrgContext,
        status: Option<AdmissionStatus>,
        limit: Option<usize>,
        after: Option<&str>,
    ) -> WardResult<Vec<(String, Admission)>> {
        let collection = paths::admissions(ctx.organization_id())?;
        let mut query =
            Query::collection(collection).order_by(FIELD_ADMISSION_DATE, Direction::Asc);
        if let Some(status) = status {
            query = query.filter(FIELD_STATUS, status.as_str());
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        if let Some(after) = after {
            query = query.start_after(paths::admission(ctx.organization_id(), after)?);
        }

        let snapshots = self.store.query(&query).map_err(WardError::Store)?;
        snapshots
            .into_iter()
            .map(|snapshot| {
                let admission = snapshot.doc.deserialize_as().map_err(WardError::Store)?;
                Ok((snapshot.path.doc_id().to_owned(), admission))
            })
            .collect()
    }

    /// Cross-tenant admin view: every currently admitted patient in every
    /// organization (collection-group scan).
    pub fn admitted_across_organizations(&self) -> WardResult<Vec<(String, Admission)>> {
        let snapshots = self
            .store
            .query(
                &Query::group(ADMISSIONS_COLLECTION)
                    .filter(FIELD_STATUS, AdmissionStatus::Admitted.as_str()),
            )
            .map_err(WardError::Store)?;

        snapshots
            .into_iter()
            .map(|snapshot| {
                let admission = snapshot.doc.deserialize_as().map_err(WardError::Store)?;
                Ok((snapshot.path.doc_id().to_owned(), admission))
            })
            .collect()
    }
}
