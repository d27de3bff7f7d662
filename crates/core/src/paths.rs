//! Document path builders for the persisted layout.
//!
//! ```text
//! organizations/{org}/facilities/{facility_id}
//! organizations/{org}/admissions/{admission_id}
//! organizations/{org}/invoices/{invoice_id}
//! organizations/{org}/invoices/{invoice_id}/items/{item_id}
//! organizations/{org}/invoice_index/{patient_id}
//! users/{user_id}/notifications/{notification_id}
//! ```

use crate::constants::{
    ADMISSIONS_COLLECTION, FACILITIES_COLLECTION, INVOICES_COLLECTION, INVOICE_INDEX_COLLECTION,
    INVOICE_ITEMS_COLLECTION, NOTIFICATIONS_COLLECTION, ORGANIZATIONS_COLLECTION, USERS_COLLECTION,
};
use crate::error::{WardError, WardResult};
use wardbook_docstore::{CollectionPath, DocPath, StoreError};

fn invalid(err: StoreError) -> WardError {
    WardError::InvalidInput(err.to_string())
}

fn org(org_id: &str) -> WardResult<DocPath> {
    CollectionPath::top(ORGANIZATIONS_COLLECTION)
        .and_then(|c| c.doc(org_id))
        .map_err(invalid)
}

pub(crate) fn facilities(org_id: &str) -> WardResult<CollectionPath> {
    org(org_id)?
        .collection(FACILITIES_COLLECTION)
        .map_err(invalid)
}

pub(crate) fn facility(org_id: &str, facility_id: &str) -> WardResult<DocPath> {
    facilities(org_id)?.doc(facility_id).map_err(invalid)
}

pub(crate) fn admissions(org_id: &str) -> WardResult<CollectionPath> {
    org(org_id)?
        .collection(ADMISSIONS_COLLECTION)
        .map_err(invalid)
}

pub(crate) fn admission(org_id: &str, admission_id: &str) -> WardResult<DocPath> {
    admissions(org_id)?.doc(admission_id).map_err(invalid)
}

pub(crate) fn invoices(org_id: &str) -> WardResult<CollectionPath> {
    org(org_id)?
        .collection(INVOICES_COLLECTION)
        .map_err(invalid)
}

pub(crate) fn invoice(org_id: &str, invoice_id: &str) -> WardResult<DocPath> {
    invoices(org_id)?.doc(invoice_id).map_err(invalid)
}

pub(crate) fn invoice_items(org_id: &str, invoice_id: &str) -> WardResult<CollectionPath> {
    invoice(org_id, invoice_id)?
        .collection(INVOICE_ITEMS_COLLECTION)
        .map_err(invalid)
}

pub(crate) fn invoice_item(org_id: &str, invoice_id: &str, item_id: &str) -> WardResult<DocPath> {
    invoice_items(org_id, invoice_id)?
        .doc(item_id)
        .map_err(invalid)
}

pub(crate) fn invoice_index(org_id: &str, patient_id: &str) -> WardResult<DocPath> {
    org(org_id)?
        .collection(INVOICE_INDEX_COLLECTION)
        .and_then(|c| c.doc(patient_id))
        .map_err(invalid)
}

pub(crate) fn notification(user_id: &str, notification_id: &str) -> WardResult<DocPath> {
    CollectionPath::top(USERS_COLLECTION)
        .and_then(|c| c.doc(user_id))
        .and_then(|d| d.collection(NOTIFICATIONS_COLLECTION))
        .and_then(|c| c.doc(notification_id))
        .map_err(invalid)
}

pub(crate) fn notifications(user_id: &str) -> WardResult<CollectionPath> {
    CollectionPath::top(USERS_COLLECTION)
        .and_then(|c| c.doc(user_id))
        .and_then(|d| d.collection(NOTIFICATIONS_COLLECTION))
        .map_err(invalid)
}
