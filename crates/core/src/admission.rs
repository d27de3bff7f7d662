//! Admission record and stay-length arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wardbook_types::Money;

/// Admission lifecycle state. `admitted → discharged` is the only
/// transition; discharged is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    Admitted,
    Discharged,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionStatus::Admitted => "admitted",
            AdmissionStatus::Discharged => "discharged",
        }
    }
}

impl std::fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One in-patient stay: patient, bed, and the billing rate snapshotted at
/// admission time.
///
/// `facility_cost_per_day` is optional on read because admissions written
/// before the rate snapshot existed may lack it; discharge refuses to
/// proceed without it. Admissions are historical records and are never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
    pub patient_id: String,
    pub patient_name: String,
    pub organization_id: String,
    pub facility_id: String,
    pub facility_name: String,
    pub bed_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_cost_per_day: Option<Money>,
    pub admission_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_date: Option<DateTime<Utc>>,
    pub status: AdmissionStatus,
}

/// Billable length of a stay.
///
/// A stay is billed in whole days, rounded up, with a minimum of one day.
/// The first day is charged at admission time, so only `additional_days`
/// remain to bill at discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayLength {
    pub total_days: i64,
    pub additional_days: i64,
}

impl StayLength {
    pub fn between(admitted: DateTime<Utc>, discharged: DateTime<Utc>) -> Self {
        let seconds = (discharged - admitted).num_seconds().max(0);
        let total_days = ((seconds + 86_399) / 86_400).max(1);
        Self {
            total_days,
            additional_days: total_days - 1,
        }
    }
}
