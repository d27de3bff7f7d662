//! Facility and bed shapes.
//!
//! A facility is a ward or cabin with an embedded map of beds. The bed map
//! is mutated only through [`Facility::occupy`] and [`Facility::release`],
//! and those mutations only reach storage inside the admission lifecycle's
//! atomic batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wardbook_types::{Money, NonEmptyText};

use crate::error::{WardError, WardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    Available,
    Occupied,
    Maintenance,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Occupied => "occupied",
            BedStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One bed within a facility's embedded map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bed {
    pub id: String,
    pub status: BedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

/// A ward or cabin containing one or more independently occupiable beds.
///
/// `cost_per_day` is the rate snapshotted onto new admissions; changing it
/// later never affects admissions already on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub name: NonEmptyText,
    #[serde(rename = "type")]
    pub kind: NonEmptyText,
    pub cost_per_day: Money,
    pub total_beds: u32,
    pub beds: BTreeMap<String, Bed>,
}

impl Facility {
    /// Builds a facility with every listed bed available.
    pub fn with_beds(
        name: NonEmptyText,
        kind: NonEmptyText,
        cost_per_day: Money,
        bed_ids: impl IntoIterator<Item = NonEmptyText>,
    ) -> WardResult<Self> {
        let mut beds = BTreeMap::new();
        for bed_id in bed_ids {
            let id = bed_id.as_str().to_owned();
            let duplicate = beds
                .insert(
                    id.clone(),
                    Bed {
                        id,
                        status: BedStatus::Available,
                        patient_id: None,
                        patient_name: None,
                    },
                )
                .is_some();
            if duplicate {
                return Err(WardError::InvalidInput(format!(
                    "duplicate bed id: {bed_id}"
                )));
            }
        }
        if beds.is_empty() {
            return Err(WardError::InvalidInput(
                "a facility needs at least one bed".into(),
            ));
        }

        Ok(Self {
            name,
            kind,
            cost_per_day,
            total_beds: beds.len() as u32,
            beds,
        })
    }

    pub fn bed(&self, bed_id: &str) -> Option<&Bed> {
        self.beds.get(bed_id)
    }

    /// Beds currently free to assign.
    pub fn available_beds(&self) -> Vec<&Bed> {
        self.beds
            .values()
            .filter(|bed| bed.status == BedStatus::Available)
            .collect()
    }

    /// Marks a bed occupied, recording who is in it.
    ///
    /// Rejects unknown beds and beds that are not currently available
    /// (occupied or under maintenance).
    pub fn occupy(&mut self, bed_id: &str, patient_id: &str, patient_name: &str) -> WardResult<()> {
        let facility = self.name.as_str().to_owned();
        let bed = self
            .beds
            .get_mut(bed_id)
            .ok_or_else(|| WardError::BedNotFound {
                facility,
                bed_id: bed_id.to_owned(),
            })?;
        if bed.status != BedStatus::Available {
            return Err(WardError::BedUnavailable {
                bed_id: bed_id.to_owned(),
                status: bed.status,
            });
        }

        bed.status = BedStatus::Occupied;
        bed.patient_id = Some(patient_id.to_owned());
        bed.patient_name = Some(patient_name.to_owned());
        Ok(())
    }

    /// Marks an occupied bed available again, clearing the patient fields.
    pub fn release(&mut self, bed_id: &str) -> WardResult<()> {
        let facility = self.name.as_str().to_owned();
        let bed = self
            .beds
            .get_mut(bed_id)
            .ok_or_else(|| WardError::BedNotFound {
                facility,
                bed_id: bed_id.to_owned(),
            })?;
        if bed.status != BedStatus::Occupied {
            return Err(WardError::BedNotOccupied {
                bed_id: bed_id.to_owned(),
            });
        }

        bed.status = BedStatus::Available;
        bed.patient_id = None;
        bed.patient_name = None;
        Ok(())
    }
}
