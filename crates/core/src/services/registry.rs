//! Facility/Bed Registry.
//!
//! Read access to facilities and their bed maps, plus facility
//! administration. Bed occupancy itself is only ever mutated inside the
//! admission lifecycle's atomic batch; the registry never flips a bed on
//! its own.

use std::sync::Arc;

use uuid::Uuid;
use wardbook_docstore::{Document, DocumentStore, Query, WriteBatch};
use wardbook_types::{Money, NonEmptyText};

use crate::constants::FIELD_COST_PER_DAY;
use crate::context::OrgContext;
use crate::error::{WardError, WardResult};
use crate::facility::{Bed, Facility};
use crate::paths;

/// Input for creating a facility.
#[derive(Debug, Clone)]
pub struct NewFacility {
    pub name: NonEmptyText,
    pub kind: NonEmptyText,
    pub cost_per_day: Money,
    pub bed_ids: Vec<NonEmptyText>,
}

/// Facility registry operations.
#[derive(Clone)]
pub struct RegistryService {
    store: Arc<dyn DocumentStore>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a facility with every listed bed available. Returns its id.
    pub fn create(&self, ctx: &OrgContext, new: NewFacility) -> WardResult<String> {
        let facility = Facility::with_beds(new.name, new.kind, new.cost_per_day, new.bed_ids)?;
        let facility_id = Uuid::new_v4().to_string();
        let path = paths::facility(ctx.organization_id(), &facility_id)?;

        self.store
            .commit(
                WriteBatch::new()
                    .create(path, Document::from_serialize(&facility).map_err(WardError::Store)?),
            )
            .map_err(WardError::Commit)?;

        tracing::info!(
            facility = %facility_id,
            name = %facility.name,
            beds = facility.total_beds,
            actor = ctx.actor_id(),
            "created facility"
        );
        Ok(facility_id)
    }

    /// Reads one facility.
    pub fn get(&self, ctx: &OrgContext, facility_id: &str) -> WardResult<Facility> {
        let path = paths::facility(ctx.organization_id(), facility_id)?;
        let doc = self
            .store
            .get(&path)
            .map_err(WardError::Store)?
            .ok_or_else(|| WardError::FacilityNotFound(facility_id.to_owned()))?;
        doc.deserialize_as().map_err(WardError::Store)
    }

    /// Lists the organization's facilities.
    pub fn list(&self, ctx: &OrgContext) -> WardResult<Vec<(String, Facility)>> {
        let collection = paths::facilities(ctx.organization_id())?;
        let snapshots = self
            .store
            .query(&Query::collection(collection))
            .map_err(WardError::Store)?;

        snapshots
            .into_iter()
            .map(|snapshot| {
                let facility = snapshot.doc.deserialize_as().map_err(WardError::Store)?;
                Ok((snapshot.path.doc_id().to_owned(), facility))
            })
            .collect()
    }

    /// Beds of a facility that are currently free to assign.
    pub fn available_beds(&self, ctx: &OrgContext, facility_id: &str) -> WardResult<Vec<Bed>> {
        let facility = self.get(ctx, facility_id)?;
        Ok(facility.available_beds().into_iter().cloned().collect())
    }

    /// Updates a facility's per-day rate.
    ///
    /// Only future admissions see the new rate; existing admissions keep
    /// the snapshot taken when they were created.
    pub fn set_cost_per_day(
        &self,
        ctx: &OrgContext,
        facility_id: &str,
        cost_per_day: Money,
    ) -> WardResult<()> {
        // Existence check so the caller gets NotFound rather than a commit
        // error.
        self.get(ctx, facility_id)?;

        let path = paths::facility(ctx.organization_id(), facility_id)?;
        let mut fields = serde_json::Map::new();
        fields.insert(
            FIELD_COST_PER_DAY.to_owned(),
            serde_json::to_value(cost_per_day).map_err(|e| WardError::Store(e.into()))?,
        );

        self.store
            .commit(WriteBatch::new().update(path, fields))
            .map_err(WardError::Commit)?;

        tracing::info!(
            facility = facility_id,
            cost_per_day = %cost_per_day,
            actor = ctx.actor_id(),
            "updated facility rate"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::BedStatus;
    use wardbook_docstore::MemoryStore;

    fn ctx() -> OrgContext {
        OrgContext::new(
            NonEmptyText::new("org-1").unwrap(),
            NonEmptyText::new("user-1").unwrap(),
            NonEmptyText::new("Ward Admin").unwrap(),
        )
    }

    fn ward_a() -> NewFacility {
        NewFacility {
            name: NonEmptyText::new("Ward A").unwrap(),
            kind: NonEmptyText::new("ward").unwrap(),
            cost_per_day: Money::from_major(1500),
            bed_ids: ["bed-1", "bed-2", "bed-3"]
                .into_iter()
                .map(|id| NonEmptyText::new(id).unwrap())
                .collect(),
        }
    }

    #[test]
    fn create_and_read_back() {
        let registry = RegistryService::new(Arc::new(MemoryStore::new()));
        let ctx = ctx();

        let id = registry.create(&ctx, ward_a()).unwrap();
        let facility = registry.get(&ctx, &id).unwrap();

        assert_eq!(facility.name.as_str(), "Ward A");
        assert_eq!(facility.total_beds, 3);
        assert!(facility
            .beds
            .values()
            .all(|bed| bed.status == BedStatus::Available));

        assert_eq!(registry.list(&ctx).unwrap().len(), 1);
        assert_eq!(registry.available_beds(&ctx, &id).unwrap().len(), 3);
    }

    #[test]
    fn get_unknown_facility_is_not_found() {
        let registry = RegistryService::new(Arc::new(MemoryStore::new()));
        let err = registry.get(&ctx(), "missing").unwrap_err();
        assert!(matches!(err, WardError::FacilityNotFound(_)));
    }

    #[test]
    fn set_cost_per_day_updates_rate() {
        let registry = RegistryService::new(Arc::new(MemoryStore::new()));
        let ctx = ctx();
        let id = registry.create(&ctx, ward_a()).unwrap();

        registry
            .set_cost_per_day(&ctx, &id, Money::from_major(1750))
            .unwrap();
        assert_eq!(
            registry.get(&ctx, &id).unwrap().cost_per_day,
            Money::from_major(1750)
        );
    }
}
