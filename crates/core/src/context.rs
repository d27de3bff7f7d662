use wardbook_types::NonEmptyText;

/// Explicit per-call context: which tenant the call operates on and who is
/// acting.
///
/// Every lifecycle and ledger operation takes an `OrgContext` argument
/// instead of reading organization or user identity from ambient session
/// state, so a call's tenancy is always visible at the call site.
#[derive(Clone, Debug)]
pub struct OrgContext {
    organization_id: NonEmptyText,
    actor_id: NonEmptyText,
    actor_name: NonEmptyText,
}

impl OrgContext {
    pub fn new(
        organization_id: NonEmptyText,
        actor_id: NonEmptyText,
        actor_name: NonEmptyText,
    ) -> Self {
        Self {
            organization_id,
            actor_id,
            actor_name,
        }
    }

    pub fn organization_id(&self) -> &str {
        self.organization_id.as_str()
    }

    pub fn actor_id(&self) -> &str {
        self.actor_id.as_str()
    }

    pub fn actor_name(&self) -> &str {
        self.actor_name.as_str()
    }
}
