//! Entry points tying the normalizer, allocator, ledger and reporting together.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::Organization;
use crate::processing::{
    build_reports, export_summary, normalize, Allocator, ExportEntry, MaskPolicy,
    OrganizationReport, ReportQuery,
};
use crate::request::{AllocationRequest, AllocationResult, RegisterRequest, SubnetSummary};
use crate::store::Store;

/// Subnet manager over an injected store.
pub struct SubnetManager<S> {
    ledger: Ledger<S>,
    mask_policy: MaskPolicy,
}

impl<S: Store> SubnetManager<S> {
    pub fn new(store: S) -> Self {
        SubnetManager {
            ledger: Ledger::new(store),
            mask_policy: MaskPolicy::default(),
        }
    }

    pub fn with_mask_policy(mut self, policy: MaskPolicy) -> Self {
        self.mask_policy = policy;
        self
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn register_organization(&self, req: &RegisterRequest) -> Result<Organization> {
        req.validate()?;
        let org = self
            .ledger
            .store()
            .create_organization(&req.org_name, req.pc_count)
            .inspect_err(|e| log::warn!("register_organization({}) failed: {e}", req.org_name))?;
        log::info!("Organization '{}' registered with id {}", org.name, org.id);
        Ok(org)
    }

    pub fn organizations(&self) -> Result<Vec<Organization>> {
        self.ledger.store().organizations()
    }

    /// Normalize the request, then allocate and record its addresses.
    pub fn allocate(&self, req: &AllocationRequest) -> Result<AllocationResult> {
        req.validate()?;
        let start = normalize(&req.ip_address, &req.subnet_spec, self.mask_policy)?;
        let org = self
            .ledger
            .store()
            .find_organization(&req.organization_name)?
            .ok_or_else(|| Error::OrganizationNotFound(req.organization_name.clone()))?;

        let allocation = Allocator::new(&self.ledger)
            .allocate(start, org.id, req.requested_count)
            .inspect_err(|e| log::warn!("allocate({start}) for '{}' failed: {e}", org.name))?;
        log::info!(
            "Allocated {} addresses to '{}' across {} subnets",
            allocation.assigned_count(),
            org.name,
            allocation.subnets.len()
        );
        Ok(AllocationResult::new(&org.name, &allocation))
    }

    pub fn report(&self, query: &ReportQuery) -> Result<Vec<OrganizationReport>> {
        build_reports(&self.ledger, query)
    }

    pub fn export(&self) -> Result<Vec<ExportEntry>> {
        export_summary(&self.ledger)
    }

    /// Describe the network containing `ip` without allocating anything.
    pub fn calculate(&self, ip: &str, subnet_spec: &str) -> Result<SubnetSummary> {
        Ok(normalize(ip, subnet_spec, self.mask_policy)?.into())
    }
}
