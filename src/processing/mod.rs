//! Subnet allocation logic.
//!
//! This module contains the business logic of the ledger:
//! - [`normalize`] - subnet specifier parsing and network normalization
//! - [`allocator`] - walking same-size networks and reserving addresses
//! - [`aggregate`] - regrouping stored assignments into subnet views

mod aggregate;
mod allocator;
mod normalize;

// Re-export public functions
pub use aggregate::{
    build_reports, export_summary, group_assignments, ExportEntry, OrganizationReport,
    PrefixCount, ReportQuery, SubnetGroup,
};
pub use allocator::{Allocation, Allocator, SubnetAllocation};
pub use normalize::{is_contiguous_mask, mask_prefix_len, normalize, MaskPolicy, SubnetSpec};
