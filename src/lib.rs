//! IPv4 subnet ledger.
//!
//! Assigns host addresses to organizations by walking same-size subnets from a
//! requested base network, records every address in a ledger that keeps it
//! globally unique, and regroups stored addresses into subnet reports.
//!
//! ```
//! use subnet_ledger::{AllocationRequest, MemoryStore, RegisterRequest, SubnetManager};
//!
//! let manager = SubnetManager::new(MemoryStore::new());
//! manager
//!     .register_organization(&RegisterRequest { org_name: "acme".into(), pc_count: 5 })
//!     .unwrap();
//! let result = manager
//!     .allocate(&AllocationRequest {
//!         organization_name: "acme".into(),
//!         ip_address: "192.168.1.0".into(),
//!         subnet_spec: "30".into(),
//!         requested_count: 5,
//!     })
//!     .unwrap();
//! assert_eq!(result.assigned_subnets.len(), 3);
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod output;
pub mod processing;
pub mod request;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{Batch, Ledger};
pub use models::{HostAssignment, Network, Organization};
pub use processing::{Allocation, Allocator, MaskPolicy, ReportQuery};
pub use request::{AllocationRequest, AllocationResult, RegisterRequest, SubnetSummary};
pub use service::SubnetManager;
pub use store::{JsonFileStore, MemoryStore, Store};
