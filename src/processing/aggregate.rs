//! Regroups stored assignments into per-subnet views.
//!
//! Groups are rebuilt from the stored `(address, prefix)` pairs only, never
//! from allocation history, so running this twice over the same data gives
//! the same output.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{Network, Organization};
use crate::store::Store;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Assigned addresses of one organization that share a containing network.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    /// "Subnet N", numbered in first-seen order.
    pub label: String,
    pub subnet: Network,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    pub first_usable: Option<Ipv4Addr>,
    pub last_usable: Option<Ipv4Addr>,
    /// Usable host capacity of the subnet, not the number of members.
    pub total_hosts: u64,
    pub member_addresses: Vec<Ipv4Addr>,
}

impl SubnetGroup {
    fn new(index: usize, subnet: Network) -> Self {
        SubnetGroup {
            label: format!("Subnet {}", index + 1),
            subnet,
            network_address: subnet.network_address(),
            broadcast_address: subnet.broadcast_address(),
            first_usable: subnet.first_usable(),
            last_usable: subnet.last_usable(),
            total_hosts: subnet.usable_capacity(),
            member_addresses: Vec::new(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrganizationReport {
    pub organization: String,
    pub subnets: Vec<SubnetGroup>,
}

/// Which organizations a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportQuery {
    All,
    Organization(String),
}

impl FromStr for ReportQuery {
    type Err = Error;

    /// "all" selects every organization; anything else is an organization name.
    fn from_str(s: &str) -> Result<ReportQuery> {
        match s {
            "" => Err(Error::InvalidRequest("empty organization name".to_string())),
            "all" => Ok(ReportQuery::All),
            name => Ok(ReportQuery::Organization(name.to_string())),
        }
    }
}

/// Group `(address, prefix)` rows by containing network, keeping groups and
/// members in the order first seen.
pub fn group_assignments(rows: &[(Ipv4Addr, u8)]) -> Result<Vec<SubnetGroup>> {
    let mut groups: Vec<SubnetGroup> = Vec::new();
    let mut index: HashMap<Network, usize> = HashMap::new();

    for &(addr, prefix) in rows {
        let subnet = Network::containing(addr, prefix)?;
        let i = *index.entry(subnet).or_insert_with(|| {
            groups.push(SubnetGroup::new(groups.len(), subnet));
            groups.len() - 1
        });
        groups[i].member_addresses.push(addr);
    }
    Ok(groups)
}

fn selected_organizations<S: Store>(store: &S, query: &ReportQuery) -> Result<Vec<Organization>> {
    match query {
        ReportQuery::All => store.organizations(),
        ReportQuery::Organization(name) => store
            .find_organization(name)?
            .map(|org| vec![org])
            .ok_or_else(|| Error::OrganizationNotFound(name.clone())),
    }
}

/// Subnet view for every organization selected by `query`, in registration order.
pub fn build_reports<S: Store>(
    ledger: &Ledger<S>,
    query: &ReportQuery,
) -> Result<Vec<OrganizationReport>> {
    let orgs = selected_organizations(ledger.store(), query)?;
    log::info!("build_reports({query:?}) for {} organizations", orgs.len());

    orgs.into_iter()
        .map(|org| {
            let rows = ledger.list_by_organization(org.id)?;
            Ok(OrganizationReport {
                organization: org.name,
                subnets: group_assignments(&rows)?,
            })
        })
        .collect()
}

/// Number of assignments stored under one prefix length.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PrefixCount {
    pub cidr: u8,
    pub pc_count: usize,
}

/// Per-organization assignment counts grouped by prefix length.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub organization: String,
    pub subnet_count: usize,
    pub subnets: Vec<PrefixCount>,
}

/// Export summary over all organizations. Prefixes are listed in ascending order.
pub fn export_summary<S: Store>(ledger: &Ledger<S>) -> Result<Vec<ExportEntry>> {
    ledger
        .store()
        .organizations()?
        .into_iter()
        .map(|org| {
            let subnets: Vec<PrefixCount> = ledger
                .list_by_organization(org.id)?
                .into_iter()
                .map(|(_, prefix)| prefix)
                .sorted()
                .dedup_with_count()
                .map(|(pc_count, cidr)| PrefixCount { cidr, pc_count })
                .collect();
            Ok(ExportEntry {
                organization: org.name,
                subnet_count: subnets.len(),
                subnets,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
        Ipv4Addr::new(a, b, c, d)
    }

    #[test]
    fn test_group_first_seen_order() {
        let rows = vec![
            (ip(10, 0, 1, 5), 24),
            (ip(10, 0, 0, 1), 24),
            (ip(10, 0, 1, 2), 24),
            (ip(10, 0, 0, 9), 24),
        ];
        let groups = group_assignments(&rows).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Subnet 1");
        assert_eq!(groups[0].subnet.to_string(), "10.0.1.0/24");
        assert_eq!(groups[0].member_addresses, vec![ip(10, 0, 1, 5), ip(10, 0, 1, 2)]);
        assert_eq!(groups[1].label, "Subnet 2");
        assert_eq!(groups[1].subnet.to_string(), "10.0.0.0/24");
        assert_eq!(groups[1].first_usable, Some(ip(10, 0, 0, 1)));
        assert_eq!(groups[1].last_usable, Some(ip(10, 0, 0, 254)));
        assert_eq!(groups[1].total_hosts, 254);
    }

    #[test]
    fn test_group_same_address_different_prefix() {
        let rows = vec![(ip(10, 0, 0, 5), 24), (ip(10, 0, 0, 6), 30)];
        let groups = group_assignments(&rows).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].subnet.to_string(), "10.0.0.4/30");
        assert_eq!(groups[1].total_hosts, 2);
    }

    #[test]
    fn test_group_is_idempotent() {
        let rows = vec![(ip(192, 168, 1, 1), 30), (ip(192, 168, 1, 5), 30)];
        assert_eq!(
            group_assignments(&rows).unwrap(),
            group_assignments(&rows).unwrap()
        );
    }

    #[test]
    fn test_report_query_parse() {
        assert_eq!("all".parse::<ReportQuery>().unwrap(), ReportQuery::All);
        assert_eq!(
            "acme".parse::<ReportQuery>().unwrap(),
            ReportQuery::Organization("acme".to_string())
        );
        assert!("".parse::<ReportQuery>().is_err());
    }

    #[test]
    fn test_build_reports_and_export() {
        let ledger = Ledger::new(MemoryStore::new());
        let a = ledger.store().create_organization("acme", 3).unwrap();
        let b = ledger.store().create_organization("globex", 0).unwrap();
        ledger.reserve(ip(10, 0, 0, 1), a.id, 30).unwrap();
        ledger.reserve(ip(10, 0, 0, 2), a.id, 30).unwrap();
        ledger.reserve(ip(10, 0, 0, 5), a.id, 30).unwrap();
        ledger.reserve(ip(172, 16, 0, 1), a.id, 16).unwrap();

        let reports = build_reports(&ledger, &ReportQuery::All).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].organization, "acme");
        assert_eq!(reports[0].subnets.len(), 3);
        assert_eq!(reports[1].organization, "globex");
        assert!(reports[1].subnets.is_empty());

        let one = build_reports(&ledger, &ReportQuery::Organization("acme".into())).unwrap();
        assert_eq!(one, reports[..1].to_vec());
        assert_eq!(
            build_reports(&ledger, &ReportQuery::Organization("initech".into())).unwrap_err(),
            Error::OrganizationNotFound("initech".to_string())
        );

        let export = export_summary(&ledger).unwrap();
        assert_eq!(export[0].subnet_count, 2);
        assert_eq!(
            export[0].subnets,
            vec![
                PrefixCount { cidr: 16, pc_count: 1 },
                PrefixCount { cidr: 30, pc_count: 3 },
            ]
        );
        assert_eq!(export[1].organization, b.name);
        assert_eq!(export[1].subnet_count, 0);
    }
}
