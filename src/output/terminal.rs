//! Terminal rendering with colors.

use crate::models::Organization;
use crate::processing::OrganizationReport;
use crate::request::AllocationResult;
use chrono_tz::Tz;
use colored::Colorize;
use itertools::Itertools;

fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Subnet groups of each organization, one block per organization.
pub fn render_reports(reports: &[OrganizationReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!(
            "{} ({} subnets)\n",
            report.organization.bold(),
            report.subnets.len()
        ));
        if report.subnets.is_empty() {
            out.push_str(&format!("  {}\n", "no addresses assigned".dimmed()));
        }
        for group in &report.subnets {
            out.push_str(&format!(
                "  {label:<10} {subnet:<18} br={broadcast:<15} usable={first}-{last} hosts={used}/{total}\n",
                label = group.label.cyan(),
                subnet = group.subnet.to_string(),
                broadcast = group.broadcast_address.to_string(),
                first = or_na(group.first_usable),
                last = or_na(group.last_usable),
                used = group.member_addresses.len(),
                total = group.total_hosts,
            ));
            out.push_str(&format!(
                "    {}\n",
                group.member_addresses.iter().join(", ")
            ));
        }
    }
    out
}

/// Registered organizations with their registration time in `tz`.
pub fn render_organizations(orgs: &[Organization], tz: Tz) -> String {
    let mut out = String::new();
    for org in orgs {
        out.push_str(&format!(
            "{id:>4} {name:<24} pcs={pcs:<6} registered {at}\n",
            id = org.id,
            name = org.name.bold(),
            pcs = org.pc_count,
            at = org.created_at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z"),
        ));
    }
    out
}

pub fn render_allocation(result: &AllocationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} network={} broadcast={} usable={}\n",
        result.organization.bold(),
        result.assigned_subnet.to_string().green(),
        result.network_address,
        result.broadcast_address,
        result.total_usable_hosts
    ));
    for (i, s) in result.assigned_subnets.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3}. {:<18} {}-{} pcs={}\n",
            i + 1,
            s.subnet.to_string(),
            or_na(s.first_usable),
            or_na(s.last_usable),
            s.pcs_allocated
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::group_assignments;
    use chrono::{TimeZone, Utc};
    use std::net::Ipv4Addr;

    #[test]
    fn test_render_reports() {
        colored::control::set_override(false);
        let reports = vec![
            OrganizationReport {
                organization: "acme".to_string(),
                subnets: group_assignments(&[(Ipv4Addr::new(10, 0, 0, 1), 24)]).unwrap(),
            },
            OrganizationReport {
                organization: "globex".to_string(),
                subnets: vec![],
            },
        ];
        let text = render_reports(&reports);
        assert!(text.contains("acme (1 subnets)"));
        assert!(text.contains("10.0.0.0/24"));
        assert!(text.contains("usable=10.0.0.1-10.0.0.254 hosts=1/254"));
        assert!(text.contains("globex (0 subnets)"));
        assert!(text.contains("no addresses assigned"));
    }

    #[test]
    fn test_render_organizations_in_tz() {
        colored::control::set_override(false);
        let org = Organization {
            id: 1,
            name: "acme".to_string(),
            pc_count: 5,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let text = render_organizations(&[org], chrono_tz::Pacific::Auckland);
        assert!(text.contains("2024-01-01 13:00:00 NZDT"), "{text}");
    }

    #[test]
    fn test_render_allocation_lists_every_subnet() {
        colored::control::set_override(false);
        let result = AllocationResult {
            organization: "acme".to_string(),
            assigned_subnet: "10.0.0.0/30".parse().unwrap(),
            network_address: Ipv4Addr::new(10, 0, 0, 0),
            broadcast_address: Ipv4Addr::new(10, 0, 0, 3),
            total_usable_hosts: 2,
            assigned_subnets: vec![
                crate::request::AssignedSubnet {
                    subnet: "10.0.0.0/30".parse().unwrap(),
                    network_address: Ipv4Addr::new(10, 0, 0, 0),
                    broadcast_address: Ipv4Addr::new(10, 0, 0, 3),
                    first_usable: Some(Ipv4Addr::new(10, 0, 0, 1)),
                    last_usable: Some(Ipv4Addr::new(10, 0, 0, 2)),
                    pcs_allocated: 2,
                },
                crate::request::AssignedSubnet {
                    subnet: "10.0.0.4/30".parse().unwrap(),
                    network_address: Ipv4Addr::new(10, 0, 0, 4),
                    broadcast_address: Ipv4Addr::new(10, 0, 0, 7),
                    first_usable: None,
                    last_usable: None,
                    pcs_allocated: 1,
                },
            ],
        };
        let text = render_allocation(&result);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "{text}");
        assert_eq!(
            lines[0],
            "acme 10.0.0.0/30 network=10.0.0.0 broadcast=10.0.0.3 usable=2"
        );
        assert!(lines[1].contains("10.0.0.1-10.0.0.2 pcs=2"), "{text}");
        assert!(lines[2].contains("N/A-N/A pcs=1"), "{text}");
        assert!(text.ends_with('\n'));
    }
}
