//! CSV output for subnet reports.

use crate::error::{Error, Result};
use crate::processing::OrganizationReport;
use itertools::Itertools;
use std::io::Write;

const HEADER: &str = "organization,label,subnet,network_address,broadcast_address,first_usable,last_usable,total_hosts,member_count,members";

/// Quote a field if it contains a comma, quote or newline.
pub fn escape_csv_field(input: &str) -> String {
    if input.contains([',', '"', '\n']) {
        // excel does not like spaces after the comma between fields either
        format!("\"{}\"", input.replace('"', "\"\""))
    } else {
        input.to_string()
    }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write one row per subnet group. Members are space separated.
pub fn write_reports_csv<W: Write>(out: &mut W, reports: &[OrganizationReport]) -> Result<()> {
    let io_err = |e: std::io::Error| Error::Storage(format!("Error writing CSV: {e}"));
    writeln!(out, "{HEADER}").map_err(io_err)?;
    for report in reports {
        for group in &report.subnets {
            writeln!(
                out,
                "{org},{label},{subnet},{network},{broadcast},{first},{last},{total},{count},{members}",
                org = escape_csv_field(&report.organization),
                label = escape_csv_field(&group.label),
                subnet = group.subnet,
                network = group.network_address,
                broadcast = group.broadcast_address,
                first = opt_to_string(group.first_usable),
                last = opt_to_string(group.last_usable),
                total = group.total_hosts,
                count = group.member_addresses.len(),
                members = group.member_addresses.iter().join(" "),
            )
            .map_err(io_err)?;
        }
    }
    log::debug!("write_reports_csv() wrote {} organizations", reports.len());
    Ok(())
}
