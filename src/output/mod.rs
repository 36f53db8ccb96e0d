//! Output formatting for ledger data.
//!
//! - [`csv`] - CSV export of subnet reports
//! - [`terminal`] - colored terminal rendering

mod csv;
mod terminal;

pub use csv::{escape_csv_field, write_reports_csv};
pub use terminal::{render_allocation, render_organizations, render_reports};
