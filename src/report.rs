//! The markdown status report: configured statuses with their problems,
//! followed by the diagram of the statuses actually loaded.

use crate::check::{printable_symbol, problems_for_status};
use crate::config::StatusSettings;
use crate::registry::StatusRegistry;

const TABLE_HEADINGS: [&str; 5] = [
    "Status Symbol",
    "Next Status Symbol",
    "Status Name",
    "Status Type",
    "Problems (if any)",
];

/// One row per configured status, core first, in a markdown table.
pub fn tabulate_status_settings(settings: &StatusSettings) -> String {
    let statuses = settings.all_statuses();
    let mut table = String::new();
    table.push_str(&table_row(TABLE_HEADINGS.iter().map(|h| h.to_string())));
    table.push_str(&table_row(TABLE_HEADINGS.iter().map(|_| "-----".to_string())));

    for (index, status) in statuses.iter().enumerate() {
        table.push_str(&table_row([
            printable_symbol(&status.symbol),
            printable_symbol(&status.next_status_symbol),
            status.name.clone(),
            printable_symbol(status.status_type.as_str()),
            problems_for_status(&statuses, index).join("<br>"),
        ]));
    }
    table
}

fn table_row(cells: impl IntoIterator<Item = String>) -> String {
    let mut row = String::from("|");
    for cell in cells {
        row.push(' ');
        row.push_str(&cell.replace('|', "\\|"));
        row.push_str(" |");
    }
    row.push('\n');
    row
}

pub fn status_report(settings: &StatusSettings, registry: &StatusRegistry) -> String {
    format!(
        "# Review and check your Statuses

## Status Settings

These are the status values in the Core and Custom statuses sections.

{}
## Loaded Settings

These are the settings actually used when changing task statuses.
{}",
        tabulate_status_settings(settings),
        registry.mermaid_diagram(true)
    )
}
