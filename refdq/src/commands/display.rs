// refdq/src/commands/display.rs
//
// Terminal rendering of session results.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::Value;

use refdq_core::domain::row::Row;
use refdq_core::domain::schema::SchemaMismatch;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result rows as a table, at most `cap` of them.
pub fn rows_table(rows: &[Row], cap: usize) -> Table {
    let mut table = base_table();
    if let Some(first) = rows.first() {
        table.set_header(first.columns().map(Cell::new));
    }
    for row in rows.iter().take(cap) {
        table.add_row(row.values().map(|v| Cell::new(cell_text(v))));
    }
    table
}

pub fn print_rows(rows: &[Row], cap: usize) {
    println!("{}", rows_table(rows, cap));
    if rows.len() > cap {
        println!("   … {} more rows not shown", rows.len() - cap);
    }
}

pub fn mismatch_table(mismatches: &[SchemaMismatch]) -> Table {
    let mut table = base_table();
    table.set_header(["Column", "Target type", "Upload type", "Reason"]);
    for m in mismatches {
        table.add_row([
            m.column.clone(),
            m.target_type.clone(),
            m.staged_type.clone().unwrap_or_else(|| "-".to_string()),
            m.reason.to_string(),
        ]);
    }
    table
}
