// src/export.rs
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{info, warn};

use crate::extract::{Record, TableKind};

/// Sheet names are capped well under the XLSX limit, matching the output
/// consumers already built against. Two states sharing a truncated prefix
/// would collide; the duplicate sheet is skipped with a warning.
const SHEET_NAME_LIMIT: usize = 24;

const COMBINED_SHEET_NAME: &str = "All_Combined";

const PER_STATE_HEADER: [&str; 9] = [
    "State",
    "Year",
    "Month",
    "Month_Num",
    "Date",
    "Month_Total",
    "Group",
    "Category",
    "Total",
];

const COMBINED_HEADER: [&str; 10] = [
    "State",
    "Year",
    "Month",
    "Month_Num",
    "Date",
    "Month_Total",
    "Table",
    "Group",
    "Category",
    "Total",
];

/// Write the workbook: per state (in roster order) one `_Class` and one
/// `_Category` sheet when that state has records of that kind, then the
/// combined sheet with the extra `Table` column. The workbook is written
/// even when nothing was collected.
pub fn write_workbook(
    path: &Path,
    states: &[String],
    class_records: &[Record],
    category_records: &[Record],
) -> Result<()> {
    let mut workbook = Workbook::new();
    let mut used_names: HashSet<String> = HashSet::new();

    for state in states {
        for (kind, records) in [
            (TableKind::VehicleClass, class_records),
            (TableKind::VehicleCategory, category_records),
        ] {
            let rows: Vec<&Record> = records
                .iter()
                .filter(|record| record.state == *state)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let name = format!(
                "{}{}",
                truncate_chars(state, SHEET_NAME_LIMIT),
                kind.sheet_suffix()
            );
            if !used_names.insert(name.clone()) {
                warn!(sheet = %name, state = %state, "sheet name collides after truncation, skipping");
                continue;
            }

            let sheet = workbook.add_worksheet();
            sheet
                .set_name(&name)
                .with_context(|| format!("naming sheet `{name}`"))?;
            write_state_sheet(sheet, &rows)?;
        }
    }

    let combined: Vec<&Record> = class_records
        .iter()
        .chain(category_records.iter())
        .collect();
    let sheet = workbook.add_worksheet();
    sheet.set_name(COMBINED_SHEET_NAME).context("naming combined sheet")?;
    write_combined_sheet(sheet, &combined)?;

    workbook
        .save(path)
        .with_context(|| format!("saving workbook to {}", path.display()))?;
    info!(
        path = %path.display(),
        records = combined.len(),
        "workbook written"
    );
    Ok(())
}

fn write_state_sheet(sheet: &mut Worksheet, records: &[&Record]) -> Result<()> {
    for (col, title) in PER_STATE_HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, record.state.as_str())?;
        sheet.write_number(row, 1, record.year as f64)?;
        sheet.write_string(row, 2, record.month.as_str())?;
        if let Some(month_num) = record.month_num {
            sheet.write_number(row, 3, month_num as f64)?;
        }
        if let Some(date) = &record.date {
            sheet.write_string(row, 4, date.as_str())?;
        }
        if let Some(month_total) = record.month_total {
            sheet.write_number(row, 5, month_total as f64)?;
        }
        if let Some(group) = &record.group {
            sheet.write_string(row, 6, group.as_str())?;
        }
        sheet.write_string(row, 7, record.category.as_str())?;
        if let Some(total) = record.total {
            sheet.write_number(row, 8, total as f64)?;
        }
    }
    Ok(())
}

fn write_combined_sheet(sheet: &mut Worksheet, records: &[&Record]) -> Result<()> {
    for (col, title) in COMBINED_HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, record.state.as_str())?;
        sheet.write_number(row, 1, record.year as f64)?;
        sheet.write_string(row, 2, record.month.as_str())?;
        if let Some(month_num) = record.month_num {
            sheet.write_number(row, 3, month_num as f64)?;
        }
        if let Some(date) = &record.date {
            sheet.write_string(row, 4, date.as_str())?;
        }
        if let Some(month_total) = record.month_total {
            sheet.write_number(row, 5, month_total as f64)?;
        }
        sheet.write_string(row, 6, record.table.label())?;
        if let Some(group) = &record.group {
            sheet.write_string(row, 7, group.as_str())?;
        }
        sheet.write_string(row, 8, record.category.as_str())?;
        if let Some(total) = record.total {
            sheet.write_number(row, 9, total as f64)?;
        }
    }
    Ok(())
}

/// Character-count truncation; never splits a multi-byte character.
fn truncate_chars(name: &str, limit: usize) -> String {
    name.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::records_for_month;
    use tempfile::tempdir;

    fn sample_records(state: &str, kind: TableKind) -> Vec<Record> {
        let rows = vec![
            vec!["Two Wheelers".to_string()],
            vec!["Scooter".to_string(), "10".to_string()],
        ];
        records_for_month(state, 2023, "JAN", Some(10), kind, &rows)
    }

    #[test]
    fn writes_per_state_and_combined_sheets() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.xlsx");
        let states = vec!["Goa".to_string(), "Kerala".to_string()];
        let class_records = sample_records("Goa", TableKind::VehicleClass);
        let category_records = sample_records("Goa", TableKind::VehicleCategory);

        write_workbook(&path, &states, &class_records, &category_records)?;

        assert!(path.is_file());
        assert!(std::fs::metadata(&path)?.len() > 0);
        Ok(())
    }

    #[test]
    fn empty_run_still_writes_a_workbook() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.xlsx");

        write_workbook(&path, &["Goa".to_string()], &[], &[])?;

        assert!(path.is_file());
        Ok(())
    }

    #[test]
    fn colliding_truncated_names_keep_the_first_sheet() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("collide.xlsx");
        let long_a = "Dadra and Nagar Haveli and Daman and Diu".to_string();
        let long_b = "Dadra and Nagar Haveli an Exclave".to_string();
        let mut class_records = sample_records(&long_a, TableKind::VehicleClass);
        class_records.extend(sample_records(&long_b, TableKind::VehicleClass));

        // Both truncate to the same 24-character prefix; only the first
        // survives, and the write still succeeds.
        write_workbook(&path, &[long_a, long_b], &class_records, &[])?;

        assert!(path.is_file());
        Ok(())
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(
            truncate_chars("Andaman & Nicobar Island(UT)", 24),
            "Andaman & Nicobar Island"
        );
        let devanagari = "अरुणाचल प्रदेश अरुणाचल प्रदेश".to_string();
        assert!(truncate_chars(&devanagari, 24).chars().count() <= 24);
    }
}
