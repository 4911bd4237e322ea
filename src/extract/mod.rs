// src/extract/mod.rs
pub mod table;

use crate::normalize;
use self::table::ParsedRow;

/// Which of the two per-month data tables a record came from. The tables
/// share one structure but are kept as separate record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    VehicleClass,
    VehicleCategory,
}

impl TableKind {
    /// Value of the `Table` column in the combined output.
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::VehicleClass => "Vehicle Class",
            TableKind::VehicleCategory => "Vehicle Category",
        }
    }

    /// Suffix appended to the per-state sheet name.
    pub fn sheet_suffix(&self) -> &'static str {
        match self {
            TableKind::VehicleClass => "_Class",
            TableKind::VehicleCategory => "_Category",
        }
    }
}

/// One flat registration row for a (state, year, month) selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub state: String,
    pub year: i32,
    /// Month label as shown in the UI; empty when the block had none.
    pub month: String,
    pub month_num: Option<u32>,
    /// `YYYY-MM-01`, derived from `year` and `month`.
    pub date: Option<String>,
    /// Aggregate total from the month block's label, when present.
    pub month_total: Option<i64>,
    pub group: Option<String>,
    pub category: String,
    pub total: Option<i64>,
    pub table: TableKind,
}

/// Turn one rendered table (as row cell texts) into records, stamping the
/// month context on each. `month_num` and `date` derive from the label the
/// same way for both table kinds.
pub fn records_for_month(
    state: &str,
    year: i32,
    month_label: &str,
    month_total: Option<i64>,
    kind: TableKind,
    rows: &[Vec<String>],
) -> Vec<Record> {
    let month_num = normalize::month_number(month_label);
    let date = normalize::month_to_date(year, month_label);

    table::parse_rows(rows)
        .into_iter()
        .map(
            |ParsedRow {
                 group,
                 category,
                 total,
             }| Record {
                state: state.to_string(),
                year,
                month: month_label.to_string(),
                month_num,
                date: date.clone(),
                month_total,
                group,
                category,
                total,
                table: kind,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_rows() -> Vec<Vec<String>> {
        vec![
            vec!["Two Wheelers".to_string()],
            vec!["Scooter".to_string(), "10".to_string()],
            vec!["Motorcycle".to_string(), "20".to_string()],
        ]
    }

    #[test]
    fn assembles_month_records() {
        let records =
            records_for_month("Goa", 2023, "JAN", Some(30), TableKind::VehicleClass, &class_rows());

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.state, "Goa");
        assert_eq!(first.year, 2023);
        assert_eq!(first.month, "JAN");
        assert_eq!(first.month_num, Some(1));
        assert_eq!(first.date.as_deref(), Some("2023-01-01"));
        assert_eq!(first.month_total, Some(30));
        assert_eq!(first.group.as_deref(), Some("Two Wheelers"));
        assert_eq!(first.category, "Scooter");
        assert_eq!(first.total, Some(10));
        assert_eq!(first.table, TableKind::VehicleClass);

        assert_eq!(records[1].category, "Motorcycle");
        assert_eq!(records[1].total, Some(20));
        assert_eq!(records[1].group.as_deref(), Some("Two Wheelers"));
    }

    #[test]
    fn unknown_month_label_leaves_dates_absent() {
        let records =
            records_for_month("Goa", 2023, "", None, TableKind::VehicleCategory, &class_rows());
        assert!(records.iter().all(|record| record.month_num.is_none()));
        assert!(records.iter().all(|record| record.date.is_none()));
        assert!(records.iter().all(|record| record.month_total.is_none()));
        assert_eq!(records[0].table, TableKind::VehicleCategory);
    }

    #[test]
    fn table_kind_labels_and_suffixes() {
        assert_eq!(TableKind::VehicleClass.label(), "Vehicle Class");
        assert_eq!(TableKind::VehicleCategory.label(), "Vehicle Category");
        assert_eq!(TableKind::VehicleClass.sheet_suffix(), "_Class");
        assert_eq!(TableKind::VehicleCategory.sheet_suffix(), "_Category");
    }
}
