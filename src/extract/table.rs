// src/extract/table.rs
//
// Group-aware parser for the dashboard's data tables. The tables interleave
// section header rows (a single spanning cell, e.g. "Two Wheelers") with
// data rows; a header applies to every following data row until the next
// non-blank header.
use scraper::{Html, Selector};

use crate::normalize;

/// One data row after group resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub group: Option<String>,
    pub category: String,
    pub total: Option<i64>,
}

/// Extract `<tr>` rows from a table's HTML as trimmed `<td>` cell texts.
/// Rows without `<td>` cells (e.g. `<th>` header rows) come back as empty
/// vectors so they fall through `parse_rows` without effect.
pub fn table_rows(html: &str) -> Vec<Vec<String>> {
    let row_selector = Selector::parse("tr").expect("valid row selector");
    let cell_selector = Selector::parse("td").expect("valid cell selector");

    let fragment = Html::parse_fragment(html);
    fragment
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect()
}

/// Walk the rows in order, carrying the current group header forward.
///
/// A row with exactly one cell is a header: a non-blank one replaces the
/// carried group, a blank one leaves it unchanged, and neither emits a row.
/// A row with two or more cells emits one `ParsedRow` (cells beyond the
/// second are ignored). The carried group starts absent on every call.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<ParsedRow> {
    let mut current_group: Option<String> = None;
    let mut parsed = Vec::new();

    for cells in rows {
        match cells.len() {
            1 => {
                let text = cells[0].trim();
                if !text.is_empty() {
                    current_group = Some(text.to_string());
                }
            }
            n if n >= 2 => {
                parsed.push(ParsedRow {
                    group: current_group.clone(),
                    category: cells[0].trim().to_string(),
                    total: normalize::to_integer(Some(&cells[1])),
                });
            }
            _ => {}
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(layout: &[&[&str]]) -> Vec<Vec<String>> {
        layout
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn carries_group_headers_forward() {
        let input = rows(&[
            &["Group A"],
            &["x", "1"],
            &[""],
            &["y", "2"],
            &["Group B"],
            &["z", "3"],
        ]);
        assert_eq!(
            parse_rows(&input),
            vec![
                ParsedRow {
                    group: Some("Group A".to_string()),
                    category: "x".to_string(),
                    total: Some(1),
                },
                ParsedRow {
                    group: Some("Group A".to_string()),
                    category: "y".to_string(),
                    total: Some(2),
                },
                ParsedRow {
                    group: Some("Group B".to_string()),
                    category: "z".to_string(),
                    total: Some(3),
                },
            ]
        );
    }

    #[test]
    fn group_starts_absent_on_every_call() {
        parse_rows(&rows(&[&["Group A"], &["x", "1"]]));
        let second = parse_rows(&rows(&[&["y", "2"]]));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].group, None);
    }

    #[test]
    fn repeated_parse_is_identical() {
        let input = rows(&[&["Group A"], &["x", "1"], &["y", "2"]]);
        assert_eq!(parse_rows(&input), parse_rows(&input));
    }

    #[test]
    fn cells_beyond_the_second_are_ignored() {
        let parsed = parse_rows(&rows(&[&["x", "1,000", "ignored"]]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].category, "x");
        assert_eq!(parsed[0].total, Some(1000));
    }

    #[test]
    fn rows_without_cells_do_not_disturb_the_group() {
        let input = rows(&[&["Group A"], &[], &["x", "1"]]);
        let parsed = parse_rows(&input);
        assert_eq!(parsed[0].group.as_deref(), Some("Group A"));
    }

    #[test]
    fn unparseable_totals_are_absent() {
        let parsed = parse_rows(&rows(&[&["x", "n/a"]]));
        assert_eq!(parsed[0].total, None);
    }

    #[test]
    fn extracts_td_rows_from_html() {
        let html = r#"<table>
            <tr><th>Vehicle Class</th><th>Total</th></tr>
            <tr><td colspan="2">Two Wheelers</td></tr>
            <tr><td>Scooter</td><td> 1,234 </td></tr>
        </table>"#;
        let rows = table_rows(html);
        assert_eq!(
            rows,
            vec![
                Vec::<String>::new(),
                vec!["Two Wheelers".to_string()],
                vec!["Scooter".to_string(), "1,234".to_string()],
            ]
        );
    }

    #[test]
    fn html_headers_do_not_break_group_carry() {
        let html = r#"<table>
            <tr><th>Vehicle Class</th><th>Total</th></tr>
            <tr><td>Two Wheelers</td></tr>
            <tr><td>Scooter</td><td>10</td></tr>
            <tr><td>Motorcycle</td><td>20</td></tr>
        </table>"#;
        let parsed = parse_rows(&table_rows(html));
        assert_eq!(parsed.len(), 2);
        assert!(parsed
            .iter()
            .all(|row| row.group.as_deref() == Some("Two Wheelers")));
    }
}
