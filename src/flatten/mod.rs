//! Turns report records into plain string tables and plans how they are laid
//! into the report template.

use crate::model::{PartRow, ResultRow, TestRow};
use crate::pipeline::Report;

/// Sheet holding the structured result log.
pub const RESULT_SHEET: &str = "Test Result";
/// Sheet holding the parts coverage table.
pub const PARTS_SHEET: &str = "PartsCoverage";

pub const PART_COLUMNS: [&str; 7] = [
    "Step",
    "No.",
    "Components",
    "Testable",
    "Skip",
    "Description",
    "Remark",
];

pub const TEST_ROW_COLUMNS: [&str; 5] = ["Step", "No.", "Components", "Testable", "Skip"];

pub const RESULT_COLUMNS: [&str; 9] = [
    "No.",
    "Component Name",
    "Testing Type",
    "Testing Point No.",
    "Reference Value",
    "Lower Limit(%)",
    "Upper Limit(%)",
    "Measured Value",
    "Result",
];

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    fn new(sheet_name: &str, columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows,
        }
    }

    /// Cell of `row` under the column called `column`; empty when the table
    /// has no such column.
    pub fn value(&self, row: usize, column: &str) -> &str {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.rows.get(row)?.get(index))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Represents all tables required to materialise a standalone workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

fn test_row_cells(row: &TestRow) -> Vec<String> {
    vec![
        row.step.clone(),
        row.no.to_string(),
        row.components.clone(),
        row.testable.as_str().to_string(),
        row.skip.map(|skip| skip.as_str()).unwrap_or_default().to_string(),
    ]
}

pub fn parts_table(sheet_name: &str, rows: &[PartRow]) -> SheetTable {
    let rows = rows
        .iter()
        .map(|part| {
            let mut cells = test_row_cells(&part.row);
            cells.push(part.description.clone());
            cells.push(part.remark.clone());
            cells
        })
        .collect();
    SheetTable::new(sheet_name, &PART_COLUMNS, rows)
}

pub fn test_rows_table(sheet_name: &str, rows: &[TestRow]) -> SheetTable {
    SheetTable::new(
        sheet_name,
        &TEST_ROW_COLUMNS,
        rows.iter().map(test_row_cells).collect(),
    )
}

pub fn results_table(sheet_name: &str, rows: &[ResultRow]) -> SheetTable {
    let rows = rows
        .iter()
        .map(|row| {
            vec![
                row.step_number.clone(),
                row.part_name.clone(),
                row.test_type.clone(),
                row.test_points.clone(),
                row.reference_value.clone(),
                row.lower_limit.clone(),
                row.upper_limit.clone(),
                row.measured_value.clone(),
                row.result.as_str().to_string(),
            ]
        })
        .collect();
    SheetTable::new(sheet_name, &RESULT_COLUMNS, rows)
}

/// Auxiliary tables exported as standalone workbooks, keyed by file name.
/// Empty tables are left out.
pub fn bucket_workbooks(report: &Report) -> Vec<(&'static str, WorkbookData)> {
    let Some(parts) = &report.parts else {
        return Vec::new();
    };
    let tables = [
        ("nc_data.xlsx", test_rows_table("NoConnect", &parts.no_connect)),
        ("dup_data.xlsx", parts_table("Duplicates", &parts.duplicates)),
        (
            "no_desc_data.xlsx",
            parts_table("NoDescription", &parts.no_description),
        ),
    ];
    tables
        .into_iter()
        .filter(|(_, table)| !table.is_empty())
        .map(|(file_name, table)| {
            (
                file_name,
                WorkbookData {
                    tables: vec![table],
                },
            )
        })
        .collect()
}

/// Zero-based cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    /// Parses an A1-style address such as `I7`.
    pub fn parse(address: &str) -> Option<Self> {
        let split = address.find(|ch: char| ch.is_ascii_digit())?;
        let (letters, digits) = address.split_at(split);
        if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return None;
        }
        let col = letters
            .chars()
            .try_fold(0u32, |acc, ch| {
                let value = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
                acc.checked_mul(26)?.checked_add(value)
            })?
            .checked_sub(1)?;
        let row = digits.parse::<u32>().ok()?.checked_sub(1)?;
        Some(Self {
            row,
            col: u16::try_from(col).ok()?,
        })
    }

    const fn at(row: u32, col: u16) -> Self {
        Self { row, col }
    }
}

/// Fixed addresses of the report template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLayout {
    pub result_sheet: String,
    pub parts_sheet: String,
    /// Row naming the body columns.
    pub header_row: u32,
    /// First body row.
    pub body_row: u32,
    pub result_board_name: CellRef,
    pub result_pass_fail: CellRef,
    pub result_test_time: CellRef,
    pub parts_board_name: CellRef,
    pub parts_test_time: CellRef,
    pub parts_coverage: CellRef,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            result_sheet: RESULT_SHEET.to_string(),
            parts_sheet: PARTS_SHEET.to_string(),
            header_row: 9,
            body_row: 10,
            // I4, I7, I8
            result_board_name: CellRef::at(3, 8),
            result_pass_fail: CellRef::at(6, 8),
            result_test_time: CellRef::at(7, 8),
            // H4, H7, C7
            parts_board_name: CellRef::at(3, 7),
            parts_test_time: CellRef::at(6, 7),
            parts_coverage: CellRef::at(6, 2),
        }
    }
}

impl TemplateLayout {
    pub fn required_sheets(&self) -> [&str; 2] {
        [self.result_sheet.as_str(), self.parts_sheet.as_str()]
    }
}

/// What to write into one template sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFill {
    pub sheet_name: String,
    /// Header-area cells written by address.
    pub cells: Vec<(CellRef, String)>,
    pub header_row: u32,
    pub body_row: u32,
    /// Written under the template's header row, matched by column name.
    pub body: SheetTable,
    /// Columns appended to the header row when the template lacks them.
    pub ensure_columns: Vec<String>,
}

/// `0.8512` → `85.12%`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Plans the writes for both template sheets.
pub fn plan_fills(report: &Report, layout: &TemplateLayout) -> Vec<SheetFill> {
    let header = &report.header;
    let result_fill = SheetFill {
        sheet_name: layout.result_sheet.clone(),
        cells: vec![
            (layout.result_pass_fail, header.pass_fail.clone()),
            (layout.result_test_time, header.test_time.clone()),
            (layout.result_board_name, header.board_name.clone()),
        ],
        header_row: layout.header_row,
        body_row: layout.body_row,
        body: results_table(&layout.result_sheet, &report.results),
        ensure_columns: Vec::new(),
    };

    let (board_name, test_time, coverage, unique) = match &report.parts {
        Some(parts) => (
            parts.board_name.clone(),
            parts.test_time.clone(),
            parts.coverage,
            parts.unique.as_slice(),
        ),
        None => (String::new(), String::new(), 0.0, &[][..]),
    };
    let parts_fill = SheetFill {
        sheet_name: layout.parts_sheet.clone(),
        cells: vec![
            (layout.parts_board_name, board_name),
            (layout.parts_test_time, test_time),
            (layout.parts_coverage, format_percentage(coverage)),
        ],
        header_row: layout.header_row,
        body_row: layout.body_row,
        body: parts_table(&layout.parts_sheet, unique),
        ensure_columns: vec!["Description".to_string()],
    };

    vec![result_fill, parts_fill]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SkipFlag, Testability};

    #[test]
    fn parses_cell_addresses() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::at(0, 0)));
        assert_eq!(CellRef::parse("I7"), Some(CellRef::at(6, 8)));
        assert_eq!(CellRef::parse("aa10"), Some(CellRef::at(9, 26)));
        assert_eq!(CellRef::parse("7"), None);
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("A"), None);
    }

    #[test]
    fn default_layout_matches_template_addresses() {
        let layout = TemplateLayout::default();
        assert_eq!(CellRef::parse("I4"), Some(layout.result_board_name));
        assert_eq!(CellRef::parse("I7"), Some(layout.result_pass_fail));
        assert_eq!(CellRef::parse("I8"), Some(layout.result_test_time));
        assert_eq!(CellRef::parse("H4"), Some(layout.parts_board_name));
        assert_eq!(CellRef::parse("H7"), Some(layout.parts_test_time));
        assert_eq!(CellRef::parse("C7"), Some(layout.parts_coverage));
    }

    #[test]
    fn parts_table_looks_up_by_column_name() {
        let mut part = PartRow::new(
            TestRow {
                step: "4".to_string(),
                no: 1,
                components: "C4/R".to_string(),
                testable: Testability::Parallel,
                skip: Some(SkipFlag::Skipped),
            },
            "capacitor",
        );
        part.remark = "it is in parallel with R".to_string();
        let table = parts_table(PARTS_SHEET, &[part]);

        assert_eq!(table.value(0, "Testable"), "L");
        assert_eq!(table.value(0, "Skip"), "1");
        assert_eq!(table.value(0, "Remark"), "it is in parallel with R");
        assert_eq!(table.value(0, "Unknown column"), "");
        assert_eq!(table.value(3, "Step"), "");
    }

    #[test]
    fn formats_percentage_with_two_decimals() {
        assert_eq!(format_percentage(0.6), "60.00%");
        assert_eq!(format_percentage(0.0), "0.00%");
        assert_eq!(format_percentage(2.0 / 3.0), "66.67%");
    }
}
