use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Table, Workbook, Worksheet};

use crate::error::{Result, ToolError};
use crate::flatten::{SheetFill, WorkbookData};
use crate::io::excel_read::{CellValue, TemplateSheet, TemplateWorkbook};

/// Writes the provided workbook data to the given path, one sheet per table
/// with a header row and an autofilter table over the data.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
                }
            }
        }

        if table.rows.is_empty() {
            continue;
        }
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// A cell of the output sheet; `framed` cells get the body format.
#[derive(Debug, Clone)]
struct OutputCell {
    value: CellValue,
    framed: bool,
}

/// Re-emits every template sheet with the planned fills applied.
///
/// Body cells are centred and framed with a thin border over the whole
/// written range; all other template cells are carried over as values.
/// Merged regions are kept, and only their top-left cell is written.
pub fn write_filled_template(
    path: &Path,
    template: &TemplateWorkbook,
    fills: &[SheetFill],
) -> Result<()> {
    for fill in fills {
        if template.sheet(&fill.sheet_name).is_none() {
            return Err(ToolError::InvalidWorkbook(format!(
                "template is missing sheet '{}'",
                fill.sheet_name
            )));
        }
    }

    let body_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    for sheet in &template.sheets {
        let mut cells: BTreeMap<(u32, u16), OutputCell> = sheet
            .cells
            .iter()
            .map(|(&position, value)| {
                let cell = OutputCell {
                    value: value.clone(),
                    framed: false,
                };
                (position, cell)
            })
            .collect();

        if let Some(fill) = fills.iter().find(|fill| fill.sheet_name == sheet.name) {
            apply_fill(sheet, fill, &mut cells);
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for range in &sheet.merged {
            worksheet.merge_range(
                range.first.row,
                range.first.col,
                range.last.row,
                range.last.col,
                "",
                &Format::new(),
            )?;
        }
        for (&(row, col), cell) in &cells {
            if sheet.merged.iter().any(|range| range.covers(row, col)) {
                if cell.framed {
                    tracing::debug!(sheet = %sheet.name, row, col, "skipped merged cell");
                }
                continue;
            }
            write_cell(worksheet, row, col, cell, &body_format)?;
        }
    }

    workbook.save(path)?;
    tracing::info!(path = %path.display(), "wrote report workbook");
    Ok(())
}

fn apply_fill(
    sheet: &TemplateSheet,
    fill: &SheetFill,
    cells: &mut BTreeMap<(u32, u16), OutputCell>,
) {
    let mut headers = sheet.row_texts(fill.header_row);
    for column in &fill.ensure_columns {
        if !headers.contains(column) {
            let col = headers.len() as u16;
            cells.insert(
                (fill.header_row, col),
                OutputCell {
                    value: CellValue::Text(column.clone()),
                    framed: false,
                },
            );
            headers.push(column.clone());
        }
    }

    for (cell_ref, text) in &fill.cells {
        cells.insert(
            (cell_ref.row, cell_ref.col),
            OutputCell {
                value: CellValue::Text(text.clone()),
                framed: false,
            },
        );
    }

    for row_idx in 0..fill.body.rows.len() {
        let row = fill.body_row + row_idx as u32;
        for (col, header) in headers.iter().enumerate() {
            let value = if header.is_empty() {
                ""
            } else {
                fill.body.value(row_idx, header)
            };
            cells.insert(
                (row, col as u16),
                OutputCell {
                    value: CellValue::Text(value.to_string()),
                    framed: true,
                },
            );
        }
    }

    tracing::debug!(
        sheet = %fill.sheet_name,
        rows = fill.body.rows.len(),
        columns = headers.len(),
        "filled template sheet"
    );
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &OutputCell,
    body_format: &Format,
) -> Result<()> {
    match (&cell.value, cell.framed) {
        (CellValue::Text(text), true) if text.is_empty() => {
            worksheet.write_blank(row, col, body_format)?;
        }
        (CellValue::Text(text), true) => {
            worksheet.write_string_with_format(row, col, text, body_format)?;
        }
        (CellValue::Text(text), false) if text.is_empty() => {}
        (CellValue::Text(text), false) => {
            worksheet.write_string(row, col, text)?;
        }
        (CellValue::Number(value), true) => {
            worksheet.write_number_with_format(row, col, *value, body_format)?;
        }
        (CellValue::Number(value), false) => {
            worksheet.write_number(row, col, *value)?;
        }
        (CellValue::Bool(value), true) => {
            worksheet.write_boolean_with_format(row, col, *value, body_format)?;
        }
        (CellValue::Bool(value), false) => {
            worksheet.write_boolean(row, col, *value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use calamine::{DataType, Reader, Xlsx, open_workbook};
    use tempfile::tempdir;

    use super::*;
    use crate::flatten::SheetTable;

    fn table(sheet_name: &str, rows: Vec<Vec<String>>) -> SheetTable {
        SheetTable {
            sheet_name: sheet_name.to_string(),
            columns: vec!["Step".to_string(), "Components".to_string()],
            rows,
        }
    }

    #[test]
    fn writes_one_sheet_per_table() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("buckets.xlsx");
        let data = WorkbookData {
            tables: vec![
                table(
                    "Duplicates",
                    vec![
                        vec!["3".to_string(), "C3".to_string()],
                        vec!["9".to_string(), String::new()],
                    ],
                ),
                table("NoConnect", Vec::new()),
            ],
        };
        write_workbook(&path, &data)?;

        let mut workbook: Xlsx<_> = open_workbook(&path)?;
        assert_eq!(workbook.sheet_names().to_owned(), vec!["Duplicates", "NoConnect"]);

        let range = workbook
            .worksheet_range("Duplicates")
            .expect("sheet present")?;
        assert_eq!(
            range.get_value((0, 1)),
            Some(&DataType::String("Components".to_string()))
        );
        assert_eq!(
            range.get_value((1, 1)),
            Some(&DataType::String("C3".to_string()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&DataType::String("9".to_string()))
        );

        let empty = workbook
            .worksheet_range("NoConnect")
            .expect("sheet present")?;
        assert_eq!(
            empty.get_value((0, 0)),
            Some(&DataType::String("Step".to_string()))
        );
        assert_eq!(empty.height(), 1);
        Ok(())
    }
}
