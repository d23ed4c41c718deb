use std::collections::BTreeMap;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};
use crate::io::merged::{self, MergedRange};

/// A literal cell value carried over from the template.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(value) => value.to_string(),
        }
    }
}

/// Non-empty cells of one template sheet, keyed by zero-based `(row, column)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateSheet {
    pub name: String,
    pub cells: BTreeMap<(u32, u16), CellValue>,
    pub merged: Vec<MergedRange>,
}

impl TemplateSheet {
    /// Number of columns spanned by the sheet's used area.
    pub fn width(&self) -> u16 {
        self.cells
            .keys()
            .map(|&(_, col)| col + 1)
            .max()
            .unwrap_or(0)
    }

    /// Text of every cell in `row` across the sheet width; blanks are empty.
    pub fn row_texts(&self, row: u32) -> Vec<String> {
        (0..self.width())
            .map(|col| {
                self.cells
                    .get(&(row, col))
                    .map(CellValue::as_text)
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// All sheets of a template workbook, in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateWorkbook {
    pub sheets: Vec<TemplateSheet>,
}

impl TemplateWorkbook {
    pub fn sheet(&self, name: &str) -> Option<&TemplateSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Loads every sheet of the template and checks that the `required` sheets
/// are present.
pub fn read_template(path: &Path, required: &[&str]) -> Result<TemplateWorkbook> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names: Vec<String> = workbook.sheet_names().to_owned();

    for name in required {
        if !names.iter().any(|sheet| sheet == name) {
            return Err(ToolError::InvalidWorkbook(format!(
                "template is missing sheet '{name}'"
            )));
        }
    }

    let mut regions = merged::read_merged_regions(path)?;
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = read_sheet(&mut workbook, &name)?;
        sheets.push(TemplateSheet {
            cells: collect_cells(&range),
            merged: regions.remove(&name).unwrap_or_default(),
            name,
        });
    }

    tracing::debug!(sheets = sheets.len(), "loaded template");
    Ok(TemplateWorkbook { sheets })
}

fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn collect_cells(range: &calamine::Range<DataType>) -> BTreeMap<(u32, u16), CellValue> {
    let Some((start_row, start_col)) = range.start() else {
        return BTreeMap::new();
    };

    range
        .used_cells()
        .filter_map(|(row, col, cell)| {
            let value = cell_value(cell)?;
            let position = (start_row + row as u32, (start_col as usize + col) as u16);
            Some((position, value))
        })
        .collect()
}

fn cell_value(cell: &DataType) -> Option<CellValue> {
    match cell {
        DataType::Empty => None,
        DataType::String(value) if value.is_empty() => None,
        DataType::String(value) => Some(CellValue::Text(value.clone())),
        DataType::Float(value) | DataType::DateTime(value) => Some(CellValue::Number(*value)),
        DataType::Int(value) => Some(CellValue::Number(*value as f64)),
        DataType::Bool(value) => Some(CellValue::Bool(*value)),
        other => Some(CellValue::Text(other.to_string())),
    }
}
