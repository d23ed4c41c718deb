//! Parser for the structured result log: a header block and a component block,
//! each introduced by a marker comment and a comment line naming its fields.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{HeaderRecord, ResultRow, Verdict};

const COMMENT_PREFIX: &str = "//";
const HEADER_MARKER: &str = "// Header_Data";
const COMPONENT_MARKER: &str = "// Component_Data";

/// Header record plus the measurement rows of one result log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultLog {
    pub header: HeaderRecord,
    pub rows: Vec<ResultRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Outside,
    Header,
    Component,
}

/// Fields of one block, addressable by name.
#[derive(Debug, Default)]
struct FieldLayout {
    positions: HashMap<String, usize>,
    width: usize,
}

impl FieldLayout {
    fn from_comment(line: &str) -> Self {
        let names = split_fields(&line[COMMENT_PREFIX.len()..]);
        let positions = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Self {
            positions,
            width: names.len(),
        }
    }

    fn value(&self, values: &[String], name: &str) -> String {
        self.positions
            .get(name)
            .and_then(|&index| values.get(index))
            .cloned()
            .unwrap_or_default()
    }
}

/// Parses a decoded result log. Only the first header values line is used;
/// component lines whose width differs from the field line are dropped.
pub fn parse_result_log(text: &str) -> ResultLog {
    let mut block = Block::Outside;
    let mut header_layout = FieldLayout::default();
    let mut header_values: Vec<String> = Vec::new();
    let mut component_layout = FieldLayout::default();
    let mut component_values: Vec<Vec<String>> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.starts_with(HEADER_MARKER) {
            block = Block::Header;
            continue;
        }
        match block {
            Block::Header if line.starts_with(COMMENT_PREFIX) => {
                header_layout = FieldLayout::from_comment(line);
                continue;
            }
            Block::Header if !line.is_empty() => {
                header_values = split_fields(line);
                block = Block::Outside;
                continue;
            }
            _ => {}
        }
        if line.starts_with(COMPONENT_MARKER) {
            block = Block::Component;
            continue;
        }
        if block != Block::Component || line.is_empty() {
            continue;
        }
        if line.starts_with(COMMENT_PREFIX) {
            component_layout = FieldLayout::from_comment(line);
        } else {
            let values = split_fields(line);
            if values.len() == component_layout.width {
                component_values.push(values);
            } else {
                tracing::debug!(
                    expected = component_layout.width,
                    found = values.len(),
                    "dropping component line with mismatched width"
                );
            }
        }
    }

    let header = header_record(&header_layout, &header_values);
    let rows: Vec<ResultRow> = component_values
        .iter()
        .map(|values| result_row(&component_layout, values))
        .collect();

    tracing::info!(rows = rows.len(), board = %header.board_name, "parsed result log");
    ResultLog { header, rows }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

fn header_record(layout: &FieldLayout, values: &[String]) -> HeaderRecord {
    let date = layout.value(values, "Date");
    let time = layout.value(values, "Time");
    HeaderRecord {
        board_name: layout.value(values, "BoardName"),
        pass_fail: layout.value(values, "PASS/FAIL"),
        result: layout.value(values, "Result"),
        test_time: format_timestamp(&date, &time),
    }
}

/// `YYYYMMDD` + `HHMMSS` → `YYYY-MM-DD HH:MM:SS`; anything else yields an
/// empty string.
fn format_timestamp(date: &str, time: &str) -> String {
    let date: Vec<char> = date.chars().collect();
    let time: Vec<char> = time.chars().collect();
    if date.len() != 8 || time.len() != 6 {
        return String::new();
    }
    let part = |chars: &[char]| chars.iter().collect::<String>();
    format!(
        "{}-{}-{} {}:{}:{}",
        part(&date[..4]),
        part(&date[4..6]),
        part(&date[6..]),
        part(&time[..2]),
        part(&time[2..4]),
        part(&time[4..]),
    )
}

fn result_row(layout: &FieldLayout, values: &[String]) -> ResultRow {
    let high = layout.value(values, "HPin");
    let low = layout.value(values, "LPin");
    let test_points = match (high.is_empty(), low.is_empty()) {
        (false, false) => format!("{high},{low}"),
        (false, true) => high,
        _ => low,
    };

    ResultRow {
        step_number: layout.value(values, "StepNum"),
        part_name: layout.value(values, "PartName"),
        test_type: layout.value(values, "Type"),
        test_points,
        reference_value: layout.value(values, "Std_V"),
        // The equipment names its limits from the opposite side.
        lower_limit: layout.value(values, "HLim"),
        upper_limit: layout.value(values, "LLim"),
        measured_value: layout.value(values, "Msr_V"),
        result: Verdict::from_raw(&layout.value(values, "Result")),
    }
}
