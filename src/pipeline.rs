use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, ToolError};
use crate::flatten::{TemplateLayout, bucket_workbooks, plan_fills};
use crate::io::{excel_read, excel_write, reference_csv, text};
use crate::model::{HeaderRecord, PartRow, ReferenceRow, ResultRow, TestRow, coverage};
use crate::parse::{parse_result_log, parse_test_log};
use crate::reconcile::reconcile;
use crate::reference::ReferenceIndex;

/// Files taking part in one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInputs {
    /// Structured result log (`.dcl`). Required.
    pub result_log: PathBuf,
    /// Report template workbook. Required.
    pub template: PathBuf,
    /// Equipment test log (`.dat`).
    pub test_log: Option<PathBuf>,
    /// Component reference table (`.csv`).
    pub reference: Option<PathBuf>,
    /// Destination of the filled workbook.
    pub output: PathBuf,
}

/// Parts coverage derived from the test log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartsReport {
    pub board_name: String,
    pub test_time: String,
    /// Coverage over every classified row of the test log.
    pub log_coverage: f64,
    /// Coverage over [`PartsReport::unique`]; the figure written to the report.
    pub coverage: f64,
    pub unique: Vec<PartRow>,
    pub duplicates: Vec<PartRow>,
    pub no_description: Vec<PartRow>,
    pub no_connect: Vec<TestRow>,
}

/// Everything one run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub header: HeaderRecord,
    pub results: Vec<ResultRow>,
    /// Absent when no test log was supplied.
    pub parts: Option<PartsReport>,
}

/// Builds the report from already decoded inputs.
pub fn build_report(
    result_log: &str,
    test_log: Option<&str>,
    reference_rows: &[ReferenceRow],
) -> Report {
    let results = parse_result_log(result_log);
    let parts = test_log.map(|text| {
        let log = parse_test_log(text);
        let index = ReferenceIndex::build(reference_rows);
        if index.is_empty() {
            tracing::warn!("no reference designators; every part lacks a description");
        }
        let buckets = reconcile(log.rows, &index);
        PartsReport {
            board_name: log.board_name,
            test_time: log.test_time,
            log_coverage: log.coverage,
            coverage: coverage(buckets.unique.iter().map(|part| part.row.testable)),
            unique: buckets.unique,
            duplicates: buckets.duplicates,
            no_description: buckets.no_description,
            no_connect: log.no_connect,
        }
    });

    Report {
        header: results.header,
        results: results.rows,
        parts,
    }
}

fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::MissingInput(path.to_path_buf()))
    }
}

/// Runs the whole pipeline: checks inputs, parses, reconciles and writes the
/// filled template to `inputs.output`.
pub fn generate_report(inputs: &ReportInputs, layout: &TemplateLayout) -> Result<Report> {
    require(&inputs.result_log)?;
    require(&inputs.template)?;
    for optional in [&inputs.test_log, &inputs.reference].into_iter().flatten() {
        require(optional)?;
    }

    let result_log = text::read_utf8(&inputs.result_log)?;
    let test_log = inputs
        .test_log
        .as_deref()
        .map(text::read_utf8)
        .transpose()?;
    let reference_rows = match &inputs.reference {
        Some(path) => reference_csv::read_reference_table(path)?,
        None => Vec::new(),
    };

    let report = build_report(&result_log, test_log.as_deref(), &reference_rows);

    let template = excel_read::read_template(&inputs.template, &layout.required_sheets())?;
    let fills = plan_fills(&report, layout);
    excel_write::write_filled_template(&inputs.output, &template, &fills)?;

    Ok(report)
}

/// Writes each non-empty auxiliary table into `dir` and returns the written
/// paths.
pub fn export_buckets(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (file_name, workbook) in bucket_workbooks(report) {
        let path = dir.join(file_name);
        excel_write::write_workbook(&path, &workbook)?;
        tracing::info!(path = %path.display(), "exported table");
        written.push(path);
    }
    Ok(written)
}

/// Writes the run result as pretty JSON.
pub fn write_summary(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Testability;

    const RESULT_LOG: &str = "\
// Header_Data
// BoardName, PASS/FAIL, Result, Date, Time
BOARD-7, FAIL, 1, 20240501, 102233
// Component_Data
// StepNum, PartName, Type, HPin, LPin, Std_V, HLim, LLim, Msr_V, Result
1, R1, R, 1, 2, 10K, 5, 5, 10K, 0
";

    #[test]
    fn single_resistor_scenario() {
        let report = build_report(
            RESULT_LOG,
            Some("1  R1  10K  0  X\n"),
            &[ReferenceRow::new("R1", "10k resistor")],
        );
        let parts = report.parts.expect("parts report");
        assert_eq!(parts.unique.len(), 1);
        let part = &parts.unique[0];
        assert_eq!(part.row.components, "R1");
        assert_eq!(part.row.testable, Testability::Yes);
        assert_eq!(part.description, "10k resistor");
        assert_eq!(part.remark, "");
        assert_eq!(parts.coverage, 1.0);
    }

    #[test]
    fn no_point_scenario() {
        let report = build_report(
            RESULT_LOG,
            Some("2  L3/NP  10uH  1  X\n"),
            &[ReferenceRow::new("L1-L5", "inductor")],
        );
        let parts = report.parts.expect("parts report");
        let part = &parts.unique[0];
        assert_eq!(part.row.testable, Testability::No);
        assert_eq!(part.remark, "No test point");
        assert_eq!(parts.coverage, 0.0);
    }

    #[test]
    fn missing_test_log_skips_parts() {
        let report = build_report(RESULT_LOG, None, &[]);
        assert!(report.parts.is_none());
        assert_eq!(report.header.board_name, "BOARD-7");
        assert_eq!(report.results.len(), 1);
    }

    #[test]
    fn empty_reference_table_routes_everything_to_no_description() {
        let report = build_report(RESULT_LOG, Some("1 R1 0 X\n2 C2 0 X\n"), &[]);
        let parts = report.parts.expect("parts report");
        assert!(parts.unique.is_empty());
        assert!(parts.duplicates.is_empty());
        assert_eq!(parts.no_description.len(), 2);
        assert_eq!(parts.log_coverage, 1.0);
    }

    #[test]
    fn missing_required_input_is_reported_first() {
        let inputs = ReportInputs {
            result_log: PathBuf::from("/nonexistent/result.dcl"),
            template: PathBuf::from("/nonexistent/template.xlsx"),
            test_log: None,
            reference: None,
            output: PathBuf::from("/nonexistent/out.xlsx"),
        };
        let error = generate_report(&inputs, &TemplateLayout::default())
            .expect_err("missing input rejected");
        assert!(matches!(error, ToolError::MissingInput(path) if path.ends_with("result.dcl")));
    }
}
