use serde::{Serialize, Serializer};

/// Testability classification attached to a test-log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Testability {
    /// Tested directly.
    Yes,
    /// Structurally not testable (no test point).
    No,
    /// Tested in parallel with another point.
    Parallel,
    /// No-connect; not a real test point.
    NoConnect,
    /// Could not be classified.
    #[default]
    Unknown,
}

impl Testability {
    /// Code written to the output tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Testability::Yes => "Y",
            Testability::No => "N",
            Testability::Parallel => "L",
            Testability::NoConnect => "NC",
            Testability::Unknown => "",
        }
    }

    pub fn is_known(self) -> bool {
        self != Testability::Unknown
    }
}

impl Serialize for Testability {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Skip marker found on a test-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipFlag {
    /// `0`: the step ran.
    Run,
    /// `1`: the step was skipped.
    Skipped,
}

impl SkipFlag {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "0" => Some(SkipFlag::Run),
            "1" => Some(SkipFlag::Skipped),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkipFlag::Run => "0",
            SkipFlag::Skipped => "1",
        }
    }
}

impl Serialize for SkipFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the component reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRow {
    /// Designator range expression or comma-separated list, e.g. `R1-R5,C3`.
    pub reference: String,
    pub description: String,
}

impl ReferenceRow {
    pub fn new(reference: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            description: description.into(),
        }
    }
}

/// A step parsed from the equipment test log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRow {
    /// Step id as printed in the log.
    pub step: String,
    /// Dense 1-based position inside the table the row currently belongs to.
    #[serde(rename = "No.")]
    pub no: usize,
    /// Designator-bearing field, case preserved.
    pub components: String,
    pub testable: Testability,
    pub skip: Option<SkipFlag>,
}

/// A test row after description lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRow {
    #[serde(flatten)]
    pub row: TestRow,
    pub description: String,
    pub remark: String,
}

impl PartRow {
    pub fn new(row: TestRow, description: impl Into<String>) -> Self {
        Self {
            row,
            description: description.into(),
            remark: String::new(),
        }
    }
}

/// Rows that carry a sequence number which must stay dense after filtering.
pub trait Numbered {
    fn set_number(&mut self, no: usize);
}

impl Numbered for TestRow {
    fn set_number(&mut self, no: usize) {
        self.no = no;
    }
}

impl Numbered for PartRow {
    fn set_number(&mut self, no: usize) {
        self.row.no = no;
    }
}

/// Reassigns `No.` as `1..=len` following the current order.
pub fn renumber<T: Numbered>(rows: &mut [T]) {
    for (index, row) in rows.iter_mut().enumerate() {
        row.set_number(index + 1);
    }
}

/// `(Y + L) / (Y + N + L)`, or `0` when nothing was classified.
pub fn coverage(classes: impl IntoIterator<Item = Testability>) -> f64 {
    let (mut tested, mut total) = (0usize, 0usize);
    for class in classes {
        match class {
            Testability::Yes | Testability::Parallel => {
                tested += 1;
                total += 1;
            }
            Testability::No => total += 1,
            Testability::NoConnect | Testability::Unknown => {}
        }
    }
    if total == 0 {
        0.0
    } else {
        tested as f64 / total as f64
    }
}

/// Header block of the structured result log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderRecord {
    pub board_name: String,
    pub pass_fail: String,
    pub result: String,
    /// `YYYY-MM-DD HH:MM:SS`, or empty when the date/time fields are malformed.
    pub test_time: String,
}

/// Pass/fail outcome of a measured step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl Verdict {
    /// The equipment writes `0` for a pass; anything else is a failure.
    pub fn from_raw(raw: &str) -> Self {
        if raw == "0" { Verdict::Pass } else { Verdict::Fail }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        }
    }
}

/// One measurement row of the structured result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub step_number: String,
    pub part_name: String,
    pub test_type: String,
    /// High and low pin joined as `H,L`, or whichever one is present.
    pub test_points: String,
    pub reference_value: String,
    pub lower_limit: String,
    pub upper_limit: String,
    pub measured_value: String,
    pub result: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(step: &str) -> TestRow {
        TestRow {
            step: step.to_string(),
            no: 0,
            components: "R1".to_string(),
            testable: Testability::Yes,
            skip: Some(SkipFlag::Run),
        }
    }

    #[test]
    fn renumber_produces_dense_sequence() {
        let mut rows = vec![row("7"), row("3"), row("12")];
        renumber(&mut rows);
        let numbers: Vec<usize> = rows.iter().map(|r| r.no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn coverage_ignores_unknown_and_no_connect() {
        let classes = [
            Testability::Yes,
            Testability::Parallel,
            Testability::No,
            Testability::No,
            Testability::Unknown,
            Testability::NoConnect,
        ];
        assert!((coverage(classes) - 0.5).abs() < f64::EPSILON);
        assert_eq!(coverage([Testability::Unknown]), 0.0);
    }

    #[test]
    fn verdict_maps_zero_to_pass() {
        assert_eq!(Verdict::from_raw("0"), Verdict::Pass);
        assert_eq!(Verdict::from_raw("1"), Verdict::Fail);
        assert_eq!(Verdict::from_raw(""), Verdict::Fail);
    }
}
