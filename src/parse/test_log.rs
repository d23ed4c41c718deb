//! Parser for the step-oriented equipment test log.
//!
//! Data lines look like `<step> <components> ... <skip> <mode> ...`. Comment
//! lines start with `!`; one of them carries the board name and test time.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{SkipFlag, TestRow, Testability, coverage, renumber};

const BOARD_MARKER: &str = "! Board Name:";
const TIME_MARKER: &str = "Time:";
const COMMENT_PREFIX: char = '!';
const NO_CONNECT_MARKER: &str = "/NC";

/// Device classes measured directly.
pub const TESTABLE_CLASSES: &[&str] = &["R", "IC", "U", "C", "Q", "D"];
/// Classes without a usable test point.
pub const UNTESTABLE_CLASSES: &[&str] = &["SG", "L", "NP", "RM", "VM", "PCB"];
/// Classes only covered through a parallel measurement.
pub const PARALLEL_CLASSES: &[&str] = &["TVS", "PCB"];

static STEP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(\S+)").expect("step pattern compiles"));
static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("digit pattern compiles"));
static CLASS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)\d+").expect("prefix pattern compiles"));

/// Everything extracted from one test log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestLog {
    pub board_name: String,
    pub test_time: String,
    pub rows: Vec<TestRow>,
    pub no_connect: Vec<TestRow>,
    /// `(Y + L) / (Y + N + L)` over [`TestLog::rows`].
    pub coverage: f64,
}

/// Parses a decoded test log. Lines that do not start with `<digits> <token>`
/// are skipped. `\n`, `\r\n` and bare `\r` all end a line.
pub fn parse_test_log(text: &str) -> TestLog {
    let lines: Vec<&str> = text.split(['\n', '\r']).collect();
    let (board_name, test_time) = board_header(&lines);
    let start = data_start(&lines);

    let mut rows = Vec::new();
    let mut no_connect = Vec::new();

    for raw in &lines[start..] {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        let Some(captures) = STEP_LINE.captures(line) else {
            tracing::debug!(line, "skipping malformed test log line");
            continue;
        };
        let step = captures[1].to_string();
        let components = captures[2].to_string();
        let skip = find_skip(line);

        if components.to_uppercase().contains(NO_CONNECT_MARKER) {
            no_connect.push(TestRow {
                step,
                no: 0,
                components,
                testable: Testability::NoConnect,
                skip,
            });
            continue;
        }

        let testable = classify(&components, skip);
        rows.push(TestRow {
            step,
            no: 0,
            components,
            testable,
            skip,
        });
    }

    renumber(&mut rows);
    renumber(&mut no_connect);
    let coverage = coverage(rows.iter().map(|row| row.testable));

    tracing::info!(
        rows = rows.len(),
        no_connect = no_connect.len(),
        coverage,
        "parsed test log"
    );

    TestLog {
        board_name,
        test_time,
        rows,
        no_connect,
        coverage,
    }
}

/// Board name and test time from the `! Board Name: ... Time: ...` comment.
/// Every matching line is considered, so the last one wins.
fn board_header(lines: &[&str]) -> (String, String) {
    let mut header = (String::new(), String::new());
    for line in lines.iter().filter(|line| line.starts_with(BOARD_MARKER)) {
        let parts: Vec<&str> = line.split(TIME_MARKER).collect();
        if let [name, time] = parts.as_slice() {
            header = (
                name.replace(BOARD_MARKER, "").trim().to_string(),
                time.trim().to_string(),
            );
        }
    }
    header
}

/// Index of the first data line whose step number is exactly `1`, else `0`.
fn data_start(lines: &[&str]) -> usize {
    lines
        .iter()
        .position(|raw| {
            let line = raw.trim();
            !line.is_empty()
                && !line.starts_with(COMMENT_PREFIX)
                && LEADING_DIGITS
                    .captures(line)
                    .is_some_and(|captures| &captures[1] == "1")
        })
        .unwrap_or(0)
}

/// The first `0`/`1` token immediately followed by an alphabetic token.
fn find_skip(line: &str) -> Option<SkipFlag> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        let followed_by_word = pair[1].chars().all(char::is_alphabetic);
        if followed_by_word {
            SkipFlag::from_token(pair[0])
        } else {
            None
        }
    })
}

/// Classifies a component field.
///
/// Fields without `/` are `Y` when the step ran. Otherwise the class after the
/// last `/` decides, falling back to the letter prefix of the designator;
/// classes are checked untestable, testable, parallel. A skipped step turns a
/// testable class into `L`.
pub fn classify(components: &str, skip: Option<SkipFlag>) -> Testability {
    let upper = components.to_uppercase();
    if !upper.contains('/') {
        return match skip {
            Some(SkipFlag::Run) => Testability::Yes,
            _ => Testability::Unknown,
        };
    }
    let Some(skip) = skip else {
        return Testability::Unknown;
    };

    let suffix = upper.rsplit('/').next().unwrap_or_default();
    let prefix = CLASS_PREFIX
        .captures(&upper)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    class_testability(suffix, skip)
        .or_else(|| class_testability(prefix, skip))
        .unwrap_or(Testability::Unknown)
}

fn class_testability(class: &str, skip: SkipFlag) -> Option<Testability> {
    if class.is_empty() {
        None
    } else if UNTESTABLE_CLASSES.contains(&class) {
        Some(Testability::No)
    } else if TESTABLE_CLASSES.contains(&class) {
        Some(match skip {
            SkipFlag::Run => Testability::Yes,
            SkipFlag::Skipped => Testability::Parallel,
        })
    } else if PARALLEL_CLASSES.contains(&class) {
        Some(Testability::Parallel)
    } else {
        None
    }
}
