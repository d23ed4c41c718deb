//! Designator range expansion and the designator → description index built
//! from the component reference table.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ReferenceRow;

/// `<letters><start>-[<letters>]<end>`. Anchored at the start only, so trailing
/// noise after the end number is ignored.
static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)(\d+)-([A-Za-z]+)?(\d+)").expect("range pattern compiles")
});

/// Uppercases a designator and strips all whitespace from it.
pub fn normalize_designator(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Expands compact reference notation (`R1-R3`, `C3,C4`, `U1-U2,R7`) into
/// individual designators, in source order. Never fails: reversed ranges
/// expand to nothing and unrecognised parts are kept verbatim.
pub fn expand(expression: &str) -> Vec<String> {
    let compact: String = expression.chars().filter(|ch| !ch.is_whitespace()).collect();
    let mut designators = Vec::new();

    for part in compact.split(',') {
        if let Some(range) = RANGE_PATTERN.captures(part) {
            let prefix = range
                .get(3)
                .or_else(|| range.get(1))
                .map(|m| m.as_str().to_uppercase())
                .unwrap_or_default();
            let bounds = (parse_bound(&range[2]), parse_bound(&range[4]));
            if let (Some(start), Some(end)) = bounds {
                designators.extend((start..=end).map(|index| format!("{prefix}{index}")));
                continue;
            }
        }
        if !part.is_empty() {
            designators.push(normalize_designator(part));
        }
    }

    designators
}

fn parse_bound(digits: &str) -> Option<u64> {
    digits.parse().ok()
}

/// Lookup from expanded designator to its description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    entries: HashMap<String, String>,
}

impl ReferenceIndex {
    /// Builds the index in row order; a designator listed again in a later row
    /// takes that row's description.
    pub fn build<'a>(rows: impl IntoIterator<Item = &'a ReferenceRow>) -> Self {
        let mut entries = HashMap::new();
        for row in rows {
            for designator in expand(&row.reference) {
                entries.insert(designator, row.description.clone());
            }
        }
        tracing::debug!(designators = entries.len(), "built reference index");
        Self { entries }
    }

    pub fn get(&self, designator: &str) -> Option<&str> {
        self.entries.get(designator).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
