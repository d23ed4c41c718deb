use crate::model::{PartRow, TestRow};
use crate::reference::ReferenceIndex;

/// Cuts a designator token at its first `_` or `-` (`R1_A` → `R1`).
fn base_designator(token: &str) -> &str {
    let end = token.find(['_', '-']).unwrap_or(token.len());
    &token[..end]
}

fn compact_upper(components: &str) -> String {
    components
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Every designator named in a component field, in order. `/` and `,` both
/// separate designators.
pub fn candidate_designators(components: &str) -> Vec<String> {
    compact_upper(components)
        .split(['/', ','])
        .filter(|token| !token.is_empty())
        .map(|token| base_designator(token).to_string())
        .collect()
}

/// The designator a component field is grouped under: the part before the
/// first `/` (then the first `,`), cut at `_`/`-`.
pub fn primary_designator(components: &str) -> String {
    let compact = compact_upper(components);
    let head = compact.split('/').next().unwrap_or_default();
    let head = head.split(',').next().unwrap_or_default();
    base_designator(head).to_string()
}

/// Description of the first candidate designator present in the index, or
/// empty when none is.
pub fn lookup_description(components: &str, index: &ReferenceIndex) -> String {
    candidate_designators(components)
        .iter()
        .find_map(|designator| index.get(designator))
        .unwrap_or_default()
        .to_string()
}

/// Attaches descriptions to every row, preserving order.
pub fn attach(rows: Vec<TestRow>, index: &ReferenceIndex) -> Vec<PartRow> {
    rows.into_iter()
        .map(|row| {
            let description = lookup_description(&row.components, index);
            PartRow::new(row, description)
        })
        .collect()
}
