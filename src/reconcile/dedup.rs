use std::cmp::Reverse;

use crate::model::{PartRow, Testability};
use crate::reconcile::describe::primary_designator;

const PARALLEL_REMARK: &str = "it is in parallel with";
const NO_TEST_POINT_REMARK: &str = "No test point";

/// Ranking features of one row; lower sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    primary: String,
    has_testable: Reverse<bool>,
    has_np: Reverse<bool>,
    has_slash: Reverse<bool>,
    has_dash: Reverse<bool>,
    has_underscore: Reverse<bool>,
    length: usize,
}

impl RankKey {
    fn of(row: &PartRow) -> Self {
        let components = &row.row.components;
        Self {
            primary: primary_designator(components),
            has_testable: Reverse(row.row.testable.is_known()),
            has_np: Reverse(components.to_uppercase().contains("/NP")),
            has_slash: Reverse(components.contains('/')),
            has_dash: Reverse(components.contains('-')),
            has_underscore: Reverse(components.contains('_')),
            length: components.chars().count(),
        }
    }
}

/// Splits described rows into one canonical row per primary designator and the
/// rows it displaced.
///
/// Within a group the canonical row is the first under: classified testability,
/// then `/NP`, `/`, `-`, `_` present, then shortest field, then source order.
/// Unique rows come out ordered by primary designator; duplicates keep their
/// source order.
pub fn partition(rows: Vec<PartRow>) -> (Vec<PartRow>, Vec<PartRow>) {
    if rows.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let keys: Vec<RankKey> = rows.iter().map(RankKey::of).collect();
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&lhs, &rhs| keys[lhs].cmp(&keys[rhs]).then(lhs.cmp(&rhs)));

    let mut canonical = vec![false; rows.len()];
    let mut unique_order = Vec::new();
    let mut previous: Option<&str> = None;
    for &index in &order {
        let primary = keys[index].primary.as_str();
        if previous != Some(primary) {
            canonical[index] = true;
            unique_order.push(index);
            previous = Some(primary);
        }
    }

    let mut slots: Vec<Option<PartRow>> = rows.into_iter().map(Some).collect();
    let unique = unique_order
        .iter()
        .filter_map(|&index| slots[index].take())
        .collect();
    let duplicates = slots
        .into_iter()
        .zip(canonical)
        .filter_map(|(slot, is_canonical)| if is_canonical { None } else { slot })
        .collect();

    (unique, duplicates)
}

/// Explanation written next to non-testable and parallel rows; other rows keep
/// whatever remark they already carry.
pub fn remark_for(row: &PartRow) -> String {
    match row.row.testable {
        Testability::No => NO_TEST_POINT_REMARK.to_string(),
        Testability::Parallel => {
            let components = &row.row.components;
            let partner = if components.contains('/') {
                components.rsplit('/').next()
            } else if components.contains(',') {
                components.rsplit(',').next()
            } else {
                None
            };
            match partner {
                Some(partner) => format!("{PARALLEL_REMARK} {}", partner.trim()),
                None => PARALLEL_REMARK.to_string(),
            }
        }
        _ => row.remark.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SkipFlag, TestRow};

    fn part(step: &str, components: &str, testable: Testability) -> PartRow {
        PartRow::new(
            TestRow {
                step: step.to_string(),
                no: 0,
                components: components.to_string(),
                testable,
                skip: Some(SkipFlag::Run),
            },
            "desc",
        )
    }

    fn steps(rows: &[PartRow]) -> Vec<&str> {
        rows.iter().map(|row| row.row.step.as_str()).collect()
    }

    #[test]
    fn empty_input_gives_empty_partition() {
        let (unique, duplicates) = partition(Vec::new());
        assert!(unique.is_empty());
        assert!(duplicates.is_empty());
    }

    #[test]
    fn classified_row_beats_unclassified_in_any_order() {
        let a = part("1", "R1", Testability::Unknown);
        let b = part("2", "R1/X", Testability::Yes);

        let (unique, duplicates) = partition(vec![a.clone(), b.clone()]);
        assert_eq!(steps(&unique), vec!["2"]);
        assert_eq!(steps(&duplicates), vec!["1"]);

        let (unique, duplicates) = partition(vec![b, a]);
        assert_eq!(steps(&unique), vec!["2"]);
        assert_eq!(steps(&duplicates), vec!["1"]);
    }

    #[test]
    fn slash_variant_wins_over_bare_designator() {
        let rows = vec![
            part("1", "C10", Testability::Yes),
            part("2", "C10/R", Testability::Yes),
        ];
        let (unique, duplicates) = partition(rows);
        assert_eq!(unique[0].row.components, "C10/R");
        assert_eq!(duplicates[0].row.components, "C10");
    }

    #[test]
    fn shortest_field_breaks_remaining_ties() {
        let rows = vec![
            part("1", "C10/RRR", Testability::Yes),
            part("2", "C10/R", Testability::Yes),
            part("3", "C10/RR", Testability::Yes),
        ];
        let (unique, duplicates) = partition(rows);
        assert_eq!(steps(&unique), vec!["2"]);
        assert_eq!(steps(&duplicates), vec!["1", "3"]);
    }

    #[test]
    fn np_marker_outranks_plain_slash() {
        let rows = vec![
            part("1", "L3/R", Testability::No),
            part("2", "L3/NP", Testability::No),
        ];
        let (unique, _) = partition(rows);
        assert_eq!(steps(&unique), vec!["2"]);
    }

    #[test]
    fn unique_rows_sorted_by_designator_and_partition_is_complete() {
        let rows = vec![
            part("1", "U2", Testability::Yes),
            part("2", "C1", Testability::Yes),
            part("3", "U2_1", Testability::Yes),
            part("4", "R7", Testability::Yes),
            part("5", "C1-2", Testability::Unknown),
        ];
        let (unique, duplicates) = partition(rows);
        let primaries: Vec<String> = unique
            .iter()
            .map(|row| primary_designator(&row.row.components))
            .collect();
        assert_eq!(primaries, vec!["C1", "R7", "U2"]);
        assert_eq!(unique.len() + duplicates.len(), 5);

        let mut all: Vec<&str> = steps(&unique);
        all.extend(steps(&duplicates));
        all.sort_unstable();
        assert_eq!(all, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn remarks() {
        assert_eq!(
            remark_for(&part("1", "L3/NP", Testability::No)),
            "No test point"
        );
        assert_eq!(
            remark_for(&part("1", "C4/ R12 ", Testability::Parallel)),
            "it is in parallel with R12"
        );
        assert_eq!(
            remark_for(&part("1", "C4,C5", Testability::Parallel)),
            "it is in parallel with C5"
        );
        assert_eq!(
            remark_for(&part("1", "C4", Testability::Parallel)),
            "it is in parallel with"
        );
        let mut kept = part("1", "R1", Testability::Yes);
        kept.remark = "checked".to_string();
        assert_eq!(remark_for(&kept), "checked");
    }
}
