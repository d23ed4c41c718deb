//! Joins parsed test rows with the reference index and splits them into the
//! tables handed to the report writer.

pub mod dedup;
pub mod describe;

use serde::Serialize;

use crate::model::{PartRow, TestRow, renumber};
use crate::reference::ReferenceIndex;

pub use dedup::{partition, remark_for};
pub use describe::{attach, candidate_designators, lookup_description, primary_designator};

/// The disjoint buckets every test row ends up in. Each table is numbered
/// `1..=len` on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    /// One row per primary designator, ordered by designator.
    pub unique: Vec<PartRow>,
    /// Described rows displaced by a better-ranked row for the same designator.
    pub duplicates: Vec<PartRow>,
    /// Rows whose components matched no reference designator.
    pub no_description: Vec<PartRow>,
}

/// Attaches descriptions, generates remarks and deduplicates.
pub fn reconcile(rows: Vec<TestRow>, index: &ReferenceIndex) -> Reconciliation {
    let (mut described, mut no_description): (Vec<PartRow>, Vec<PartRow>) = attach(rows, index)
        .into_iter()
        .partition(|row| !row.description.is_empty());

    for row in &mut described {
        row.remark = remark_for(row);
    }

    let (mut unique, mut duplicates) = partition(described);
    renumber(&mut unique);
    renumber(&mut duplicates);
    renumber(&mut no_description);

    tracing::info!(
        unique = unique.len(),
        duplicates = duplicates.len(),
        no_description = no_description.len(),
        "reconciled test rows"
    );

    Reconciliation {
        unique,
        duplicates,
        no_description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReferenceRow, SkipFlag, Testability};

    fn row(step: &str, components: &str, testable: Testability) -> TestRow {
        TestRow {
            step: step.to_string(),
            no: step.parse().unwrap_or(0),
            components: components.to_string(),
            testable,
            skip: Some(SkipFlag::Run),
        }
    }

    #[test]
    fn buckets_are_disjoint_and_exhaustive() {
        let index = ReferenceIndex::build(&[
            ReferenceRow::new("R1-R3", "resistor"),
            ReferenceRow::new("C10", "capacitor"),
        ]);
        let rows = vec![
            row("1", "R1", Testability::Yes),
            row("2", "J4", Testability::Yes),
            row("3", "C10/R", Testability::Parallel),
            row("4", "C10", Testability::Unknown),
            row("5", "R2/NP", Testability::No),
            row("6", "X1_2", Testability::Unknown),
        ];

        let result = reconcile(rows, &index);

        let mut steps: Vec<String> = result
            .unique
            .iter()
            .chain(&result.duplicates)
            .chain(&result.no_description)
            .map(|row| row.row.step.clone())
            .collect();
        steps.sort();
        assert_eq!(steps, vec!["1", "2", "3", "4", "5", "6"]);

        let no_description: Vec<&str> = result
            .no_description
            .iter()
            .map(|row| row.row.components.as_str())
            .collect();
        assert_eq!(no_description, vec!["J4", "X1_2"]);
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.duplicates[0].row.components, "C10");
    }

    #[test]
    fn tables_are_renumbered_and_remarked() {
        let index = ReferenceIndex::build(&[ReferenceRow::new("C1-C9", "capacitor")]);
        let rows = vec![
            row("10", "C3", Testability::Yes),
            row("11", "C2/R5", Testability::Parallel),
            row("12", "C2", Testability::Unknown),
            row("13", "C1/NP", Testability::No),
        ];

        let result = reconcile(rows, &index);

        let numbers: Vec<usize> = result.unique.iter().map(|row| row.row.no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(result.duplicates[0].row.no, 1);

        let remarks: Vec<(&str, &str)> = result
            .unique
            .iter()
            .map(|row| (row.row.components.as_str(), row.remark.as_str()))
            .collect();
        assert_eq!(
            remarks,
            vec![
                ("C1/NP", "No test point"),
                ("C2/R5", "it is in parallel with R5"),
                ("C3", ""),
            ]
        );
    }
}
