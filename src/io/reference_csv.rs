use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};

use crate::error::Result;
use crate::model::ReferenceRow;

/// Candidate encodings, tried in order.
const ENCODINGS: [&Encoding; 3] = [UTF_8, GBK, WINDOWS_1252];

const REFERENCE_COLUMN: &str = "Reference";
const DESCRIPTION_COLUMN: &str = "Description";

/// Reads the component reference table.
///
/// Only I/O failures are errors. A file that cannot be decoded or parsed in
/// any candidate encoding, or that lacks the `Reference`/`Description`
/// columns, yields an empty table.
pub fn read_reference_table(path: &Path) -> Result<Vec<ReferenceRow>> {
    let bytes = fs::read(path)?;
    Ok(decode_reference_table(&bytes))
}

/// Decodes raw table bytes, see [`read_reference_table`].
pub fn decode_reference_table(bytes: &[u8]) -> Vec<ReferenceRow> {
    for encoding in ENCODINGS {
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            tracing::debug!(encoding = encoding.name(), "reference table does not decode");
            continue;
        }
        match parse_table(&text) {
            Ok(Some(rows)) => {
                tracing::debug!(encoding = encoding.name(), "decoded reference table");
                return rows;
            }
            Ok(None) => continue,
            Err(error) => {
                tracing::debug!(encoding = encoding.name(), %error, "reference table does not parse");
            }
        }
    }
    tracing::warn!("reference table is empty or unreadable; descriptions will be missing");
    Vec::new()
}

/// `Ok(None)` when the table has no records.
fn parse_table(text: &str) -> std::result::Result<Option<Vec<ReferenceRow>>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_string())
        .collect();

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Ok(None);
    }

    let position = |name: &str| headers.iter().position(|header| header == name);
    let (Some(reference_idx), Some(description_idx)) =
        (position(REFERENCE_COLUMN), position(DESCRIPTION_COLUMN))
    else {
        tracing::warn!(
            columns = ?headers,
            "reference table lacks Reference/Description columns"
        );
        return Ok(Some(Vec::new()));
    };

    let rows = records
        .iter()
        .filter_map(|record| {
            let reference = record.get(reference_idx).unwrap_or_default().trim();
            if reference.is_empty() {
                return None;
            }
            let description = record.get(description_idx).unwrap_or_default().trim();
            Some(ReferenceRow::new(reference, description))
        })
        .collect();
    Ok(Some(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_utf8_table() {
        let rows = decode_reference_table(
            "\u{feff}Item, Reference ,Description\n1,\"R1-R3, R7\",10k resistor\n2,C1,100nF\n"
                .as_bytes(),
        );
        assert_eq!(
            rows,
            vec![
                ReferenceRow::new("R1-R3, R7", "10k resistor"),
                ReferenceRow::new("C1", "100nF"),
            ]
        );
    }

    #[test]
    fn falls_back_to_gbk() {
        let (bytes, _, _) = GBK.encode("Reference,Description\nR1,电阻\n");
        let rows = decode_reference_table(&bytes);
        assert_eq!(rows, vec![ReferenceRow::new("R1", "电阻")]);
    }

    #[test]
    fn falls_back_to_latin1() {
        // 0xB5 is not valid UTF-8 nor a complete GBK sequence at end of input.
        let bytes = b"Reference,Description\nC1,1\xb5F\xb5";
        let rows = decode_reference_table(bytes);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "1\u{b5}F\u{b5}");
    }

    #[test]
    fn missing_columns_give_empty_table() {
        let rows = decode_reference_table(b"Ref,Desc\nR1,resistor\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(decode_reference_table(b"").is_empty());
        assert!(decode_reference_table(b"Reference,Description\n").is_empty());
    }

    #[test]
    fn blank_references_are_skipped() {
        let rows = decode_reference_table(b"Reference,Description\n,orphan\nR2,ok\n");
        assert_eq!(rows, vec![ReferenceRow::new("R2", "ok")]);
    }
}
