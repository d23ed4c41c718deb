//! Merged regions of an `.xlsx` workbook, read straight from the package
//! parts because the sheet reader does not report them.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::error::Result;
use crate::flatten::CellRef;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// An inclusive block of merged cells spanning more than one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl MergedRange {
    /// Parses an `A1:C2` reference. Single cells and reversed corners are
    /// rejected.
    pub fn parse(reference: &str) -> Option<Self> {
        let (first, last) = reference.split_once(':')?;
        let first = CellRef::parse(first)?;
        let last = CellRef::parse(last)?;
        let ordered = first.row <= last.row && first.col <= last.col;
        (ordered && first != last).then_some(Self { first, last })
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first.row..=self.last.row).contains(&row)
            && (self.first.col..=self.last.col).contains(&col)
    }

    /// True for cells hidden under the region; only the top-left cell holds a
    /// value.
    pub fn covers(&self, row: u32, col: u16) -> bool {
        self.contains(row, col) && (row, col) != (self.first.row, self.first.col)
    }
}

/// Merged regions of every sheet in the workbook, keyed by sheet name.
/// Sheets without merges are absent.
pub fn read_merged_regions(path: &Path) -> Result<HashMap<String, Vec<MergedRange>>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let workbook = read_part(&mut archive, WORKBOOK_PART)?;
    let relationships = read_part(&mut archive, WORKBOOK_RELS_PART)?;
    let targets: HashMap<String, String> = element_attributes(
        &relationships,
        b"Relationship",
        &[b"Id", b"Target"],
    )?
    .into_iter()
    .map(|mut values| (std::mem::take(&mut values[0]), std::mem::take(&mut values[1])))
    .collect();

    let mut regions = HashMap::new();
    for values in element_attributes(&workbook, b"sheet", &[b"name", b"id"])? {
        let [name, id] = values.as_slice() else {
            continue;
        };
        let Some(target) = targets.get(id) else {
            tracing::warn!(sheet = %name, "sheet has no package part");
            continue;
        };
        let sheet = read_part(&mut archive, &sheet_part(target))?;
        let ranges: Vec<MergedRange> = element_attributes(&sheet, b"mergeCell", &[b"ref"])?
            .iter()
            .filter_map(|values| MergedRange::parse(&values[0]))
            .collect();
        if !ranges.is_empty() {
            tracing::debug!(sheet = %name, merged = ranges.len(), "read merged regions");
            regions.insert(name.clone(), ranges);
        }
    }
    Ok(regions)
}

/// Package path of a worksheet relationship target.
fn sheet_part(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Values of `keys` (matched by local name) on every `tag` element, in
/// document order. Missing attributes are empty.
fn element_attributes(xml: &str, tag: &[u8], keys: &[&[u8]]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut found = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == tag =>
            {
                found.push(attribute_values(&reader, &element, keys)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(found)
}

fn attribute_values<B>(reader: &Reader<B>, element: &BytesStart, keys: &[&[u8]]) -> Result<Vec<String>> {
    let mut values = vec![String::new(); keys.len()];
    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let local = attribute.key.local_name();
        if let Some(index) = keys.iter().position(|key| *key == local.as_ref()) {
            values[index] = attribute.decode_and_unescape_value(reader)?.into_owned();
        }
    }
    Ok(values)
}
