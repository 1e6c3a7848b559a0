use std::collections::BTreeMap;

use crate::model::{FieldTable, HeaderMap, LabelField, Record, RecordSet, normalize_header};
use crate::xlsx::{SheetCells, cell_ref};

/// Knobs for turning a tabular source into records.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOptions {
    /// Header holding the identifier. `None` picks the first column recognised
    /// as [`LabelField::Id`], falling back to `id`.
    pub id_field: Option<String>,
    /// Drop rows whose identifier is blank (whitespace counts as blank).
    pub drop_blank_ids: bool,
}

impl ExtractOptions {
    /// Pasted text: blank-identifier rows are dropped.
    pub fn for_paste() -> Self {
        Self {
            id_field: None,
            drop_blank_ids: true,
        }
    }

    /// Workbook upload: every row is kept.
    pub fn for_workbook() -> Self {
        Self {
            id_field: None,
            drop_blank_ids: false,
        }
    }

    pub fn with_id_field(mut self, field: impl AsRef<str>) -> Self {
        self.id_field = Some(normalize_header(field.as_ref()));
        self
    }

    pub fn with_drop_blank_ids(mut self, drop: bool) -> Self {
        self.drop_blank_ids = drop;
        self
    }
}

/// Records from a sparse cell map. Row 1 is the header; `!`-prefixed metadata
/// keys and unparseable addresses are skipped. Output follows ascending row
/// number regardless of map iteration order.
///
/// Returns `None` when the sheet has no header row.
pub fn extract_cells(cells: &SheetCells, opts: &ExtractOptions) -> Option<RecordSet> {
    let mut rows: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
    for (address, value) in cells {
        if address.starts_with('!') {
            continue;
        }
        let Some((col, row)) = cell_ref::parse(address) else {
            log::debug!("Skipping non-cell key {address:?}");
            continue;
        };
        rows.entry(row).or_default().insert(col, value.to_text());
    }

    let header_row = rows.remove(&1)?;
    let header = HeaderMap::from_columns(header_row.iter().map(|(c, v)| (*c, v.as_str())));
    if header.is_empty() {
        return None;
    }

    let records = rows
        .into_values()
        .map(|row| build_record(&header, row))
        .collect();
    Some(finish(header, records, opts))
}

/// Records from tab-delimited text, first line as header.
///
/// Returns `None` when there is no data row at all (fewer than two lines),
/// which is distinct from `Some` with zero records after filtering.
pub fn extract_delimited(text: &str, opts: &ExtractOptions) -> Option<RecordSet> {
    let mut lines = text.lines();
    let header_line = lines.next()?;
    let data: Vec<&str> = lines.collect();
    if data.is_empty() {
        return None;
    }

    let header = HeaderMap::from_columns(
        header_line
            .split('\t')
            .enumerate()
            .map(|(i, h)| (i as u32, h)),
    );
    let width = header_line.split('\t').count();

    let mut records = Vec::with_capacity(data.len());
    for (n, line) in data.iter().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() > width {
            log::warn!(
                "Line {} has {} fields but the header has {width}; extra fields ignored",
                n + 2,
                fields.len(),
            );
        }
        let row = fields
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as u32, v.to_string()));
        records.push(build_record(&header, row));
    }
    Some(finish(header, records, opts))
}

fn build_record(header: &HeaderMap, row: impl IntoIterator<Item = (u32, String)>) -> Record {
    let mut record = Record::new();
    for (col, value) in row {
        if let Some(name) = header.field_name(col) {
            record.insert(name, value);
        }
    }
    record
}

fn finish(header: HeaderMap, mut records: Vec<Record>, opts: &ExtractOptions) -> RecordSet {
    let id_field = opts
        .id_field
        .clone()
        .or_else(|| FieldTable::resolve(&header).header_for(LabelField::Id).map(str::to_string))
        .unwrap_or_else(|| "id".to_string());

    if !header.contains(&id_field) {
        log::warn!("Identifier column '{id_field}' not found in header");
    }

    if opts.drop_blank_ids {
        let before = records.len();
        records.retain(|r| !r.value(&id_field).trim().is_empty());
        let dropped = before - records.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} row(s) with a blank '{id_field}'");
        }
    }

    log::info!("Extracted {} record(s), identifier column '{id_field}'", records.len());
    RecordSet::new(header, records, id_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    #[test]
    fn header_values_are_trimmed_and_lowercased() {
        let set = extract_delimited(" ID \t Recipient First Name\nC1\tAnn", &ExtractOptions::for_paste()).unwrap();
        assert_eq!(set.header.names().collect::<Vec<_>>(), vec!["id", "recipient first name"]);
        assert_eq!(set.records[0].get("recipient first name"), Some("Ann"));
    }

    #[test]
    fn sparse_rows_with_only_unmapped_cells_are_kept() {
        let mut cells = SheetCells::new();
        cells.insert("A1".into(), CellValue::from("id"));
        cells.insert("A2".into(), CellValue::from("X"));
        cells.insert("D3".into(), CellValue::from("stray"));
        let set = extract_cells(&cells, &ExtractOptions::for_workbook()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.records[1].is_empty());
    }

    #[test]
    fn explicit_id_field_overrides_detection() {
        let opts = ExtractOptions::for_paste().with_id_field(" Code ");
        let set = extract_delimited("id\tcode\n1\t\n2\tB", &opts).unwrap();
        assert_eq!(set.id_field, "code");
        assert_eq!(set.identifiers().collect::<Vec<_>>(), vec!["B"]);
    }
}
