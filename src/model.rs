use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Raw worksheet cell content before it is coerced to text.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Plain string form. Numbers use their shortest round-trip representation,
    /// no locale grouping or fixed decimals.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// Header text as used for field lookups: trimmed and lower-cased.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One imported row, keyed by normalized header name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Like [`Record::get`] but absent fields read as the empty string.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Column position -> normalized field name, taken from the first row of a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderMap {
    columns: BTreeMap<u32, String>,
}

impl HeaderMap {
    /// Build from `(column, raw header text)` pairs. Blank headers map to nothing.
    pub fn from_columns<'a>(cells: impl IntoIterator<Item = (u32, &'a str)>) -> Self {
        let columns = cells
            .into_iter()
            .map(|(col, raw)| (col, normalize_header(raw)))
            .filter(|(_, name)| !name.is_empty())
            .collect();
        Self { columns }
    }

    pub fn field_name(&self, column: u32) -> Option<&str> {
        self.columns.get(&column).map(String::as_str)
    }

    /// Field names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.values().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.values().any(|n| n == field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The closed set of fields the label renderer knows how to print.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelField {
    Id,
    FirstName,
    LastName,
    FullName,
    Address1,
    Address2,
    City,
    State,
    Zip,
}

impl LabelField {
    pub const COUNT: usize = 9;

    /// Resolve a normalized header to a field tag.
    pub fn from_header(name: &str) -> Option<Self> {
        let tag = match name {
            "id" | "cheerboxid" | "cheerbox id" | "container id" | "containerid" | "box id" => {
                LabelField::Id
            }
            "recipient first name" | "first name" | "firstname" => LabelField::FirstName,
            "recipient last name" | "last name" | "lastname" => LabelField::LastName,
            "recipient name" | "name" | "full name" => LabelField::FullName,
            "address line 1" | "address 1" | "address1" | "address" | "street"
            | "recipient address" => LabelField::Address1,
            "address line 2" | "address 2" | "address2" | "apt" | "unit" => LabelField::Address2,
            "city" | "recipient city" => LabelField::City,
            "state" | "recipient state" | "province" => LabelField::State,
            "zip" | "zip code" | "zipcode" | "postal code" | "recipient zip" => LabelField::Zip,
            _ => return None,
        };
        Some(tag)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LabelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LabelField::Id => "id",
            LabelField::FirstName => "first name",
            LabelField::LastName => "last name",
            LabelField::FullName => "name",
            LabelField::Address1 => "address line 1",
            LabelField::Address2 => "address line 2",
            LabelField::City => "city",
            LabelField::State => "state",
            LabelField::Zip => "zip",
        };
        f.write_str(s)
    }
}

/// Field tag -> header name present in this load. Resolved once per header row;
/// the first column matching a tag wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldTable {
    slots: [Option<String>; LabelField::COUNT],
}

impl FieldTable {
    pub fn resolve(header: &HeaderMap) -> Self {
        let mut table = FieldTable::default();
        for name in header.names() {
            if let Some(tag) = LabelField::from_header(name) {
                let slot = &mut table.slots[tag.index()];
                if slot.is_none() {
                    log::debug!("Column '{name}' prints as {tag}");
                    *slot = Some(name.to_string());
                }
            }
        }
        table
    }

    pub fn header_for(&self, tag: LabelField) -> Option<&str> {
        self.slots[tag.index()].as_deref()
    }

    pub fn value<'r>(&self, record: &'r Record, tag: LabelField) -> &'r str {
        self.header_for(tag).map_or("", |h| record.value(h))
    }
}

/// Records from one load event, with the header they were built from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSet {
    pub header: HeaderMap,
    pub fields: FieldTable,
    pub records: Vec<Record>,
    /// Normalized header name holding each record's identifier.
    pub id_field: String,
}

impl RecordSet {
    pub fn new(header: HeaderMap, records: Vec<Record>, id_field: impl Into<String>) -> Self {
        let fields = FieldTable::resolve(&header);
        Self {
            header,
            fields,
            records,
            id_field: id_field.into(),
        }
    }

    /// A single-column set built from bare identifiers, header `id`.
    pub fn from_identifiers<S: AsRef<str>>(ids: &[S]) -> Self {
        let header = HeaderMap::from_columns([(0, "id")]);
        let records = ids
            .iter()
            .map(|id| Record::from_iter([("id", id.as_ref())]))
            .collect();
        Self::new(header, records, "id")
    }

    pub fn identifier<'r>(&self, record: &'r Record) -> &'r str {
        record.value(&self.id_field)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| self.identifier(r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Physical unit a layout is computed in. Only the PDF sink converts to points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Mm,
    In,
    Pt,
}

impl Unit {
    pub fn to_points(self, value: f32) -> f32 {
        match self {
            Unit::Mm => value * 72.0 / 25.4,
            Unit::In => value * 72.0,
            Unit::Pt => value,
        }
    }

    pub fn from_points(self, points: f32) -> f32 {
        match self {
            Unit::Mm => points * 25.4 / 72.0,
            Unit::In => points / 72.0,
            Unit::Pt => points,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
    pub unit: Unit,
}

impl PageSize {
    pub const A4_MM: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
        unit: Unit::Mm,
    };

    pub fn width_pt(&self) -> f32 {
        self.unit.to_points(self.width)
    }

    pub fn height_pt(&self) -> f32 {
        self.unit.to_points(self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_resolve_back_to_their_field() {
        use LabelField::*;
        for tag in [Id, FirstName, LastName, FullName, Address1, Address2, City, State, Zip] {
            assert_eq!(LabelField::from_header(&tag.to_string()), Some(tag));
        }
    }

    #[test]
    fn first_matching_column_wins() {
        let header = HeaderMap::from_columns([(0, "Name"), (1, "Recipient Name"), (2, "Zip Code")]);
        let table = FieldTable::resolve(&header);
        assert_eq!(table.header_for(LabelField::FullName), Some("name"));
        assert_eq!(table.header_for(LabelField::Zip), Some("zip code"));
        assert_eq!(table.header_for(LabelField::City), None);
    }
}
