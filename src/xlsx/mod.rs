pub mod cell_ref;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::CellValue;

const SML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Sparse worksheet content: `A1`-style address -> value. Sheet metadata is
/// stored under `!`-prefixed keys (`!ref`, `!margins`, `!autofilter`).
pub type SheetCells = HashMap<String, CellValue>;

/// Read the first sheet whose name is in `sheet_names` (tried in order).
/// `Ok(None)` when the workbook has none of them.
pub fn read_sheet<S: AsRef<str>>(path: &Path, sheet_names: &[S]) -> Result<Option<SheetCells>, Error> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|_| Error::InvalidWorkbook("file is not a ZIP archive".into()))?;
    read_sheet_from(&mut zip, sheet_names)
}

pub fn read_sheet_bytes<S: AsRef<str>>(data: &[u8], sheet_names: &[S]) -> Result<Option<SheetCells>, Error> {
    let mut zip = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|_| Error::InvalidWorkbook("file is not a ZIP archive".into()))?;
    read_sheet_from(&mut zip, sheet_names)
}

fn read_sheet_from<R: Read + Seek, S: AsRef<str>>(
    zip: &mut zip::ZipArchive<R>,
    sheet_names: &[S],
) -> Result<Option<SheetCells>, Error> {
    let workbook_xml = read_zip_text(zip, "xl/workbook.xml")
        .ok_or_else(|| Error::InvalidWorkbook("missing xl/workbook.xml (is this an XLSX file?)".into()))?;
    let sheets = parse_sheet_list(&workbook_xml)?;
    log::debug!(
        "Workbook sheets: {:?}",
        sheets.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
    );

    let Some((name, rid)) = pick_sheet(&sheets, sheet_names) else {
        log::warn!(
            "No sheet named {:?} in workbook",
            sheet_names.iter().map(AsRef::as_ref).collect::<Vec<_>>()
        );
        return Ok(None);
    };

    let rels = read_zip_text(zip, "xl/_rels/workbook.xml.rels")
        .map(|xml| parse_rels(&xml))
        .unwrap_or_default();
    let sheet_path = rels
        .get(rid)
        .map(|target| resolve_target(target))
        .ok_or_else(|| Error::InvalidWorkbook(format!("sheet '{name}' has no relationship target")))?;

    let shared = read_zip_text(zip, "xl/sharedStrings.xml")
        .map(|xml| parse_shared_strings(&xml))
        .transpose()?
        .unwrap_or_default();

    let sheet_xml = read_zip_text(zip, &sheet_path)
        .ok_or_else(|| Error::InvalidWorkbook(format!("missing {sheet_path}")))?;
    let cells = parse_worksheet(&sheet_xml, &shared)?;
    log::info!("Read sheet '{name}' ({sheet_path}): {} entries", cells.len());
    Ok(Some(cells))
}

fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

fn sml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(SML_NS))
}

fn is_sml(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(SML_NS)
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let sheets = sml(doc.root_element(), "sheets")
        .into_iter()
        .flat_map(|s| s.children())
        .filter(|n| is_sml(n, "sheet"))
        .filter_map(|n| {
            let name = n.attribute("name")?;
            let rid = n.attribute((REL_NS, "id"))?;
            Some((name.to_string(), rid.to_string()))
        })
        .collect();
    Ok(sheets)
}

fn pick_sheet<'a, S: AsRef<str>>(
    sheets: &'a [(String, String)],
    wanted: &[S],
) -> Option<(&'a str, &'a str)> {
    let exact = wanted
        .iter()
        .find_map(|w| sheets.iter().find(|(name, _)| name == w.as_ref()));
    let loose = || {
        wanted.iter().find_map(|w| {
            let w = w.as_ref().trim();
            sheets.iter().find(|(name, _)| name.trim().eq_ignore_ascii_case(w))
        })
    };
    exact
        .or_else(loose)
        .map(|(name, rid)| (name.as_str(), rid.as_str()))
}

fn parse_rels(xml: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return rels;
    };
    for node in doc.root_element().children() {
        if node.tag_name().name() == "Relationship"
            && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
        {
            rels.insert(id.to_string(), target.to_string());
        }
    }
    rels
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        abs.to_string()
    } else {
        let mut rel = target;
        while let Some(up) = rel.strip_prefix("../") {
            rel = up;
        }
        if rel.len() != target.len() {
            rel.to_string()
        } else {
            format!("xl/{target}")
        }
    }
}

/// Concatenated text of `<t>` elements, skipping phonetic runs.
fn text_of(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| is_sml(n, "t"))
        .filter(|n| !n.ancestors().any(|a| is_sml(&a, "rPh")))
        .filter_map(|n| n.text())
        .collect()
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| is_sml(n, "si"))
        .map(text_of)
        .collect())
}

fn parse_worksheet(xml: &str, shared: &[String]) -> Result<SheetCells, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let mut cells = SheetCells::new();

    if let Some(r) = sml(root, "dimension").and_then(|n| n.attribute("ref")) {
        cells.insert("!ref".into(), CellValue::from(r));
    }
    if let Some(r) = sml(root, "autoFilter").and_then(|n| n.attribute("ref")) {
        cells.insert("!autofilter".into(), CellValue::from(r));
    }
    if let Some(m) = sml(root, "pageMargins") {
        let desc: Vec<String> = m
            .attributes()
            .map(|a| format!("{}={}", a.name(), a.value()))
            .collect();
        cells.insert("!margins".into(), CellValue::Text(desc.join(";")));
    }

    let Some(sheet_data) = sml(root, "sheetData") else {
        return Ok(cells);
    };

    // `None` once the previous row or column was the last addressable one.
    let mut next_row = Some(1u32);
    for row in sheet_data.children().filter(|n| is_sml(n, "row")) {
        let row_num = match row.attribute("r").and_then(|r| r.parse::<u32>().ok()) {
            Some(r) => r,
            None => next_row.ok_or_else(|| out_of_range("row"))?,
        };
        next_row = row_num.checked_add(1);

        let mut next_col = Some(0u32);
        for c in row.children().filter(|n| is_sml(n, "c")) {
            let (col, addr) = match c.attribute("r").and_then(|r| cell_ref::parse(r).map(|p| (r, p))) {
                Some((r, (col, _))) => (col, r.to_string()),
                None => {
                    let col = next_col.ok_or_else(|| out_of_range("column"))?;
                    (col, cell_ref::format(col, row_num))
                }
            };
            next_col = col.checked_add(1);

            if let Some(value) = cell_value(c, shared) {
                cells.insert(addr, value);
            }
        }
    }

    Ok(cells)
}

fn out_of_range(what: &str) -> Error {
    Error::InvalidWorkbook(format!("unaddressed {what} follows the last addressable {what}"))
}

fn cell_value(c: roxmltree::Node, shared: &[String]) -> Option<CellValue> {
    let raw = sml(c, "v").and_then(|v| v.text());
    match c.attribute("t").unwrap_or("n") {
        "s" => {
            let idx: usize = raw?.trim().parse().ok()?;
            let s = shared.get(idx);
            if s.is_none() {
                log::warn!("Shared string index {idx} out of range");
            }
            s.map(|s| CellValue::Text(s.clone()))
        }
        "b" => raw.map(|v| CellValue::Bool(v.trim() == "1")),
        "inlineStr" => sml(c, "is").map(|is| CellValue::Text(text_of(is))),
        "str" | "e" | "d" => raw.map(CellValue::from),
        _ => raw.map(|v| match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::from(v),
        }),
    }
}
