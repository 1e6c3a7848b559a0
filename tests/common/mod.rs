#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use qrlabel_pdf::model::{Align, PageSize};
use qrlabel_pdf::pdf::DocumentSink;
use qrlabel_pdf::qr::{ModuleGrid, QrRenderer};
use qrlabel_pdf::xlsx::cell_ref;
use qrlabel_pdf::Error;
use zip::write::SimpleFileOptions;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scratch directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Minimal .xlsx with one worksheet per `(name, rows)`. String cells go through
/// the shared string table; cells that parse as numbers are written as numbers.
pub fn build_xlsx(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let mut shared: Vec<String> = Vec::new();
    let mut sheet_xml = Vec::new();

    for (_, rows) in sheets {
        let mut data = String::new();
        for (r, row) in rows.iter().enumerate() {
            data.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let addr = cell_ref::format(c as u32, r as u32 + 1);
                if value.parse::<f64>().is_ok() {
                    data.push_str(&format!("<c r=\"{addr}\"><v>{value}</v></c>"));
                } else {
                    let idx = shared.len();
                    shared.push(value.to_string());
                    data.push_str(&format!("<c r=\"{addr}\" t=\"s\"><v>{idx}</v></c>"));
                }
            }
            data.push_str("</row>");
        }
        sheet_xml.push(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1"/><sheetData>{data}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
        ));
    }

    let sheet_entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                xml_escape(name),
                i + 1,
                i + 1
            )
        })
        .collect();
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
    );

    let mut rels: String = (0..sheets.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            )
        })
        .collect();
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheets.len() + 1
    ));
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    );

    let sst_items: String = shared
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", xml_escape(s)))
        .collect();
    let sst = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{sst_items}</sst>"#,
        n = shared.len()
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    let mut add = |name: &str, body: &str| {
        zip.start_file(name, opts).expect("start zip entry");
        zip.write_all(body.as_bytes()).expect("write zip entry");
    };
    add("xl/workbook.xml", &workbook);
    add("xl/_rels/workbook.xml.rels", &rels);
    add("xl/sharedStrings.xml", &sst);
    for (i, xml) in sheet_xml.iter().enumerate() {
        add(&format!("xl/worksheets/sheet{}.xml", i + 1), xml);
    }
    zip.finish().expect("finish zip").into_inner()
}

pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
    std::fs::write(path, build_xlsx(sheets)).expect("write xlsx fixture");
}

/// Calls a sink received, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    AddPage(PageSize),
    Image { x: f32, y: f32, width: f32, height: f32, png_len: usize },
    Text { text: String, x: f32, y: f32, align: Align },
}

#[derive(Debug)]
pub struct RecordingSink {
    pub first_page: PageSize,
    pub calls: Vec<SinkCall>,
    pub fail_on_image: Option<usize>,
}

impl RecordingSink {
    pub fn new(first_page: PageSize) -> Self {
        Self {
            first_page,
            calls: Vec::new(),
            fail_on_image: None,
        }
    }

    pub fn page_breaks(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::AddPage(_)))
            .count()
    }

    pub fn images(&self) -> Vec<&SinkCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Image { .. }))
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DocumentSink for RecordingSink {
    fn add_page(&mut self, size: PageSize) -> Result<(), Error> {
        self.calls.push(SinkCall::AddPage(size));
        Ok(())
    }

    fn place_image(&mut self, image: &[u8], x: f32, y: f32, width: f32, height: f32) -> Result<(), Error> {
        if self.fail_on_image == Some(self.images().len()) {
            return Err(Error::Pdf("sink refused image".into()));
        }
        self.calls.push(SinkCall::Image {
            x,
            y,
            width,
            height,
            png_len: image.len(),
        });
        Ok(())
    }

    fn place_text(&mut self, text: &str, x: f32, y: f32, align: Align) -> Result<(), Error> {
        self.calls.push(SinkCall::Text {
            text: text.to_string(),
            x,
            y,
            align,
        });
        Ok(())
    }

    fn save(self, _path: &Path) -> Result<(), Error> {
        Ok(())
    }
}

/// 1x1 module grid, dark when the payload has an even length. Remembers
/// every payload it was asked for.
#[derive(Default)]
pub struct FakeRenderer {
    pub payloads: std::cell::RefCell<Vec<String>>,
}

impl QrRenderer for FakeRenderer {
    fn render(&self, payload: &str) -> Result<ModuleGrid, Error> {
        self.payloads.borrow_mut().push(payload.to_string());
        ModuleGrid::new(1, vec![payload.len() % 2 == 0])
    }
}

/// Count `/Type /Page` dictionaries (excluding the `/Pages` tree node).
pub fn pdf_page_count(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}
