mod error;
mod fonts;
pub mod ids;
pub mod layout;
pub mod manifest;
pub mod model;
pub mod pdf;
pub mod prefs;
pub mod qr;
pub mod records;
pub mod render;
pub mod session;
pub mod xlsx;

pub use error::Error;
pub use layout::{GridGeometry, LabelSheet, Placement};
pub use model::{LabelField, PageSize, Record, RecordSet, Unit};
pub use records::{ExtractOptions, extract_cells, extract_delimited};

use std::path::Path;
use std::time::Instant;

use pdf::{DocumentSink, PdfSink};
use qr::QrCodeRenderer;

/// Finished label document plus the identifier manifest that goes with it.
#[derive(Clone, Debug)]
pub struct Export {
    pub pdf: Vec<u8>,
    pub manifest: String,
    pub pages: usize,
}

fn ensure_records(set: &RecordSet) -> Result<(), Error> {
    if set.is_empty() {
        return Err(Error::Config("no records to print".into()));
    }
    Ok(())
}

/// Render every record onto `sheet` with the built-in QR encoder. An empty
/// set is a [`Error::Config`] error rather than a blank document.
pub fn export_labels(set: &RecordSet, sheet: &LabelSheet, url_prefix: &str) -> Result<Export, Error> {
    ensure_records(set)?;
    let t0 = Instant::now();

    let mut sink = PdfSink::new(sheet.geometry.page(), sheet.font_size);
    let pages = render::render_labels(set, sheet, url_prefix, &QrCodeRenderer::default(), &mut sink)?;
    let t_layout = t0.elapsed();

    let pdf = sink.finish();
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout+qr={:.1}ms, assembly={:.1}ms, total={:.1}ms ({} labels, {} pages, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        set.len(),
        pages,
        pdf.len(),
    );

    Ok(Export {
        pdf,
        manifest: manifest::manifest_csv(set.identifiers(), true),
        pages,
    })
}

/// Render straight to `output`, streaming through the sink's own `save`.
pub fn write_labels(set: &RecordSet, sheet: &LabelSheet, url_prefix: &str, output: &Path) -> Result<usize, Error> {
    ensure_records(set)?;
    let mut sink = PdfSink::new(sheet.geometry.page(), sheet.font_size);
    let pages = render::render_labels(set, sheet, url_prefix, &QrCodeRenderer::default(), &mut sink)?;
    sink.save(output)?;
    Ok(pages)
}

/// Read `input`, extract records from the first matching sheet and write the
/// label PDF. `Ok(None)` when the workbook has no usable data; a sheet whose
/// rows were all filtered out is a [`Error::Config`] error.
pub fn convert_xlsx_to_labels<S: AsRef<str>>(
    input: &Path,
    sheet_names: &[S],
    opts: &ExtractOptions,
    sheet: &LabelSheet,
    url_prefix: &str,
    output: &Path,
) -> Result<Option<RecordSet>, Error> {
    let t0 = Instant::now();
    let Some(cells) = xlsx::read_sheet(input, sheet_names)? else {
        return Ok(None);
    };
    let Some(set) = extract_cells(&cells, opts) else {
        return Ok(None);
    };
    let t_parse = t0.elapsed();

    write_labels(&set, sheet, url_prefix, output)?;
    log::info!(
        "Timing: parse={:.1}ms, render+write={:.1}ms",
        t_parse.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_parse).as_secs_f64() * 1000.0,
    );
    Ok(Some(set))
}
