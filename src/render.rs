use crate::error::Error;
use crate::layout::LabelSheet;
use crate::model::{Align, RecordSet};
use crate::pdf::DocumentSink;
use crate::qr::{MODULE_PIXELS, QrRenderer};

/// Draw one label per record, in order. For each record: open a page if its
/// slot is the first of a new page, render `url_prefix + identifier` as a QR
/// image into the code area, then write its caption lines.
///
/// Records are processed strictly one at a time; the first failure aborts the
/// whole run.
pub fn render_labels<R, S>(
    set: &RecordSet,
    sheet: &LabelSheet,
    url_prefix: &str,
    renderer: &R,
    sink: &mut S,
) -> Result<usize, Error>
where
    R: QrRenderer + ?Sized,
    S: DocumentSink + ?Sized,
{
    let geometry = &sheet.geometry;
    let mut pages = usize::from(!set.is_empty());

    for (placement, record) in geometry.placements(set.len()).zip(&set.records) {
        if placement.starts_page {
            sink.add_page(geometry.page())?;
            pages += 1;
        }

        let id = set.identifier(record);
        let payload = format!("{url_prefix}{id}");
        let png = renderer.render(&payload)?.to_png(MODULE_PIXELS)?;
        let code = sheet.code_rect(&placement);
        sink.place_image(&png, code.x, code.y, code.width, code.height)?;

        for (line, text) in sheet.caption_lines(set, record).iter().enumerate() {
            let (x, y) = sheet.caption_anchor(&placement, line);
            sink.place_text(text, x, y, Align::Center)?;
        }

        log::debug!(
            "Label {} '{id}': page {} slot {} (col {}, row {})",
            placement.index,
            placement.page,
            placement.slot,
            placement.column,
            placement.row,
        );
    }

    Ok(pages)
}
