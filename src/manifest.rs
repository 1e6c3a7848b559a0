use std::path::Path;

use crate::error::Error;

pub const MANIFEST_HEADER: &str = "id";

/// One identifier per line, in label order, optionally preceded by an `id`
/// header. No trailing newline.
pub fn manifest_csv<'a>(ids: impl IntoIterator<Item = &'a str>, with_header: bool) -> String {
    let header = with_header.then_some(MANIFEST_HEADER);
    header
        .into_iter()
        .map(str::to_string)
        .chain(ids.into_iter().map(csv_field))
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn write_manifest<'a>(
    path: &Path,
    ids: impl IntoIterator<Item = &'a str>,
    with_header: bool,
) -> Result<(), Error> {
    let text = manifest_csv(ids, with_header);
    std::fs::write(path, text.as_bytes())?;
    log::info!("Wrote manifest {}", path.display());
    Ok(())
}
