use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid workbook: {0}")]
    InvalidWorkbook(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to encode QR code: {0}")]
    Qr(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("invalid label configuration: {0}")]
    Config(String),

    #[error("preferences error: {0}")]
    Prefs(String),
}
