use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::Error;

/// Pixels per module when rasterizing.
pub const MODULE_PIXELS: u32 = 10;

/// Square dark/light matrix of a QR symbol, without quiet zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    dark: Vec<bool>,
}

impl ModuleGrid {
    /// `dark` is row-major and must hold `width * width` modules.
    pub fn new(width: usize, dark: Vec<bool>) -> Result<Self, Error> {
        if width == 0 || dark.len() != width * width {
            return Err(Error::Qr(format!(
                "module grid of width {width} needs {} cells, got {}",
                width * width,
                dark.len()
            )));
        }
        Ok(Self { width, dark })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.dark.get(row * self.width + col).copied().unwrap_or(false)
    }

    /// One opaque black square per dark module, transparent elsewhere.
    pub fn rasterize(&self, scale: u32) -> RgbaImage {
        let side = self.width as u32 * scale;
        RgbaImage::from_fn(side, side, |x, y| {
            if self.is_dark((y / scale) as usize, (x / scale) as usize) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    pub fn to_png(&self, scale: u32) -> Result<Vec<u8>, Error> {
        let mut out = Cursor::new(Vec::new());
        self.rasterize(scale).write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Turns a payload into a module grid. Implementations decide error correction
/// and version; the payload must survive a scan.
pub trait QrRenderer {
    fn render(&self, payload: &str) -> Result<ModuleGrid, Error>;
}

/// Local encoder backed by the `qrcode` crate.
#[derive(Clone, Copy, Debug)]
pub struct QrCodeRenderer {
    pub ec_level: EcLevel,
}

impl Default for QrCodeRenderer {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
        }
    }
}

impl QrRenderer for QrCodeRenderer {
    fn render(&self, payload: &str) -> Result<ModuleGrid, Error> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| Error::Qr(format!("{e} (payload {} bytes)", payload.len())))?;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        ModuleGrid::new(code.width(), dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_symbol_is_21_modules() {
        let grid = QrCodeRenderer::default().render("C1").unwrap();
        assert_eq!(grid.width(), 21);
        // finder pattern corners
        assert!(grid.is_dark(0, 0));
        assert!(grid.is_dark(0, 20));
        assert!(grid.is_dark(20, 0));
        assert!(!grid.is_dark(7, 7));
    }

    #[test]
    fn rasterized_modules_are_square_blocks() {
        let grid = ModuleGrid::new(2, vec![true, false, false, true]).unwrap();
        let img = grid.rasterize(3);
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 0).0[3], 0);
        assert_eq!(img.get_pixel(5, 5).0[3], 255);
    }

    #[test]
    fn png_output_decodes_at_scaled_size() {
        let grid = QrCodeRenderer::default().render("https://example.com/form?id=ABC").unwrap();
        let png = grid.to_png(MODULE_PIXELS).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        let side = grid.width() as u32 * MODULE_PIXELS;
        assert_eq!((decoded.width(), decoded.height()), (side, side));
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        assert!(ModuleGrid::new(3, vec![true; 8]).is_err());
        assert!(ModuleGrid::new(0, vec![]).is_err());
    }
}
