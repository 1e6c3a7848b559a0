use std::path::Path;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{CAPTION_FONT, text_width, to_winansi_bytes};
use crate::model::{Align, PageSize};

/// Receives drawing commands in page order. Coordinates are in the page's
/// unit, measured from the top-left corner; `y` of text is its baseline.
///
/// A sink starts with one open page. Every later page is opened with
/// [`DocumentSink::add_page`] before anything is drawn on it.
pub trait DocumentSink {
    fn add_page(&mut self, size: PageSize) -> Result<(), Error>;

    /// Draw PNG-encoded `image` stretched into the given box.
    fn place_image(&mut self, image: &[u8], x: f32, y: f32, width: f32, height: f32)
    -> Result<(), Error>;

    fn place_text(&mut self, text: &str, x: f32, y: f32, align: Align) -> Result<(), Error>;

    fn save(self, path: &Path) -> Result<(), Error>
    where
        Self: Sized;
}

struct PageState {
    size: PageSize,
    content: Content,
    /// Indices into `PdfSink::images` drawn on this page.
    images: Vec<usize>,
}

/// [`DocumentSink`] that writes a PDF with `pdf-writer`.
pub struct PdfSink {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    font_ref: Ref,
    font_size: f32,
    images: Vec<(String, Ref)>,
    pages: Vec<PageState>,
}

const FONT_NAME: &[u8] = b"F1";

impl PdfSink {
    /// Start a document whose first page has `size`; captions are set in
    /// `font_size` points.
    pub fn new(size: PageSize, font_size: f32) -> Self {
        let mut sink = Self {
            pdf: Pdf::new(),
            next_id: 1,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(1),
            font_ref: Ref::new(1),
            font_size,
            images: Vec::new(),
            pages: Vec::new(),
        };
        sink.catalog_id = sink.alloc();
        sink.pages_id = sink.alloc();
        sink.font_ref = sink.alloc();
        sink.pdf
            .type1_font(sink.font_ref)
            .base_font(Name(CAPTION_FONT.as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        sink.open_page(size);
        sink
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn open_page(&mut self, size: PageSize) {
        let mut content = Content::new();
        content.set_fill_gray(0.0);
        self.pages.push(PageState {
            size,
            content,
            images: Vec::new(),
        });
    }

    fn current(&mut self) -> Result<&mut PageState, Error> {
        self.pages
            .last_mut()
            .ok_or_else(|| Error::Pdf("no open page".into()))
    }

    /// Decode a PNG and write it as a Flate-compressed RGB image XObject, with
    /// a soft mask when any pixel is not fully opaque.
    fn embed_png(&mut self, data: &[u8]) -> Result<usize, Error> {
        let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)?.to_rgba8();
        let (w, h) = (rgba.width() as i32, rgba.height() as i32);
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

        // Transparent pixels are painted white under the mask so viewers that
        // ignore SMask still show a scannable code.
        let rgb: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| {
                if p.0[3] == 0 {
                    [255, 255, 255]
                } else {
                    [p.0[0], p.0[1], p.0[2]]
                }
            })
            .collect();
        let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6);

        let smask_ref = if has_alpha {
            let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
            let mask_ref = self.alloc();
            let mut mask = self.pdf.image_xobject(mask_ref, &compressed_alpha);
            mask.filter(Filter::FlateDecode);
            mask.width(w);
            mask.height(h);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            Some(mask_ref)
        } else {
            None
        };

        let xobj_ref = self.alloc();
        let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed_rgb);
        xobj.filter(Filter::FlateDecode);
        xobj.width(w);
        xobj.height(h);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        // Keep module edges crisp when scaled up.
        xobj.interpolate(false);
        if let Some(mask_ref) = smask_ref {
            xobj.s_mask(mask_ref);
        }
        drop(xobj);

        let name = format!("Im{}", self.images.len() + 1);
        self.images.push((name, xobj_ref));
        Ok(self.images.len() - 1)
    }

    /// Assemble catalog, page tree and content streams.
    pub fn finish(mut self) -> Vec<u8> {
        let t0 = std::time::Instant::now();
        let n = self.pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for (i, page) in self.pages.into_iter().enumerate() {
            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            self.pdf
                .stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);

            let mut pdf_page = self.pdf.page(page_ids[i]);
            pdf_page
                .media_box(Rect::new(0.0, 0.0, page.size.width_pt(), page.size.height_pt()))
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = pdf_page.resources();
            resources.fonts().pair(Name(FONT_NAME), self.font_ref);
            if !page.images.is_empty() {
                let mut xobjects = resources.x_objects();
                for &idx in &page.images {
                    let (name, xobj_ref) = &self.images[idx];
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        log::debug!(
            "PDF assembly: {n} page(s), {} image(s) in {:.1}ms",
            self.images.len(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        self.pdf.finish()
    }
}

impl DocumentSink for PdfSink {
    fn add_page(&mut self, size: PageSize) -> Result<(), Error> {
        self.open_page(size);
        log::debug!("Opened page {}", self.pages.len());
        Ok(())
    }

    fn place_image(
        &mut self,
        image: &[u8],
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), Error> {
        let idx = self.embed_png(image)?;
        let name = self.images[idx].0.clone();
        let page = self.current()?;
        let unit = page.size.unit;
        let (w, h) = (unit.to_points(width), unit.to_points(height));
        let left = unit.to_points(x);
        let bottom = page.size.height_pt() - unit.to_points(y) - h;

        page.images.push(idx);
        page.content.save_state();
        page.content.transform([w, 0.0, 0.0, h, left, bottom]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();
        Ok(())
    }

    fn place_text(&mut self, text: &str, x: f32, y: f32, align: Align) -> Result<(), Error> {
        let font_size = self.font_size;
        let page = self.current()?;
        let unit = page.size.unit;
        let width = text_width(text, font_size);
        let anchor = unit.to_points(x);
        let left = match align {
            Align::Left => anchor,
            Align::Center => anchor - width / 2.0,
            Align::Right => anchor - width,
        };
        let baseline = page.size.height_pt() - unit.to_points(y);

        page.content.begin_text();
        page.content.set_font(Name(FONT_NAME), font_size);
        page.content.next_line(left, baseline);
        page.content.show(Str(&to_winansi_bytes(text)));
        page.content.end_text();
        Ok(())
    }

    fn save(self, path: &Path) -> Result<(), Error> {
        let bytes = self.finish();
        std::fs::write(path, &bytes).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}
