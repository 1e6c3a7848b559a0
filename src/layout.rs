use crate::error::Error;
use crate::model::{LabelField, PageSize, Record, RecordSet, Unit};

/// Page grid derived from a page size, a column count and a text allowance.
/// All lengths share `page.unit`. Only [`GridGeometry::grid`] and
/// [`GridGeometry::single`] build one, so every value has at least one slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    page: PageSize,
    columns: u32,
    cell_width: f32,
    /// `cell_width + text_allowance` for grids, the page height for single labels.
    cell_height: f32,
    text_allowance: f32,
    rows_per_page: u32,
    items_per_page: u32,
}

impl GridGeometry {
    /// Square-ish cells: `columns` across, each `page.width / columns` wide and
    /// `text_allowance` taller than wide. Rows fill the page height, floored.
    pub fn grid(page: PageSize, columns: u32, text_allowance: f32) -> Result<Self, Error> {
        check_page(&page)?;
        if columns == 0 {
            return Err(Error::Config("column count must be at least 1".into()));
        }
        let cell_width = page.width / columns as f32;
        Self::build(page, columns, cell_width, cell_width + text_allowance, text_allowance)
    }

    /// One cell per page; the cell is the page.
    pub fn single(page: PageSize, text_allowance: f32) -> Result<Self, Error> {
        check_page(&page)?;
        Self::build(page, 1, page.width, page.height, text_allowance)
    }

    fn build(
        page: PageSize,
        columns: u32,
        cell_width: f32,
        cell_height: f32,
        text_allowance: f32,
    ) -> Result<Self, Error> {
        if !(text_allowance >= 0.0 && text_allowance < cell_height) {
            return Err(Error::Config(format!(
                "text allowance {text_allowance} must be in [0, {cell_height})"
            )));
        }
        let rows = (page.height / cell_height).floor();
        if rows < 1.0 {
            return Err(Error::Config(format!(
                "cell height {cell_height} exceeds page height {}: no row fits",
                page.height
            )));
        }
        let too_many = || {
            Error::Config(format!(
                "{rows} rows of {columns} cells {cell_width}x{cell_height} do not fit one page"
            ))
        };
        if rows >= u32::MAX as f32 {
            return Err(too_many());
        }
        let rows_per_page = rows as u32;
        let items_per_page = rows_per_page.checked_mul(columns).ok_or_else(too_many)?;
        Ok(Self {
            page,
            columns,
            cell_width,
            cell_height,
            text_allowance,
            rows_per_page,
            items_per_page,
        })
    }

    pub fn page(&self) -> PageSize {
        self.page
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    pub fn text_allowance(&self) -> f32 {
        self.text_allowance
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn page_count(&self, items: usize) -> usize {
        items.div_ceil(self.items_per_page() as usize)
    }

    /// Where the item at linear index `index` goes.
    pub fn place(&self, index: usize) -> Placement {
        let per_page = self.items_per_page() as usize;
        let slot = index % per_page;
        let column = (slot % self.columns as usize) as u32;
        let row = (slot / self.columns as usize) as u32;
        Placement {
            index,
            page: index / per_page,
            slot: slot as u32,
            column,
            row,
            x: column as f32 * self.cell_width,
            y: row as f32 * self.cell_height,
            starts_page: index != 0 && slot == 0,
        }
    }

    pub fn placements(&self, count: usize) -> Placements {
        Placements {
            geometry: *self,
            next: 0,
            count,
        }
    }
}

fn check_page(page: &PageSize) -> Result<(), Error> {
    let ok = |v: f32| v.is_finite() && v > 0.0;
    if ok(page.width) && ok(page.height) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "page size {}x{} must be positive",
            page.width, page.height
        )))
    }
}

/// Position of one item. `x`/`y` are the cell's top-left corner, measured from
/// the page's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub page: usize,
    pub slot: u32,
    pub column: u32,
    pub row: u32,
    pub x: f32,
    pub y: f32,
    /// A new page must be opened before this item is drawn.
    pub starts_page: bool,
}

/// Lazy, restartable sequence of placements for `count` items.
#[derive(Clone, Debug)]
pub struct Placements {
    geometry: GridGeometry,
    next: usize,
    count: usize,
}

impl Iterator for Placements {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        if self.next >= self.count {
            return None;
        }
        let p = self.geometry.place(self.next);
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.count - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Placements {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything needed to draw labels onto a grid: geometry plus padding and
/// caption settings.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSheet {
    pub geometry: GridGeometry,
    pub padding: f32,
    /// Each entry is one caption line; its fields are joined with spaces.
    pub captions: Vec<Vec<LabelField>>,
    /// Caption font size in points.
    pub font_size: f32,
    /// Baseline step between caption lines, in the geometry unit.
    pub line_height: f32,
}

impl LabelSheet {
    pub fn new(
        geometry: GridGeometry,
        padding: f32,
        captions: Vec<Vec<LabelField>>,
        font_size: f32,
    ) -> Result<Self, Error> {
        let sheet = Self {
            geometry,
            padding,
            captions,
            font_size,
            line_height: geometry.page.unit.from_points(font_size * 1.25),
        };
        let area = sheet.image_box(&geometry.place(0));
        if !(padding >= 0.0 && area.width > 0.0 && area.height > 0.0) {
            return Err(Error::Config(format!(
                "padding {padding} leaves no room for the code in a {}x{} cell",
                geometry.cell_width, geometry.cell_height
            )));
        }
        if !(font_size > 0.0) {
            return Err(Error::Config("font size must be positive".into()));
        }
        Ok(sheet)
    }

    /// A4 portrait, 3 columns of 70 mm codes with the identifier underneath.
    pub fn a4_grid() -> Result<Self, Error> {
        let geometry = GridGeometry::grid(PageSize::A4_MM, 3, 5.0)?;
        Self::new(geometry, 10.0, vec![vec![LabelField::Id]], 9.0)
    }

    /// One shipping label per page at a custom physical size. The code takes the
    /// top square of the label; address lines go underneath.
    pub fn shipping_label(width: f32, height: f32, unit: Unit) -> Result<Self, Error> {
        let page = PageSize { width, height, unit };
        let allowance = if height > width { height - width } else { height / 2.0 };
        let geometry = GridGeometry::single(page, allowance)?;
        let captions = vec![
            vec![LabelField::Id],
            vec![LabelField::FirstName, LabelField::LastName, LabelField::FullName],
            vec![LabelField::Address1],
            vec![LabelField::Address2],
            vec![LabelField::City, LabelField::State, LabelField::Zip],
        ];
        Self::new(geometry, unit.from_points(18.0), captions, 12.0)
    }

    /// Area reserved for the code inside a cell.
    pub fn image_box(&self, p: &Placement) -> Rect {
        let g = &self.geometry;
        Rect {
            x: p.x + self.padding,
            y: p.y + self.padding,
            width: g.cell_width - 2.0 * self.padding,
            height: g.cell_height - g.text_allowance - 2.0 * self.padding,
        }
    }

    /// The square the code is drawn into: the largest square in
    /// [`LabelSheet::image_box`], top-aligned and horizontally centered.
    pub fn code_rect(&self, p: &Placement) -> Rect {
        let area = self.image_box(p);
        let side = area.width.min(area.height);
        Rect {
            x: area.x + (area.width - side) / 2.0,
            y: area.y,
            width: side,
            height: side,
        }
    }

    /// Caption baseline for line `line`, horizontally centered in the cell.
    pub fn caption_anchor(&self, p: &Placement, line: usize) -> (f32, f32) {
        let g = &self.geometry;
        (
            p.x + g.cell_width / 2.0,
            p.y + g.cell_height - g.text_allowance + line as f32 * self.line_height,
        )
    }

    /// Caption text for a record; lines whose fields are all blank are skipped.
    /// [`LabelField::FullName`] only prints when the same line has no first or
    /// last name.
    pub fn caption_lines(&self, set: &RecordSet, record: &Record) -> Vec<String> {
        self.captions
            .iter()
            .filter_map(|fields| {
                let has_given_name = fields.iter().any(|&f| {
                    matches!(f, LabelField::FirstName | LabelField::LastName)
                        && !field_text(set, record, f).is_empty()
                });
                let parts: Vec<&str> = fields
                    .iter()
                    .filter(|&&f| !(f == LabelField::FullName && has_given_name))
                    .map(|&f| field_text(set, record, f))
                    .filter(|s| !s.is_empty())
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            })
            .collect()
    }
}

fn field_text<'r>(set: &RecordSet, record: &'r Record, field: LabelField) -> &'r str {
    match field {
        LabelField::Id => set.identifier(record),
        _ => set.fields.value(record, field),
    }
    .trim()
}
