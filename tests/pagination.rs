use qrlabel_pdf::model::{PageSize, Unit};
use qrlabel_pdf::{Error, GridGeometry, LabelSheet};

/// 3 columns, 2 rows: 6 items per page.
fn six_up() -> GridGeometry {
    let page = PageSize {
        width: 90.0,
        height: 70.0,
        unit: Unit::Mm,
    };
    let g = GridGeometry::grid(page, 3, 5.0).unwrap();
    assert_eq!(g.items_per_page(), 6);
    g
}

#[test]
fn seventh_item_starts_a_new_page() {
    let g = six_up();
    let placements: Vec<_> = g.placements(7).collect();
    assert_eq!(placements.len(), 7);

    let fifth = placements[5];
    assert_eq!((fifth.page, fifth.slot, fifth.column, fifth.row), (0, 5, 2, 1));
    assert!(!fifth.starts_page);
    assert!((fifth.x - 60.0).abs() < 1e-4);
    assert!((fifth.y - 35.0).abs() < 1e-4);

    let sixth = placements[6];
    assert_eq!((sixth.page, sixth.slot, sixth.column, sixth.row), (1, 0, 0, 0));
    assert!(sixth.starts_page);
    assert_eq!((sixth.x, sixth.y), (0.0, 0.0));
}

#[test]
fn single_label_pages_break_before_every_record_but_the_first() {
    let page = PageSize {
        width: 4.0,
        height: 6.0,
        unit: Unit::In,
    };
    let g = GridGeometry::single(page, 2.0).unwrap();
    assert_eq!((g.columns(), g.items_per_page()), (1, 1));

    let breaks: Vec<bool> = g.placements(3).map(|p| p.starts_page).collect();
    assert_eq!(breaks, vec![false, true, true]);
    assert_eq!(g.page_count(3), 3);
    assert!(g.placements(3).all(|p| p.x == 0.0 && p.y == 0.0));
}

#[test]
fn page_breaks_land_on_multiples_of_items_per_page() {
    for (columns, height) in [(1u32, 300.0f32), (2, 200.0), (3, 297.0), (4, 100.0), (5, 500.0)] {
        let page = PageSize {
            width: 210.0,
            height,
            unit: Unit::Mm,
        };
        let g = GridGeometry::grid(page, columns, 5.0).unwrap();
        let p = g.items_per_page() as usize;

        for m in [0usize, 1, p - 1, p, p + 1, 3 * p, 3 * p + 2] {
            let breaks: Vec<usize> = g
                .placements(m)
                .filter(|pl| pl.starts_page)
                .map(|pl| pl.index)
                .collect();
            let expected: Vec<usize> = (1..).map(|k| k * p).take_while(|&i| i < m).collect();
            assert_eq!(breaks, expected, "columns={columns} height={height} m={m}");

            for pl in g.placements(m) {
                assert_eq!(pl.column as usize, pl.index % p % columns as usize);
                assert_eq!(pl.row as usize, (pl.index % p) / columns as usize);
                assert!(pl.column < g.columns());
                assert!(pl.row < g.rows_per_page());
            }
        }
    }
}

#[test]
fn placements_are_restartable() {
    let g = six_up();
    let it = g.placements(13);
    let first: Vec<_> = it.clone().collect();
    let second: Vec<_> = it.collect();
    assert_eq!(first, second);
    assert_eq!(g.placements(13).len(), 13);
    assert_eq!(g.placements(0).count(), 0);
}

#[test]
fn rows_per_page_is_floored() {
    let sheet = LabelSheet::a4_grid().unwrap();
    // 297 / 75 = 3.96
    assert_eq!(sheet.geometry.rows_per_page(), 3);
    assert_eq!(sheet.geometry.page_count(10), 2);
}

#[test]
fn cell_taller_than_page_is_rejected() {
    let page = PageSize {
        width: 210.0,
        height: 50.0,
        unit: Unit::Mm,
    };
    let err = GridGeometry::grid(page, 1, 5.0).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn degenerate_geometry_is_rejected() {
    let a4 = PageSize::A4_MM;
    assert!(matches!(GridGeometry::grid(a4, 0, 5.0), Err(Error::Config(_))));
    assert!(matches!(GridGeometry::grid(a4, 3, -1.0), Err(Error::Config(_))));
    let flat = PageSize { width: 0.0, ..a4 };
    assert!(matches!(GridGeometry::single(flat, 1.0), Err(Error::Config(_))));
    assert!(matches!(LabelSheet::shipping_label(4.0, f32::NAN, Unit::In), Err(Error::Config(_))));
}

#[test]
fn page_with_too_many_slots_is_rejected() {
    // 2e12 rows of half-millimetre cells.
    let tall = PageSize {
        width: 1.0,
        height: 1e12,
        unit: Unit::Mm,
    };
    assert!(matches!(GridGeometry::grid(tall, 2, 0.0), Err(Error::Config(_))));

    // Rows fit a u32 but rows x columns does not.
    let tall = PageSize {
        width: 1.0,
        height: 1.5e9,
        unit: Unit::Mm,
    };
    assert!(matches!(GridGeometry::grid(tall, 2, 0.0), Err(Error::Config(_))));
}

#[test]
fn geometry_reports_what_it_was_built_from() {
    let g = six_up();
    assert_eq!(g.page(), PageSize { width: 90.0, height: 70.0, unit: Unit::Mm });
    assert_eq!((g.columns(), g.rows_per_page()), (3, 2));
    assert!((g.cell_width() - 30.0).abs() < 1e-4);
    assert!((g.cell_height() - 35.0).abs() < 1e-4);
    assert!((g.text_allowance() - 5.0).abs() < 1e-4);
}
