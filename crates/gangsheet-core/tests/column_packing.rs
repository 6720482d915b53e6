use gangsheet_core::model::ManagedImage;
use gangsheet_core::packer::Packer;
use gangsheet_core::packer::column::{ColumnPacker, pack_columns};
use gangsheet_core::sizing::expand_units;

const PAD: f64 = 0.125;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn narrower_items_stack_in_the_first_column() {
    let images = vec![
        ManagedImage::new("c", 4.0, 3.0, 1),
        ManagedImage::new("a", 4.0, 6.0, 1),
        ManagedImage::new("b", 3.0, 5.0, 1),
    ];
    let units = expand_units(&images);
    let layout = pack_columns(&units, 13.0, PAD, &|_| false);
    let order: Vec<&str> = layout.placed_items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert!(layout.placed_items.iter().all(|p| approx(p.x, PAD)));
    assert!(approx(layout.placed_items[1].y, 6.25));
    assert!(approx(layout.placed_items[2].y, 11.375));
    assert!(approx(layout.sheet_length, 14.625));
}

#[test]
fn wider_items_open_a_new_column() {
    let images = vec![
        ManagedImage::new("narrow", 3.0, 6.0, 1),
        ManagedImage::new("wide", 4.0, 5.0, 1),
    ];
    let units = expand_units(&images);
    let mut packer = ColumnPacker::new(13.0, PAD);
    let first = packer.pack(&units[0], false).expect("first fits");
    let second = packer.pack(&units[1], false).expect("second fits");
    assert_eq!(packer.column_count(), 2);
    assert!(approx(first.x, PAD));
    // previous column x + (width + padding) + padding
    assert!(approx(second.x, 3.375));
    assert!(approx(second.y, PAD));
}

#[test]
fn existing_column_accepts_rotated_orientation() {
    let images = vec![
        ManagedImage::new("tall", 3.0, 8.0, 1),
        ManagedImage::new("flat", 6.0, 2.0, 1),
    ];
    let units = expand_units(&images);
    let layout = pack_columns(&units, 13.0, PAD, &|_| true);
    let flat = layout
        .placed_items
        .iter()
        .find(|p| p.id == "flat")
        .expect("flat placed");
    assert!(flat.rotated);
    assert!(approx(flat.x, PAD));
    assert!(approx(flat.y, 8.25));
    assert_eq!((flat.width, flat.height), (6.0, 2.0));
}

#[test]
fn wider_unit_fails_when_no_column_can_open() {
    // equal widths stack in one column; the 7" unit would need x = 6.375 + 7.125 > 13
    let images = vec![ManagedImage::new("half", 6.0, 6.0, 3)];
    let units = expand_units(&images);
    let layout = pack_columns(&units, 13.0, PAD, &|_| false);
    assert_eq!(layout.placed_items.len(), 3);
    let mut packer = ColumnPacker::new(13.0, PAD);
    let wide = expand_units(&[ManagedImage::new("w", 7.0, 1.0, 1)]);
    assert!(packer.pack(&units[0], false).is_some());
    assert!(packer.pack(&wide[0], false).is_none());
}

#[test]
fn column_respects_the_right_margin() {
    let images = vec![ManagedImage::new("max", 12.75, 1.0, 1)];
    let units = expand_units(&images);
    let layout = pack_columns(&units, 13.0, PAD, &|_| false);
    assert_eq!(layout.placed_items.len(), 1);

    let too_wide = expand_units(&[ManagedImage::new("over", 12.8, 1.0, 1)]);
    let layout = pack_columns(&too_wide, 13.0, PAD, &|_| false);
    assert!(layout.placed_items.is_empty());
    assert_eq!(layout.sheet_length, 0.0);
}
