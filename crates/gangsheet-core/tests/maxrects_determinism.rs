use gangsheet_core::config::MaxRectsHeuristic;
use gangsheet_core::model::{ManagedImage, NestedImage, Rect};
use gangsheet_core::packer::Packer;
use gangsheet_core::packer::maxrects::{MaxRectsPacker, pack_maxrects};
use gangsheet_core::sizing::expand_units;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PAD: f64 = 0.125;

const HEURISTICS: [MaxRectsHeuristic; 5] = [
    MaxRectsHeuristic::BestShortSideFit,
    MaxRectsHeuristic::BestLongSideFit,
    MaxRectsHeuristic::BestAreaFit,
    MaxRectsHeuristic::BottomLeft,
    MaxRectsHeuristic::ContactPoint,
];

fn disjoint(items: &[NestedImage]) -> bool {
    let rects: Vec<Rect> = items.iter().map(NestedImage::footprint).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                return false;
            }
        }
    }
    true
}

fn random_batch(seed: u64, n: usize) -> Vec<ManagedImage> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(1.0..6.0);
            let h = rng.gen_range(1.0..6.0);
            ManagedImage::new(format!("r{}", i), w, h, rng.gen_range(1..3))
        })
        .collect()
}

#[test]
fn maxrects_is_deterministic_per_heuristic() {
    let units = expand_units(&random_batch(7, 30));
    for h in HEURISTICS {
        let a = pack_maxrects(&units, 13.0, PAD, h, &|u| u.width != u.height);
        let b = pack_maxrects(&units, 13.0, PAD, h, &|u| u.width != u.height);
        assert_eq!(a.placed_items, b.placed_items, "{:?}", h);
        assert_eq!(a.sheet_length, b.sheet_length);
    }
}

#[test]
fn maxrects_places_everything_disjoint_and_in_bounds() {
    let units = expand_units(&random_batch(42, 40));
    for h in HEURISTICS {
        let layout = pack_maxrects(&units, 13.0, PAD, h, &|_| true);
        assert_eq!(layout.placed_items.len(), units.len(), "{:?}", h);
        assert!(disjoint(&layout.placed_items), "{:?}", h);
        for p in &layout.placed_items {
            let r = p.footprint();
            assert!(r.x >= PAD - 1e-9 && r.y >= PAD - 1e-9);
            assert!(r.right() <= 13.0 - PAD + 1e-9, "{:?}: {:?}", h, r);
            assert!(r.bottom() <= layout.sheet_length - PAD + 1e-9);
        }
    }
}

#[test]
fn maxrects_first_unit_sits_at_the_margin() {
    let units = expand_units(&[ManagedImage::new("a", 4.0, 2.0, 1)]);
    let mut p = MaxRectsPacker::new(13.0, PAD, MaxRectsHeuristic::BottomLeft);
    let placed = p.pack(&units[0], false).expect("fits");
    assert_eq!((placed.x, placed.y), (PAD, PAD));
    assert!(p.free_list_len() >= 1);
    // reserved slot plus bottom margin
    assert!((p.max_y() + p.padding() - (PAD + 2.0 + 2.0 * PAD)).abs() < 1e-9);
}

#[test]
fn maxrects_rotates_when_only_rotated_fits() {
    let units = expand_units(&[ManagedImage::new("strip", 12.8, 1.0, 1)]);
    let layout = pack_maxrects(&units, 13.0, PAD, MaxRectsHeuristic::BestAreaFit, &|_| true);
    assert_eq!(layout.placed_items.len(), 1);
    assert!(layout.placed_items[0].rotated);

    let layout = pack_maxrects(&units, 13.0, PAD, MaxRectsHeuristic::BestAreaFit, &|_| false);
    assert!(layout.placed_items.is_empty());
    assert_eq!(layout.sheet_length, 0.0);
}
