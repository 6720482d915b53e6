use gangsheet_core::config::NestConfig;
use gangsheet_core::model::{ManagedImage, NestedImage, Rect};
use gangsheet_core::quality::{
    QualityIssue, QualityOptions, evaluate_footprints, evaluate_quality,
};
use gangsheet_core::nest;

fn placed(x: f64, y: f64, w: f64, h: f64, rotated: bool) -> NestedImage {
    NestedImage {
        id: format!("p{}_{}", x, y),
        url: String::new(),
        copy_index: 0,
        x,
        y,
        width: w,
        height: h,
        rotated,
    }
}

fn with_util(u: f64) -> QualityOptions {
    QualityOptions {
        utilization: Some(u),
        ..Default::default()
    }
}

#[test]
fn clean_layout_scores_its_utilization() {
    let items = vec![placed(0.125, 0.125, 4.0, 4.0, false), placed(4.25, 0.125, 4.0, 4.0, false)];
    let r = evaluate_quality(&items, 8.375, 4.25, &with_util(0.9));
    assert!(!r.is_bad, "{:?}", r.issues);
    assert_eq!(r.overlap_pairs, 0);
    assert!((r.min_gap - 0.125).abs() < 1e-9);
    assert!((r.score01 - 0.9).abs() < 1e-12);
}

#[test]
fn overlap_is_penalised_heavily() {
    let rects = vec![Rect::new(1.0, 1.0, 3.0, 3.0), Rect::new(2.0, 2.0, 3.0, 3.0)];
    let r = evaluate_footprints(&rects, 13.0, 10.0, &with_util(0.9));
    assert_eq!(r.overlap_pairs, 1);
    assert!(r.has(QualityIssue::Overlap));
    // a negative gap is also under-spaced
    assert!(r.has(QualityIssue::UnderSpacing));
    assert!(r.min_gap < 0.0);
    assert!((r.score01 - 0.2).abs() < 1e-9);
}

#[test]
fn out_of_bounds_uses_rotated_footprint() {
    // 2 x 6 design turned on its side occupies 6 x 2
    let rotated = vec![placed(6.875, 0.125, 2.0, 6.0, true)];
    let r = evaluate_quality(&rotated, 13.0, 2.25, &QualityOptions::default());
    assert_eq!(r.out_of_bounds, 0);

    let upright = vec![placed(6.875, 0.125, 2.0, 6.0, false)];
    let r = evaluate_quality(&upright, 13.0, 2.25, &QualityOptions::default());
    assert_eq!(r.out_of_bounds, 1);
    assert_eq!(r.issues, vec![QualityIssue::OutOfBounds]);
    assert!((r.score01 - 0.7).abs() < 1e-12);
}

#[test]
fn margin_violation_is_out_of_bounds() {
    let r = evaluate_footprints(&[Rect::new(0.0, 0.5, 1.0, 1.0)], 13.0, 5.0, &QualityOptions::default());
    assert_eq!(r.out_of_bounds, 1);
    // within the 1e-6 tolerance
    let r = evaluate_footprints(
        &[Rect::new(0.125 - 5e-7, 0.5, 1.0, 1.0)],
        13.0,
        5.0,
        &QualityOptions::default(),
    );
    assert_eq!(r.out_of_bounds, 0);
}

#[test]
fn tight_neighbours_are_under_spaced() {
    let rects = vec![Rect::new(1.0, 1.0, 2.0, 2.0), Rect::new(3.05, 1.5, 2.0, 2.0)];
    let r = evaluate_footprints(&rects, 13.0, 10.0, &QualityOptions::default());
    assert_eq!(r.overlap_pairs, 0);
    assert_eq!(r.under_spacing_pairs, 1);
    assert_eq!(r.issues, vec![QualityIssue::UnderSpacing]);
    assert!((r.min_gap - 0.05).abs() < 1e-9);
}

#[test]
fn diagonal_neighbours_share_no_axis() {
    let rects = vec![Rect::new(1.0, 1.0, 2.0, 2.0), Rect::new(3.01, 3.01, 2.0, 2.0)];
    let r = evaluate_footprints(&rects, 13.0, 10.0, &QualityOptions::default());
    assert_eq!(r.under_spacing_pairs, 0);
    assert_eq!(r.min_gap, 0.10);
}

#[test]
fn single_item_reports_spacing_as_min_gap() {
    let r = evaluate_footprints(&[Rect::new(1.0, 1.0, 1.0, 1.0)], 13.0, 3.0, &QualityOptions::default());
    assert_eq!(r.min_gap, 0.10);
    assert!(!r.is_bad);
    assert_eq!(r.score01, 1.0);
}

#[test]
fn failures_and_low_utilization_are_flagged() {
    let opts = QualityOptions {
        failed_count: 2,
        utilization: Some(0.5),
        ..Default::default()
    };
    let r = evaluate_footprints(&[], 13.0, 0.0, &opts);
    assert_eq!(r.issues, vec![QualityIssue::FailedItems, QualityIssue::LowUtilization]);
    assert!(r.is_bad);
    // 0.5 - (0.8 - 0.5) * 0.5
    assert!((r.score01 - 0.35).abs() < 1e-12);
}

#[test]
fn issues_serialize_with_screaming_tags() {
    let rects = vec![Rect::new(0.0, 0.0, 3.0, 3.0), Rect::new(1.0, 1.0, 3.0, 3.0)];
    let r = evaluate_footprints(&rects, 13.0, 10.0, &QualityOptions::default());
    let v = serde_json::to_value(&r).expect("serialize");
    assert_eq!(v["isBad"], true);
    let tags: Vec<&str> = v["issues"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t.as_str())
        .collect();
    assert_eq!(tags, vec!["OVERLAP", "OUT_OF_BOUNDS", "UNDER_SPACING"]);
    assert!(v.get("score01").is_some());
}

#[test]
fn nesting_result_quality_uses_its_own_metrics() {
    let images = vec![ManagedImage::new("sq", 4.0, 4.0, 5)];
    let out = nest(&images, &NestConfig::default()).expect("nest");
    let r = out.quality(&QualityOptions::default());
    // 0.724 utilization sits below the 0.80 warning line
    assert_eq!(r.issues, vec![QualityIssue::LowUtilization]);
    let util = out.area_utilization_pct;
    let expected = util - (0.80 - util) * 0.5;
    assert!((r.score01 - expected).abs() < 1e-12);
}
