use gangsheet_core::prelude::*;
use gangsheet_core::{NestJob, RunRecord};

fn sample() -> (Vec<ManagedImage>, NestingResult) {
    let images = vec![
        ManagedImage::new("strip", 12.7, 2.0, 1).with_url("https://cdn.example/strip.png"),
        ManagedImage::new("sq", 3.0, 3.0, 2),
    ];
    let cfg = NestConfig {
        methods: vec![PackingMethod::Skyline],
        ..Default::default()
    };
    let out = nest(&images, &cfg).expect("nest");
    (images, out)
}

#[test]
fn to_json_uses_camel_case_wire_shape() {
    let (_, out) = sample();
    let v = to_json(&out);
    for key in [
        "placedItems",
        "sheetWidth",
        "sheetLength",
        "areaUtilizationPct",
        "totalCount",
        "failedCount",
        "sortStrategy",
        "packingMethod",
        "strategy",
    ] {
        assert!(v.get(key).is_some(), "missing {}", key);
    }
    assert!(v.get("warning").is_none());
    assert_eq!(v["totalCount"], 3);
    assert_eq!(v["packingMethod"], "skyline");
    let label = v["strategy"].as_str().expect("label");
    assert!(label.ends_with(" / skyline"), "{}", label);
}

#[test]
fn rotated_items_keep_original_dimensions() {
    let (_, out) = sample();
    let v = to_json(&out);
    let items = v["placedItems"].as_array().expect("array");
    let strip = items
        .iter()
        .find(|i| i["id"] == "strip")
        .expect("strip placed");
    assert_eq!(strip["rotated"], true);
    assert_eq!(strip["width"], 12.7);
    assert_eq!(strip["height"], 2.0);
    assert_eq!(strip["originalWidth"], 12.7);
    assert_eq!(strip["originalHeight"], 2.0);
    assert_eq!(strip["url"], "https://cdn.example/strip.png");
}

#[test]
fn warning_is_exported_when_present() {
    let images = vec![
        ManagedImage::new("ok", 3.0, 3.0, 1),
        ManagedImage::new("huge", 30.0, 30.0, 1),
    ];
    let cfg = NestConfig {
        oversize: OversizePolicy::Exclude,
        ..Default::default()
    };
    let out = nest(&images, &cfg).expect("nest");
    let v = to_json(&out);
    assert_eq!(v["failedCount"], 1);
    assert!(v["warning"].as_str().expect("warning").contains("huge (30x30)"));
}

#[test]
fn run_record_is_a_single_json_line() {
    let (images, out) = sample();
    let rec = RunRecord::new("2026-01-01T00:00:00Z", "tester", &images, &out);
    let line = rec.to_jsonl_line().expect("serialize");
    assert!(line.ends_with('\n'));
    assert_eq!(line.trim_end().lines().count(), 1);

    let v: serde_json::Value = serde_json::from_str(line.trim_end()).expect("parse");
    assert_eq!(v["context"], "tester");
    assert_eq!(v["sheetWidth"], 13.0);
    assert_eq!(v["images"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(v["metrics"]["total"], 3);
    assert_eq!(v["metrics"]["failed"], 0);
    assert_eq!(v["metrics"]["packingMethod"], "skyline");
}

#[test]
fn job_file_defaults_optional_fields() {
    let job = NestJob::from_json_str(
        r#"{ "sheetWidth": 17, "images": [ { "id": "a", "width": 4, "height": 2.5 } ] }"#,
    )
    .expect("parse job");
    assert_eq!(job.sheet_width, 17.0);
    assert_eq!(job.images.len(), 1);
    assert_eq!(job.images[0].copies, 1);
    assert_eq!(job.images[0].url, "");
    assert!(job.name.is_none());

    assert!(NestJob::from_json_str(r#"{ "images": [] }"#).is_err());
}

#[test]
fn job_file_round_trips_through_pretty_json() {
    let job = NestJob {
        name: Some("order-42".into()),
        sheet_width: 22.0,
        images: vec![
            ManagedImage::new("logo", 3.5, 2.0, 4).with_url("https://cdn.example/logo.png"),
            ManagedImage::new("badge", 2.0, 2.0, 1),
        ],
    };
    let text = job.to_json_pretty().expect("serialize");
    assert!(text.contains("\"sheetWidth\": 22.0"), "{}", text);
    let back = NestJob::from_json_str(&text).expect("parse");
    assert_eq!(back.name.as_deref(), Some("order-42"));
    assert_eq!(back.sheet_width, 22.0);
    assert_eq!(back.images, job.images);

    // an unnamed job omits the field entirely
    let unnamed = NestJob { name: None, ..job };
    let text = unnamed.to_json_pretty().expect("serialize");
    assert!(!text.contains("\"name\""), "{}", text);
}

#[test]
fn packing_method_tags_parse_in_every_spelling() {
    assert_eq!("skyline".parse::<PackingMethod>(), Ok(PackingMethod::Skyline));
    assert_eq!("COLUMN".parse::<PackingMethod>(), Ok(PackingMethod::Column));
    assert_eq!(
        "maxrects".parse::<PackingMethod>(),
        Ok(PackingMethod::MaxRects(MaxRectsHeuristic::BestShortSideFit))
    );
    assert_eq!(
        "maxrects:cp".parse::<PackingMethod>(),
        Ok(PackingMethod::MaxRects(MaxRectsHeuristic::ContactPoint))
    );
    assert!("guillotine".parse::<PackingMethod>().is_err());
    assert_eq!("AREA_DESC".parse::<SortStrategy>(), Ok(SortStrategy::AreaDesc));

    let m = PackingMethod::MaxRects(MaxRectsHeuristic::BottomLeft);
    let s = serde_json::to_string(&m).expect("serialize");
    assert_eq!(s, "\"maxrects-bl\"");
    let back: PackingMethod = serde_json::from_str(&s).expect("parse");
    assert_eq!(back, m);
}
