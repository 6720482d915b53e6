//! Geometry checks and a 0..1 quality score for a finished layout.
//!
//! This is a diagnostic oracle: it never influences placement. Footprints are
//! taken after rotation, so a rotated item is checked as `height x width`.

use serde::{Deserialize, Serialize};

use crate::model::{NestedImage, NestingResult, Rect};

const CHECK_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityIssue {
    Overlap,
    OutOfBounds,
    UnderSpacing,
    FailedItems,
    LowUtilization,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOptions {
    /// Required clearance from every sheet edge (inches).
    pub margin: f64,
    /// Required gap between neighbouring footprints (inches).
    pub spacing: f64,
    /// Utilization below this flags `LOW_UTILIZATION`.
    pub util_warn: f64,
    #[serde(default)]
    pub failed_count: usize,
    /// Layout utilization; `None` scores as a full sheet.
    #[serde(default)]
    pub utilization: Option<f64>,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            margin: 0.125,
            spacing: 0.10,
            util_warn: 0.80,
            failed_count: 0,
            utilization: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub is_bad: bool,
    pub issues: Vec<QualityIssue>,
    pub overlap_pairs: usize,
    pub out_of_bounds: usize,
    pub under_spacing_pairs: usize,
    /// Smallest gap between footprints that share an axis; `spacing` when no
    /// pair does.
    pub min_gap: f64,
    pub score01: f64,
}

impl QualityReport {
    pub fn has(&self, issue: QualityIssue) -> bool {
        self.issues.contains(&issue)
    }
}

/// Horizontal gap when the two rectangles overlap vertically, else infinite.
fn gap_x(a: &Rect, b: &Rect) -> f64 {
    if a.bottom() <= b.y || b.bottom() <= a.y {
        return f64::INFINITY;
    }
    if a.x <= b.x { b.x - a.right() } else { a.x - b.right() }
}

/// Vertical gap when the two rectangles overlap horizontally, else infinite.
fn gap_y(a: &Rect, b: &Rect) -> f64 {
    if a.right() <= b.x || b.right() <= a.x {
        return f64::INFINITY;
    }
    if a.y <= b.y { b.y - a.bottom() } else { a.y - b.bottom() }
}

fn out_of_bounds(r: &Rect, sheet_width: f64, sheet_length: f64, margin: f64) -> bool {
    r.x < margin - CHECK_EPS
        || r.y < margin - CHECK_EPS
        || r.right() > sheet_width - margin + CHECK_EPS
        || r.bottom() > sheet_length - margin + CHECK_EPS
}

/// Checks placed footprints (post-rotation) against the sheet and each other.
pub fn evaluate_quality(
    placed: &[NestedImage],
    sheet_width: f64,
    sheet_length: f64,
    opts: &QualityOptions,
) -> QualityReport {
    let rects: Vec<Rect> = placed.iter().map(NestedImage::footprint).collect();
    evaluate_footprints(&rects, sheet_width, sheet_length, opts)
}

/// [`evaluate_quality`] over raw footprint rectangles.
pub fn evaluate_footprints(
    rects: &[Rect],
    sheet_width: f64,
    sheet_length: f64,
    opts: &QualityOptions,
) -> QualityReport {
    let spacing = opts.spacing;
    let out_of_bounds = rects
        .iter()
        .filter(|r| out_of_bounds(r, sheet_width, sheet_length, opts.margin))
        .count();

    let mut overlap_pairs = 0;
    let mut under_spacing_pairs = 0;
    let mut min_gap = f64::INFINITY;
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            if a.intersects(b) {
                overlap_pairs += 1;
            }
            let gx = gap_x(a, b);
            let gy = gap_y(a, b);
            let local = gx.min(gy);
            if local.is_finite() {
                min_gap = min_gap.min(local);
            }
            let tight = |g: f64| g.is_finite() && g < spacing - CHECK_EPS;
            if tight(gx) || tight(gy) {
                under_spacing_pairs += 1;
            }
        }
    }
    if !min_gap.is_finite() {
        min_gap = spacing;
    }

    let util = opts.utilization.unwrap_or(1.0);
    let mut issues = Vec::new();
    if overlap_pairs > 0 {
        issues.push(QualityIssue::Overlap);
    }
    if out_of_bounds > 0 {
        issues.push(QualityIssue::OutOfBounds);
    }
    if under_spacing_pairs > 0 {
        issues.push(QualityIssue::UnderSpacing);
    }
    if opts.failed_count > 0 {
        issues.push(QualityIssue::FailedItems);
    }
    if util < opts.util_warn {
        issues.push(QualityIssue::LowUtilization);
    }

    let flag = |hit: bool, weight: f64| if hit { weight } else { 0.0 };
    let penalty = flag(overlap_pairs > 0, 0.6)
        + flag(out_of_bounds > 0, 0.3)
        + flag(under_spacing_pairs > 0, 0.1)
        + (opts.util_warn - util).max(0.0) * 0.5;
    let score01 = (util - penalty).clamp(0.0, 1.0);

    QualityReport {
        is_bad: !issues.is_empty(),
        issues,
        overlap_pairs,
        out_of_bounds,
        under_spacing_pairs,
        min_gap,
        score01,
    }
}

impl NestingResult {
    /// Runs the checker with this result's own failure count and utilization.
    /// `opts.failed_count` and `opts.utilization` are overridden.
    pub fn quality(&self, opts: &QualityOptions) -> QualityReport {
        let opts = QualityOptions {
            failed_count: self.failed_count,
            utilization: Some(self.area_utilization_pct),
            ..*opts
        };
        evaluate_quality(&self.placed_items, self.sheet_width, self.sheet_length, &opts)
    }
}
