use serde::{Deserialize, Serialize};

use crate::config::{PackingMethod, SortStrategy};

/// Tolerance for float comparisons on sheet coordinates (inches).
pub(crate) const EPS: f64 = 1e-9;

/// Axis-aligned rectangle in sheet inches. `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> f64 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
    pub fn area(&self) -> f64 {
        self.w * self.h
    }
    /// Open-interval intersection: rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }
    /// Returns true if `r` lies inside `self`, tolerating `eps` on every edge.
    pub fn contains_eps(&self, r: &Rect, eps: f64) -> bool {
        r.x >= self.x - eps
            && r.y >= self.y - eps
            && r.right() <= self.right() + eps
            && r.bottom() <= self.bottom() + eps
    }
}

/// A logical design supplied by the caller. `width`/`height` are the unrotated
/// physical dimensions in inches and never change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedImage {
    pub id: String,
    /// Opaque reference carried through to the placements.
    #[serde(default)]
    pub url: String,
    pub width: f64,
    pub height: f64,
    /// `width / height`; informational only.
    #[serde(default)]
    pub aspect_ratio: f64,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

impl ManagedImage {
    pub fn new(id: impl Into<String>, width: f64, height: f64, copies: u32) -> Self {
        Self {
            id: id.into(),
            url: String::new(),
            width,
            height,
            aspect_ratio: if height > 0.0 { width / height } else { 0.0 },
            copies,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// True when the design fits the sheet in neither orientation.
    pub fn exceeds_sheet(&self, sheet_width: f64) -> bool {
        self.width > sheet_width && self.height > sheet_width
    }
}

/// One physical copy of a [`ManagedImage`], placed independently of its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementUnit {
    pub source_id: String,
    pub url: String,
    pub copy_index: u32,
    pub width: f64,
    pub height: f64,
}

impl PlacementUnit {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }
}

/// A placed copy on the sheet.
///
/// `width`/`height` always hold the source's unrotated dimensions; the occupied
/// footprint is `height x width` when `rotated`. Renderers swap at draw time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NestedImage {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub copy_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotated: bool,
}

impl NestedImage {
    pub(crate) fn from_unit(unit: &PlacementUnit, x: f64, y: f64, rotated: bool) -> Self {
        Self {
            id: unit.source_id.clone(),
            url: unit.url.clone(),
            copy_index: unit.copy_index,
            x,
            y,
            width: unit.width,
            height: unit.height,
            rotated,
        }
    }

    /// Occupied size on the sheet (post-rotation).
    pub fn footprint_size(&self) -> (f64, f64) {
        if self.rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    pub fn footprint(&self) -> Rect {
        let (w, h) = self.footprint_size();
        Rect::new(self.x, self.y, w, h)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Raw output of a single packing pass, before sizing finalizes it.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub placed_items: Vec<NestedImage>,
    /// Lowest occupied edge plus the bottom margin; 0 when nothing was placed.
    pub sheet_length: f64,
}

impl Layout {
    pub fn used_area(&self) -> f64 {
        self.placed_items.iter().map(NestedImage::area).sum()
    }

    /// `used_area / (sheet_width * sheet_length)`, 0 for a degenerate sheet.
    pub fn utilization(&self, sheet_width: f64) -> f64 {
        utilization(self.used_area(), sheet_width, self.sheet_length)
    }
}

pub(crate) fn utilization(used_area: f64, sheet_width: f64, sheet_length: f64) -> f64 {
    let sheet_area = sheet_width * sheet_length;
    if sheet_area > 0.0 && sheet_area.is_finite() {
        used_area / sheet_area
    } else {
        0.0
    }
}

/// Final nesting output for one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestingResult {
    pub placed_items: Vec<NestedImage>,
    pub sheet_width: f64,
    pub sheet_length: f64,
    /// Fraction in `0..=1`.
    pub area_utilization_pct: f64,
    pub total_count: usize,
    pub failed_count: usize,
    pub sort_strategy: SortStrategy,
    pub packing_method: PackingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Summary statistics for a nesting result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetStats {
    pub placed: usize,
    pub failed: usize,
    pub rotated: usize,
    /// Sum of placed design areas (sq in).
    pub used_area: f64,
    /// `sheet_width * sheet_length` (sq in).
    pub sheet_area: f64,
    pub utilization: f64,
}

impl NestingResult {
    /// `"AREA_DESC / skyline"`.
    pub fn strategy_label(&self) -> String {
        format!("{} / {}", self.sort_strategy, self.packing_method)
    }

    pub fn stats(&self) -> SheetStats {
        let used_area: f64 = self.placed_items.iter().map(NestedImage::area).sum();
        SheetStats {
            placed: self.placed_items.len(),
            failed: self.failed_count,
            rotated: self.placed_items.iter().filter(|p| p.rotated).count(),
            used_area,
            sheet_area: self.sheet_width * self.sheet_length,
            utilization: self.area_utilization_pct,
        }
    }
}

impl SheetStats {
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Failed: {}, Rotated: {}, Utilization: {:.2}%, Sheet Area: {:.2} sq in, Used Area: {:.2} sq in",
            self.placed,
            self.failed,
            self.rotated,
            self.utilization * 100.0,
            self.sheet_area,
            self.used_area,
        )
    }

    pub fn wasted_area(&self) -> f64 {
        (self.sheet_area - self.used_area).max(0.0)
    }

    /// Wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.sheet_area > 0.0 {
            self.wasted_area() / self.sheet_area * 100.0
        } else {
            0.0
        }
    }
}
