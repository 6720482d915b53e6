use super::{Packer, feed, finish};
use crate::model::{EPS, Layout, NestedImage, PlacementUnit};

/// Adjacent segments closer than this in height (and in x) are merged.
const MERGE_EPS: f64 = 0.01;

/// One horizontal run of the skyline: everything below `y` on `[x, x + width)`
/// is occupied or spacing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkylineSegment {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl SkylineSegment {
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Upper boundary of placed content: contiguous segments sorted by `x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Skyline {
    segments: Vec<SkylineSegment>,
}

impl Skyline {
    /// A flat skyline spanning `[left, right)` at height `y`.
    pub fn new(left: f64, right: f64, y: f64) -> Self {
        Self {
            segments: vec![SkylineSegment {
                x: left,
                y,
                width: (right - left).max(0.0),
            }],
        }
    }

    pub fn segments(&self) -> &[SkylineSegment] {
        &self.segments
    }

    /// Height at which a span of `width` starting at segment `start` rests: the
    /// highest segment it covers. `None` when the skyline ends first.
    fn support(&self, start: usize, width: f64) -> Option<f64> {
        let mut covered = 0.0;
        let mut rest_y = self.segments[start].y;
        let mut j = start;
        while j < self.segments.len() && covered < width - EPS {
            covered += self.segments[j].width;
            rest_y = rest_y.max(self.segments[j].y);
            j += 1;
        }
        (covered >= width - EPS).then_some(rest_y)
    }

    /// Returns the skyline with `[left, right)` raised to `top`. Covered
    /// segments are dropped or trimmed and equal-height neighbours merged.
    pub fn raised(&self, left: f64, right: f64, top: f64) -> Skyline {
        let mut next: Vec<SkylineSegment> = Vec::with_capacity(self.segments.len() + 2);
        for seg in &self.segments {
            let seg_right = seg.right();
            if seg_right <= left + EPS || seg.x >= right - EPS {
                next.push(*seg);
                continue;
            }
            if seg.x < left - EPS {
                next.push(SkylineSegment {
                    x: seg.x,
                    y: seg.y,
                    width: left - seg.x,
                });
            }
            if seg_right > right + EPS {
                next.push(SkylineSegment {
                    x: right,
                    y: seg.y,
                    width: seg_right - right,
                });
            }
        }
        next.push(SkylineSegment {
            x: left,
            y: top,
            width: right - left,
        });
        next.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut merged: Vec<SkylineSegment> = Vec::with_capacity(next.len());
        for seg in next {
            if seg.width <= EPS {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if (last.y - seg.y).abs() < MERGE_EPS && (last.right() - seg.x).abs() < MERGE_EPS {
                    // Keep the higher of the two so nothing placed later can dip into either.
                    last.y = last.y.max(seg.y);
                    last.width = seg.right() - last.x;
                    continue;
                }
            }
            merged.push(seg);
        }
        Skyline { segments: merged }
    }
}

#[derive(Clone, Copy, Debug)]
struct Fit {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    rotated: bool,
    waste: f64,
}

impl Fit {
    fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Min-waste skyline packer for a fixed-width, unbounded-length sheet.
///
/// Each placement reserves `padding` to its right and below; the skyline
/// starts at `[padding, sheet_width - padding)` on `y = padding`.
pub struct SkylinePacker {
    sheet_width: f64,
    padding: f64,
    skyline: Skyline,
    max_y: f64,
}

impl SkylinePacker {
    pub fn new(sheet_width: f64, padding: f64) -> Self {
        Self {
            sheet_width,
            padding,
            skyline: Skyline::new(padding, sheet_width - padding, padding),
            max_y: padding,
        }
    }

    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }

    /// Scans every segment as a left edge, for each allowed orientation, and
    /// keeps the position with the least area wasted under the item. Equal
    /// waste prefers the lower bottom edge, then the first scanned.
    fn find_position(&self, w: f64, h: f64, allow_rotation: bool) -> Option<Fit> {
        let mut orientations = vec![(w, h, false)];
        if allow_rotation && w != h {
            orientations.push((h, w, true));
        }
        let mut best: Option<Fit> = None;
        for (i, seg) in self.skyline.segments().iter().enumerate() {
            for &(ow, oh, rotated) in &orientations {
                let need = ow + self.padding;
                if seg.x + need > self.sheet_width + EPS {
                    continue;
                }
                let Some(y) = self.skyline.support(i, need) else {
                    continue;
                };
                let cand = Fit {
                    x: seg.x,
                    y,
                    w: ow,
                    h: oh,
                    rotated,
                    waste: (y - seg.y) * ow,
                };
                let better = match &best {
                    None => true,
                    Some(b) => {
                        cand.waste < b.waste - EPS
                            || ((cand.waste - b.waste).abs() <= EPS
                                && cand.bottom() < b.bottom() - EPS)
                    }
                };
                if better {
                    best = Some(cand);
                }
            }
        }
        best
    }
}

impl Packer for SkylinePacker {
    fn pack(&mut self, unit: &PlacementUnit, allow_rotation: bool) -> Option<NestedImage> {
        let fit = self.find_position(unit.width, unit.height, allow_rotation)?;
        let top = fit.y + fit.h + self.padding;
        self.skyline = self
            .skyline
            .raised(fit.x, fit.x + fit.w + self.padding, top);
        self.max_y = self.max_y.max(top);
        Some(NestedImage::from_unit(unit, fit.x, fit.y, fit.rotated))
    }

    fn max_y(&self) -> f64 {
        self.max_y
    }

    fn padding(&self) -> f64 {
        self.padding
    }
}

/// Size bucket relative to the batch's mean unit area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeTier {
    /// Area at least 1.5x the mean.
    Large,
    Medium,
    /// Area below half the mean.
    Small,
}

impl SizeTier {
    pub fn of(area: f64, mean_area: f64) -> Self {
        if area >= mean_area * 1.5 {
            SizeTier::Large
        } else if area < mean_area * 0.5 {
            SizeTier::Small
        } else {
            SizeTier::Medium
        }
    }
}

/// Splits `units` into large, medium and small tiers, keeping the incoming
/// order within each tier.
pub fn partition_tiers(units: &[PlacementUnit]) -> [Vec<&PlacementUnit>; 3] {
    let mut tiers: [Vec<&PlacementUnit>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    if units.is_empty() {
        return tiers;
    }
    let mean = units.iter().map(PlacementUnit::area).sum::<f64>() / units.len() as f64;
    for u in units {
        let slot = match SizeTier::of(u.area(), mean) {
            SizeTier::Large => 0,
            SizeTier::Medium => 1,
            SizeTier::Small => 2,
        };
        tiers[slot].push(u);
    }
    tiers
}

/// Places large units first, then medium, then small ones into the valleys left
/// behind.
pub fn pack_tiered(
    units: &[PlacementUnit],
    sheet_width: f64,
    padding: f64,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> Layout {
    let [large, medium, small] = partition_tiers(units);
    tracing::debug!(
        large = large.len(),
        medium = medium.len(),
        small = small.len(),
        "skyline tiers"
    );
    let mut packer = SkylinePacker::new(sheet_width, padding);
    let mut placed = Vec::with_capacity(units.len());
    for tier in [large, medium, small] {
        feed(&mut packer, tier, can_rotate, &mut placed);
    }
    finish(&packer, placed)
}
