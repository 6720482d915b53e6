use super::{Packer, feed, finish};
use crate::config::MaxRectsHeuristic;
use crate::model::{EPS, Layout, NestedImage, PlacementUnit, Rect};

/// Height of the virtual bin (inches); the sheet is cut to the used length afterwards.
pub const VIRTUAL_SHEET_HEIGHT: f64 = 10_000.0;

/// MaxRects free-list packer over a virtual tall bin.
///
/// Every unit reserves `(w + padding) x (h + padding)` so neighbouring slots
/// keep `padding` between them. The bin starts at `(padding, padding)` and
/// runs to the sheet edge, the reserved trailing spacing covering the right margin.
pub struct MaxRectsPacker {
    padding: f64,
    border: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
    max_y: f64,
}

impl MaxRectsPacker {
    pub fn new(sheet_width: f64, padding: f64, heuristic: MaxRectsHeuristic) -> Self {
        let w = (sheet_width - padding).max(0.0);
        let border = Rect::new(padding, padding, w, VIRTUAL_SHEET_HEIGHT);
        Self {
            padding,
            border,
            free: vec![border],
            used: Vec::new(),
            heuristic,
            max_y: padding,
        }
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    fn place_rect(&mut self, node: &Rect) {
        // split all free rectangles that intersect with node
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            let ix1 = fr.x.max(node.x);
            let iy1 = fr.y.max(node.y);
            let ix2 = fr.right().min(node.right());
            let iy2 = fr.bottom().min(node.bottom());

            // above
            if iy1 > fr.y + EPS {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, iy1 - fr.y));
            }
            // below
            if iy2 < fr.bottom() - EPS {
                new_free.push(Rect::new(fr.x, iy2, fr.w, fr.bottom() - iy2));
            }
            // left
            if ix1 > fr.x + EPS {
                new_free.push(Rect::new(fr.x, fr.y, ix1 - fr.x, fr.h));
            }
            // right
            if ix2 < fr.right() - EPS {
                new_free.push(Rect::new(ix2, fr.y, fr.right() - ix2, fr.h));
            }
        }

        self.free = new_free;
        self.prune_free_list();
        self.used.push(*node);
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains_eps(&a, EPS) {
                    remove_i = true;
                    break;
                }
                if a.contains_eps(&b, EPS) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: f64, h: f64) -> (f64, f64) {
        let leftover_h = (fr.w - w).abs();
        let leftover_v = (fr.h - h).abs();
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() - w * h;
        match self.heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y + h, fr.x),
            MaxRectsHeuristic::ContactPoint => {
                // maximize contact: negate for minimization
                let contact = self.contact_point_score(&Rect::new(fr.x, fr.y, w, h));
                (-contact, short_fit)
            }
        }
    }

    fn find_position(&self, w: f64, h: f64, allow_rotation: bool) -> Option<(Rect, bool)> {
        let mut best: Option<(Rect, bool)> = None;
        let mut best_score = (f64::INFINITY, f64::INFINITY);
        // tie-break: prefer smaller bottom side, then smaller x
        let mut best_bottom = f64::INFINITY;
        let mut best_left = f64::INFINITY;

        let mut consider = |fr: &Rect, cw: f64, ch: f64, rotated: bool| {
            if fr.w + EPS < cw || fr.h + EPS < ch {
                return;
            }
            let s = self.score(fr, cw, ch);
            let bottom = fr.y + ch;
            let better = s.0 < best_score.0 - EPS
                || ((s.0 - best_score.0).abs() <= EPS
                    && (s.1 < best_score.1 - EPS
                        || ((s.1 - best_score.1).abs() <= EPS
                            && (bottom < best_bottom - EPS
                                || ((bottom - best_bottom).abs() <= EPS && fr.x < best_left)))));
            if better {
                best_score = s;
                best_bottom = bottom;
                best_left = fr.x;
                best = Some((Rect::new(fr.x, fr.y, cw, ch), rotated));
            }
        };

        for fr in &self.free {
            consider(fr, w, h, false);
            if allow_rotation && w != h {
                consider(fr, h, w, true);
            }
        }
        best
    }

    fn contact_point_score(&self, node: &Rect) -> f64 {
        let mut score = 0.0;
        let near = |a: f64, b: f64| (a - b).abs() <= EPS;
        // contact with sheet edges
        if near(node.x, self.border.x) {
            score += node.h;
        }
        if near(node.y, self.border.y) {
            score += node.w;
        }
        if near(node.right(), self.border.right()) {
            score += node.h;
        }

        // contact with used slots
        for u in &self.used {
            if near(node.x, u.right()) || near(u.x, node.right()) {
                score += overlap_1d(node.y, node.bottom(), u.y, u.bottom());
            }
            if near(node.y, u.bottom()) || near(u.y, node.bottom()) {
                score += overlap_1d(node.x, node.right(), u.x, u.right());
            }
        }
        score
    }
}

fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

impl Packer for MaxRectsPacker {
    fn pack(&mut self, unit: &PlacementUnit, allow_rotation: bool) -> Option<NestedImage> {
        let w = unit.width + self.padding;
        let h = unit.height + self.padding;
        let (slot, rotated) = self.find_position(w, h, allow_rotation)?;
        self.place_rect(&slot);
        self.max_y = self.max_y.max(slot.bottom());
        Some(NestedImage::from_unit(unit, slot.x, slot.y, rotated))
    }

    fn max_y(&self) -> f64 {
        self.max_y
    }

    fn padding(&self) -> f64 {
        self.padding
    }
}

/// Packs units in the given order into a single MaxRects bin.
pub fn pack_maxrects(
    units: &[PlacementUnit],
    sheet_width: f64,
    padding: f64,
    heuristic: MaxRectsHeuristic,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> Layout {
    let mut packer = MaxRectsPacker::new(sheet_width, padding, heuristic);
    let mut placed = Vec::with_capacity(units.len());
    feed(&mut packer, units, can_rotate, &mut placed);
    finish(&packer, placed)
}
