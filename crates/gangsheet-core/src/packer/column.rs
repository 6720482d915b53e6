//! Column packing for narrow sheets with many small designs.
//!
//! Columns open lazily left to right; each takes the width of the item that
//! opened it. Bookkeeping is per column, so the cost per unit is linear in the
//! number of open columns instead of the skyline's segment scan.

use super::{Packer, feed, finish};
use crate::model::{EPS, Layout, NestedImage, PlacementUnit};

#[derive(Clone, Debug)]
struct Column {
    x: f64,
    /// Opening item's width plus padding.
    width: f64,
    /// Next free y inside the column.
    next_y: f64,
}

pub struct ColumnPacker {
    sheet_width: f64,
    padding: f64,
    columns: Vec<Column>,
    max_y: f64,
}

impl ColumnPacker {
    pub fn new(sheet_width: f64, padding: f64) -> Self {
        Self {
            sheet_width,
            padding,
            columns: Vec::new(),
            max_y: padding,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn next_column_x(&self) -> f64 {
        match self.columns.last() {
            None => self.padding,
            Some(last) => last.x + last.width + self.padding,
        }
    }
}

impl Packer for ColumnPacker {
    fn pack(&mut self, unit: &PlacementUnit, allow_rotation: bool) -> Option<NestedImage> {
        let mut orientations = vec![(unit.width, unit.height, false)];
        if allow_rotation && unit.width != unit.height {
            orientations.push((unit.height, unit.width, true));
        }

        // existing columns, in creation order
        for col in self.columns.iter_mut() {
            for &(w, h, rotated) in &orientations {
                if w + self.padding <= col.width + EPS {
                    let item = NestedImage::from_unit(unit, col.x, col.next_y, rotated);
                    col.next_y += h + self.padding;
                    self.max_y = self.max_y.max(col.next_y);
                    return Some(item);
                }
            }
        }

        let x = self.next_column_x();
        for &(w, h, rotated) in &orientations {
            if x + w + self.padding <= self.sheet_width + EPS {
                let column = Column {
                    x,
                    width: w + self.padding,
                    next_y: self.padding + h + self.padding,
                };
                self.max_y = self.max_y.max(column.next_y);
                self.columns.push(column);
                return Some(NestedImage::from_unit(unit, x, self.padding, rotated));
            }
        }
        None
    }

    fn max_y(&self) -> f64 {
        self.max_y
    }

    fn padding(&self) -> f64 {
        self.padding
    }
}

/// Sorts by height (descending, stable) and fills columns.
pub fn pack_columns(
    units: &[PlacementUnit],
    sheet_width: f64,
    padding: f64,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> Layout {
    let mut ordered: Vec<&PlacementUnit> = units.iter().collect();
    ordered.sort_by(|a, b| b.height.total_cmp(&a.height));
    let mut packer = ColumnPacker::new(sheet_width, padding);
    let mut placed = Vec::with_capacity(units.len());
    feed(&mut packer, ordered, can_rotate, &mut placed);
    tracing::debug!(columns = packer.column_count(), "column packing done");
    finish(&packer, placed)
}
