use tracing::warn;

use crate::config::PackingMethod;
use crate::model::{Layout, NestedImage, PlacementUnit};

pub mod column;
pub mod maxrects;
pub mod skyline;

/// A packer places units onto a fixed-width sheet that grows downward.
///
/// Implementations must never overlap placements, must keep every footprint at
/// least `padding` away from the sheet edges and from each other, and must
/// return `None` rather than violate the width bound.
pub trait Packer {
    /// Places one unit, trying the 90-degree orientation only when
    /// `allow_rotation` is set.
    fn pack(&mut self, unit: &PlacementUnit, allow_rotation: bool) -> Option<NestedImage>;
    /// Lowest occupied edge including its trailing spacing.
    fn max_y(&self) -> f64;
    fn padding(&self) -> f64;
}

/// Runs `method` over `units` in the given order.
///
/// `can_rotate` is required: rotation eligibility is always the caller's call.
pub fn pack_units(
    method: PackingMethod,
    units: &[PlacementUnit],
    sheet_width: f64,
    padding: f64,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> Layout {
    match method {
        PackingMethod::Skyline => skyline::pack_tiered(units, sheet_width, padding, can_rotate),
        PackingMethod::Column => column::pack_columns(units, sheet_width, padding, can_rotate),
        PackingMethod::MaxRects(h) => {
            maxrects::pack_maxrects(units, sheet_width, padding, h, can_rotate)
        }
    }
}

/// Feeds units to `packer` one by one; unplaced units are logged and skipped.
pub(crate) fn feed<'a, P: Packer>(
    packer: &mut P,
    units: impl IntoIterator<Item = &'a PlacementUnit>,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
    placed: &mut Vec<NestedImage>,
) {
    for unit in units {
        match packer.pack(unit, can_rotate(unit)) {
            Some(item) => placed.push(item),
            None => warn!(
                id = %unit.source_id,
                copy = unit.copy_index,
                width = unit.width,
                height = unit.height,
                "failed to place unit"
            ),
        }
    }
}

/// Sheet length is the lowest occupied edge plus the bottom margin; an empty
/// sheet has length 0.
pub(crate) fn finish<P: Packer>(packer: &P, placed_items: Vec<NestedImage>) -> Layout {
    let sheet_length = if placed_items.is_empty() {
        0.0
    } else {
        packer.max_y() + packer.padding()
    };
    Layout {
        placed_items,
        sheet_length,
    }
}
