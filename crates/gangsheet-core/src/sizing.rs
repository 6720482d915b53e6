//! Batch validation, copy expansion and final sheet accounting.
//!
//! The pipeline is `ManagedImage[] -> PlacementUnit[]` (pure expansion) into a
//! packer, then [`finalize`] turns the packer's [`Layout`] into a
//! [`NestingResult`] with utilization and failure counts recomputed from the
//! placements themselves.

use tracing::warn;

use crate::config::{OversizePolicy, PackingMethod, SortStrategy};
use crate::error::{NestError, OversizedItem, Result, join_oversized};
use crate::model::{Layout, ManagedImage, NestingResult, PlacementUnit};

/// Units ready for packing plus the bookkeeping needed to account for the ones
/// that never reach a packer.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub units: Vec<PlacementUnit>,
    /// Designs excluded because they exceed the sheet in both orientations.
    pub oversized: Vec<OversizedItem>,
    /// Every requested copy, including excluded ones.
    pub total_count: usize,
}

/// Checks the batch and returns the designs that cannot fit the sheet in
/// either orientation.
pub fn validate_images(images: &[ManagedImage], sheet_width: f64) -> Result<Vec<OversizedItem>> {
    if images.is_empty() {
        return Err(NestError::Empty);
    }
    let mut oversized = Vec::new();
    for img in images {
        if img.id.is_empty() {
            return Err(NestError::InvalidInput(format!(
                "image with url '{}' has an empty id",
                img.url
            )));
        }
        let dims_ok = img.width.is_finite()
            && img.height.is_finite()
            && img.width > 0.0
            && img.height > 0.0;
        if !dims_ok {
            return Err(NestError::InvalidInput(format!(
                "image {} has invalid dimensions {}x{}",
                img.id, img.width, img.height
            )));
        }
        if img.copies == 0 {
            return Err(NestError::InvalidInput(format!(
                "image {} requests zero copies",
                img.id
            )));
        }
        if img.exceeds_sheet(sheet_width) {
            oversized.push(OversizedItem {
                id: img.id.clone(),
                width: img.width,
                height: img.height,
            });
        }
    }
    Ok(oversized)
}

/// Expands every image into `copies` independent units, in input order.
pub fn expand_units(images: &[ManagedImage]) -> Vec<PlacementUnit> {
    let total: usize = images.iter().map(|i| i.copies as usize).sum();
    let mut units = Vec::with_capacity(total);
    for img in images {
        for copy_index in 0..img.copies {
            units.push(PlacementUnit {
                source_id: img.id.clone(),
                url: img.url.clone(),
                copy_index,
                width: img.width,
                height: img.height,
            });
        }
    }
    units
}

/// Validates, applies the oversize policy and expands the surviving images.
pub fn prepare(
    images: &[ManagedImage],
    sheet_width: f64,
    policy: OversizePolicy,
) -> Result<PreparedBatch> {
    let oversized = validate_images(images, sheet_width)?;
    if !oversized.is_empty() && policy == OversizePolicy::Reject {
        return Err(NestError::Oversized { items: oversized });
    }
    let total_count = images.iter().map(|i| i.copies as usize).sum();
    let surviving: Vec<ManagedImage> = images
        .iter()
        .filter(|img| !img.exceeds_sheet(sheet_width))
        .cloned()
        .collect();
    if !oversized.is_empty() {
        warn!(
            excluded = %join_oversized(&oversized),
            "excluding designs larger than the sheet in both orientations"
        );
    }
    Ok(PreparedBatch {
        units: expand_units(&surviving),
        oversized,
        total_count,
    })
}

/// Builds the final result for one packing run.
pub fn finalize(
    layout: Layout,
    batch: &PreparedBatch,
    sheet_width: f64,
    sort_strategy: SortStrategy,
    packing_method: PackingMethod,
) -> NestingResult {
    let area_utilization_pct = if layout.placed_items.is_empty() {
        0.0
    } else {
        layout.utilization(sheet_width)
    };
    let sheet_length = if layout.placed_items.is_empty() {
        0.0
    } else {
        layout.sheet_length
    };
    let failed_count = batch.total_count.saturating_sub(layout.placed_items.len());
    let warning = failure_warning(failed_count, batch.total_count, &batch.oversized);
    NestingResult {
        placed_items: layout.placed_items,
        sheet_width,
        sheet_length,
        area_utilization_pct,
        total_count: batch.total_count,
        failed_count,
        sort_strategy,
        packing_method,
        warning,
    }
}

fn failure_warning(failed: usize, total: usize, oversized: &[OversizedItem]) -> Option<String> {
    if failed == 0 {
        return None;
    }
    let mut msg = format!(
        "{} out of {} image(s) could not be placed. Try reducing sizes or quantities, or using a wider sheet.",
        failed, total
    );
    if !oversized.is_empty() {
        msg.push_str(" Too large for the sheet: ");
        msg.push_str(&join_oversized(oversized));
        msg.push('.');
    }
    Some(msg)
}
