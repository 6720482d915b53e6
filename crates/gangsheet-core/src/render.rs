//! Low-resolution raster preview of a layout.
//!
//! Each placement is drawn as a filled box with a 1px outline, its footprint
//! swapped at draw time when `rotated`. Not a print compositor.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{NestError, Result};
use crate::model::NestingResult;

const SHEET: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Largest canvas a preview may allocate (64 Mpx, 256 MiB of RGBA).
pub const MAX_PREVIEW_PIXELS: u64 = 64 * 1024 * 1024;

/// Stable pastel fill per design id so copies of one design share a color.
fn fill_for(id: &str) -> Rgba<u8> {
    // FNV-1a
    let mut h: u32 = 0x811c_9dc5;
    for b in id.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    let c = |shift: u32| 150 + ((h >> shift) & 0x5f) as u8;
    Rgba([c(0), c(8), c(16), 255])
}

fn to_px(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).round().max(0.0) as u32
}

/// Renders `result` at `dpi` pixels per inch onto a white sheet.
///
/// The canvas is `sheet_width x sheet_length` inches (at least 1x1 px). Fails
/// with [`NestError::InvalidInput`] when it would exceed [`MAX_PREVIEW_PIXELS`].
pub fn render_preview(result: &NestingResult, sheet_width: f64, dpi: u32) -> Result<RgbaImage> {
    let dpi = dpi.max(1);
    let cw = to_px(sheet_width, dpi).max(1);
    let ch = to_px(result.sheet_length, dpi).max(1);
    if cw as u64 * ch as u64 > MAX_PREVIEW_PIXELS {
        return Err(NestError::InvalidInput(format!(
            "preview of {}x{} px at {} dpi exceeds the {} px limit; lower the dpi",
            cw, ch, dpi, MAX_PREVIEW_PIXELS
        )));
    }
    let mut canvas = RgbaImage::from_pixel(cw, ch, SHEET);

    for item in &result.placed_items {
        let (fw, fh) = item.footprint_size();
        let x0 = to_px(item.x, dpi).min(cw);
        let y0 = to_px(item.y, dpi).min(ch);
        let x1 = to_px(item.x + fw, dpi).min(cw);
        let y1 = to_px(item.y + fh, dpi).min(ch);
        if x1 <= x0 || y1 <= y0 {
            continue;
        }
        let fill = fill_for(&item.id);
        for yy in y0..y1 {
            for xx in x0..x1 {
                let edge = xx == x0 || xx == x1 - 1 || yy == y0 || yy == y1 - 1;
                canvas.put_pixel(xx, yy, if edge { OUTLINE } else { fill });
            }
        }
    }
    Ok(canvas)
}

/// Renders and writes a PNG preview.
pub fn save_preview(result: &NestingResult, path: impl AsRef<Path>, dpi: u32) -> Result<()> {
    let img = render_preview(result, result.sheet_width, dpi)?;
    img.save(path.as_ref())?;
    Ok(())
}
