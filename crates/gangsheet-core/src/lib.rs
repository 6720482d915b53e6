//! Core library for nesting print designs onto a gang sheet.
//!
//! - Algorithms: tiered min-waste Skyline, lazily opened Columns, MaxRects (BSSF/BLSF/BAF/BL/CP)
//! - Orchestrator: `nest` runs every sort strategy x packing method and keeps the layout
//!   with the highest area utilization (shorter sheet on ties)
//! - Quality checker, JSON export, run records and an optional raster preview (feature `image`)
//!
//! Quick example:
//! ```
//! use gangsheet_core::{ManagedImage, NestConfig, nest};
//! # fn main() -> gangsheet_core::Result<()> {
//! let images = vec![
//!     ManagedImage::new("logo", 4.0, 4.0, 3),
//!     ManagedImage::new("banner", 6.0, 2.0, 2),
//! ];
//! let cfg = NestConfig { sheet_width: 17.0, ..Default::default() };
//! let out = nest(&images, &cfg)?;
//! assert_eq!(out.placed_items.len(), 5);
//! println!("{} in long, {:.1}% used", out.sheet_length, out.area_utilization_pct * 100.0);
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod quality;
#[cfg(feature = "image")]
pub mod render;
pub mod sizing;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use quality::*;
#[cfg(feature = "image")]
pub use render::*;
pub use sizing::*;

/// Convenience prelude for common types and functions.
/// Importing `gangsheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        MaxRectsHeuristic, NestConfig, NestConfigBuilder, OversizePolicy, PackingMethod,
        RotationPolicy, SortStrategy,
    };
    pub use crate::model::{ManagedImage, NestedImage, NestingResult, PlacementUnit, SheetStats};
    pub use crate::quality::{QualityIssue, QualityOptions, QualityReport};
    pub use crate::{NestControl, NestError, nest, nest_with, nest_with_control, pack_with, to_json};
}
