use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::model::{ManagedImage, NestingResult};

/// Serialize a result in the wire shape consumed by renderers and pricing.
///
/// Keys are camelCase. Every placement carries `originalWidth/originalHeight`
/// (equal to `width/height`, which are never swapped for rotated items).
/// `warning` is omitted when absent.
pub fn to_json(result: &NestingResult) -> Value {
    let placed: Vec<Value> = result
        .placed_items
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "url": p.url,
                "copyIndex": p.copy_index,
                "x": p.x,
                "y": p.y,
                "width": p.width,
                "height": p.height,
                "rotated": p.rotated,
                "originalWidth": p.width,
                "originalHeight": p.height,
            })
        })
        .collect();
    let mut out = json!({
        "placedItems": placed,
        "sheetWidth": result.sheet_width,
        "sheetLength": result.sheet_length,
        "areaUtilizationPct": result.area_utilization_pct,
        "totalCount": result.total_count,
        "failedCount": result.failed_count,
        "sortStrategy": result.sort_strategy.as_str(),
        "packingMethod": result.packing_method.to_string(),
        "strategy": result.strategy_label(),
    });
    if let (Some(w), Some(obj)) = (&result.warning, out.as_object_mut()) {
        obj.insert("warning".into(), Value::String(w.clone()));
    }
    out
}

/// Metrics block of a [`RunRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub utilization: f64,
    pub sheet_length: f64,
    pub total: usize,
    pub failed: usize,
    pub sort_strategy: String,
    pub packing_method: String,
}

impl RunMetrics {
    pub fn from_result(result: &NestingResult) -> Self {
        Self {
            utilization: result.area_utilization_pct,
            sheet_length: result.sheet_length,
            total: result.total_count,
            failed: result.failed_count,
            sort_strategy: result.sort_strategy.as_str().to_string(),
            packing_method: result.packing_method.to_string(),
        }
    }
}

/// One nesting run, appended as a JSON line to a run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// RFC 3339 timestamp supplied by the caller.
    pub ts: String,
    /// Free-form origin tag such as `live` or `tester`.
    pub context: String,
    pub sheet_width: f64,
    #[serde(default)]
    pub images: Vec<ManagedImage>,
    pub metrics: RunMetrics,
}

impl RunRecord {
    pub fn new(
        ts: impl Into<String>,
        context: impl Into<String>,
        images: &[ManagedImage],
        result: &NestingResult,
    ) -> Self {
        Self {
            ts: ts.into(),
            context: context.into(),
            sheet_width: result.sheet_width,
            images: images.to_vec(),
            metrics: RunMetrics::from_result(result),
        }
    }

    /// Single-line JSON with a trailing newline.
    pub fn to_jsonl_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// A nesting job: the input file format `{ "sheetWidth": 13, "images": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sheet_width: f64,
    pub images: Vec<ManagedImage>,
}

impl NestJob {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
