use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{NestError, Result};
use crate::model::PlacementUnit;

/// Sort orders the orchestrator competes over. Each one feeds the packer a
/// differently ordered copy of the same units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortStrategy {
    AreaDesc,
    HeightDesc,
    WidthDesc,
    PerimeterDesc,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 4] = [
        SortStrategy::AreaDesc,
        SortStrategy::HeightDesc,
        SortStrategy::WidthDesc,
        SortStrategy::PerimeterDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::AreaDesc => "AREA_DESC",
            SortStrategy::HeightDesc => "HEIGHT_DESC",
            SortStrategy::WidthDesc => "WIDTH_DESC",
            SortStrategy::PerimeterDesc => "PERIMETER_DESC",
        }
    }

    fn key(&self, u: &PlacementUnit) -> f64 {
        match self {
            SortStrategy::AreaDesc => u.area(),
            SortStrategy::HeightDesc => u.height,
            SortStrategy::WidthDesc => u.width,
            SortStrategy::PerimeterDesc => u.perimeter(),
        }
    }

    /// Compares two units for this order (descending key, then id and copy index).
    pub fn compare(&self, a: &PlacementUnit, b: &PlacementUnit) -> Ordering {
        self.key(b)
            .total_cmp(&self.key(a))
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.copy_index.cmp(&b.copy_index))
    }

    /// Stable, deterministic sort of `units` in place.
    pub fn sort(&self, units: &mut [PlacementUnit]) {
        units.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" | "area" => Ok(Self::AreaDesc),
            "height_desc" | "height" => Ok(Self::HeightDesc),
            "width_desc" | "width" => Ok(Self::WidthDesc),
            "perimeter_desc" | "perimeter" => Ok(Self::PerimeterDesc),
            _ => Err(()),
        }
    }
}

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
    ContactPoint,
}

impl MaxRectsHeuristic {
    pub fn short_name(&self) -> &'static str {
        match self {
            MaxRectsHeuristic::BestShortSideFit => "bssf",
            MaxRectsHeuristic::BestLongSideFit => "blsf",
            MaxRectsHeuristic::BestAreaFit => "baf",
            MaxRectsHeuristic::BottomLeft => "bl",
            MaxRectsHeuristic::ContactPoint => "cp",
        }
    }
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Placement algorithm used for one candidate run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum PackingMethod {
    /// Tiered min-waste skyline (the primary method).
    Skyline,
    /// Lazily opened vertical columns; imposes its own height-descending order.
    Column,
    /// Free-rectangle MaxRects on a virtual tall bin.
    MaxRects(MaxRectsHeuristic),
}

impl fmt::Display for PackingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackingMethod::Skyline => f.write_str("skyline"),
            PackingMethod::Column => f.write_str("column"),
            PackingMethod::MaxRects(h) => write!(f, "maxrects-{}", h.short_name()),
        }
    }
}

impl FromStr for PackingMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "skyline" => Ok(Self::Skyline),
            "column" | "columns" => Ok(Self::Column),
            "maxrects" => Ok(Self::MaxRects(MaxRectsHeuristic::BestShortSideFit)),
            other => match other.strip_prefix("maxrects-").or_else(|| other.strip_prefix("maxrects:")) {
                Some(h) => h.parse().map(Self::MaxRects),
                None => Err(()),
            },
        }
    }
}

impl From<PackingMethod> for String {
    fn from(m: PackingMethod) -> Self {
        m.to_string()
    }
}

impl TryFrom<String> for PackingMethod {
    type Error = String;
    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
            .map_err(|_| format!("unknown packing method: {}", s))
    }
}

/// When a copy may be placed turned by 90 degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    Never,
    /// Rotate anything that is not an exact square.
    NonSquare,
    /// Rotate only when `|w/h - 1| > tolerance` (near-squares stay upright).
    AspectOutside { tolerance: f64 },
    Always,
}

impl RotationPolicy {
    pub fn allows(&self, unit: &PlacementUnit) -> bool {
        match self {
            RotationPolicy::Never => false,
            RotationPolicy::NonSquare => !unit.is_square(),
            RotationPolicy::AspectOutside { tolerance } => {
                (unit.aspect_ratio() - 1.0).abs() > *tolerance
            }
            RotationPolicy::Always => true,
        }
    }
}

impl FromStr for RotationPolicy {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "never" | "none" => Ok(Self::Never),
            "non_square" | "nonsquare" => Ok(Self::NonSquare),
            "always" => Ok(Self::Always),
            "aspect" | "aspect_outside" => Ok(Self::AspectOutside { tolerance: 0.05 }),
            other => match other.split_once(':') {
                Some(("aspect", tol)) => tol
                    .parse::<f64>()
                    .map(|tolerance| Self::AspectOutside { tolerance })
                    .map_err(|_| ()),
                _ => Err(()),
            },
        }
    }
}

/// What to do with designs that fit the sheet in neither orientation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Fail the whole batch, naming every offending design.
    Reject,
    /// Leave their copies out of the layout and count them as failed.
    Exclude,
}

impl FromStr for OversizePolicy {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "exclude" | "skip" => Ok(Self::Exclude),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestConfig {
    /// Sheet width in inches.
    pub sheet_width: f64,
    /// Margin from every sheet edge and minimum spacing between designs (inches).
    pub padding: f64,
    #[serde(default = "default_rotation")]
    pub rotation: RotationPolicy,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<SortStrategy>,
    #[serde(default = "default_methods")]
    pub methods: Vec<PackingMethod>,
    #[serde(default = "default_oversize")]
    pub oversize: OversizePolicy,

    /// Optional time budget for the candidate search (milliseconds). None or 0 disables.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    /// Evaluate candidates in parallel when feature "parallel" is on.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            sheet_width: 13.0,
            padding: 0.125,
            rotation: default_rotation(),
            strategies: default_strategies(),
            methods: default_methods(),
            oversize: default_oversize(),
            time_budget_ms: None,
            parallel: false,
        }
    }
}

impl NestConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the sheet width is not a positive finite number, the
    /// padding is negative or leaves no usable width, or no candidates remain.
    pub fn validate(&self) -> Result<()> {
        if !self.sheet_width.is_finite() || self.sheet_width <= 0.0 {
            return Err(NestError::InvalidConfig(format!(
                "sheet_width must be a positive number, got {}",
                self.sheet_width
            )));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(NestError::InvalidConfig(format!(
                "padding must be a non-negative number, got {}",
                self.padding
            )));
        }
        if self.padding * 2.0 >= self.sheet_width {
            return Err(NestError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no usable width on a {}\" sheet",
                self.padding, self.sheet_width
            )));
        }
        if let RotationPolicy::AspectOutside { tolerance } = self.rotation {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(NestError::InvalidConfig(format!(
                    "rotation tolerance must be non-negative, got {}",
                    tolerance
                )));
            }
        }
        if self.strategies.is_empty() {
            return Err(NestError::InvalidConfig("no sort strategies configured".into()));
        }
        if self.methods.is_empty() {
            return Err(NestError::InvalidConfig("no packing methods configured".into()));
        }
        Ok(())
    }
}

fn default_rotation() -> RotationPolicy {
    RotationPolicy::NonSquare
}
fn default_strategies() -> Vec<SortStrategy> {
    SortStrategy::ALL.to_vec()
}
fn default_methods() -> Vec<PackingMethod> {
    vec![PackingMethod::Skyline, PackingMethod::Column]
}
fn default_oversize() -> OversizePolicy {
    OversizePolicy::Reject
}

/// Builder for `NestConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct NestConfigBuilder {
    cfg: NestConfig,
}

impl NestConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: NestConfig::default(),
        }
    }
    pub fn sheet_width(mut self, v: f64) -> Self {
        self.cfg.sheet_width = v;
        self
    }
    pub fn padding(mut self, v: f64) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn rotation(mut self, v: RotationPolicy) -> Self {
        self.cfg.rotation = v;
        self
    }
    pub fn strategies(mut self, v: Vec<SortStrategy>) -> Self {
        self.cfg.strategies = v;
        self
    }
    pub fn methods(mut self, v: Vec<PackingMethod>) -> Self {
        self.cfg.methods = v;
        self
    }
    pub fn oversize(mut self, v: OversizePolicy) -> Self {
        self.cfg.oversize = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.cfg.time_budget_ms = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> NestConfig {
        self.cfg
    }
}

impl NestConfig {
    /// Create a fluent builder for `NestConfig`.
    pub fn builder() -> NestConfigBuilder {
        NestConfigBuilder::new()
    }
}
