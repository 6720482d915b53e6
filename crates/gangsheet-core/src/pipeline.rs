use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::config::{NestConfig, PackingMethod, SortStrategy};
use crate::error::{NestError, Result};
use crate::model::{ManagedImage, NestingResult, PlacementUnit};
use crate::packer::pack_units;
use crate::sizing::{PreparedBatch, finalize, prepare};

/// Deadline and cancellation hook for a nesting call.
///
/// Both are checked before each candidate run; a run already in progress is
/// never interrupted.
#[derive(Debug, Clone, Default)]
pub struct NestControl {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl NestControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn or_budget(&self, budget_ms: Option<u64>) -> NestControl {
        let mut ctl = self.clone();
        if ctl.deadline.is_none() {
            if let Some(ms) = budget_ms.filter(|ms| *ms > 0) {
                ctl.deadline = Some(Instant::now() + Duration::from_millis(ms));
            }
        }
        ctl
    }
}

/// One (sort order, packing method) pair the orchestrator evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub strategy: SortStrategy,
    pub method: PackingMethod,
}

/// Expands `strategies x methods`. The column method sorts by height on its
/// own, so it runs once and is labelled `HEIGHT_DESC`.
pub fn candidates(cfg: &NestConfig) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(cfg.strategies.len() * cfg.methods.len());
    for &method in &cfg.methods {
        if method == PackingMethod::Column {
            let c = Candidate {
                strategy: SortStrategy::HeightDesc,
                method,
            };
            if !out.contains(&c) {
                out.push(c);
            }
            continue;
        }
        for &strategy in &cfg.strategies {
            let c = Candidate { strategy, method };
            if !out.contains(&c) {
                out.push(c);
            }
        }
    }
    out
}

/// Higher utilization wins; an exact tie goes to the shorter sheet.
fn is_better(a: &NestingResult, b: &NestingResult) -> bool {
    a.area_utilization_pct > b.area_utilization_pct
        || (a.area_utilization_pct == b.area_utilization_pct && a.sheet_length < b.sheet_length)
}

fn run_candidate(
    batch: &PreparedBatch,
    cfg: &NestConfig,
    cand: Candidate,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> NestingResult {
    let mut units = batch.units.clone();
    if cand.method != PackingMethod::Column {
        cand.strategy.sort(&mut units);
    }
    let layout = pack_units(cand.method, &units, cfg.sheet_width, cfg.padding, can_rotate);
    let result = finalize(layout, batch, cfg.sheet_width, cand.strategy, cand.method);
    debug!(
        strategy = %result.strategy_label(),
        placed = result.placed_items.len(),
        failed = result.failed_count,
        sheet_length = result.sheet_length,
        utilization = result.area_utilization_pct,
        "candidate done"
    );
    result
}

/// Nests `images` using the rotation policy from `cfg`.
///
/// Runs every candidate, keeps the one with the highest area utilization
/// (shorter sheet on ties), and fails with [`NestError::NoLayout`] when no
/// candidate places anything.
pub fn nest(images: &[ManagedImage], cfg: &NestConfig) -> Result<NestingResult> {
    let policy = cfg.rotation;
    nest_with(images, cfg, move |u: &PlacementUnit| policy.allows(u))
}

/// Like [`nest`] with a caller-supplied rotation predicate.
pub fn nest_with<F>(images: &[ManagedImage], cfg: &NestConfig, can_rotate: F) -> Result<NestingResult>
where
    F: Fn(&PlacementUnit) -> bool + Sync,
{
    nest_with_control(images, cfg, &NestControl::default(), can_rotate)
}

#[instrument(skip_all)]
pub fn nest_with_control<F>(
    images: &[ManagedImage],
    cfg: &NestConfig,
    control: &NestControl,
    can_rotate: F,
) -> Result<NestingResult>
where
    F: Fn(&PlacementUnit) -> bool + Sync,
{
    cfg.validate()?;
    let batch = prepare(images, cfg.sheet_width, cfg.oversize)?;
    let control = control.or_budget(cfg.time_budget_ms);
    let cands = candidates(cfg);
    debug!(
        units = batch.units.len(),
        total = batch.total_count,
        candidates = cands.len(),
        "nesting start"
    );

    let best = search(&batch, cfg, &cands, &control, &can_rotate)?;
    let Some(best) = best else {
        return Err(NestError::DeadlineExceeded);
    };
    if best.placed_items.is_empty() {
        return Err(NestError::NoLayout {
            total: batch.total_count,
        });
    }
    if best.failed_count > 0 {
        warn!(
            failed = best.failed_count,
            total = best.total_count,
            "best layout leaves units unplaced"
        );
    }
    info!(
        strategy = %best.strategy_label(),
        placed = best.placed_items.len(),
        sheet_length = best.sheet_length,
        utilization = best.area_utilization_pct,
        "selected layout"
    );
    Ok(best)
}

fn search(
    batch: &PreparedBatch,
    cfg: &NestConfig,
    cands: &[Candidate],
    control: &NestControl,
    can_rotate: &(dyn Fn(&PlacementUnit) -> bool + Sync),
) -> Result<Option<NestingResult>> {
    // Parallel path (optional)
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            let results: Vec<Option<NestingResult>> = cands
                .par_iter()
                .map(|&cand| {
                    if control.is_cancelled() || control.is_expired() {
                        return None;
                    }
                    Some(run_candidate(batch, cfg, cand, can_rotate))
                })
                .collect();
            if control.is_cancelled() {
                return Err(NestError::Cancelled);
            }
            let skipped = results.iter().filter(|r| r.is_none()).count();
            if skipped > 0 {
                warn!(skipped, "deadline expired; keeping best of completed candidates");
            }
            // fold in candidate order so ties resolve the same as the sequential path
            let mut best: Option<NestingResult> = None;
            for r in results.into_iter().flatten() {
                if best.as_ref().is_none_or(|b| is_better(&r, b)) {
                    best = Some(r);
                }
            }
            return Ok(best);
        }
    }

    let mut best: Option<NestingResult> = None;
    for (i, &cand) in cands.iter().enumerate() {
        if control.is_cancelled() {
            return Err(NestError::Cancelled);
        }
        if control.is_expired() {
            warn!(
                completed = i,
                remaining = cands.len() - i,
                "deadline expired; keeping best of completed candidates"
            );
            break;
        }
        let r = run_candidate(batch, cfg, cand, can_rotate);
        if best.as_ref().is_none_or(|b| is_better(&r, b)) {
            best = Some(r);
        }
    }
    Ok(best)
}

/// Runs a single candidate and returns its result as is, even when nothing
/// was placed.
pub fn pack_with<F>(
    images: &[ManagedImage],
    cfg: &NestConfig,
    strategy: SortStrategy,
    method: PackingMethod,
    can_rotate: F,
) -> Result<NestingResult>
where
    F: Fn(&PlacementUnit) -> bool + Sync,
{
    cfg.validate()?;
    let batch = prepare(images, cfg.sheet_width, cfg.oversize)?;
    let strategy = if method == PackingMethod::Column {
        SortStrategy::HeightDesc
    } else {
        strategy
    };
    Ok(run_candidate(
        &batch,
        cfg,
        Candidate { strategy, method },
        &can_rotate,
    ))
}
