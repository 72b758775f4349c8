//! Mode resolution
//!
//! Turns a resolution mode, its value and the eligible instance list into a
//! concrete [`ResolutionPlan`]. Resolution is synchronous and pure apart from
//! the random source, which is always supplied per call: pass an `Rng`
//! directly, or a seed through [`resolve_seeded`] for reproducible plans.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use shared::{HasMode, HasValue, InstanceId, PodMode};

use crate::error::{ControllerError, ControllerResult, Violation};

const VALUE_FIELD: &str = "spec.value";

/// Concrete subset of instances chosen for one experiment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
    pub mode: PodMode,
    /// Distinct instances, in the order they appeared in the eligible list
    pub instances: Vec<InstanceId>,
    /// Percentage drawn for `random-max-percent`
    pub drawn_percent: Option<u8>,
    /// Number of distinct eligible instances the plan was drawn from
    pub eligible_count: usize,
}

impl ResolutionPlan {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// A mode paired with the value it was given, already parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeValue {
    One,
    All,
    Fixed(usize),
    FixedPercent(u8),
    RandomMaxPercent(u8),
}

impl ModeValue {
    pub fn mode(&self) -> PodMode {
        match self {
            ModeValue::One => PodMode::One,
            ModeValue::All => PodMode::All,
            ModeValue::Fixed(_) => PodMode::Fixed,
            ModeValue::FixedPercent(_) => PodMode::FixedPercent,
            ModeValue::RandomMaxPercent(_) => PodMode::RandomMaxPercent,
        }
    }

    /// Normalized `value` text: the bare integer, or empty for `one`/`all`
    pub fn canonical_value(&self) -> String {
        match self {
            ModeValue::One | ModeValue::All => String::new(),
            ModeValue::Fixed(n) => n.to_string(),
            ModeValue::FixedPercent(p) | ModeValue::RandomMaxPercent(p) => p.to_string(),
        }
    }
}

/// Parse `value` into the type `mode` requires
pub fn parse_value(mode: PodMode, value: &str) -> Result<ModeValue, Violation> {
    let raw = value.trim();
    let percent = |raw: &str| {
        if raw.is_empty() {
            return Err(Violation::new(VALUE_FIELD, format!("value is required for mode {mode}")));
        }
        match raw.parse::<u32>() {
            Ok(p) if p <= 100 => Ok(p as u8),
            _ => Err(Violation::new(
                VALUE_FIELD,
                format!("value {raw:?} must be an integer between 0 and 100 for mode {mode}"),
            )),
        }
    };

    match mode {
        PodMode::One => Ok(ModeValue::One),
        PodMode::All => Ok(ModeValue::All),
        PodMode::Fixed => {
            if raw.is_empty() {
                return Err(Violation::new(VALUE_FIELD, "value is required for mode fixed"));
            }
            raw.parse::<usize>().map(ModeValue::Fixed).map_err(|_| {
                Violation::new(
                    VALUE_FIELD,
                    format!("value {raw:?} must be a non-negative integer for mode fixed"),
                )
            })
        }
        PodMode::FixedPercent => percent(raw).map(ModeValue::FixedPercent),
        PodMode::RandomMaxPercent => percent(raw).map(ModeValue::RandomMaxPercent),
    }
}

/// Number of instances a percentage selects out of `eligible`
///
/// Rounds half away from zero, and never rounds a non-zero percentage of a
/// non-empty set down to nothing.
pub fn percent_count(percent: u8, eligible: usize) -> usize {
    if percent == 0 || eligible == 0 {
        return 0;
    }
    // (p * e / 100) rounded half up, in integers so .5 ties are exact
    let rounded = (usize::from(percent) * eligible * 2 + 100) / 200;
    rounded.clamp(1, eligible)
}

/// Resolve a plan from the spec's mode and value
pub fn resolve_spec<S, R>(spec: &S, eligible: &[InstanceId], rng: &mut R) -> ControllerResult<ResolutionPlan>
where
    S: HasMode + HasValue + ?Sized,
    R: Rng + ?Sized,
{
    resolve(spec.mode(), spec.value(), eligible, rng)
}

/// Resolve with a fresh per-call generator; `None` seeds from entropy
pub fn resolve_seeded(
    mode: PodMode,
    value: &str,
    eligible: &[InstanceId],
    seed: Option<u64>,
) -> ControllerResult<ResolutionPlan> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    resolve(mode, value, eligible, &mut rng)
}

/// Pick the subset of `eligible` that `mode` and `value` describe
pub fn resolve<R>(mode: PodMode, value: &str, eligible: &[InstanceId], rng: &mut R) -> ControllerResult<ResolutionPlan>
where
    R: Rng + ?Sized,
{
    let parsed = parse_value(mode, value).map_err(|v| ControllerError::Validation { violations: vec![v] })?;

    let candidates = distinct(eligible);
    if candidates.is_empty() {
        return Err(ControllerError::InsufficientCandidates { mode });
    }
    let total = candidates.len();

    let (instances, drawn_percent) = match parsed {
        ModeValue::One => {
            let index = rng.gen_range(0..total);
            (vec![candidates[index].clone()], None)
        }
        ModeValue::All => (candidates, None),
        ModeValue::Fixed(requested) => {
            if requested > total {
                debug!(requested, available = total, "fixed count exceeds eligible instances, clamping");
            }
            (sample(&candidates, requested.min(total), rng), None)
        }
        ModeValue::FixedPercent(percent) => {
            (sample(&candidates, percent_count(percent, total), rng), None)
        }
        ModeValue::RandomMaxPercent(max) => {
            let drawn: u8 = rng.gen_range(0..=max);
            (sample(&candidates, percent_count(drawn, total), rng), Some(drawn))
        }
    };

    debug!(
        mode = %mode,
        eligible = total,
        selected = instances.len(),
        drawn_percent = ?drawn_percent,
        "resolved target instances"
    );

    Ok(ResolutionPlan {
        mode,
        instances,
        drawn_percent,
        eligible_count: total,
    })
}

fn distinct(eligible: &[InstanceId]) -> Vec<InstanceId> {
    let mut seen = HashSet::with_capacity(eligible.len());
    eligible
        .iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Uniform sample without replacement, kept in eligible order
fn sample<R: Rng + ?Sized>(candidates: &[InstanceId], amount: usize, rng: &mut R) -> Vec<InstanceId> {
    let mut indices = rand::seq::index::sample(rng, candidates.len(), amount).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| candidates[i].clone()).collect()
}
