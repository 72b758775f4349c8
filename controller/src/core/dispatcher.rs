//! Action dispatch
//!
//! Owns the action/target compatibility table and the per-action parameter
//! rules, and builds the [`InstructionPayload`] sent to each agent. A payload
//! is only returned once every check has passed.

use std::collections::BTreeMap;
use tracing::debug;

use shared::{ExperimentId, InstructionKind, InstructionPayload, JvmAction, JvmTarget};

use crate::error::{ControllerError, ControllerResult, Violation};

const OOM_AREAS: &[&str] = &["HEAP", "NOHEAP", "OFFHEAP"];
const SCRIPT_TYPES: &[&str] = &["java", "groovy"];

/// Whether `action` is implemented for `target`
///
/// Exhaustive over both enums: a new target or action does not compile until
/// it is placed in this table.
pub fn supports(action: JvmAction, target: JvmTarget) -> bool {
    use JvmAction::*;

    match target {
        JvmTarget::Jvm => match action {
            Delay | Return | Script | CpuFullLoad | OutOfMemory | CodeCacheFilling | ThrowCustomException
            | ThrowDeclaredException => true,
            ConnectionPoolFull | ThreadPoolFull => false,
        },
        JvmTarget::Servlet
        | JvmTarget::Psql
        | JvmTarget::Jedis
        | JvmTarget::Http
        | JvmTarget::Rocketmq
        | JvmTarget::Mysql
        | JvmTarget::Tars => match action {
            Delay | ThrowCustomException => true,
            Return | Script | CpuFullLoad | OutOfMemory | CodeCacheFilling | ConnectionPoolFull
            | ThrowDeclaredException | ThreadPoolFull => false,
        },
        JvmTarget::Dubbo => match action {
            Delay | ThrowCustomException | ThreadPoolFull => true,
            Return | Script | CpuFullLoad | OutOfMemory | CodeCacheFilling | ConnectionPoolFull
            | ThrowDeclaredException => false,
        },
        JvmTarget::Druid => match action {
            ConnectionPoolFull => true,
            Delay | Return | Script | CpuFullLoad | OutOfMemory | CodeCacheFilling | ThrowCustomException
            | ThrowDeclaredException | ThreadPoolFull => false,
        },
    }
}

/// Targets an action can be combined with
pub fn supported_targets(action: JvmAction) -> Vec<JvmTarget> {
    JvmTarget::ALL
        .into_iter()
        .filter(|target| supports(action, *target))
        .collect()
}

/// Actions that hook a specific method rather than the whole process
fn is_method_level(action: JvmAction) -> bool {
    matches!(
        action,
        JvmAction::Delay
            | JvmAction::Return
            | JvmAction::Script
            | JvmAction::ThrowCustomException
            | JvmAction::ThrowDeclaredException
    )
}

/// Check the flags and matchers `action` needs on `target`
///
/// Returns every violated rule, empty when the parameters are well formed.
pub fn check_parameters(
    action: JvmAction,
    target: JvmTarget,
    flags: &BTreeMap<String, String>,
    matchers: &BTreeMap<String, String>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let flag = |key: &str| flags.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    let require_flag = |key: &str, what: &str, violations: &mut Vec<Violation>| {
        if flag(key).is_none() {
            violations.push(Violation::new(
                format!("spec.flags.{key}"),
                format!("{what} is required for action {action}"),
            ));
        }
    };

    match action {
        JvmAction::Delay => {
            require_flag("time", "delay time in milliseconds", &mut violations);
            if let Some(time) = flag("time") {
                if !matches!(time.parse::<u64>(), Ok(ms) if ms > 0) {
                    violations.push(Violation::new(
                        "spec.flags.time",
                        format!("delay time {time:?} must be a positive integer number of milliseconds"),
                    ));
                }
            }
        }
        JvmAction::Return => require_flag("value", "return value", &mut violations),
        JvmAction::Script => {
            require_flag("script-content", "script content", &mut violations);
            if let Some(kind) = flag("script-type") {
                if !SCRIPT_TYPES.contains(&kind) {
                    violations.push(Violation::new(
                        "spec.flags.script-type",
                        format!("script type {kind:?} must be one of {SCRIPT_TYPES:?}"),
                    ));
                }
            }
        }
        JvmAction::CpuFullLoad => {
            if let Some(count) = flag("cpu-count") {
                if !matches!(count.parse::<u32>(), Ok(n) if n > 0) {
                    violations.push(Violation::new(
                        "spec.flags.cpu-count",
                        format!("cpu count {count:?} must be a positive integer"),
                    ));
                }
            }
        }
        JvmAction::OutOfMemory => {
            require_flag("area", "memory area", &mut violations);
            if let Some(area) = flag("area") {
                if !OOM_AREAS.contains(&area) {
                    violations.push(Violation::new(
                        "spec.flags.area",
                        format!("memory area {area:?} must be one of {OOM_AREAS:?}"),
                    ));
                }
            }
        }
        JvmAction::ThrowCustomException => {
            require_flag("exception", "exception class name", &mut violations)
        }
        JvmAction::CodeCacheFilling
        | JvmAction::ConnectionPoolFull
        | JvmAction::ThrowDeclaredException
        | JvmAction::ThreadPoolFull => {}
    }

    if target == JvmTarget::Jvm && is_method_level(action) {
        for key in ["classname", "methodname"] {
            let present = matchers.get(key).is_some_and(|v| !v.trim().is_empty());
            if !present {
                violations.push(Violation::new(
                    format!("spec.matchers.{key}"),
                    format!("matcher {key} is required for action {action} on target jvm"),
                ));
            }
        }
    }

    violations
}

/// Build the apply instruction for one experiment
pub fn build(
    experiment_id: ExperimentId,
    action: JvmAction,
    target: JvmTarget,
    flags: &BTreeMap<String, String>,
    matchers: &BTreeMap<String, String>,
) -> ControllerResult<InstructionPayload> {
    if !supports(action, target) {
        return Err(ControllerError::UnsupportedCombination { action, target });
    }

    let mut violations = Vec::new();
    let flags = normalize_parameters(flags, "spec.flags", &mut violations);
    let matchers = normalize_parameters(matchers, "spec.matchers", &mut violations);
    violations.extend(check_parameters(action, target, &flags, &matchers));
    if !violations.is_empty() {
        return Err(ControllerError::MalformedParameter {
            action,
            target,
            violations,
        });
    }

    debug!(%experiment_id, %action, jvm_target = %target, "built instruction payload");

    Ok(InstructionPayload {
        experiment_id,
        kind: InstructionKind::Apply,
        action,
        target,
        flags,
        matchers,
    })
}

/// The instruction that reverts `payload`, reusing its parameters
pub fn recovery_of(payload: &InstructionPayload) -> InstructionPayload {
    payload.to_recovery()
}

/// Trim keys and values of a flag or matcher map
///
/// Empty keys and keys that collide once trimmed are reported against
/// `field`; the first entry in key order is kept.
pub fn normalize_parameters(
    raw: &BTreeMap<String, String>,
    field: &str,
    violations: &mut Vec<Violation>,
) -> BTreeMap<String, String> {
    let mut normalized = BTreeMap::new();
    for (key, value) in raw {
        let key = key.trim();
        if key.is_empty() {
            violations.push(Violation::new(field, "keys must not be empty"));
            continue;
        }
        if normalized.contains_key(key) {
            violations.push(Violation::new(
                format!("{field}.{key}"),
                "key is duplicated after trimming whitespace",
            ));
            continue;
        }
        normalized.insert(key.to_string(), value.trim().to_string());
    }
    normalized
}
