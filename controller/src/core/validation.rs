//! Admission validation
//!
//! Runs once, before any resolution or dispatch, and turns an authored
//! [`FaultDocument`] into a normalized [`JvmFault`]. Every violated constraint
//! is collected; the caller receives one error listing all of them.
//! Action/target pairing and parameter rules are delegated to the dispatcher.

use tracing::debug;

use shared::{
    ExpressionOperator, FaultDocument, FaultSpecification, JvmAction, JvmFault, JvmTarget, ObjectMeta, PodMode,
    RawFaultSpec, Selector, API_VERSION, KIND,
};

use crate::core::dispatcher;
use crate::core::duration::parse_duration;
use crate::core::resolver::parse_value;
use crate::error::{ControllerError, ControllerResult, Violation};

/// Validate a whole document, including its envelope
pub fn validate(document: &FaultDocument) -> ControllerResult<JvmFault> {
    let mut violations = Vec::new();

    if document.api_version != API_VERSION {
        violations.push(Violation::new(
            "apiVersion",
            format!("expected {API_VERSION:?}, got {:?}", document.api_version),
        ));
    }
    if document.kind != KIND {
        violations.push(Violation::new(
            "kind",
            format!("expected {KIND:?}, got {:?}", document.kind),
        ));
    }
    let name = document.metadata.name.trim();
    if name.is_empty() {
        violations.push(Violation::new("metadata.name", "name is required"));
    }
    let namespace = document.metadata.namespace.trim();
    if namespace.is_empty() {
        violations.push(Violation::new("metadata.namespace", "namespace must not be empty"));
    }

    let spec = validate_spec(&document.spec);
    match spec {
        Ok(spec) if violations.is_empty() => {
            debug!(fault = name, namespace, mode = %spec.mode, action = %spec.action, jvm_target = %spec.target, "admitted fault");
            Ok(JvmFault {
                metadata: ObjectMeta {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                },
                spec,
            })
        }
        Ok(_) => Err(ControllerError::Validation { violations }),
        Err(mut spec_violations) => {
            violations.append(&mut spec_violations);
            Err(ControllerError::Validation { violations })
        }
    }
}

/// Validate and normalize the spec portion of a document
pub fn validate_spec(raw: &RawFaultSpec) -> Result<FaultSpecification, Vec<Violation>> {
    let mut violations = Vec::new();

    let mode = parse_enum::<PodMode>(&raw.mode, "spec.mode", "mode", &PodMode::ALL.map(|m| m.as_str()), &mut violations);
    let action = parse_enum::<JvmAction>(
        &raw.action,
        "spec.action",
        "action",
        &JvmAction::ALL.map(|a| a.as_str()),
        &mut violations,
    );
    let target = parse_enum::<JvmTarget>(
        &raw.target,
        "spec.target",
        "target",
        &JvmTarget::ALL.map(|t| t.as_str()),
        &mut violations,
    );

    let value = mode.and_then(|mode| match parse_value(mode, &raw.value) {
        Ok(parsed) => Some(parsed.canonical_value()),
        Err(v) => {
            violations.push(v);
            None
        }
    });

    let duration = raw.duration.as_deref().map(str::trim).map(str::to_string);
    if let Some(text) = &duration {
        if let Err(message) = parse_duration(text) {
            violations.push(Violation::new("spec.duration", message));
        }
    }

    check_selector(&raw.selector, &mut violations);
    let flags = dispatcher::normalize_parameters(&raw.flags, "spec.flags", &mut violations);
    let matchers = dispatcher::normalize_parameters(&raw.matchers, "spec.matchers", &mut violations);

    if let (Some(action), Some(target)) = (action, target) {
        if dispatcher::supports(action, target) {
            violations.extend(dispatcher::check_parameters(action, target, &flags, &matchers));
        } else {
            let supported: Vec<&str> = dispatcher::supported_targets(action)
                .iter()
                .map(|t| t.as_str())
                .collect();
            violations.push(Violation::new(
                "spec.target",
                format!("action {action} is not supported on target {target} (supported: {supported:?})"),
            ));
        }
    }

    match (mode, value, action, target) {
        (Some(mode), Some(value), Some(action), Some(target)) if violations.is_empty() => Ok(FaultSpecification {
            mode,
            value,
            selector: raw.selector.clone(),
            duration,
            action,
            target,
            flags,
            matchers,
        }),
        _ => Err(violations),
    }
}

fn parse_enum<T: std::str::FromStr>(
    raw: &str,
    field: &str,
    what: &str,
    allowed: &[&str],
    violations: &mut Vec<Violation>,
) -> Option<T> {
    if raw.trim().is_empty() {
        violations.push(Violation::new(field, format!("{what} is required")));
        return None;
    }
    // closed sets: exact, case-sensitive wire names only
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            violations.push(Violation::new(
                field,
                format!("unrecognized {what} {raw:?} (expected one of {allowed:?})"),
            ));
            None
        }
    }
}

fn check_selector(selector: &Selector, violations: &mut Vec<Violation>) {
    for (i, expr) in selector.expression_selectors.iter().enumerate() {
        let field = format!("spec.selector.expressionSelectors[{i}]");
        if expr.key.trim().is_empty() {
            violations.push(Violation::new(format!("{field}.key"), "key is required"));
        }
        match expr.operator {
            ExpressionOperator::In | ExpressionOperator::NotIn if expr.values.is_empty() => {
                violations.push(Violation::new(
                    format!("{field}.values"),
                    format!("operator {:?} requires at least one value", expr.operator),
                ));
            }
            ExpressionOperator::Exists | ExpressionOperator::DoesNotExist if !expr.values.is_empty() => {
                violations.push(Violation::new(
                    format!("{field}.values"),
                    format!("operator {:?} takes no values", expr.operator),
                ));
            }
            _ => {}
        }
    }

    for field in selector.field_selectors.keys() {
        if !SUPPORTED_FIELDS.contains(&field.as_str()) {
            violations.push(Violation::new(
                format!("spec.selector.fieldSelectors.{field}"),
                format!("unsupported field (expected one of {SUPPORTED_FIELDS:?})"),
            ));
        }
    }

    for (namespace, names) in &selector.pods {
        if namespace.trim().is_empty() || names.iter().any(|n| n.trim().is_empty()) {
            violations.push(Violation::new(
                format!("spec.selector.pods.{namespace}"),
                "explicit instances need a namespace and non-empty names",
            ));
        }
    }
}

/// Field selectors the inventory evaluator understands
pub const SUPPORTED_FIELDS: &[&str] = &["metadata.name", "metadata.namespace", "spec.nodeName", "status.phase"];

#[cfg(test)]
mod tests {
    use super::*;

    fn document(yaml: &str) -> FaultDocument {
        FaultDocument::parse(yaml).unwrap()
    }

    const VALID: &str = r#"
kind: JVMChaos
metadata:
  name: checkout-exceptions
  namespace: shop
spec:
  mode: fixed-percent
  value: " 050 "
  selector:
    labelSelectors:
      app: checkout
  duration: " 2m "
  action: tce
  target: http
  flags:
    exception: " java.net.SocketTimeoutException "
"#;

    #[test]
    fn test_valid_document_is_normalized() {
        let fault = validate(&document(VALID)).unwrap();
        assert_eq!(fault.metadata.name, "checkout-exceptions");
        assert_eq!(fault.spec.mode, PodMode::FixedPercent);
        assert_eq!(fault.spec.value, "50");
        assert_eq!(fault.spec.duration.as_deref(), Some("2m"));
        assert_eq!(fault.spec.action, JvmAction::ThrowCustomException);
        assert_eq!(fault.spec.target, JvmTarget::Http);
        assert_eq!(
            fault.spec.flags.get("exception").map(String::as_str),
            Some("java.net.SocketTimeoutException")
        );
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let first = validate(&document(VALID)).unwrap();
        let second = validate(&first.to_document()).unwrap();
        let third = validate(&second.to_document()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_value_is_cleared_for_modes_without_value() {
        let doc = document(
            r#"
kind: JVMChaos
metadata: { name: burn }
spec: { mode: all, value: "17", action: cfl, target: jvm }
"#,
        );
        let fault = validate(&doc).unwrap();
        assert_eq!(fault.spec.value, "");
    }

    #[test]
    fn test_every_violation_is_reported() {
        let doc = document(
            r#"
kind: NetworkChaos
metadata: { name: "" }
spec:
  mode: half
  action: explode
  target: kafka
  duration: soon
"#,
        );
        let err = validate(&doc).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["kind", "metadata.name", "spec.mode", "spec.action", "spec.target", "spec.duration"]
        );
    }

    #[test]
    fn test_bad_value_and_pairing_reported_together() {
        let doc = document(
            r#"
kind: JVMChaos
metadata: { name: pool }
spec: { mode: fixed, value: "three", action: cpf, target: http }
"#,
        );
        let err = validate(&doc).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["spec.value", "spec.target"]);
        assert!(err.violations()[1].message.contains("druid"));
    }

    #[test]
    fn test_missing_parameters_surface_at_admission() {
        let doc = document(
            r#"
kind: JVMChaos
metadata: { name: slow }
spec: { mode: one, action: delay, target: jvm }
"#,
        );
        let err = validate(&doc).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["spec.flags.time", "spec.matchers.classname", "spec.matchers.methodname"]
        );
    }

    #[test]
    fn test_selector_checks() {
        let doc = document(
            r#"
kind: JVMChaos
metadata: { name: sel }
spec:
  mode: all
  action: ccf
  target: jvm
  selector:
    expressionSelectors:
      - { key: tier, operator: In }
      - { key: zone, operator: Exists, values: [a] }
    fieldSelectors:
      spec.hostIP: 10.0.0.1
"#,
        );
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn test_enum_fields_require_exact_names() {
        let doc = document("kind: JVMChaos\nmetadata: { name: x }\nspec: { mode: \" all\", action: Cfl, target: jvm }\n");
        let err = validate(&doc).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["spec.mode", "spec.action"]);
        assert!(err.violations()[0].message.contains("unrecognized"));
    }

    #[test]
    fn test_missing_mode_is_required() {
        let doc = document("kind: JVMChaos\nmetadata: { name: x }\nspec: { action: oom, target: jvm, flags: { area: HEAP } }\n");
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.violations()[0].field, "spec.mode");
        assert!(err.violations()[0].message.contains("required"));
    }
}
