//! Instance selector query
//!
//! All populated criteria are conjunctive. The query is opaque to the mode
//! resolver and only interpreted by a selector evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_selectors: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression_selectors: Vec<LabelExpression>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_selectors: BTreeMap<String, String>,

    /// Supported fields: `metadata.name`, `metadata.namespace`, `spec.nodeName`, `status.phase`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_selectors: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pod_phase_selectors: Vec<String>,

    /// Explicit instances by namespace; restricts candidates to exactly these
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pods: BTreeMap<String, Vec<String>>,
}

impl Selector {
    /// A selector with no criteria matches every instance
    pub fn is_empty(&self) -> bool {
        self == &Selector::default()
    }
}

/// Set-based label requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelExpression {
    pub key: String,
    pub operator: ExpressionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl LabelExpression {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            ExpressionOperator::In => value.is_some_and(|v| self.values.contains(v)),
            ExpressionOperator::NotIn => value.map_or(true, |v| !self.values.contains(v)),
            ExpressionOperator::Exists => value.is_some(),
            ExpressionOperator::DoesNotExist => value.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expression_operators() {
        let l = labels(&[("tier", "backend")]);
        let expr = |operator, values: &[&str]| LabelExpression {
            key: "tier".to_string(),
            operator,
            values: values.iter().map(|s| s.to_string()).collect(),
        };

        assert!(expr(ExpressionOperator::In, &["backend", "db"]).matches(&l));
        assert!(!expr(ExpressionOperator::In, &["frontend"]).matches(&l));
        assert!(expr(ExpressionOperator::NotIn, &["frontend"]).matches(&l));
        assert!(!expr(ExpressionOperator::NotIn, &["backend"]).matches(&l));
        assert!(expr(ExpressionOperator::Exists, &[]).matches(&l));
        assert!(!expr(ExpressionOperator::DoesNotExist, &[]).matches(&l));
        assert!(expr(ExpressionOperator::NotIn, &["x"]).matches(&BTreeMap::new()));
    }

    #[test]
    fn test_camel_case_fields() {
        let selector: Selector = serde_json::from_str(
            r#"{"labelSelectors":{"app":"web"},"podPhaseSelectors":["Running"],"pods":{"ns":["a"]}}"#,
        )
        .unwrap();
        assert_eq!(selector.label_selectors.get("app").map(String::as_str), Some("web"));
        assert_eq!(selector.pod_phase_selectors, vec!["Running".to_string()]);
        assert!(!selector.is_empty());
        assert!(Selector::default().is_empty());
    }
}
