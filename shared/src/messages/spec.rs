//! Declarative JVM fault documents
//!
//! A fault arrives as a JSON/YAML document shaped like the `JVMChaos`
//! custom resource. It is decoded in two stages: [`FaultDocument`] keeps
//! every enum field as a plain string so that admission can report each
//! unrecognized value, and the typed [`FaultSpecification`] is only produced
//! by the controller's admission validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};
use crate::messages::selector::Selector;

pub const API_VERSION: &str = "chaos-mesh.org/v1alpha1";
pub const KIND: &str = "JVMChaos";

/// Strategy for picking a subset of the eligible instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PodMode {
    One,
    All,
    Fixed,
    FixedPercent,
    RandomMaxPercent,
}

impl PodMode {
    pub const ALL: [PodMode; 5] = [
        PodMode::One,
        PodMode::All,
        PodMode::Fixed,
        PodMode::FixedPercent,
        PodMode::RandomMaxPercent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PodMode::One => "one",
            PodMode::All => "all",
            PodMode::Fixed => "fixed",
            PodMode::FixedPercent => "fixed-percent",
            PodMode::RandomMaxPercent => "random-max-percent",
        }
    }

    /// Whether `value` carries meaning for this mode
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            PodMode::Fixed | PodMode::FixedPercent | PodMode::RandomMaxPercent
        )
    }
}

/// Fault behaviour performed by the agent inside the JVM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JvmAction {
    /// Delay method invocation
    #[serde(rename = "delay")]
    Delay,
    /// Tamper with the return value
    #[serde(rename = "return")]
    Return,
    /// Run a Java or Groovy script at the call site
    #[serde(rename = "script")]
    Script,
    /// Drive CPU to full load
    #[serde(rename = "cfl")]
    CpuFullLoad,
    /// Trigger an out-of-memory condition
    #[serde(rename = "oom")]
    OutOfMemory,
    /// Fill the code cache
    #[serde(rename = "ccf")]
    CodeCacheFilling,
    /// Throw a custom exception
    #[serde(rename = "tce")]
    ThrowCustomException,
    /// Exhaust the connection pool
    #[serde(rename = "cpf")]
    ConnectionPoolFull,
    /// Throw the first exception declared by the method
    #[serde(rename = "tde")]
    ThrowDeclaredException,
    /// Exhaust the thread pool
    #[serde(rename = "tpf")]
    ThreadPoolFull,
}

impl JvmAction {
    pub const ALL: [JvmAction; 10] = [
        JvmAction::Delay,
        JvmAction::Return,
        JvmAction::Script,
        JvmAction::CpuFullLoad,
        JvmAction::OutOfMemory,
        JvmAction::CodeCacheFilling,
        JvmAction::ThrowCustomException,
        JvmAction::ConnectionPoolFull,
        JvmAction::ThrowDeclaredException,
        JvmAction::ThreadPoolFull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JvmAction::Delay => "delay",
            JvmAction::Return => "return",
            JvmAction::Script => "script",
            JvmAction::CpuFullLoad => "cfl",
            JvmAction::OutOfMemory => "oom",
            JvmAction::CodeCacheFilling => "ccf",
            JvmAction::ThrowCustomException => "tce",
            JvmAction::ConnectionPoolFull => "cpf",
            JvmAction::ThrowDeclaredException => "tde",
            JvmAction::ThreadPoolFull => "tpf",
        }
    }
}

/// Subsystem inside the JVM that an action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JvmTarget {
    Servlet,
    Psql,
    Jvm,
    Jedis,
    Http,
    Dubbo,
    Rocketmq,
    Mysql,
    Druid,
    Tars,
}

impl JvmTarget {
    pub const ALL: [JvmTarget; 10] = [
        JvmTarget::Servlet,
        JvmTarget::Psql,
        JvmTarget::Jvm,
        JvmTarget::Jedis,
        JvmTarget::Http,
        JvmTarget::Dubbo,
        JvmTarget::Rocketmq,
        JvmTarget::Mysql,
        JvmTarget::Druid,
        JvmTarget::Tars,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JvmTarget::Servlet => "servlet",
            JvmTarget::Psql => "psql",
            JvmTarget::Jvm => "jvm",
            JvmTarget::Jedis => "jedis",
            JvmTarget::Http => "http",
            JvmTarget::Dubbo => "dubbo",
            JvmTarget::Rocketmq => "rocketmq",
            JvmTarget::Mysql => "mysql",
            JvmTarget::Druid => "druid",
            JvmTarget::Tars => "tars",
        }
    }
}

macro_rules! closed_string_enum {
    ($ty:ident, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SharedError;

            /// Exact, case-sensitive match against the wire names
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| SharedError::UnknownVariant {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }
    };
}

closed_string_enum!(PodMode, "mode");
closed_string_enum!(JvmAction, "action");
closed_string_enum!(JvmTarget, "target");

/// Object metadata carried by every fault document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for ObjectMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            namespace: default_namespace(),
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Raw fault spec as authored, with enum fields still untyped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFaultSpec {
    #[serde(default)]
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default)]
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matchers: BTreeMap<String, String>,
}

/// Top-level declarative document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultDocument {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: RawFaultSpec,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

impl FaultDocument {
    /// Decode a YAML or JSON document
    pub fn parse(text: &str) -> SharedResult<Self> {
        serde_yaml::from_str(text).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }

    pub fn to_yaml(&self) -> SharedResult<String> {
        serde_yaml::to_string(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })
    }
}

/// Admitted, normalized fault specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSpecification {
    pub mode: PodMode,
    /// Canonical integer for value-bearing modes, empty otherwise
    pub value: String,
    pub selector: Selector,
    pub duration: Option<String>,
    pub action: JvmAction,
    pub target: JvmTarget,
    pub flags: BTreeMap<String, String>,
    pub matchers: BTreeMap<String, String>,
}

impl FaultSpecification {
    /// Render back into the authored form
    pub fn to_raw(&self) -> RawFaultSpec {
        RawFaultSpec {
            mode: self.mode.to_string(),
            value: self.value.clone(),
            selector: self.selector.clone(),
            duration: self.duration.clone(),
            action: self.action.to_string(),
            target: self.target.to_string(),
            flags: self.flags.clone(),
            matchers: self.matchers.clone(),
        }
    }
}

/// Admitted fault together with its object metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmFault {
    pub metadata: ObjectMeta,
    pub spec: FaultSpecification,
}

impl JvmFault {
    pub fn to_document(&self) -> FaultDocument {
        FaultDocument {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: self.metadata.clone(),
            spec: self.spec.to_raw(),
        }
    }
}

/// Access to the selector query of a fault type
pub trait HasSelector {
    fn selector(&self) -> &Selector;
}

/// Access to the resolution mode of a fault type
pub trait HasMode {
    fn mode(&self) -> PodMode;
}

/// Access to the raw mode value of a fault type
pub trait HasValue {
    fn value(&self) -> &str;
}

/// Everything target selection needs from a fault type
pub trait SelectSpec: HasSelector + HasMode + HasValue {}

impl<T: HasSelector + HasMode + HasValue> SelectSpec for T {}

impl HasSelector for FaultSpecification {
    fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl HasMode for FaultSpecification {
    fn mode(&self) -> PodMode {
        self.mode
    }
}

impl HasValue for FaultSpecification {
    fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for action in JvmAction::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
            assert_eq!(action.as_str().parse::<JvmAction>().unwrap(), action);
        }
        for target in JvmTarget::ALL {
            let json = serde_json::to_string(&target).unwrap();
            assert_eq!(json, format!("\"{}\"", target.as_str()));
        }
        for mode in PodMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }

    #[test]
    fn test_unknown_strings_are_rejected() {
        assert!("Delay".parse::<JvmAction>().is_err());
        assert!("kafka".parse::<JvmTarget>().is_err());
        assert!("half".parse::<PodMode>().is_err());
    }

    #[test]
    fn test_parse_yaml_document() {
        let text = r#"
apiVersion: chaos-mesh.org/v1alpha1
kind: JVMChaos
metadata:
  name: checkout-latency
  namespace: shop
spec:
  mode: fixed-percent
  value: "50"
  selector:
    namespaces: [shop]
    labelSelectors:
      app: checkout
  action: delay
  target: http
  duration: 30s
  flags:
    time: "2000"
"#;
        let doc = FaultDocument::parse(text).unwrap();
        assert_eq!(doc.kind, KIND);
        assert_eq!(doc.metadata.name, "checkout-latency");
        assert_eq!(doc.spec.mode, "fixed-percent");
        assert_eq!(doc.spec.duration.as_deref(), Some("30s"));
        assert_eq!(doc.spec.flags.get("time").map(String::as_str), Some("2000"));
        assert_eq!(doc.spec.selector.namespaces, vec!["shop".to_string()]);
    }

    #[test]
    fn test_parse_json_document() {
        let text = r#"{"kind":"JVMChaos","spec":{"mode":"all","action":"oom","target":"jvm","flags":{"area":"HEAP"}}}"#;
        let doc = FaultDocument::parse(text).unwrap();
        assert_eq!(doc.api_version, API_VERSION);
        assert_eq!(doc.metadata.namespace, "default");
        assert_eq!(doc.spec.action, "oom");
    }
}
