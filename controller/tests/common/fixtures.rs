//! Test fixtures and data for controller tests

use shared::{FaultDocument, InstanceId};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const NAMESPACE: &'static str = "shop";
    pub const SEED: u64 = 42;

    /// Ten checkout instances plus two unrelated ones
    pub const INVENTORY: &'static str = r#"
- { namespace: shop, name: checkout-0, labels: { app: checkout }, node: node-a }
- { namespace: shop, name: checkout-1, labels: { app: checkout }, node: node-a }
- { namespace: shop, name: checkout-2, labels: { app: checkout }, node: node-b }
- { namespace: shop, name: checkout-3, labels: { app: checkout }, node: node-b }
- { namespace: shop, name: checkout-4, labels: { app: checkout }, node: node-c }
- { namespace: shop, name: checkout-5, labels: { app: checkout }, node: node-c }
- { namespace: shop, name: checkout-6, labels: { app: checkout }, node: node-a }
- { namespace: shop, name: checkout-7, labels: { app: checkout }, node: node-b }
- { namespace: shop, name: checkout-8, labels: { app: checkout }, node: node-c }
- { namespace: shop, name: checkout-9, labels: { app: checkout }, node: node-a }
- { namespace: shop, name: cart-0, labels: { app: cart }, node: node-a }
- { namespace: billing, name: ledger-0, labels: { app: ledger }, node: node-b }
"#;

    /// A valid exception fault against the checkout instances
    pub fn document(mode: &str, value: &str) -> String {
        format!(
            r#"apiVersion: chaos-mesh.org/v1alpha1
kind: JVMChaos
metadata:
  name: checkout-exceptions
  namespace: shop
spec:
  mode: {mode}
  value: "{value}"
  selector:
    labelSelectors:
      app: checkout
  action: tce
  target: http
  flags:
    exception: java.net.SocketTimeoutException
"#
        )
    }

    pub fn fault_document(mode: &str, value: &str) -> FaultDocument {
        FaultDocument::parse(&Self::document(mode, value)).unwrap()
    }

    pub fn checkout_instances() -> Vec<InstanceId> {
        (0..10)
            .map(|i| InstanceId::new(Self::NAMESPACE, format!("checkout-{i}")))
            .collect()
    }
}
