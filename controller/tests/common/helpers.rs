//! Test helpers and builder patterns for controller tests

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use controller::services::{HttpAgentTransport, Inventory, InventorySelector};
use controller::{ControllerConfig, ExperimentRunner, MockAgentTransport, MockSelectorEvaluator};
use shared::{AgentAck, InstanceId, InstructionPayload};
use tokio::sync::oneshot;

use super::fixtures::TestFixtures;

/// Builder for runners over mocked collaborators
pub struct RunnerBuilder {
    selector: MockSelectorEvaluator,
    transport: MockAgentTransport,
    config: ControllerConfig,
}

impl RunnerBuilder {
    /// Ten checkout instances, an always-acknowledging transport, fixed seed
    pub fn new() -> Self {
        let mut selector = MockSelectorEvaluator::new();
        selector
            .expect_evaluate()
            .returning(|_| Ok(TestFixtures::checkout_instances()))
            .times(0..);

        let mut transport = MockAgentTransport::new();
        transport
            .expect_apply()
            .returning(|_, p| Ok(TestHelpers::ack(p)))
            .times(0..);
        transport
            .expect_recover()
            .returning(|_, p| Ok(TestHelpers::ack(p)))
            .times(0..);

        Self {
            selector,
            transport,
            config: ControllerConfig::default()
                .with_seed(Some(TestFixtures::SEED))
                .with_agent_timeout(Duration::from_millis(500)),
        }
    }

    /// Replace the selector mock
    pub fn with_selector<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockSelectorEvaluator),
    {
        self.selector = MockSelectorEvaluator::new();
        setup(&mut self.selector);
        self
    }

    /// Replace the transport mock
    pub fn with_transport<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockAgentTransport),
    {
        self.transport = MockAgentTransport::new();
        setup(&mut self.transport);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn build(self) -> ExperimentRunner<MockSelectorEvaluator, MockAgentTransport> {
        ExperimentRunner::new(self.selector, self.transport, self.config)
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Agent server running on an ephemeral port
pub struct SpawnedAgent {
    pub address: SocketAddr,
    pub state: Arc<agent::AgentState>,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for SpawnedAgent {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Static helpers
pub struct TestHelpers;

impl TestHelpers {
    pub fn ack(payload: &InstructionPayload) -> AgentAck {
        AgentAck {
            experiment_id: payload.experiment_id,
            kind: payload.kind,
            changed: true,
            active_faults: 1,
        }
    }

    /// Write `contents` to a temporary file kept alive by the returned handle
    pub fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    pub async fn spawn_agent() -> SpawnedAgent {
        let (listener, address) = agent::bind("127.0.0.1:0").await.unwrap();
        let state = Arc::new(agent::AgentState::new());
        let (stop, stopped) = oneshot::channel::<()>();
        let served = state.clone();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = stopped.await;
            };
            let _ = agent::serve(listener, served, shutdown).await;
        });
        SpawnedAgent {
            address,
            state,
            stop: Some(stop),
        }
    }

    /// Runner over a real inventory file and real agents
    ///
    /// `agents` maps inventory instance names to running agents; other
    /// instances get an address nothing listens on.
    pub fn http_runner(
        inventory_yaml: &str,
        agents: &HashMap<&str, SocketAddr>,
        timeout: Duration,
    ) -> ExperimentRunner<InventorySelector, HttpAgentTransport> {
        let file = Self::temp_file(inventory_yaml);
        let inventory = Inventory::from_path(file.path()).unwrap();

        let endpoints: HashMap<InstanceId, String> = inventory
            .instances
            .iter()
            .map(|i| {
                let address = agents
                    .get(i.name.as_str())
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "127.0.0.1:1".to_string());
                (i.id(), address)
            })
            .collect();

        let transport = HttpAgentTransport::new(endpoints, controller::DEFAULT_AGENT_PORT, timeout).unwrap();
        let config = ControllerConfig::default()
            .with_seed(Some(TestFixtures::SEED))
            .with_agent_timeout(timeout);
        ExperimentRunner::new(InventorySelector::new(inventory), transport, config)
    }
}
