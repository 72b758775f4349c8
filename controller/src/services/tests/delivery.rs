//! Tests for concurrent instruction delivery

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use shared::{AgentAck, InstanceId, InstancePhase, InstructionKind, InstructionPayload};

use super::common::{apply_payload, plan};
use crate::services::delivery::deliver;
use crate::traits::{AgentTransport, DeliveryError, MockAgentTransport};

fn ack(payload: &InstructionPayload) -> AgentAck {
    AgentAck {
        experiment_id: payload.experiment_id,
        kind: payload.kind,
        changed: true,
        active_faults: 1,
    }
}

/// Transport whose listed instances stall past any reasonable timeout
struct StallingTransport {
    stalled: Vec<&'static str>,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl StallingTransport {
    fn new(stalled: Vec<&'static str>, delay: Duration) -> Self {
        Self {
            stalled,
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn answer(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if self.stalled.contains(&instance.name.as_str()) {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ack(payload))
    }
}

#[async_trait::async_trait]
impl AgentTransport for StallingTransport {
    async fn apply(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError> {
        self.answer(instance, payload).await
    }

    async fn recover(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError> {
        self.answer(instance, payload).await
    }
}

#[tokio::test]
async fn test_outcomes_follow_plan_order() {
    let mut transport = MockAgentTransport::new();
    transport.expect_apply().times(3).returning(|_, p| Ok(ack(p)));

    let plan = plan(&["c", "a", "b"]);
    let report = deliver(&transport, &plan, &apply_payload(), Duration::from_secs(1)).await;

    let order: Vec<&str> = report.outcomes.iter().map(|o| o.instance.name.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
    assert!(report.all_succeeded());
    assert_eq!(report.kind, InstructionKind::Apply);
}

#[tokio::test]
async fn test_failure_is_recorded_per_instance() {
    let mut transport = MockAgentTransport::new();
    transport.expect_apply().times(3).returning(|instance, p| {
        if instance.name == "b" {
            Err(DeliveryError {
                instance: instance.clone(),
                message: "agent answered HTTP 500".to_string(),
            })
        } else {
            Ok(ack(p))
        }
    });

    let report = deliver(&transport, &plan(&["a", "b", "c"]), &apply_payload(), Duration::from_secs(1)).await;
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures().count(), 1);

    let records = report.records();
    assert_eq!(records[0].phase, InstancePhase::Injected);
    assert_eq!(records[1].phase, InstancePhase::InjectFailed);
    assert_eq!(records[1].error.as_deref(), Some("agent answered HTTP 500"));
    assert_eq!(records[2].phase, InstancePhase::Injected);
}

#[tokio::test]
async fn test_recover_routes_to_recover_call() {
    let mut transport = MockAgentTransport::new();
    transport.expect_apply().never();
    transport
        .expect_recover()
        .times(2)
        .returning(|_, p| Err(DeliveryError {
            instance: shared::InstanceId::new("shop", "x"),
            message: format!("refused {:?}", p.kind),
        }));

    let payload = apply_payload().to_recovery();
    let report = deliver(&transport, &plan(&["a", "b"]), &payload, Duration::from_secs(1)).await;
    assert!(report
        .records()
        .iter()
        .all(|r| r.phase == InstancePhase::RecoverFailed));
}

#[tokio::test]
async fn test_stalled_agent_times_out_without_blocking_others() {
    let transport = StallingTransport::new(vec!["b"], Duration::from_secs(30));
    let started = Instant::now();

    let report = deliver(&transport, &plan(&["a", "b", "c"]), &apply_payload(), Duration::from_millis(200)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.succeeded(), 2);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.instance.name, "b");
    assert!(failure.message.contains("no acknowledgement within 200ms"));
}

#[tokio::test]
async fn test_calls_are_in_flight_together() {
    let transport = StallingTransport::new(vec![], Duration::ZERO);
    let peak = transport.peak.clone();

    let report = deliver(&transport, &plan(&["a", "b", "c", "d"]), &apply_payload(), Duration::from_secs(2)).await;

    assert!(report.all_succeeded());
    assert_eq!(peak.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_empty_plan_delivers_nothing() {
    let transport = MockAgentTransport::new();
    let report = deliver(&transport, &plan(&[]), &apply_payload(), Duration::from_secs(1)).await;
    assert!(report.outcomes.is_empty());
    assert!(report.all_succeeded());
}
