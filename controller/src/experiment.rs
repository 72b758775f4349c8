//! Experiment runner
//!
//! Coordinates one fault from admission to recovery using dependency
//! injection for the selector evaluator and the agent transport:
//!
//! document → validate → evaluate selector → resolve plan → build payload
//! → deliver apply → (duration) → deliver recovery with the same plan.
//!
//! Everything that can fail on the document itself fails before the first
//! instruction leaves the controller.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::time::Duration;

use shared::{
    component_debug, component_info, component_warn, logging, ComponentId, ExperimentId, ExperimentPhase,
    ExperimentStatus, FaultDocument, InstructionPayload, JvmFault, SelectSpec,
};

use crate::config::ControllerConfig;
use crate::core::{self, parse_duration, ResolutionPlan};
use crate::error::{ControllerError, ControllerResult, Violation};
use crate::services::delivery::{deliver, DeliveryReport};
use crate::traits::{AgentTransport, SelectorEvaluator};

/// A fault that passed every check and is ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExperiment {
    pub id: ExperimentId,
    pub fault: JvmFault,
    pub plan: ResolutionPlan,
    pub payload: InstructionPayload,
    pub duration: Option<Duration>,
}

/// A fault that has been delivered to its plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    pub id: ExperimentId,
    pub fault: JvmFault,
    pub plan: ResolutionPlan,
    pub payload: InstructionPayload,
    pub duration: Option<Duration>,
    pub status: ExperimentStatus,
}

/// Main runner that drives experiments through the injected collaborators
pub struct ExperimentRunner<S, T>
where
    S: SelectorEvaluator,
    T: AgentTransport,
{
    selector: S,
    transport: T,
    config: ControllerConfig,
}

impl<S, T> ExperimentRunner<S, T>
where
    S: SelectorEvaluator,
    T: AgentTransport,
{
    /// Create new runner with injected dependencies
    pub fn new(selector: S, transport: T, config: ControllerConfig) -> Self {
        Self {
            selector,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Evaluate the selector and resolve a fresh plan
    ///
    /// Used both for the initial selection and for re-selection when the
    /// eligible set changes; each call fully replaces the previous plan.
    pub fn select<F: SelectSpec>(&self, spec: &F) -> ControllerResult<ResolutionPlan> {
        let eligible = self.selector.evaluate(spec.selector())?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        core::resolve_spec(spec, &eligible, &mut rng)
    }

    /// Validate, select and build without contacting any agent
    pub fn prepare(&self, document: &FaultDocument) -> ControllerResult<PreparedExperiment> {
        let fault = core::validate(document)?;
        let id = ExperimentId::new();

        let payload = core::build(
            id,
            fault.spec.action,
            fault.spec.target,
            &fault.spec.flags,
            &fault.spec.matchers,
        )?;

        let duration = fault
            .spec
            .duration
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|message| ControllerError::Validation {
                violations: vec![Violation::new("spec.duration", message)],
            })?;

        let plan = self.select(&fault.spec)?;

        component_debug!(
            ComponentId::current(),
            experiment = %id,
            fault = %fault.metadata.name,
            selected = plan.len(),
            eligible = plan.eligible_count,
            "prepared experiment"
        );

        Ok(PreparedExperiment {
            id,
            fault,
            plan,
            payload,
            duration,
        })
    }

    /// Deliver the apply instruction of a prepared experiment
    pub async fn inject(&self, prepared: PreparedExperiment) -> Experiment {
        component_info!(
            ComponentId::current(),
            experiment = %prepared.id,
            action = %prepared.payload.action,
            jvm_target = %prepared.payload.target,
            instances = prepared.plan.len(),
            "💉 Injecting fault"
        );

        let report = deliver(&self.transport, &prepared.plan, &prepared.payload, self.config.agent_timeout).await;
        let status = ExperimentStatus {
            experiment_id: prepared.id,
            phase: injection_phase(&report),
            records: report.records(),
        };

        log_report(&report, status.phase);

        Experiment {
            id: prepared.id,
            fault: prepared.fault,
            plan: prepared.plan,
            payload: prepared.payload,
            duration: prepared.duration,
            status,
        }
    }

    /// Prepare and inject in one step
    pub async fn start(&self, document: &FaultDocument) -> ControllerResult<Experiment> {
        let prepared = self.prepare(document)?;
        Ok(self.inject(prepared).await)
    }

    /// Deliver the recovery instruction to the original plan
    pub async fn recover(&self, experiment: &mut Experiment) {
        let report = recover(
            &self.transport,
            &experiment.plan,
            &experiment.payload,
            self.config.agent_timeout,
        )
        .await;

        let phase = if report.all_succeeded() {
            ExperimentPhase::Recovered
        } else {
            ExperimentPhase::PartiallyRecovered
        };
        log_report(&report, phase);

        experiment.status.phase = phase;
        experiment.status.records = report.records();
    }

    /// Inject, hold the fault for its duration (or until `shutdown`), recover
    pub async fn run_until<F>(&self, document: &FaultDocument, shutdown: F) -> ControllerResult<Experiment>
    where
        F: Future<Output = ()>,
    {
        let mut experiment = self.start(document).await?;

        // a timed-out apply may still land on the agent, so a failed
        // injection is recovered immediately instead of being held
        match experiment.duration {
            _ if experiment.status.phase == ExperimentPhase::Failed => {
                component_warn!(
                    ComponentId::current(),
                    experiment = %experiment.id,
                    "Injection failed on every instance, recovering"
                );
            }
            Some(duration) => {
                component_info!(
                    ComponentId::current(),
                    experiment = %experiment.id,
                    "⏳ Holding fault for {}ms",
                    duration.as_millis()
                );
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = shutdown => {
                        component_info!(ComponentId::current(), experiment = %experiment.id, "Shutdown requested before duration elapsed");
                    }
                }
            }
            None => {
                component_info!(
                    ComponentId::current(),
                    experiment = %experiment.id,
                    "⏳ No duration set, holding fault until shutdown"
                );
                shutdown.await;
            }
        }

        self.recover(&mut experiment).await;
        Ok(experiment)
    }
}

/// Send the recovery of `payload` to every instance of `plan`
///
/// The plan is reused as-is; recovery never re-resolves targets.
pub async fn recover<T>(
    transport: &T,
    plan: &ResolutionPlan,
    payload: &InstructionPayload,
    timeout: Duration,
) -> DeliveryReport
where
    T: AgentTransport + ?Sized,
{
    let recovery = core::recovery_of(payload);
    deliver(transport, plan, &recovery, timeout).await
}

fn injection_phase(report: &DeliveryReport) -> ExperimentPhase {
    let succeeded = report.succeeded();
    if succeeded == report.outcomes.len() {
        ExperimentPhase::Injected
    } else if succeeded == 0 {
        ExperimentPhase::Failed
    } else {
        ExperimentPhase::PartiallyInjected
    }
}

fn log_report(report: &DeliveryReport, phase: ExperimentPhase) {
    let failed = report.outcomes.len() - report.succeeded();
    if failed == 0 {
        logging::log_success(
            ComponentId::current(),
            &format!("{:?} delivered to {} instance(s)", report.kind, report.outcomes.len()),
        );
    } else {
        component_warn!(
            ComponentId::current(),
            failed,
            delivered = report.succeeded(),
            phase = ?phase,
            "Delivery incomplete"
        );
    }
}

impl Experiment {
    /// Instances currently holding the fault
    pub fn injected(&self) -> Vec<&shared::InstanceId> {
        self.status.injected_instances().collect()
    }
}
