//! HTTP API served inside each instance
//!
//! * `POST /v1/faults/apply`: install the fault carried by an apply instruction
//! * `POST /v1/faults/recover`: remove the fault of an experiment
//! * `GET /v1/faults`: list active faults
//! * `GET /health`: liveness and active fault count

use axum::{
    extract::{FromRequest, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use shared::{component_info, AgentAck, ComponentId, InstructionKind, InstructionPayload};

use crate::error::{AgentError, AgentResult};
use crate::state::{ActiveFault, AgentState};

pub const APPLY_PATH: &str = "/v1/faults/apply";
pub const RECOVER_PATH: &str = "/v1/faults/recover";
pub const FAULTS_PATH: &str = "/v1/faults";

/// JSON body extractor whose rejections answer with an [`AgentErrorBody`](shared::AgentErrorBody)
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AgentError))]
pub struct AgentJson<T>(pub T);

/// Build the Axum router with all routes
pub fn build_router(state: Arc<AgentState>) -> Router {
    Router::new()
        .route(APPLY_PATH, post(apply_handler))
        .route(RECOVER_PATH, post(recover_handler))
        .route(FAULTS_PATH, get(list_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

fn expect_kind(expected: InstructionKind, payload: &InstructionPayload) -> AgentResult<()> {
    if payload.kind == expected {
        Ok(())
    } else {
        Err(AgentError::KindMismatch {
            expected,
            got: payload.kind,
        })
    }
}

async fn apply_handler(
    State(state): State<Arc<AgentState>>,
    AgentJson(payload): AgentJson<InstructionPayload>,
) -> AgentResult<Json<AgentAck>> {
    expect_kind(InstructionKind::Apply, &payload)?;
    let (changed, active_faults) = state.apply(&payload).await?;

    if changed {
        component_info!(
            ComponentId::current(),
            experiment = %payload.experiment_id,
            action = %payload.action,
            jvm_target = %payload.target,
            "💉 Fault installed"
        );
    }

    Ok(Json(AgentAck {
        experiment_id: payload.experiment_id,
        kind: payload.kind,
        changed,
        active_faults,
    }))
}

async fn recover_handler(
    State(state): State<Arc<AgentState>>,
    AgentJson(payload): AgentJson<InstructionPayload>,
) -> AgentResult<Json<AgentAck>> {
    expect_kind(InstructionKind::Recover, &payload)?;
    let (changed, active_faults) = state.recover(&payload.experiment_id).await;

    if changed {
        component_info!(ComponentId::current(), experiment = %payload.experiment_id, "🩹 Fault removed");
    } else {
        tracing::debug!(experiment = %payload.experiment_id, "recover for inactive experiment");
    }

    Ok(Json(AgentAck {
        experiment_id: payload.experiment_id,
        kind: payload.kind,
        changed,
        active_faults,
    }))
}

async fn list_handler(State(state): State<Arc<AgentState>>) -> Json<Vec<ActiveFault>> {
    Json(state.active().await)
}

async fn health_check(State(state): State<Arc<AgentState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "activeFaults": state.active_count().await,
        "uptimeSeconds": state.uptime_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bind `address` and return the listener with its resolved local address
pub async fn bind(address: &str) -> AgentResult<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| AgentError::ServerStartup {
            address: address.to_string(),
            message: e.to_string(),
        })?;
    let local = listener.local_addr()?;
    Ok((listener, local))
}

/// Serve the agent API until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AgentState>, shutdown: F) -> AgentResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
