//! HTTP transport to in-instance agents
//!
//! Posts [`InstructionPayload`]s as JSON to the agent's
//! `/v1/faults/apply` and `/v1/faults/recover` endpoints.

use std::collections::HashMap;
use std::time::Duration;

use shared::{AgentAck, AgentErrorBody, InstanceId, InstructionPayload};

use crate::error::{ControllerError, ControllerResult};
use crate::traits::{AgentTransport, DeliveryError};

pub const APPLY_PATH: &str = "/v1/faults/apply";
pub const RECOVER_PATH: &str = "/v1/faults/recover";

/// Real agent transport over HTTP
pub struct HttpAgentTransport {
    client: reqwest::Client,
    endpoints: HashMap<InstanceId, String>,
}

impl HttpAgentTransport {
    /// Create a transport for the given `instance → host[:port]` map
    pub fn new(
        endpoints: HashMap<InstanceId, String>,
        default_port: u16,
        timeout: Duration,
    ) -> ControllerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ControllerError::ConfigurationError {
                field: format!("agent http client: {e}"),
            })?;

        let endpoints = endpoints
            .into_iter()
            .map(|(id, address)| (id, base_url(&address, default_port)))
            .collect();

        Ok(Self { client, endpoints })
    }

    async fn post(
        &self,
        instance: &InstanceId,
        path: &str,
        payload: &InstructionPayload,
    ) -> Result<AgentAck, DeliveryError> {
        let failure = |message: String| DeliveryError {
            instance: instance.clone(),
            message,
        };

        let base = self
            .endpoints
            .get(instance)
            .ok_or_else(|| failure("no agent address known for instance".to_string()))?;
        let url = format!("{base}{path}");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| failure(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<AgentErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => "no error body".to_string(),
            };
            return Err(failure(format!("agent answered HTTP {status}: {detail}")));
        }

        response
            .json::<AgentAck>()
            .await
            .map_err(|e| failure(format!("invalid acknowledgement from {url}: {e}")))
    }
}

#[async_trait::async_trait]
impl AgentTransport for HttpAgentTransport {
    async fn apply(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError> {
        self.post(instance, APPLY_PATH, payload).await
    }

    async fn recover(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError> {
        self.post(instance, RECOVER_PATH, payload).await
    }
}

/// Normalize `host`, `host:port` or a full URL into a base URL
fn base_url(address: &str, default_port: u16) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    let has_port = trimmed
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && !host.ends_with(':') && port.parse::<u16>().is_ok());
    if has_port {
        format!("http://{trimmed}")
    } else {
        format!("http://{trimmed}:{default_port}")
    }
}
