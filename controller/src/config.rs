//! Controller runtime configuration

use std::time::Duration;

/// Port agents listen on when an inventory entry gives only a host
pub const DEFAULT_AGENT_PORT: u16 = 9288;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Upper bound for one apply/recover call to a single agent
    pub agent_timeout: Duration,
    /// Seed for target resolution; `None` draws from entropy on every run
    pub seed: Option<u64>,
    /// Port appended to inventory addresses that carry no port
    pub default_agent_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(5),
            seed: None,
            default_agent_port: DEFAULT_AGENT_PORT,
        }
    }
}

impl ControllerConfig {
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }
}
