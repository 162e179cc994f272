use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pacing of the background metric generators.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(default)]
pub struct GeneratorsConfig {
    pub enabled: bool,
    /// Period of the heartbeat counter.
    pub counter_interval_ms: u64,
    /// Period of the simulated latency observations.
    pub latency_interval_ms: u64,
}

impl Default for GeneratorsConfig {
    fn default() -> Self {
        GeneratorsConfig {
            enabled: true,
            counter_interval_ms: 1000,
            latency_interval_ms: 10,
        }
    }
}

/// Behaviour of the simulated workload endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Upper bound (exclusive) of the random delay applied by `/gauge`; 0 disables it.
    pub max_delay_ms: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig { max_delay_ms: 1000 }
    }
}
