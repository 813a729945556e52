use std::time::Duration;

/// Default bound on request payloads accepted by `PipelineRequest::from_json_limited`.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;

/// Tunables for the execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum node computations running at once within one request.
    ///
    /// Set to 1 to run a layer's nodes one after another (useful for debugging).
    pub max_concurrent_nodes: usize,
    /// Wall-clock bound for the execution phase. `None` means no bound.
    pub timeout: Option<Duration>,
    /// Largest request payload, in bytes, accepted from the wire.
    pub max_request_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_nodes: 16,
            timeout: None,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables, falling back to defaults.
    ///
    /// Reads the following environment variables:
    /// - `NAGARE_MAX_CONCURRENT_NODES`: maximum concurrent node computations
    /// - `NAGARE_TIMEOUT_MS`: execution wall-clock bound in milliseconds (`0` disables it)
    /// - `NAGARE_MAX_REQUEST_BYTES`: largest accepted request payload
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let max_concurrent_nodes = parse("NAGARE_MAX_CONCURRENT_NODES")
            .map(|n| usize::try_from(n.max(1)).unwrap_or(usize::MAX))
            .unwrap_or(defaults.max_concurrent_nodes);
        let timeout = match parse("NAGARE_TIMEOUT_MS") {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.timeout,
        };
        let max_request_bytes = parse("NAGARE_MAX_REQUEST_BYTES")
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(defaults.max_request_bytes);

        Self {
            max_concurrent_nodes,
            timeout,
            max_request_bytes,
        }
    }
}
