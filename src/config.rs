use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// How long a bucket may stay ungranted before new waiters give up immediately.
pub const GRANT_GRACE_WINDOW_SECONDS: u64 = 3;

/// Top-level configuration for the mediator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Age in milliseconds after which an ungranted acquisition is treated as
    /// already timed out by later `await_granted` calls.
    pub grace_window_ms: u64,
    /// Milliseconds to keep a platform acquisition alive after its last lease
    /// closes. Zero releases immediately.
    pub release_delay_ms: u64,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            grace_window_ms: GRANT_GRACE_WINDOW_SECONDS * 1000,
            release_delay_ms: 0,
        }
    }
}

impl MediatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grace_window_ms == 0 {
            return Err(anyhow!("grace_window_ms must be > 0"));
        }
        Ok(())
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MediatorConfig::default();
        assert_eq!(config.grace_window(), Duration::from_secs(3));
        assert_eq!(config.release_delay(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MediatorConfig = serde_json::from_str(r#"{"release_delay_ms": 1500}"#).unwrap();
        assert_eq!(config.grace_window_ms, 3000);
        assert_eq!(config.release_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_zero_grace_window_rejected() {
        let config = MediatorConfig {
            grace_window_ms: 0,
            ..MediatorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
