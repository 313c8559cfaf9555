//! Application configuration loaded from environment variables.

use std::env;

use clap::ValueEnum;

/// Which counter store to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Process-local store; windows last only for this invocation.
    Memory,
    /// Shared Redis store at `REDIS_URL`.
    Redis,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `--backend` on the command line takes precedence over this.
    pub fn from_env() -> Self {
        let backend = if env::var("REDIS_URL").is_ok() {
            Backend::Redis
        } else {
            Backend::Memory
        };

        Self {
            backend,
            json_logs: env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }

    pub fn with_backend(mut self, backend: Option<Backend>) -> Self {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_backend_overrides_env_default() {
        let config = AppConfig {
            backend: Backend::Memory,
            json_logs: false,
        };

        assert_eq!(config.clone().with_backend(None).backend, Backend::Memory);
        assert_eq!(
            config.with_backend(Some(Backend::Redis)).backend,
            Backend::Redis
        );
    }
}
