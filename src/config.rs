//! Environment-driven configuration for the solver service.

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables. Every field
/// has a sane default so the teacher's previous hardcoded behavior
/// ("127.0.0.1:8080", a 300s budget, 1 thread for reproducibility) keeps
/// working unconfigured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP presentation edge binds to.
    pub bind_address: String,
    /// Default solver wall-clock budget in seconds, used when a
    /// `SolveRequest` does not override it.
    pub default_solver_budget_seconds: u64,
    /// Number of parallel search workers requested from the MILP engine.
    /// Defaults to 1, matching the teacher's `set_option("threads", 1) //
    /// limit to 1 thread for reproducibility"; raising it trades the
    /// idempotent-rerun guarantee (fixed seed, fixed thread count) for
    /// search speed.
    pub solver_worker_count: usize,
    /// When true, the primary CP/MILP engine is never invoked and every
    /// request goes straight to the greedy fallback. Useful in environments
    /// where the HiGHs backend cannot be linked.
    pub fallback_only: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            default_solver_budget_seconds: 300,
            solver_worker_count: 1,
            fallback_only: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset. A `.env` file in the working directory
    /// is honored if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = AppConfig::default();

        let bind_address =
            env_var_or("TIMETABLE_BIND_ADDRESS", &defaults.bind_address);

        let default_solver_budget_seconds = env_var_parsed(
            "TIMETABLE_SOLVER_BUDGET_SECONDS",
            defaults.default_solver_budget_seconds,
        )?;

        let solver_worker_count = env_var_parsed(
            "TIMETABLE_SOLVER_WORKERS",
            defaults.solver_worker_count,
        )?;

        let fallback_only = match env::var("TIMETABLE_FALLBACK_ONLY") {
            Ok(v) => v
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue("TIMETABLE_FALLBACK_ONLY".into(), v))?,
            Err(_) => defaults.fallback_only,
        };

        Ok(AppConfig {
            bind_address,
            default_solver_budget_seconds,
            solver_worker_count,
            fallback_only,
        })
    }
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_var_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_teacher_hardcoded_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind_address, "127.0.0.1:8080");
        assert_eq!(cfg.default_solver_budget_seconds, 300);
        assert_eq!(cfg.solver_worker_count, 1);
        assert!(!cfg.fallback_only);
    }

    #[test]
    fn env_var_or_uses_default_when_unset() {
        let val = env_var_or("TIMETABLE_TEST_NON_EXISTENT_VAR", "fallback");
        assert_eq!(val, "fallback");
    }
}
