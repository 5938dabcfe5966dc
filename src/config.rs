use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// What to do when the solver runs out of time on a newly added clue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Keep the clue, print a warning and carry on
    #[default]
    Warn,
    /// End the session
    Abort,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Time budget for each oracle call, in seconds
    #[serde(default = "default_solver_seconds")]
    pub solver_seconds: f64,
    #[serde(default)]
    pub on_timeout: TimeoutPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            solver_seconds: default_solver_seconds(),
            on_timeout: TimeoutPolicy::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let settings: Settings =
            toml::from_str(&content).context("Failed to parse config TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.solver_seconds.is_finite() && self.solver_seconds > 0.0,
            "solver_seconds must be a positive number, got {}",
            self.solver_seconds
        );
        Ok(())
    }

    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.solver_seconds).unwrap_or(Duration::MAX)
    }
}

fn default_solver_seconds() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.time_limit(), Duration::from_secs(1));
        assert_eq!(settings.on_timeout, TimeoutPolicy::Warn);
    }

    #[test]
    fn test_parse_all_fields() {
        let settings: Settings = toml::from_str(
            r#"
solver_seconds = 0.25
on_timeout = "abort"
"#,
        )
        .unwrap();
        assert_eq!(settings.time_limit(), Duration::from_millis(250));
        assert_eq!(settings.on_timeout, TimeoutPolicy::Abort);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<Settings>("solver_secs = 2").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "solver_seconds = 3").unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.time_limit(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_rejects_non_positive_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "solver_seconds = 0").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("solver_seconds"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/clues.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
