use std::path::PathBuf;
use std::time::Duration;

/// Fatal configuration problems. The binary exits before starting any loop.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("LOG_FORMAT must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Root of the file-backed record store.
    pub data_dir: PathBuf,
    /// Root of the file-backed log store.
    pub logs_dir: PathBuf,
    pub check_interval: Duration,
    pub rotation_interval: Duration,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default  |
    /// |------------------------------|----------|
    /// | `DATA_DIR`                   | `.data`  |
    /// | `LOGS_DIR`                   | `.logs`  |
    /// | `CHECK_INTERVAL_SECS`        | `60`     |
    /// | `LOG_ROTATION_INTERVAL_SECS` | `86400`  |
    /// | `LOG_FORMAT`                 | `pretty` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("DATA_DIR").unwrap_or_else(|| ".data".into());
        let logs_dir = lookup("LOGS_DIR").unwrap_or_else(|| ".logs".into());

        let check_interval = interval(&lookup, "CHECK_INTERVAL_SECS", 60)?;
        let rotation_interval = interval(&lookup, "LOG_ROTATION_INTERVAL_SECS", 86_400)?;

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            data_dir: data_dir.into(),
            logs_dir: logs_dir.into(),
            check_interval,
            rotation_interval,
            log_format,
        })
    }
}

fn interval(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = match lookup(var) {
        None => default_secs,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw })?,
    };
    if secs == 0 {
        return Err(ConfigError::ZeroInterval(var));
    }
    Ok(Duration::from_secs(secs))
}
