//! Configuration types for weread-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Remote API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the reading service (default: "https://weread.qq.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User identifier passed to the review endpoint
    #[serde(default)]
    pub user_vid: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_vid: String::new(),
            timeout: default_timeout(),
        }
    }
}

/// Retry behavior for a single book export
///
/// One retry is allowed per entry in `delays`. The wait before retry `n` is
/// `delays[min(n, len - 1)]`; a zero entry retries without pausing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delays between attempts, serialized as milliseconds (default: 1s, 2s, 4s)
    #[serde(default = "default_retry_delays", with = "duration_list_serde")]
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays: default_retry_delays(),
        }
    }
}

impl RetryConfig {
    /// Configuration that never retries
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Build a configuration from raw millisecond delays
    pub fn from_millis(delays: &[u64]) -> Self {
        Self {
            delays: delays.iter().copied().map(Duration::from_millis).collect(),
        }
    }
}

/// Batch runner settings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of books exported at the same time (default: 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between sequential exports when concurrency is 1 (default: 500ms)
    #[serde(default = "default_batch_delay", with = "duration_millis_serde")]
    pub delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay: default_batch_delay(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Keep the existing file and fail the write
    Skip,
}

/// Where file exports are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Export directory (default: "./exports")
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// File collision handling
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// Main configuration for [`BookExporter`](crate::BookExporter)
///
/// Fields are organized into sub-configs:
/// - [`api`](ApiConfig): base URL, user identifier, timeout
/// - [`retry`](RetryConfig): per-book retry delays
/// - [`batch`](BatchConfig): concurrency and inter-run delay
/// - [`output`](OutputConfig): export directory and collision handling
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Batch configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Check settings that would otherwise fail later at request time
    pub fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("batch.concurrency".to_string()),
            });
        }
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(Error::Config {
                message: format!("invalid base URL {:?}: {e}", self.api.base_url),
                key: Some("api.base_url".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://weread.qq.com".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_delays() -> Vec<Duration> {
    vec![
        Duration::from_millis(1000),
        Duration::from_millis(2000),
        Duration::from_millis(4000),
    ]
}

fn default_concurrency() -> usize {
    1
}

fn default_batch_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./exports")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Duration list serialization helper (milliseconds)
mod duration_list_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(delays: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(delays.iter().map(|d| d.as_millis() as u64))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}
