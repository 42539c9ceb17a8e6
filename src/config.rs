use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn empty_path_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(opt.filter(|path| !path.as_os_str().is_empty()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // libpcap treats 0 as "block forever", which hides Ctrl-C on an idle link.
        if self.capture.timeout_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "capture.timeout_ms must be positive, got {}",
                self.capture.timeout_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Interface to capture on; all interfaces when unset.
    pub interface: Option<String>,
    /// Read timeout; bounds how long an interrupt waits to be noticed.
    pub timeout_ms: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            interface: None,
            timeout_ms: 100,
        }
    }
}

impl From<&CaptureConfig> for crate::capture::CaptureConfig {
    fn from(config: &CaptureConfig) -> Self {
        crate::capture::CaptureConfig {
            interface: config.interface.clone(),
            timeout_ms: config.timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Hex-dump each frame's payload.
    pub display_data: bool,
    /// Suppress per-frame screen output.
    pub quiet: bool,
    #[serde(deserialize_with = "empty_path_none")]
    pub json_lines: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after this many decoded frames; 0 runs until interrupted.
    pub count: u64,
}
