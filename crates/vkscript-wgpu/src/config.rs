//! Runner configuration
//!
//! Loaded from YAML. Every field has a default, so an empty document is a valid
//! configuration:
//!
//! ```yaml
//! device_id: 1
//! backends: [vulkan, metal]
//! power_preference: low_power
//! fail_fast: true
//! ```

use serde::{Deserialize, Serialize};

/// Graphics API a device may be searched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendName {
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

/// Which adapter to prefer when several satisfy a script
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    LowPower,
    #[default]
    HighPerformance,
}

/// Settings of a runner process
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Index of the adapter to use among those enumerated, instead of searching
    pub device_id: Option<usize>,
    /// APIs to enumerate adapters on
    pub backends: Vec<BackendName>,
    pub power_preference: PowerPreference,
    /// Stop a batch at the first failing script
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            backends: vec![BackendName::Vulkan],
            power_preference: PowerPreference::default(),
            fail_fast: false,
        }
    }
}

impl RunnerConfig {
    /// Parses a configuration from YAML text
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    /// Parses a configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }
}
