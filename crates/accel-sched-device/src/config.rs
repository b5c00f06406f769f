//! Adapter configuration.
//!
//! Each vendor adapter declares the container resource names it reads. The
//! names are command-line flags parsed once at process startup and handed to
//! the adapter constructor. Each flag falls back to an environment variable
//! (`DCU_NAME`, `DCU_MEMORY`, `DCU_CORES`) when it is not given.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Default resource name for the DCU count.
pub const DEFAULT_DCU_RESOURCE_COUNT: &str = "hygon.com/dcunum";
/// Default resource name for DCU memory.
pub const DEFAULT_DCU_RESOURCE_MEMORY: &str = "hygon.com/dcumem";
/// Default resource name for DCU cores.
pub const DEFAULT_DCU_RESOURCE_CORES: &str = "hygon.com/dcucores";

/// Container resource names the DCU adapter looks for.
#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcuConfig {
    /// DCU resource count.
    #[arg(long = "dcu-name", env = "DCU_NAME", default_value = DEFAULT_DCU_RESOURCE_COUNT)]
    pub resource_count: String,

    /// DCU memory resource.
    #[arg(long = "dcu-memory", env = "DCU_MEMORY", default_value = DEFAULT_DCU_RESOURCE_MEMORY)]
    pub resource_memory: String,

    /// DCU core resource.
    #[arg(long = "dcu-cores", env = "DCU_CORES", default_value = DEFAULT_DCU_RESOURCE_CORES)]
    pub resource_cores: String,
}

impl Default for DcuConfig {
    fn default() -> Self {
        Self {
            resource_count: DEFAULT_DCU_RESOURCE_COUNT.to_string(),
            resource_memory: DEFAULT_DCU_RESOURCE_MEMORY.to_string(),
            resource_cores: DEFAULT_DCU_RESOURCE_CORES.to_string(),
        }
    }
}

impl DcuConfig {
    /// Check that no resource name is blank.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first empty resource.
    pub fn validate(&self) -> crate::Result<()> {
        for (flag, value) in [
            ("dcu-name", &self.resource_count),
            ("dcu-memory", &self.resource_memory),
            ("dcu-cores", &self.resource_cores),
        ] {
            if value.trim().is_empty() {
                return Err(crate::DeviceError::Config(format!(
                    "--{flag} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for every adapter in the device table.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Hygon DCU adapter.
    #[command(flatten)]
    pub dcu: DcuConfig,
}
