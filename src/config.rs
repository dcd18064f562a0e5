//! Engine configuration
//!
//! Loaded from the `[clipboard]` table of a TOML file. Every field has a
//! default, so an empty table (or no table at all) yields the defaults.
//!
//! ```toml
//! [clipboard]
//! verbose = true
//! caps_version = 2
//! use_long_format_names = true
//! can_lock_clipdata = false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pdu::{GeneralCapability, GeneralCapabilityFlags, CB_CAPS_VERSION_1, CB_CAPS_VERSION_2};

/// Clipboard channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log every PDU at info level instead of trace
    #[serde(default)]
    pub verbose: bool,

    /// Version advertised in the General Capability Set
    #[serde(default = "default_caps_version")]
    pub caps_version: u32,

    /// Advertise CB_USE_LONG_FORMAT_NAMES
    #[serde(default = "default_true")]
    pub use_long_format_names: bool,

    /// Advertise CB_STREAM_FILECLIP_ENABLED
    #[serde(default = "default_true")]
    pub stream_fileclip_enabled: bool,

    /// Advertise CB_FILECLIP_NO_FILE_PATHS
    #[serde(default = "default_true")]
    pub fileclip_no_file_paths: bool,

    /// Advertise CB_CAN_LOCK_CLIPDATA
    #[serde(default = "default_true")]
    pub can_lock_clipdata: bool,

    /// Advertise CB_HUGE_FILE_SUPPORT_ENABLED
    #[serde(default)]
    pub huge_file_support_enabled: bool,
}

fn default_caps_version() -> u32 {
    CB_CAPS_VERSION_2
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            caps_version: default_caps_version(),
            use_long_format_names: true,
            stream_fileclip_enabled: true,
            fileclip_no_file_paths: true,
            can_lock_clipdata: true,
            huge_file_support_enabled: false,
        }
    }
}

/// Top-level layout of the configuration file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    clipboard: EngineConfig,
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Failed to parse config file")?;

        file.clipboard.validate()?;
        Ok(file.clipboard)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.caps_version {
            CB_CAPS_VERSION_1 | CB_CAPS_VERSION_2 => {}
            other => anyhow::bail!("Invalid clipboard capability version: {}", other),
        }

        Ok(())
    }

    /// General capability flags this side advertises
    pub fn general_flags(&self) -> GeneralCapabilityFlags {
        let mut flags = GeneralCapabilityFlags::empty();

        if self.use_long_format_names {
            flags |= GeneralCapability::UseLongFormatNames;
        }
        if self.stream_fileclip_enabled {
            flags |= GeneralCapability::StreamFileclipEnabled;
        }
        if self.fileclip_no_file_paths {
            flags |= GeneralCapability::FileclipNoFilePaths;
        }
        if self.can_lock_clipdata {
            flags |= GeneralCapability::CanLockClipdata;
        }
        if self.huge_file_support_enabled {
            flags |= GeneralCapability::HugeFileSupportEnabled;
        }

        flags
    }
}
