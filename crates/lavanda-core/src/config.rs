use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

// ---------------------------------------------------------------------------
// BusinessConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    /// Public page customers use to follow their order; quoted in messages.
    #[serde(default = "default_tracking_url")]
    pub tracking_url: String,
}

fn default_tracking_url() -> String {
    "https://example.invalid/tracking".to_string()
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Days a finished order is held before the quoted pickup deadline.
    #[serde(default = "default_pickup_window_days")]
    pub pickup_window_days: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_pickup_window_days() -> u32 {
    7
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            pickup_window_days: default_pickup_window_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackingConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub business: BusinessConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_version() -> u32 {
    1
}

impl TrackingConfig {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            business: BusinessConfig {
                name: business_name.into(),
                tracking_url: default_tracking_url(),
            },
            notifications: NotificationConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TrackError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: TrackingConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Write via a tempfile in the target directory so a crash mid-write
    /// never leaves a truncated config behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| TrackError::Io(e.error))?;
        Ok(())
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self::new("lavanda")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
