// src/config.rs
//! Configuration management with file-backed storage

use crate::{
    error::{Error, Result},
    gps::framer::LINE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How reports are written by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable log lines
    #[default]
    Log,
    /// One JSON object per line on stdout
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub serial_port: Option<String>,
    pub baudrate: u32,
    /// Reject sentences without a `*HH` checksum.
    pub strict_checksum: bool,
    /// Drop the partially framed line when the link reports a fault.
    pub reset_on_link_fault: bool,
    pub output: OutputFormat,
    pub line_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baudrate: 9600,
            strict_checksum: false,
            reset_on_link_fault: false,
            output: OutputFormat::Log,
            line_capacity: LINE_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Load from the default config file, falling back to defaults if it
    /// does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `$HOME/.config/nmea-link/config.json` (`%USERPROFILE%` on Windows)
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("nmea-link")
            .join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.line_capacity < 2 {
            return Err(Error::Config(format!(
                "line_capacity must be at least 2, got {}",
                self.line_capacity
            )));
        }
        if self.baudrate == 0 {
            return Err(Error::Config("baudrate must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.serial_port = Some(port);
        self.baudrate = baudrate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("nmea-link-test-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.line_capacity, 83);
        assert!(!config.strict_checksum);
        assert!(!config.reset_on_link_fault);
        assert_eq!(config.output, OutputFormat::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_update_serial() {
        let mut config = MonitorConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        assert_eq!(config.serial_port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(config.baudrate, 115200);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"serial_port":"/dev/ttyACM0","output":"json"}"#).unwrap();
        assert_eq!(config.serial_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.baudrate, 9600);
    }

    #[test]
    fn test_validate_rejects_tiny_buffer() {
        let config = MonitorConfig {
            line_capacity: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_default() {
        let path = temp_path("missing");
        assert_eq!(MonitorConfig::load_from(&path).unwrap(), MonitorConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut config = MonitorConfig::default();
        config.update_serial("COM3".to_string(), 38400);
        config.strict_checksum = true;

        config.save_to(&path).unwrap();
        let loaded = MonitorConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"line_capacity":0}"#).unwrap();

        assert!(matches!(MonitorConfig::load_from(&path), Err(Error::Config(_))));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
