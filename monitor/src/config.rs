//! Monitor configuration file (`monitor.toml`).
//!
//! ```toml
//! speed = "3.5"
//! slow_latency = 4
//! shadow_bank = 0
//! log_level = "debug"
//!
//! [overlays]
//! rom_e000 = true
//!
//! [[load]]
//! file = "prog.bin"
//! address = 0x2000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use gs45_core::core::machine::Machine;
use gs45_core::cpu::gs4510::ClockSpeed;
use gs45_core::memory::RomOverlays;
use log::info;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown speed {0:?} (expected 1, 2, 3.5 or full)")]
    UnknownSpeed(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub speed: Option<String>,
    pub slow_latency: Option<u8>,
    pub shadow_bank: Option<u8>,
    pub overlays: OverlayConfig,
    pub log_level: Option<String>,
    pub load: Vec<LoadEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub rom_8000: bool,
    pub rom_a000: bool,
    pub rom_c000: bool,
    pub rom_e000: bool,
}

impl From<OverlayConfig> for RomOverlays {
    fn from(o: OverlayConfig) -> Self {
        RomOverlays {
            rom_8000: o.rom_8000,
            rom_a000: o.rom_a000,
            rom_c000: o.rom_c000,
            rom_e000: o.rom_e000,
        }
    }
}

/// A file copied into physical memory before the machine starts.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadEntry {
    pub file: PathBuf,
    pub address: u32,
}

impl MonitorConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gs45").join("monitor.toml"))
    }

    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn clock_speed(&self) -> Result<Option<ClockSpeed>, ConfigError> {
        self.speed.as_deref().map(parse_speed).transpose()
    }

    /// Reset `machine`, then apply the settings. A reset restores the
    /// arbiter's power-on control registers, so it has to come first.
    pub fn boot(&self, machine: &mut dyn Machine) -> Result<(), ConfigError> {
        machine.reset();
        self.apply(machine)
    }

    /// Push the settings into the machine and copy the `[[load]]` files
    /// into memory.
    pub fn apply(&self, machine: &mut dyn Machine) -> Result<(), ConfigError> {
        let speed = self.clock_speed()?;
        let config = machine.config_mut();
        if let Some(speed) = speed {
            config.speed = speed;
        }
        config.overlays = self.overlays.into();

        if let Some(latency) = self.slow_latency {
            machine.arbiter_mut().set_slow_latency(latency);
        }
        if let Some(bank) = self.shadow_bank {
            machine.arbiter_mut().set_shadow_bank(bank);
        }

        for entry in &self.load {
            let data = fs::read(&entry.file).map_err(|source| ConfigError::Io {
                path: entry.file.clone(),
                source,
            })?;
            info!(
                "loading {} ({} bytes) at ${:07X}",
                entry.file.display(),
                data.len(),
                entry.address
            );
            machine.load(entry.address, &data);
        }
        Ok(())
    }
}

/// Accepts `1`, `2`, `3.5` and `full`, with or without a `mhz` suffix.
pub fn parse_speed(text: &str) -> Result<ClockSpeed, ConfigError> {
    let lower = text.trim().to_ascii_lowercase();
    match lower.trim_end_matches("mhz").trim() {
        "1" => Ok(ClockSpeed::Mhz1),
        "2" => Ok(ClockSpeed::Mhz2),
        "3.5" => Ok(ClockSpeed::Mhz3_5),
        "full" | "40" => Ok(ClockSpeed::Full),
        _ => Err(ConfigError::UnknownSpeed(text.to_string())),
    }
}
