/*
 * This file is part of Thermowire.
 *
 * Copyright (C) 2025 Thermowire contributors
 *
 * Thermowire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Thermowire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Thermowire. If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tw_error::{Result, ThermowireError};

use crate::sim::MAX_SIM_SENSORS;
use crate::wire::{Resolution, UnitsOfMeasure};

pub const ENV_RESOLUTION: &str = "THERMOWIRE_RESOLUTION";
pub const ENV_UNITS: &str = "THERMOWIRE_UNITS";
pub const ENV_INTERVAL_MS: &str = "THERMOWIRE_INTERVAL_MS";
pub const ENV_NAMES_PATH: &str = "THERMOWIRE_NAMES_PATH";
pub const ENV_WIRES: &str = "THERMOWIRE_WIRES";

/// One bus to bring up: `name:gpio:sensors` in `THERMOWIRE_WIRES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSpec {
    pub name: String,
    pub gpio: u8,
    /// Simulated sensor count, only used by the demo binary.
    pub sensors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayConfig {
    pub resolution: Resolution,
    pub units: UnitsOfMeasure,
    pub interval_ms: u64,
    /// Where sensor names are persisted. `None` disables saving.
    pub names_path: Option<PathBuf>,
    pub wires: Vec<WireSpec>,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Bits12,
            units: UnitsOfMeasure::Celsius,
            interval_ms: 1000,
            names_path: None,
            wires: Vec::new(),
        }
    }
}

pub fn default_names_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("thermowire").join("sensor_names.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("thermowire")
            .join("sensor_names.json");
    }
    PathBuf::from("/etc/thermowire/sensor_names.json")
}

fn is_safe_label(s: &str) -> bool {
    if s.is_empty() || s.len() > 64 {
        return false;
    }
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Parse `name:gpio:sensors[,name:gpio:sensors...]`. The sensor count defaults to 0.
pub fn parse_wire_specs(s: &str) -> Result<Vec<WireSpec>> {
    let mut out = Vec::new();
    for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let mut parts = item.split(':');
        let name = parts.next().unwrap_or_default().trim().to_string();
        let gpio = parts
            .next()
            .and_then(|g| g.trim().parse::<u8>().ok())
            .ok_or_else(|| ThermowireError::invalid_config("wires", format!("'{}' needs name:gpio", item)))?;
        let sensors = match parts.next() {
            Some(n) => n
                .trim()
                .parse::<usize>()
                .map_err(|_| ThermowireError::invalid_config("wires", format!("bad sensor count in '{}'", item)))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(ThermowireError::invalid_config("wires", format!("too many fields in '{}'", item)));
        }
        out.push(WireSpec { name, gpio, sensors });
    }
    Ok(out)
}

impl ArrayConfig {
    /// Defaults overridden by any `THERMOWIRE_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(v) = env::var(ENV_RESOLUTION) {
            cfg.resolution = v.parse()?;
        }
        if let Ok(v) = env::var(ENV_UNITS) {
            cfg.units = v.parse()?;
        }
        if let Ok(v) = env::var(ENV_INTERVAL_MS) {
            cfg.interval_ms = v
                .trim()
                .parse()
                .map_err(|_| ThermowireError::invalid_config("interval_ms", format!("'{}' is not a number", v)))?;
        }
        if let Ok(v) = env::var(ENV_NAMES_PATH) {
            cfg.names_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var(ENV_WIRES) {
            cfg.wires = parse_wire_specs(&v)?;
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let min = self.resolution.conversion_time_ms();
        if self.interval_ms < min {
            return Err(ThermowireError::invalid_config(
                "interval_ms",
                format!("{} ms is shorter than the {}-bit conversion time ({} ms)", self.interval_ms, self.resolution.bits(), min),
            ));
        }
        if let Some(p) = &self.names_path {
            if p.as_os_str().is_empty() {
                return Err(ThermowireError::invalid_config("names_path", "must not be empty"));
            }
        }
        if self.wires.len() > 64 {
            return Err(ThermowireError::invalid_config("wires", "too many wires (max 64)"));
        }
        let mut names = HashSet::new();
        let mut gpios = HashSet::new();
        for (i, w) in self.wires.iter().enumerate() {
            if !is_safe_label(&w.name) {
                return Err(ThermowireError::invalid_config("wires", format!("invalid name for wire #{}", i + 1)));
            }
            if !names.insert(w.name.as_str()) {
                return Err(ThermowireError::invalid_config("wires", format!("duplicate wire name '{}'", w.name)));
            }
            if !gpios.insert(w.gpio) {
                return Err(ThermowireError::invalid_config("wires", format!("duplicate GPIO {}", w.gpio)));
            }
            if w.sensors > MAX_SIM_SENSORS {
                return Err(ThermowireError::invalid_config(
                    "wires",
                    format!("wire '{}' has {} sensors (max {})", w.name, w.sensors, MAX_SIM_SENSORS),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [ENV_RESOLUTION, ENV_UNITS, ENV_INTERVAL_MS, ENV_NAMES_PATH, ENV_WIRES] {
            env::remove_var(key);
        }
    }

    fn create_test_config() -> ArrayConfig {
        ArrayConfig {
            wires: vec![
                WireSpec { name: "boiler".to_string(), gpio: 4, sensors: 2 },
                WireSpec { name: "floor".to_string(), gpio: 5, sensors: 3 },
            ],
            ..ArrayConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ArrayConfig::default();
        assert_eq!(cfg.resolution, Resolution::Bits12);
        assert_eq!(cfg.units, UnitsOfMeasure::Celsius);
        assert!(cfg.names_path.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var(ENV_RESOLUTION, "10");
        env::set_var(ENV_UNITS, "F");
        env::set_var(ENV_INTERVAL_MS, "250");
        env::set_var(ENV_NAMES_PATH, "/data/names.json");
        env::set_var(ENV_WIRES, "boiler:4:2, floor:5");
        let cfg = ArrayConfig::from_env().unwrap();
        clear_env();

        assert_eq!(cfg.resolution, Resolution::Bits10);
        assert_eq!(cfg.units, UnitsOfMeasure::Fahrenheit);
        assert_eq!(cfg.interval_ms, 250);
        assert_eq!(cfg.names_path, Some(PathBuf::from("/data/names.json")));
        assert_eq!(cfg.wires.len(), 2);
        assert_eq!(cfg.wires[1], WireSpec { name: "floor".to_string(), gpio: 5, sensors: 0 });
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        env::set_var(ENV_RESOLUTION, "16");
        assert!(ArrayConfig::from_env().is_err());
        clear_env();
        env::set_var(ENV_INTERVAL_MS, "soon");
        assert!(ArrayConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_default_names_path_with_xdg() {
        env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = default_names_path();
        assert_eq!(path, PathBuf::from("/custom/config/thermowire/sensor_names.json"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_default_names_path_with_home() {
        env::remove_var("XDG_CONFIG_HOME");
        env::set_var("HOME", "/home/testuser");
        let path = default_names_path();
        assert!(path.to_string_lossy().contains("/home/testuser/.config/thermowire/sensor_names.json"));
    }

    #[test]
    fn test_parse_wire_specs() {
        let specs = parse_wire_specs("a:4:1,b:5:0").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].gpio, 4);
        assert!(parse_wire_specs("").unwrap().is_empty());
        assert!(parse_wire_specs("a").is_err());
        assert!(parse_wire_specs("a:300").is_err());
        assert!(parse_wire_specs("a:4:x").is_err());
        assert!(parse_wire_specs("a:4:1:9").is_err());
    }

    #[test]
    fn test_validate_interval_shorter_than_conversion() {
        let mut cfg = create_test_config();
        cfg.interval_ms = 500;
        assert!(cfg.validate().is_err());
        cfg.resolution = Resolution::Bits11;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_duplicate_wires() {
        let mut cfg = create_test_config();
        cfg.wires[1].name = "boiler".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = create_test_config();
        cfg.wires[1].gpio = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_wire_names() {
        let mut cfg = create_test_config();
        cfg.wires[0].name = String::new();
        assert!(cfg.validate().is_err());
        cfg.wires[0].name = "bad name!".to_string();
        assert!(cfg.validate().is_err());
        cfg.wires[0].name = "a".repeat(65);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_sensor_count_limit() {
        let mut cfg = create_test_config();
        cfg.wires[0].sensors = MAX_SIM_SENSORS;
        assert!(cfg.validate().is_ok());
        cfg.wires[0].sensors = MAX_SIM_SENSORS + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_empty_names_path() {
        let mut cfg = create_test_config();
        cfg.names_path = Some(PathBuf::new());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let json = serde_json::to_value(create_test_config()).unwrap();
        assert_eq!(json["units"], "celsius");
        assert_eq!(json["wires"][0]["name"], "boiler");
    }

    #[test]
    fn test_is_safe_label() {
        assert!(is_safe_label("boiler"));
        assert!(is_safe_label("bus-2.a_b"));
        assert!(!is_safe_label(""));
        assert!(!is_safe_label("has space"));
        assert!(!is_safe_label("a/b"));
    }
}
