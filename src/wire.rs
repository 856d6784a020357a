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

//! The bus driver contract.
//!
//! A `Wire` is one physical OneWire bus together with the driver that owns the
//! sensors discovered on it. The array never talks to hardware; it only calls
//! these methods. Local indices passed to a wire are always below the
//! `sensor_count()` the wire reported during the same call.

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use serde::Serialize;
use tw_error::{LookupError, ThermowireError};

use crate::address::DeviceAddress;

/// Reading reported by a DS18B20 with no valid conversion, in Celsius.
pub const DEVICE_DISCONNECTED_C: f32 = -127.0;

/// Reading reported by a DS18B20 with no valid conversion, in Fahrenheit.
pub const DEVICE_DISCONNECTED_F: f32 = -196.6;

/// Shared handle to a wire.
///
/// The caller that builds a wire keeps its own clone; the registry only
/// orders and dispatches to it.
pub type WireHandle = Rc<RefCell<dyn Wire>>;

/// True when both handles point at the same wire object.
pub fn same_wire(a: &WireHandle, b: &WireHandle) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// Conversion bit depth of a sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    #[default]
    Bits12,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    /// Worst-case conversion time from the DS18B20 datasheet.
    pub const fn conversion_time_ms(self) -> u64 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }
}

impl FromStr for Resolution {
    type Err = ThermowireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Resolution::from_bits)
            .ok_or_else(|| ThermowireError::invalid_config("resolution", format!("'{}' is not 9, 10, 11 or 12", s)))
    }
}

/// Unit in which temperatures are reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsOfMeasure {
    #[default]
    Celsius,
    Fahrenheit,
}

impl UnitsOfMeasure {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnitsOfMeasure::Celsius => "C",
            UnitsOfMeasure::Fahrenheit => "F",
        }
    }

    /// Sentinel returned in place of a temperature when no reading is available.
    pub const fn disconnected(self) -> f32 {
        match self {
            UnitsOfMeasure::Celsius => DEVICE_DISCONNECTED_C,
            UnitsOfMeasure::Fahrenheit => DEVICE_DISCONNECTED_F,
        }
    }

    pub fn from_celsius(self, celsius: f32) -> f32 {
        match self {
            UnitsOfMeasure::Celsius => celsius,
            UnitsOfMeasure::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl fmt::Display for UnitsOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitsOfMeasure {
    type Err = ThermowireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(UnitsOfMeasure::Celsius),
            "f" | "fahrenheit" => Ok(UnitsOfMeasure::Fahrenheit),
            _ => Err(ThermowireError::invalid_config("units", format!("'{}' is not C or F", s))),
        }
    }
}

/// One sensor bus and its driver.
///
/// Implementations own sensor discovery and conversion timing; every method
/// must return without blocking.
#[cfg_attr(test, mockall::automock)]
pub trait Wire {
    fn wire_name(&self) -> String;

    fn set_wire_name(&mut self, name: &str);

    fn gpio(&self) -> u8;

    /// Number of sensors currently known on this bus. May change after a rescan.
    fn sensor_count(&self) -> usize;

    fn begin(&mut self, resolution: Resolution, units: UnitsOfMeasure, interval_ms: u64);

    /// Advance the driver's non-blocking state machine.
    fn update(&mut self);

    fn rescan_wire(&mut self);

    fn request_temperature(&mut self);

    fn set_resolution(&mut self, resolution: Resolution);

    fn set_units_of_measure(&mut self, units: UnitsOfMeasure);

    fn set_path_of_sensor_names(&mut self, path: Option<PathBuf>);

    fn temp_by_index(&self, index: usize) -> Result<f32, LookupError>;

    fn temp_by_name(&self, name: &str) -> Result<f32, LookupError>;

    fn sensor_name_by_index(&self, index: usize) -> Result<String, LookupError>;

    fn set_sensor_name_by_index(&mut self, index: usize, name: &str) -> Result<(), LookupError>;

    fn index_by_sensor_name(&self, name: &str) -> Result<usize, LookupError>;

    fn address_by_index(&self, index: usize) -> Result<DeviceAddress, LookupError>;

    fn set_sensor_name_by_address(&mut self, address: &DeviceAddress, name: &str) -> Result<(), LookupError>;

    /// Milliseconds timestamp of the last valid conversion.
    fn last_time_of_valid_temp_by_index(&self, index: usize) -> Result<u64, LookupError>;

    fn last_time_of_valid_temp_by_name(&self, name: &str) -> Result<u64, LookupError>;
}
