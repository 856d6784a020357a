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

//! In-memory wire used by the CLI demo and the tests.
//!
//! `SimWire` behaves like a non-blocking bus driver: `request_temperature`
//! starts a conversion, `update` completes it once the configured interval of
//! simulated time has passed. Sensors can be attached or detached at any time
//! but only become visible to callers after `rescan_wire`.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tw_error::LookupError;

use crate::address::{DeviceAddress, DS18B20_FAMILY};
use crate::wire::{Resolution, UnitsOfMeasure, Wire};

/// Most sensors a generated wire can carry with distinct addresses.
pub const MAX_SIM_SENSORS: usize = u8::MAX as usize + 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SimSensor {
    pub address: DeviceAddress,
    pub name: String,
    pub temp_c: f32,
    pub connected: bool,
    /// Simulated clock value of the last completed conversion, 0 if none.
    pub last_valid_ms: u64,
    valid: bool,
}

impl SimSensor {
    pub fn new(address: DeviceAddress, name: impl Into<String>, temp_c: f32) -> Self {
        Self {
            address,
            name: name.into(),
            temp_c,
            connected: true,
            last_valid_ms: 0,
            valid: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimWire {
    name: String,
    gpio: u8,
    sensors: Vec<SimSensor>,
    attached: Vec<SimSensor>,
    resolution: Resolution,
    units: UnitsOfMeasure,
    interval_ms: u64,
    names_path: Option<PathBuf>,
    clock_ms: u64,
    requested_at: Option<u64>,
    pub begun: bool,
    pub updates: u32,
    pub rescans: u32,
    pub requests: u32,
}

impl SimWire {
    pub fn new(name: impl Into<String>, gpio: u8) -> Self {
        Self {
            name: name.into(),
            gpio,
            sensors: Vec::new(),
            attached: Vec::new(),
            resolution: Resolution::default(),
            units: UnitsOfMeasure::default(),
            interval_ms: Resolution::default().conversion_time_ms(),
            names_path: None,
            clock_ms: 0,
            requested_at: None,
            begun: false,
            updates: 0,
            rescans: 0,
            requests: 0,
        }
    }

    /// Wire with `count` unnamed sensors already discovered.
    ///
    /// Addresses are `40.<gpio>.<i>.0.0.0.0.0`, temperatures `20 + i` °C.
    /// The index byte limits a wire to [`MAX_SIM_SENSORS`] sensors; extra ones are not created.
    pub fn with_sensors(name: impl Into<String>, gpio: u8, count: usize) -> Self {
        let mut wire = Self::new(name, gpio);
        for i in (0..=u8::MAX).take(count) {
            wire.attach(SimSensor::new(
                DeviceAddress::new([DS18B20_FAMILY, gpio, i, 0, 0, 0, 0, 0]),
                "",
                20.0 + f32::from(i),
            ));
        }
        wire.rescan_wire();
        wire.rescans = 0;
        wire
    }

    /// Wrap in a handle suitable for `SensorArray::add_wire`.
    pub fn into_handle(self) -> Rc<RefCell<SimWire>> {
        Rc::new(RefCell::new(self))
    }

    /// Physically connect a sensor; visible after the next rescan.
    pub fn attach(&mut self, sensor: SimSensor) {
        self.attached.push(sensor);
    }

    /// Physically remove a sensor; visible after the next rescan.
    pub fn detach(&mut self, address: &DeviceAddress) -> bool {
        let before = self.attached.len();
        self.attached.retain(|s| s.address != *address);
        before != self.attached.len()
    }

    /// Move the simulated clock forward.
    pub fn advance(&mut self, ms: u64) {
        self.clock_ms += ms;
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn set_temperature(&mut self, index: usize, celsius: f32) -> Result<(), LookupError> {
        let sensor = self.sensors.get_mut(index).ok_or(LookupError::IndexOutOfRange)?;
        sensor.temp_c = celsius;
        Ok(())
    }

    pub fn set_connected(&mut self, index: usize, connected: bool) -> Result<(), LookupError> {
        let sensor = self.sensors.get_mut(index).ok_or(LookupError::IndexOutOfRange)?;
        sensor.connected = connected;
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn units(&self) -> UnitsOfMeasure {
        self.units
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn names_path(&self) -> Option<&PathBuf> {
        self.names_path.as_ref()
    }

    pub fn sensors(&self) -> &[SimSensor] {
        &self.sensors
    }

    fn reading(&self, sensor: &SimSensor) -> f32 {
        if sensor.connected && sensor.valid {
            self.units.from_celsius(sensor.temp_c)
        } else {
            self.units.disconnected()
        }
    }

    fn find_by_name(&self, name: &str) -> Result<&SimSensor, LookupError> {
        self.sensors
            .iter()
            .find(|s| s.name == name)
            .ok_or(LookupError::NameNotFound)
    }

    fn sensor(&self, index: usize) -> Result<&SimSensor, LookupError> {
        self.sensors.get(index).ok_or(LookupError::IndexOutOfRange)
    }
}

impl Wire for SimWire {
    fn wire_name(&self) -> String {
        self.name.clone()
    }

    fn set_wire_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn gpio(&self) -> u8 {
        self.gpio
    }

    fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    fn begin(&mut self, resolution: Resolution, units: UnitsOfMeasure, interval_ms: u64) {
        self.resolution = resolution;
        self.units = units;
        self.interval_ms = interval_ms.max(resolution.conversion_time_ms());
        self.begun = true;
    }

    fn update(&mut self) {
        self.updates += 1;
        let Some(started) = self.requested_at else {
            return;
        };
        if self.clock_ms.saturating_sub(started) < self.interval_ms {
            return;
        }
        let now = self.clock_ms;
        for sensor in self.sensors.iter_mut().filter(|s| s.connected) {
            sensor.valid = true;
            sensor.last_valid_ms = now;
        }
        self.requested_at = None;
    }

    fn rescan_wire(&mut self) {
        self.rescans += 1;
        // Keep names and readings of sensors that are still present.
        let previous = std::mem::take(&mut self.sensors);
        self.sensors = self
            .attached
            .iter()
            .map(|a| {
                previous
                    .iter()
                    .find(|p| p.address == a.address)
                    .cloned()
                    .unwrap_or_else(|| a.clone())
            })
            .collect();
    }

    fn request_temperature(&mut self) {
        self.requests += 1;
        if self.requested_at.is_none() {
            self.requested_at = Some(self.clock_ms);
        }
    }

    fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    fn set_units_of_measure(&mut self, units: UnitsOfMeasure) {
        self.units = units;
    }

    fn set_path_of_sensor_names(&mut self, path: Option<PathBuf>) {
        self.names_path = path;
    }

    fn temp_by_index(&self, index: usize) -> Result<f32, LookupError> {
        self.sensor(index).map(|s| self.reading(s))
    }

    fn temp_by_name(&self, name: &str) -> Result<f32, LookupError> {
        self.find_by_name(name).map(|s| self.reading(s))
    }

    fn sensor_name_by_index(&self, index: usize) -> Result<String, LookupError> {
        self.sensor(index).map(|s| s.name.clone())
    }

    fn set_sensor_name_by_index(&mut self, index: usize, name: &str) -> Result<(), LookupError> {
        let sensor = self.sensors.get_mut(index).ok_or(LookupError::IndexOutOfRange)?;
        sensor.name = name.to_string();
        Ok(())
    }

    fn index_by_sensor_name(&self, name: &str) -> Result<usize, LookupError> {
        self.sensors
            .iter()
            .position(|s| s.name == name)
            .ok_or(LookupError::NameNotFound)
    }

    fn address_by_index(&self, index: usize) -> Result<DeviceAddress, LookupError> {
        self.sensor(index).map(|s| s.address)
    }

    fn set_sensor_name_by_address(&mut self, address: &DeviceAddress, name: &str) -> Result<(), LookupError> {
        let sensor = self
            .sensors
            .iter_mut()
            .find(|s| s.address == *address)
            .ok_or(LookupError::AddressNotFound)?;
        sensor.name = name.to_string();
        Ok(())
    }

    fn last_time_of_valid_temp_by_index(&self, index: usize) -> Result<u64, LookupError> {
        self.sensor(index).map(|s| s.last_valid_ms)
    }

    fn last_time_of_valid_temp_by_name(&self, name: &str) -> Result<u64, LookupError> {
        self.find_by_name(name).map(|s| s.last_valid_ms)
    }
}
