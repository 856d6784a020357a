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

//! `SensorArray`: all sensors of all wires behind one flat index.
//!
//! Broadcast operations (`update`, `rescan_wire`, `request_temperature`,
//! configuration setters) are applied to every wire in registry order and
//! never stop early. Indexed and named operations are routed to exactly one
//! wire through [`IndexResolver`]; the wire's own error is returned verbatim.
//!
//! Global indices are recomputed on every call and are not stable across
//! rescans.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tw_error::LookupError;

use crate::address::DeviceAddress;
use crate::names::{FileSystem, NameStore, SaveOutcome, StdFileSystem};
use crate::registry::WireRegistry;
use crate::resolver::IndexResolver;
use crate::wire::{Resolution, UnitsOfMeasure, WireHandle};

/// One row of [`SensorArray::sensors`].
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    pub index: usize,
    pub wire_name: String,
    pub gpio: u8,
    pub local_index: usize,
    pub address: Option<DeviceAddress>,
    pub name: Option<String>,
}

pub struct SensorArray<F: FileSystem = StdFileSystem> {
    wires: WireRegistry,
    resolution: Resolution,
    units: UnitsOfMeasure,
    names: NameStore<F>,
}

impl Default for SensorArray<StdFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorArray<StdFileSystem> {
    pub fn new() -> Self {
        Self::with_file_system(StdFileSystem)
    }
}

impl<F: FileSystem> SensorArray<F> {
    /// Array whose name map is written through `fs`.
    pub fn with_file_system(fs: F) -> Self {
        Self {
            wires: WireRegistry::new(),
            resolution: Resolution::default(),
            units: UnitsOfMeasure::default(),
            names: NameStore::new(fs),
        }
    }

    // ------------------------------------------------------------------
    // Wires
    // ------------------------------------------------------------------

    /// Add a wire. Returns `false` if it (or its name or GPIO) is already present.
    pub fn add_wire(&mut self, wire: WireHandle) -> bool {
        self.wires.add(wire)
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn wires(&self) -> &WireRegistry {
        &self.wires
    }

    pub fn wire_name(&self, wire_index: usize) -> Option<String> {
        self.wires.get(wire_index).map(|w| w.borrow().wire_name())
    }

    /// Rename the wire at `wire_index`. Refuses names used by another wire.
    pub fn set_wire_name(&mut self, wire_index: usize, name: &str) -> bool {
        let Some(wire) = self.wires.get(wire_index) else {
            return false;
        };
        if self.wires.name_taken(name, wire_index) {
            debug!(wire_index, name, "Wire name already in use");
            return false;
        }
        wire.borrow_mut().set_wire_name(name);
        true
    }

    fn resolver(&self) -> IndexResolver<'_> {
        IndexResolver::new(&self.wires)
    }

    /// Total number of sensors across all wires, counted now.
    pub fn sensor_count(&self) -> usize {
        self.resolver().total_sensor_count()
    }

    // ------------------------------------------------------------------
    // Broadcast
    // ------------------------------------------------------------------

    /// Initialise every wire with the same parameters.
    pub fn begin(&mut self, resolution: Resolution, units: UnitsOfMeasure, interval_ms: u64) {
        self.resolution = resolution;
        self.units = units;
        let path = self.names.path().map(PathBuf::from);
        for wire in &self.wires {
            let mut w = wire.borrow_mut();
            w.set_path_of_sensor_names(path.clone());
            w.begin(resolution, units, interval_ms);
        }
        info!(
            wires = self.wires.len(),
            bits = resolution.bits(),
            units = units.as_str(),
            interval_ms,
            "Sensor array started"
        );
    }

    /// `begin`, persisting sensor names at `path`.
    pub fn begin_with_names(
        &mut self,
        resolution: Resolution,
        units: UnitsOfMeasure,
        interval_ms: u64,
        path: impl Into<PathBuf>,
    ) {
        self.names.set_path(Some(path.into()));
        self.begin(resolution, units, interval_ms);
    }

    pub fn update(&mut self) {
        for wire in &self.wires {
            wire.borrow_mut().update();
        }
    }

    pub fn rescan_wire(&mut self) {
        for wire in &self.wires {
            let mut w = wire.borrow_mut();
            info!(wire = %w.wire_name(), "Rescanning wire");
            w.rescan_wire();
        }
    }

    pub fn request_temperature(&mut self) {
        for wire in &self.wires {
            wire.borrow_mut().request_temperature();
        }
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        for wire in &self.wires {
            wire.borrow_mut().set_resolution(resolution);
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_units_of_measure(&mut self, units: UnitsOfMeasure) {
        self.units = units;
        for wire in &self.wires {
            wire.borrow_mut().set_units_of_measure(units);
        }
    }

    pub fn units_of_measure(&self) -> UnitsOfMeasure {
        self.units
    }

    /// "C" or "F".
    pub fn units_of_measure_str(&self) -> &'static str {
        self.units.as_str()
    }

    // ------------------------------------------------------------------
    // Names file
    // ------------------------------------------------------------------

    pub fn names_path(&self) -> Option<&Path> {
        self.names.path()
    }

    /// Write the address -> name map of every sensor. Skipped when no path is set.
    pub fn save_sensor_names(&self) -> tw_error::Result<SaveOutcome> {
        self.names.save(&self.wires)
    }

    // ------------------------------------------------------------------
    // By global index
    // ------------------------------------------------------------------

    pub fn gpio_by_index(&self, index: usize) -> Result<u8, LookupError> {
        self.resolver().with_wire(index, |w, _| Ok(w.gpio()))
    }

    pub fn temp_by_index(&self, index: usize) -> Result<f32, LookupError> {
        self.resolver().with_wire(index, |w, local| w.temp_by_index(local))
    }

    /// Temperature, or the disconnected sentinel of the current unit on any error.
    pub fn temp_by_index_or_disconnected(&self, index: usize) -> f32 {
        self.temp_by_index(index).unwrap_or(self.units.disconnected())
    }

    pub fn sensor_name_by_index(&self, index: usize) -> Result<String, LookupError> {
        self.resolver().with_wire(index, |w, local| w.sensor_name_by_index(local))
    }

    pub fn set_sensor_name_by_index(&mut self, index: usize, name: &str) -> Result<(), LookupError> {
        self.resolver()
            .with_wire_mut(index, |w, local| w.set_sensor_name_by_index(local, name))
    }

    pub fn last_time_of_valid_temp_by_index(&self, index: usize) -> Result<u64, LookupError> {
        self.resolver()
            .with_wire(index, |w, local| w.last_time_of_valid_temp_by_index(local))
    }

    pub fn address_by_index(&self, index: usize) -> Result<DeviceAddress, LookupError> {
        self.resolver().with_wire(index, |w, local| w.address_by_index(local))
    }

    // ------------------------------------------------------------------
    // By name
    // ------------------------------------------------------------------

    /// Temperature of the first sensor (lowest global index) named `name`.
    pub fn temp_by_name(&self, name: &str) -> Result<f32, LookupError> {
        self.wires
            .iter()
            .find_map(|w| w.borrow().temp_by_name(name).ok())
            .ok_or(LookupError::NameNotFound)
    }

    pub fn temp_by_name_or_disconnected(&self, name: &str) -> f32 {
        self.temp_by_name(name).unwrap_or(self.units.disconnected())
    }

    pub fn last_time_of_valid_temp_by_name(&self, name: &str) -> Result<u64, LookupError> {
        self.wires
            .iter()
            .find_map(|w| w.borrow().last_time_of_valid_temp_by_name(name).ok())
            .ok_or(LookupError::NameNotFound)
    }

    /// Lowest global index of a sensor named `name`.
    pub fn index_by_sensor_name(&self, name: &str) -> Result<usize, LookupError> {
        self.resolver().find_index_by_name(name)
    }

    // ------------------------------------------------------------------
    // By address
    // ------------------------------------------------------------------

    pub fn index_by_address(&self, address: &DeviceAddress) -> Result<usize, LookupError> {
        self.resolver().find_index_by_address(address)
    }

    pub fn sensor_name_by_address(&self, address: &DeviceAddress) -> Result<String, LookupError> {
        let index = self.index_by_address(address)?;
        self.sensor_name_by_index(index)
    }

    /// Name the sensor with `address` on whichever wire claims it first.
    pub fn set_sensor_name_by_address(
        &mut self,
        address: &DeviceAddress,
        name: &str,
    ) -> Result<(), LookupError> {
        for wire in &self.wires {
            if wire.borrow_mut().set_sensor_name_by_address(address, name).is_ok() {
                return Ok(());
            }
        }
        Err(LookupError::AddressNotFound)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    /// Snapshot of every sensor in global index order.
    pub fn sensors(&self) -> Vec<SensorInfo> {
        let mut out = Vec::new();
        for wire in &self.wires {
            let w = wire.borrow();
            let (wire_name, gpio) = (w.wire_name(), w.gpio());
            for local_index in 0..w.sensor_count() {
                out.push(SensorInfo {
                    index: out.len(),
                    wire_name: wire_name.clone(),
                    gpio,
                    local_index,
                    address: w.address_by_index(local_index).ok(),
                    name: w.sensor_name_by_index(local_index).ok(),
                });
            }
        }
        out
    }
}
