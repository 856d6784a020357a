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

//! Global index resolution.
//!
//! Sensors are numbered across all wires in registry order: the first wire's
//! sensors come first, then the second wire's, and so on. Counts are read from
//! the wires on every call because a rescan can change them at any time.
//!
//! Indices are therefore **not stable**: after a wire gains or loses a sensor,
//! every index at or past that wire's offset may name a different sensor.

use tw_error::LookupError;

use crate::address::DeviceAddress;
use crate::registry::WireRegistry;
use crate::wire::{Wire, WireHandle};

/// Where a global index lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Position of the wire in the registry.
    pub wire: usize,
    /// Index of the sensor within that wire.
    pub local: usize,
}

/// Map `index` onto per-wire `counts`.
///
/// The owning wire is the first one whose cumulative count exceeds `index`;
/// wires with no sensors are skipped naturally.
pub fn locate<I>(counts: I, index: usize) -> Option<Location>
where
    I: IntoIterator<Item = usize>,
{
    let mut pointer = 0usize;
    for (wire, count) in counts.into_iter().enumerate() {
        if pointer + count > index {
            return Some(Location { wire, local: index - pointer });
        }
        pointer += count;
    }
    None
}

/// Resolves indices, names and addresses against a registry snapshot.
#[derive(Clone, Copy)]
pub struct IndexResolver<'a> {
    wires: &'a [WireHandle],
}

impl<'a> IndexResolver<'a> {
    pub fn new(registry: &'a WireRegistry) -> Self {
        Self { wires: registry.as_slice() }
    }

    fn counts(&self) -> impl Iterator<Item = usize> + 'a {
        let wires = self.wires;
        wires.iter().map(|w| w.borrow().sensor_count())
    }

    pub fn total_sensor_count(&self) -> usize {
        self.counts().sum()
    }

    pub fn resolve(&self, index: usize) -> Result<Location, LookupError> {
        locate(self.counts(), index).ok_or(LookupError::IndexOutOfRange)
    }

    /// Run `f` against the wire owning `index`, with the local index.
    ///
    /// Nothing is forwarded when the index is out of range.
    pub fn with_wire<T, F>(&self, index: usize, f: F) -> Result<T, LookupError>
    where
        F: FnOnce(&dyn Wire, usize) -> Result<T, LookupError>,
    {
        let loc = self.resolve(index)?;
        let wire = self.wires[loc.wire].borrow();
        f(&*wire, loc.local)
    }

    pub fn with_wire_mut<T, F>(&self, index: usize, f: F) -> Result<T, LookupError>
    where
        F: FnOnce(&mut dyn Wire, usize) -> Result<T, LookupError>,
    {
        let loc = self.resolve(index)?;
        let mut wire = self.wires[loc.wire].borrow_mut();
        f(&mut *wire, loc.local)
    }

    /// Lowest global index whose sensor is named `name`.
    pub fn find_index_by_name(&self, name: &str) -> Result<usize, LookupError> {
        let mut pointer = 0usize;
        for wire in self.wires {
            let w = wire.borrow();
            if let Ok(local) = w.index_by_sensor_name(name) {
                return Ok(pointer + local);
            }
            pointer += w.sensor_count();
        }
        Err(LookupError::NameNotFound)
    }

    /// Lowest global index whose sensor has exactly `address`.
    pub fn find_index_by_address(&self, address: &DeviceAddress) -> Result<usize, LookupError> {
        let mut pointer = 0usize;
        for wire in self.wires {
            let w = wire.borrow();
            let count = w.sensor_count();
            for local in 0..count {
                if w.address_by_index(local).as_ref() == Ok(address) {
                    return Ok(pointer + local);
                }
            }
            pointer += count;
        }
        Err(LookupError::AddressNotFound)
    }
}
