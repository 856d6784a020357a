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

//! Ordered set of wires.
//!
//! Insertion order is the only topology: it defines the order in which
//! sensors are flattened into global indices.

use std::slice;

use tracing::debug;

use crate::wire::{same_wire, WireHandle};

/// Append-only list of wires with unique identity, name and GPIO.
#[derive(Default)]
pub struct WireRegistry {
    wires: Vec<WireHandle>,
}

impl WireRegistry {
    pub fn new() -> Self {
        Self { wires: Vec::new() }
    }

    /// Register a wire.
    ///
    /// The wire is dropped (and `false` returned) if the same object, a wire
    /// with the same name, or a wire on the same GPIO is already registered.
    pub fn add(&mut self, wire: WireHandle) -> bool {
        let (name, gpio) = {
            let w = wire.borrow();
            (w.wire_name(), w.gpio())
        };

        for existing in &self.wires {
            if same_wire(existing, &wire) {
                debug!(wire = %name, "Wire already registered, ignoring");
                return false;
            }
            let e = existing.borrow();
            if e.wire_name() == name {
                debug!(wire = %name, "Wire name already in use, ignoring");
                return false;
            }
            if e.gpio() == gpio {
                debug!(wire = %name, gpio, "GPIO already in use, ignoring");
                return false;
            }
        }

        debug!(wire = %name, gpio, position = self.wires.len(), "Registered wire");
        self.wires.push(wire);
        // Wires are added once at setup; keep no spare capacity.
        self.wires.shrink_to_fit();
        true
    }

    pub fn len(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WireHandle> {
        self.wires.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, WireHandle> {
        self.wires.iter()
    }

    pub fn as_slice(&self) -> &[WireHandle] {
        &self.wires
    }

    /// Position of `wire` in the registry, by identity.
    pub fn position(&self, wire: &WireHandle) -> Option<usize> {
        self.wires.iter().position(|w| same_wire(w, wire))
    }

    /// True if a wire other than the one at `skip` is named `name`.
    pub(crate) fn name_taken(&self, name: &str, skip: usize) -> bool {
        self.wires
            .iter()
            .enumerate()
            .any(|(i, w)| i != skip && w.borrow().wire_name() == name)
    }
}

impl<'a> IntoIterator for &'a WireRegistry {
    type Item = &'a WireHandle;
    type IntoIter = slice::Iter<'a, WireHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.wires.iter()
    }
}
