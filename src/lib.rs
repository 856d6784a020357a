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

//! Thermowire - several one-wire temperature buses behind one flat sensor index
//!
//! Wires are registered in order; sensor `i` of the array is found by walking
//! the wires' live sensor counts. Names bound to device addresses can be
//! saved to a JSON file.

pub mod address;
pub mod array;
pub mod config;
pub mod logger;
pub mod names;
pub mod registry;
pub mod resolver;
pub mod sim;
pub mod wire;

#[cfg(test)]
pub mod test_utils;

pub use address::DeviceAddress;
pub use array::{SensorArray, SensorInfo};
pub use names::{FileSystem, NameStore, SaveOutcome, StdFileSystem};
pub use registry::WireRegistry;
pub use resolver::{locate, IndexResolver, Location};
pub use sim::{SimSensor, SimWire};
pub use wire::{Resolution, UnitsOfMeasure, Wire, WireHandle};
pub use tw_error::{LookupError, Result, ThermowireError};
