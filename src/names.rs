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

//! Persistence of the sensor name map.
//!
//! All sensors of all wires are written to one JSON object mapping the
//! dotted-decimal address to the sensor's name, in registry order then local
//! index order:
//!
//! ```json
//! {"40.1.2.3.4.5.6.7":"boiler","40.1.2.3.4.5.6.8":"return"}
//! ```
//!
//! Saving is best effort. A missing path skips the save; file errors are
//! logged and returned but never panic.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use tw_error::{Result, ThermowireError};

use crate::registry::WireRegistry;

/// Where the name map gets written.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// Open `path` for writing, truncating any previous content.
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>>;
}

/// Local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(File::create(path)?))
    }
}

/// Result of a save that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No path configured; nothing was written.
    Skipped,
    Saved { path: PathBuf, entries: usize },
}

pub struct NameStore<F: FileSystem = StdFileSystem> {
    fs: F,
    path: Option<PathBuf>,
}

impl Default for NameStore<StdFileSystem> {
    fn default() -> Self {
        Self::new(StdFileSystem)
    }
}

impl<F: FileSystem> NameStore<F> {
    pub fn new(fs: F) -> Self {
        Self { fs, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path.filter(|p| !p.as_os_str().is_empty());
    }

    /// Collect `address -> name` for every readable sensor.
    ///
    /// An address reported by more than one sensor keeps the first name seen.
    pub fn collect(wires: &WireRegistry) -> Map<String, Value> {
        let mut map = Map::new();
        for wire in wires {
            let w = wire.borrow();
            for local in 0..w.sensor_count() {
                let address = match w.address_by_index(local) {
                    Ok(a) => a,
                    Err(e) => {
                        debug!(wire = %w.wire_name(), local, error = %e, "Skipping sensor without address");
                        continue;
                    }
                };
                let name = match w.sensor_name_by_index(local) {
                    Ok(n) => n,
                    Err(e) => {
                        debug!(wire = %w.wire_name(), local, error = %e, "Skipping sensor without name");
                        continue;
                    }
                };
                let key = address.to_string();
                if map.contains_key(&key) {
                    // Lookups by address resolve to the lowest index; keep that name.
                    debug!(wire = %w.wire_name(), local, address = %key, "Skipping duplicate address");
                    continue;
                }
                map.insert(key, Value::String(name));
            }
        }
        map
    }

    /// Render the name map as a compact JSON document.
    pub fn to_json(wires: &WireRegistry) -> Result<String> {
        Ok(serde_json::to_string(&Value::Object(Self::collect(wires)))?)
    }

    /// Write the name map to the configured path.
    pub fn save(&self, wires: &WireRegistry) -> Result<SaveOutcome> {
        let Some(path) = self.path.as_ref() else {
            debug!("No sensor names path configured, skipping save");
            return Ok(SaveOutcome::Skipped);
        };

        let map = Self::collect(wires);
        let entries = map.len();
        let json = serde_json::to_string(&Value::Object(map))?;

        let mut file = match self.fs.create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = ?path, error = %e, "Error opening sensor names file for writing");
                return Err(ThermowireError::FileOpen { path: path.clone(), source: e });
            }
        };
        debug!(path = ?path, %json, "Writing sensor names");

        if let Err(e) = file.write_all(json.as_bytes()).and_then(|_| file.flush()) {
            warn!(path = ?path, error = %e, "Error writing sensor names file");
            return Err(ThermowireError::FileWrite { path: path.clone(), source: e });
        }

        info!(path = ?path, entries, "Saved sensor names");
        Ok(SaveOutcome::Saved { path: path.clone(), entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::DeviceAddress;
    use crate::resolver::IndexResolver;
    use crate::sim::{SimSensor, SimWire};
    use crate::test_utils::test_utils::{named_sim_wire, FailingWriter, SharedBuffer};
    use crate::wire::Wire;

    fn registry() -> WireRegistry {
        let mut registry = WireRegistry::new();
        registry.add(named_sim_wire("a", 4, &["boiler", "return"]));
        registry.add(named_sim_wire("b", 5, &[]));
        registry.add(named_sim_wire("c", 6, &["attic"]));
        registry
    }

    #[test]
    fn test_no_path_makes_no_filesystem_call() {
        let mut fs = MockFileSystem::new();
        fs.expect_create().never();
        let store = NameStore::new(fs);
        assert_eq!(store.save(&registry()).unwrap(), SaveOutcome::Skipped);
    }

    #[test]
    fn test_empty_path_is_treated_as_unset() {
        let mut fs = MockFileSystem::new();
        fs.expect_create().never();
        let mut store = NameStore::new(fs);
        store.set_path(Some(PathBuf::new()));
        assert!(store.path().is_none());
        assert_eq!(store.save(&registry()).unwrap(), SaveOutcome::Skipped);
    }

    #[test]
    fn test_document_order_and_format() {
        let json = NameStore::<StdFileSystem>::to_json(&registry()).unwrap();
        assert_eq!(
            json,
            "{\"40.4.0.0.0.0.0.0\":\"boiler\",\"40.4.1.0.0.0.0.0\":\"return\",\"40.6.0.0.0.0.0.0\":\"attic\"}"
        );
    }

    #[test]
    fn test_duplicate_address_keeps_first_name() {
        let shared = DeviceAddress::new([40, 1, 2, 3, 4, 5, 6, 7]);
        let mut registry = WireRegistry::new();
        for (name, gpio, sensor) in [("a", 1, "first"), ("b", 2, "second")] {
            let mut wire = SimWire::new(name, gpio);
            wire.attach(SimSensor::new(shared, sensor, 20.0));
            wire.rescan_wire();
            registry.add(wire.into_handle());
        }

        let map = NameStore::<StdFileSystem>::collect(&registry);
        assert_eq!(map.len(), 1);
        assert_eq!(map["40.1.2.3.4.5.6.7"], Value::String("first".to_string()));

        let resolver = IndexResolver::new(&registry);
        assert_eq!(resolver.find_index_by_address(&shared), Ok(0));
    }

    #[test]
    fn test_empty_registry_writes_empty_object() {
        let json = NameStore::<StdFileSystem>::to_json(&WireRegistry::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_save_writes_through_file_system() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let mut fs = MockFileSystem::new();
        fs.expect_create()
            .withf(|p| p == Path::new("/data/names.json"))
            .times(1)
            .returning(move |_| Ok(Box::new(sink.clone()) as Box<dyn Write>));

        let mut store = NameStore::new(fs);
        store.set_path(Some(PathBuf::from("/data/names.json")));
        let outcome = store.save(&registry()).unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::Saved { path: PathBuf::from("/data/names.json"), entries: 3 }
        );
        assert!(buffer.contents().starts_with("{\"40.4.0.0.0.0.0.0\":\"boiler\""));
        assert_eq!(buffer.flushes(), 1);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let mut fs = MockFileSystem::new();
        fs.expect_create()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")));
        let mut store = NameStore::new(fs);
        store.set_path(Some(PathBuf::from("/ro/names.json")));

        let err = store.save(&registry()).unwrap_err();
        assert!(matches!(err, ThermowireError::FileOpen { .. }));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut fs = MockFileSystem::new();
        fs.expect_create()
            .returning(|_| Ok(Box::new(FailingWriter) as Box<dyn Write>));
        let mut store = NameStore::new(fs);
        store.set_path(Some(PathBuf::from("/full/names.json")));

        let err = store.save(&registry()).unwrap_err();
        assert!(matches!(err, ThermowireError::FileWrite { .. }));
    }

    #[test]
    fn test_std_file_system_truncates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        std::fs::write(&path, "a much longer previous document that must disappear").unwrap();

        let mut store: NameStore = NameStore::default();
        store.set_path(Some(path.clone()));
        store.save(&registry()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with('{'));
        assert!(written.ends_with('}'));
        assert!(!written.contains("previous"));
    }
}
