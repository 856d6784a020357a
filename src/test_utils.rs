/*
 * Test utilities and mock helpers for Thermowire
 *
 * This module provides common test utilities, mock wires and writers
 * that can be used across different test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::registry::WireRegistry;
    use crate::sim::SimWire;
    use crate::wire::{MockWire, Wire, WireHandle};
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    /// Creates a MockWire that answers identity and count queries
    pub fn mock_wire_with(name: &str, gpio: u8, count: usize) -> MockWire {
        let mut wire = MockWire::new();
        wire.expect_wire_name().return_const(name.to_string());
        wire.expect_gpio().return_const(gpio);
        wire.expect_sensor_count().return_const(count);
        wire
    }

    /// Same as `mock_wire_with`, already wrapped in a handle
    pub fn mock_wire(name: &str, gpio: u8, count: usize) -> WireHandle {
        Rc::new(RefCell::new(mock_wire_with(name, gpio, count)))
    }

    /// Registry of mock wires `w0`, `w1`, ... with the given sensor counts
    pub fn registry_with_counts(counts: &[usize]) -> WireRegistry {
        let mut registry = WireRegistry::new();
        for (i, &count) in counts.iter().enumerate() {
            registry.add(mock_wire(&format!("w{}", i), i as u8, count));
        }
        registry
    }

    /// Simulated wire whose sensors carry the given names, in order
    pub fn named_sim_wire(name: &str, gpio: u8, names: &[&str]) -> WireHandle {
        let mut wire = SimWire::with_sensors(name, gpio, names.len());
        for (i, n) in names.iter().enumerate() {
            wire.set_sensor_name_by_index(i, n).unwrap();
        }
        Rc::new(RefCell::new(wire))
    }

    /// Writer that keeps everything written, shareable with the test body
    #[derive(Clone, Default)]
    pub struct SharedBuffer {
        data: Arc<Mutex<Vec<u8>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
        }

        pub fn flushes(&self) -> usize {
            *self.flushes.lock().unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.flushes.lock().unwrap() += 1;
            Ok(())
        }
    }

    /// Writer that fails every write, like a full disk
    pub struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use std::io::Write;

    #[test]
    fn test_registry_with_counts() {
        let registry = registry_with_counts(&[2, 0, 3]);
        assert_eq!(registry.len(), 3);
        let counts: Vec<usize> = registry.iter().map(|w| w.borrow().sensor_count()).collect();
        assert_eq!(counts, vec![2, 0, 3]);
    }

    #[test]
    fn test_named_sim_wire() {
        let wire = named_sim_wire("a", 4, &["x", "y"]);
        assert_eq!(wire.borrow().index_by_sensor_name("y"), Ok(1));
    }

    #[test]
    fn test_shared_buffer() {
        let buffer = SharedBuffer::default();
        let mut writer = buffer.clone();
        writer.write_all(b"{}").unwrap();
        writer.flush().unwrap();
        assert_eq!(buffer.contents(), "{}");
        assert_eq!(buffer.flushes(), 1);
    }

    #[test]
    fn test_failing_writer() {
        assert!(FailingWriter.write_all(b"x").is_err());
    }
}
