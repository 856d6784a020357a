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

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use thermowire::config::{default_names_path, ArrayConfig, WireSpec};
use thermowire::logger;
use thermowire::address::DS18B20_FAMILY;
use thermowire::{DeviceAddress, SaveOutcome, SensorArray, SimSensor, SimWire, Wire};

const USAGE: &str = "usage: thermowire [--logging] [status|save]";

fn demo_wires() -> Vec<WireSpec> {
    vec![
        WireSpec { name: "wire-a".to_string(), gpio: 4, sensors: 2 },
        WireSpec { name: "wire-b".to_string(), gpio: 5, sensors: 3 },
    ]
}

/// Simulated wire whose sensors carry CRC-valid DS18B20 addresses.
fn build_wire(spec: &WireSpec) -> Rc<RefCell<SimWire>> {
    let mut wire = SimWire::new(spec.name.as_str(), spec.gpio);
    for i in (0..=u8::MAX).take(spec.sensors) {
        let serial = [spec.gpio, i, 0, 0, 0, 0];
        let address = DeviceAddress::with_crc(DS18B20_FAMILY, serial);
        wire.attach(SimSensor::new(address, "", 18.0 + f32::from(i) * 1.5));
    }
    wire.rescan_wire();
    wire.into_handle()
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    logger::init_tracing("info");

    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    let command = args
        .iter()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("status");
    if command != "status" && command != "save" {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let mut cfg = ArrayConfig::from_env()?;
    if cfg.wires.is_empty() {
        cfg.wires = demo_wires();
    }
    cfg.validate()?;
    if logging_enabled {
        logger::log_event("config", serde_json::to_value(&cfg)?);
    }

    // Keep our own handles so the simulated clock can be driven.
    let mut sims: Vec<Rc<RefCell<SimWire>>> = Vec::new();
    let mut array = SensorArray::new();
    for spec in &cfg.wires {
        let sim = build_wire(spec);
        if array.add_wire(sim.clone()) {
            sims.push(sim);
        } else {
            warn!(wire = %spec.name, gpio = spec.gpio, "Wire not added");
        }
    }

    let names_path = cfg.names_path.clone().unwrap_or_else(default_names_path);
    array.begin_with_names(cfg.resolution, cfg.units, cfg.interval_ms, names_path);

    for info in array.sensors() {
        if info.name.as_deref().map_or(true, str::is_empty) {
            let name = format!("{}-{}", info.wire_name, info.local_index);
            array.set_sensor_name_by_index(info.index, &name)?;
        }
    }

    array.request_temperature();
    for sim in &sims {
        sim.borrow_mut().advance(cfg.interval_ms);
    }
    array.update();

    match command {
        "save" => match array.save_sensor_names()? {
            SaveOutcome::Saved { path, entries } => {
                println!("Wrote {} sensor names to {}", entries, path.display());
                if logging_enabled {
                    logger::log_event(
                        "names_saved",
                        serde_json::json!({ "path": path, "entries": entries }),
                    );
                }
            }
            SaveOutcome::Skipped => println!("No sensor names path configured"),
        },
        _ => {
            println!(
                "{} wires, {} sensors, {}-bit, units {}",
                array.wire_count(),
                array.sensor_count(),
                array.resolution().bits(),
                array.units_of_measure_str()
            );
            for info in array.sensors() {
                let address = match info.address {
                    Some(a) if a.has_valid_crc() => a.to_string(),
                    Some(a) => format!("{} (bad crc)", a),
                    None => "?".to_string(),
                };
                println!(
                    "{:>3}  {}[{}] gpio {:<3} {:<24} {:<16} {:>8.2} {}",
                    info.index,
                    info.wire_name,
                    info.local_index,
                    info.gpio,
                    address,
                    info.name.unwrap_or_default(),
                    array.temp_by_index_or_disconnected(info.index),
                    array.units_of_measure_str()
                );
            }
        }
    }

    if logging_enabled {
        logger::log_event("exit", serde_json::json!({ "command": command }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_wire_discovers_crc_valid_sensors() {
        let spec = WireSpec { name: "boiler".to_string(), gpio: 4, sensors: 3 };
        let wire = build_wire(&spec);
        let wire = wire.borrow();
        assert_eq!(wire.sensor_count(), 3);
        for i in 0..3 {
            let address = wire.address_by_index(i).unwrap();
            assert_eq!(address.family_code(), DS18B20_FAMILY);
            assert!(address.has_valid_crc());
        }
    }

    #[test]
    fn test_demo_wires_are_valid_config() {
        let cfg = ArrayConfig { wires: demo_wires(), ..ArrayConfig::default() };
        assert!(cfg.validate().is_ok());
    }
}
