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

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const DEFAULT_LOG_PATH: &str = "/var/log/thermowire/events.json";
const FALLBACK_LOG_PATH: &str = "/tmp/thermowire_events.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Install the stdout tracing subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    // A subscriber may already be installed (tests, embedding apps).
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .try_init();
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Send events to `path` from now on.
pub fn init_logging_at(path: &Path) -> io::Result<()> {
    let f = open_append(path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(f);
    }
    Ok(())
}

pub fn init_logging() {
    if init_logging_at(Path::new(DEFAULT_LOG_PATH)).is_err() {
        // /var/log may not be writable for normal users
        let _ = init_logging_at(Path::new(FALLBACK_LOG_PATH));
    }
}

/// Stop writing to the event log.
pub fn close_logging() {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = None;
    }
}

pub fn log_event(event: &str, data: Value) {
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{}", line);
            return;
        }
    }
    // Not initialised: events are dropped, tracing still sees them.
    tracing::debug!(event, "Event log not initialised");
}
