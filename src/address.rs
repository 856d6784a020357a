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

//! Hardware addresses of OneWire temperature sensors.
//!
//! Every sensor carries a factory-programmed 8-byte ROM code: one family byte,
//! a 6-byte serial number and a CRC-8 over the first seven bytes. Addresses
//! are rendered as the eight bytes in decimal joined by `.` (for example
//! `40.1.2.3.4.5.6.7`); the persisted name map depends on that exact format.

use std::fmt;
use std::str::FromStr;

use crc::{Crc, CRC_8_MAXIM_DOW};
use tw_error::ThermowireError;

/// Number of bytes in a device address.
pub const ADDRESS_LEN: usize = 8;

/// Family code of the DS18B20 temperature sensor.
pub const DS18B20_FAMILY: u8 = 0x28;

// OneWire ROM codes use the Dallas/Maxim CRC-8 (poly 0x31, reflected).
const ROM_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// 8-byte ROM code identifying one physical sensor.
///
/// Equality is exact over all eight bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceAddress([u8; ADDRESS_LEN]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a family code and serial, appending a valid CRC byte.
    pub fn with_crc(family: u8, serial: [u8; 6]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = family;
        bytes[1..7].copy_from_slice(&serial);
        bytes[7] = ROM_CRC.checksum(&bytes[..7]);
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    #[inline]
    pub const fn family_code(&self) -> u8 {
        self.0[0]
    }

    /// True when the last byte is the CRC-8 of the first seven.
    pub fn has_valid_crc(&self) -> bool {
        ROM_CRC.checksum(&self.0[..7]) == self.0[7]
    }
}

impl From<[u8; ADDRESS_LEN]> for DeviceAddress {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for DeviceAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for DeviceAddress {
    type Err = ThermowireError;

    /// Parse the dotted-decimal form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ADDRESS_LEN];
        let mut parts = s.trim().split('.');
        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ThermowireError::invalid_address(s))?;
            *byte = part
                .parse::<u8>()
                .map_err(|_| ThermowireError::invalid_address(s))?;
        }
        if parts.next().is_some() {
            return Err(ThermowireError::invalid_address(s));
        }
        Ok(Self(bytes))
    }
}
