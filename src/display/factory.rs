/*
 *  display/factory.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  USB discovery and construction of the matching display controller
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::{Delay, I2cdev};
use log::{debug, info};
use serialport::{ClearBuffer, SerialPort, SerialPortType};

use crate::config::Config;
use crate::display::ascii::AsciiCommandDisplay;
use crate::display::binary::BinaryBitmapDisplay;
use crate::display::channel::SerialChannel;
use crate::display::error::DisplayError;
use crate::display::indicator::IndicatorSink;
use crate::display::traits::{DeviceFamily, DisplayController};

/// Type alias for boxed display controller trait objects
pub type BoxedDisplay = Box<dyn DisplayController>;

/// One supported USB bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub vid: u16,
    pub pid: u16,
    pub family: DeviceFamily,
    pub baud: u32,
}

/// Known displays, in detection priority order
pub const DEVICE_TABLE: [DeviceSpec; 4] = [
    DeviceSpec { vid: 0x2047, pid: 0xF002, family: DeviceFamily::BinaryBitmap, baud: 230_400 },
    DeviceSpec { vid: 0x2047, pid: 0xF001, family: DeviceFamily::BinaryBitmap, baud: 230_400 },
    DeviceSpec { vid: 0x1A86, pid: 0x7523, family: DeviceFamily::BinaryBitmap, baud: 230_400 },
    DeviceSpec { vid: 0x10C4, pid: 0xEA60, family: DeviceFamily::AsciiCommand, baud: 115_200 },
];

/// A serial port whose USB identity is in [`DEVICE_TABLE`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub port: String,
    pub spec: DeviceSpec,
}

pub fn lookup(vid: u16, pid: u16) -> Option<&'static DeviceSpec> {
    DEVICE_TABLE.iter().find(|s| s.vid == vid && s.pid == pid)
}

/// Pick out supported devices from `(port, vid, pid)` triples.
/// Results follow table order, then port order.
pub fn match_ports(ports: &[(String, u16, u16)]) -> Vec<DiscoveredDevice> {
    DEVICE_TABLE
        .iter()
        .flat_map(|spec| {
            ports
                .iter()
                .filter(move |(_, vid, pid)| *vid == spec.vid && *pid == spec.pid)
                .map(move |(port, _, _)| DiscoveredDevice { port: port.clone(), spec: *spec })
        })
        .collect()
}

fn usb_ports() -> Result<Vec<(String, u16, u16)>, DisplayError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .filter_map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) => Some((p.port_name, usb.vid, usb.pid)),
            _ => None,
        })
        .collect())
}

/// Enumerate attached, supported displays
pub fn discover() -> Result<Vec<DiscoveredDevice>, DisplayError> {
    let found = match_ports(&usb_ports()?);
    for d in &found {
        debug!("Found {} display {:04x}:{:04x} on {}", d.spec.family, d.spec.vid, d.spec.pid, d.port);
    }
    Ok(found)
}

/// Open with non-blocking reads and empty buffers
pub fn open_port(path: &str, baud: u32) -> Result<Box<dyn SerialPort>, DisplayError> {
    let port = serialport::new(path, baud)
        .timeout(Duration::ZERO)
        .open()
        .map_err(|e| DisplayError::Serial(format!("{}: {}", path, e)))?;
    port.clear(ClearBuffer::All)?;
    debug!("Opened {} at {} baud", path, baud);
    Ok(port)
}

/// Wrap an open channel in the controller for `family`
pub fn build<C, D, I>(
    family: DeviceFamily,
    channel: C,
    delay: D,
    vid: u16,
    pid: u16,
    indicator: IndicatorSink<I>,
) -> BoxedDisplay
where
    C: SerialChannel + 'static,
    D: DelayNs + Send + 'static,
    I: I2c + Send + 'static,
{
    match family {
        DeviceFamily::BinaryBitmap => Box::new(BinaryBitmapDisplay::new(channel, delay, vid, pid, indicator)),
        DeviceFamily::AsciiCommand => Box::new(AsciiCommandDisplay::new(channel, delay, vid, pid, indicator)),
    }
}

/// Factory for display controllers from configuration
pub struct DisplayFactory;

impl DisplayFactory {
    /// Open the configured display.
    ///
    /// An explicit port (with its family) is used as-is; otherwise the first
    /// attached device from [`DEVICE_TABLE`] wins.
    pub fn create_from_config(config: &Config) -> Result<BoxedDisplay, DisplayError> {
        let serial = config.serial();
        let indicator = match config.indicator_bus() {
            Some((bus, address)) => IndicatorSink::open(bus, address),
            None => IndicatorSink::None,
        };

        match (serial.port, serial.family) {
            (Some(port), Some(family)) => Self::open_explicit(&port, family, serial.baud, indicator),
            (Some(_), None) => Err(DisplayError::InvalidFormat(
                "an explicit port needs a device family".to_string(),
            )),
            (None, _) => Self::open_first(serial.baud, indicator),
        }
    }

    /// Open the first supported device found on USB
    pub fn open_first(baud: Option<u32>, indicator: IndicatorSink<I2cdev>) -> Result<BoxedDisplay, DisplayError> {
        let device = discover()?
            .into_iter()
            .next()
            .ok_or(DisplayError::DeviceNotFound)?;

        let baud = baud.unwrap_or(device.spec.baud);
        info!("Using {} display on {} at {} baud", device.spec.family, device.port, baud);
        let port = open_port(&device.port, baud)?;
        Ok(build(device.spec.family, port, Delay, device.spec.vid, device.spec.pid, indicator))
    }

    /// Open a known port without enumeration
    pub fn open_explicit(
        path: &str,
        family: DeviceFamily,
        baud: Option<u32>,
        indicator: IndicatorSink<I2cdev>,
    ) -> Result<BoxedDisplay, DisplayError> {
        // USB identity is informational only; report it when the port is a USB bridge
        let (vid, pid) = usb_ports()
            .unwrap_or_default()
            .into_iter()
            .find(|(name, _, _)| name == path)
            .map_or((0, 0), |(_, vid, pid)| (vid, pid));

        let baud = baud.unwrap_or_else(|| family.default_baud());
        info!("Using {} display on {} at {} baud", family, path, baud);
        let port = open_port(path, baud)?;
        Ok(build(family, port, Delay, vid, pid, indicator))
    }
}
