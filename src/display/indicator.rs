/*
 *  display/indicator.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Best-effort mirror of the indicator positions onto an I2C LED driver
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

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use log::{info, warn};

use crate::display::state::{Indicator, Update, TOP_LEN, COMPOSITE_INDEX};

pub const DEFAULT_ADDRESS: u8 = 0x3C;

const REG_ENABLE: u8 = 0x00;
const REG_PWM_BASE: u8 = 0x05;
const REG_UPDATE: u8 = 0x25;
const REG_LED_BASE: u8 = 0x2A;

static TOP_CHANNELS: [u8; TOP_LEN] = [7, 6, 5, 4, 3, 2, 8, 15, 14, 13, 12, 11];
static BOTTOM_CHANNELS: [u8; COMPOSITE_INDEX] = [19, 22, 23, 26, 21];

// ABS is wired to two LEDs
static ABS_CHANNELS: [u8; 2] = [20, 25];

/// LED driver channels behind an indicator
pub fn channels(indicator: Indicator) -> &'static [u8] {
    match indicator {
        Indicator::Top(i) => TOP_CHANNELS.get(i..i + 1).unwrap_or(&[]),
        Indicator::Bottom(i) => BOTTOM_CHANNELS.get(i..i + 1).unwrap_or(&[]),
        Indicator::Abs => &ABS_CHANNELS,
        Indicator::Gsm => &[18],
        Indicator::Tvp => &[17],
        Indicator::Wmk => &[16],
    }
}

fn all_channels() -> impl Iterator<Item = u8> {
    TOP_CHANNELS
        .into_iter()
        .chain(BOTTOM_CHANNELS)
        .chain(ABS_CHANNELS)
        .chain([18, 17, 16])
}

/// PWM LED driver on an I2C bus
pub struct LedDriver<I> {
    bus: I,
    address: u8,
}

impl<I: I2c> LedDriver<I> {
    /// Enable the driver outputs
    pub fn new(mut bus: I, address: u8) -> Result<Self, I::Error> {
        bus.write(address, &[REG_ENABLE, 0x01])?;
        Ok(Self { bus, address })
    }

    fn set_channel(&mut self, channel: u8, lit: bool) -> Result<(), I::Error> {
        if lit {
            self.bus.write(self.address, &[REG_PWM_BASE + channel, 0xFF])?;
            self.bus.write(self.address, &[REG_LED_BASE + channel, 0x01])?;
        } else {
            self.bus.write(self.address, &[REG_LED_BASE + channel, 0x00])?;
        }
        self.bus.write(self.address, &[REG_UPDATE, 0x00])
    }

    pub fn into_inner(self) -> I {
        self.bus
    }
}

/// Optional secondary output for indicator state.
///
/// Failures are logged and dropped; they never change the outcome of the
/// primary display operation.
pub enum IndicatorSink<I = I2cdev> {
    None,
    I2c(LedDriver<I>),
}

impl IndicatorSink<I2cdev> {
    /// Open the LED driver on `bus`, falling back to no sink on failure
    pub fn open(bus: &str, address: u8) -> Self {
        let dev = match I2cdev::new(bus) {
            Ok(dev) => dev,
            Err(e) => {
                warn!("LED driver bus {} unavailable: {}", bus, e);
                return IndicatorSink::None;
            }
        };
        Self::attach(dev, address)
    }
}

impl<I: I2c> IndicatorSink<I> {
    /// Enable the driver on an already-open bus
    pub fn attach(bus: I, address: u8) -> Self {
        match LedDriver::new(bus, address) {
            Ok(driver) => {
                info!("LED driver init success at 0x{:02X}", address);
                IndicatorSink::I2c(driver)
            }
            Err(e) => {
                warn!("LED driver init failed: {:?}", e);
                IndicatorSink::None
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, IndicatorSink::I2c(_))
    }

    /// Apply a full update plan, without diffing
    pub fn mirror(&mut self, plan: &[Update]) {
        let IndicatorSink::I2c(driver) = self else { return };
        for update in plan {
            for &ch in channels(update.indicator) {
                if let Err(e) = driver.set_channel(ch, update.lit) {
                    warn!("LED {} update failed: {:?}", update.indicator, e);
                }
            }
        }
    }

    /// Switch every mapped LED off
    pub fn clear(&mut self) {
        let IndicatorSink::I2c(driver) = self else { return };
        for ch in all_channels() {
            if let Err(e) = driver.set_channel(ch, false) {
                warn!("LED channel {} clear failed: {:?}", ch, e);
            }
        }
    }
}
