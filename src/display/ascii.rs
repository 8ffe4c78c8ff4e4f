/*
 *  display/ascii.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  ASCII command display family: lamp-per-character panels
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

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::display::channel::SerialChannel;
use crate::display::engine::CharacterStateEngine;
use crate::display::error::DisplayError;
use crate::display::indicator::IndicatorSink;
use crate::display::remote::{RemoteCode, RemoteDecoder};
use crate::display::state::{CharacterState, Indicator, Update};
use crate::display::traits::{DeviceFamily, DisplayController, DisplayInfo};
use crate::display::DisplayMode;

/// Panel with one lamp per character position (CP210x bridge)
pub struct AsciiCommandDisplay<C, D, I> {
    info: DisplayInfo,
    engine: CharacterStateEngine<C, D>,
    indicator: IndicatorSink<I>,
}

impl<C, D, I> AsciiCommandDisplay<C, D, I>
where
    C: SerialChannel,
    D: DelayNs,
    I: I2c,
{
    pub fn new(channel: C, delay: D, vid: u16, pid: u16, indicator: IndicatorSink<I>) -> Self {
        info!("Display {:04x}:{:04x} initialized (ascii)", vid, pid);
        Self {
            info: DisplayInfo { family: DeviceFamily::AsciiCommand, vid, pid },
            engine: CharacterStateEngine::new(channel, delay),
            indicator,
        }
    }

    /// What the panel is believed to show
    pub fn state(&self) -> &CharacterState {
        self.engine.state()
    }

    /// Drive the GSM/TV/watermark lamps, mirrored to the LED driver
    pub fn show_info(&mut self, gsm: bool, tv: bool, wmk: bool) -> Result<(), DisplayError> {
        self.engine.show_info(gsm, tv, wmk)?;
        let plan = [
            Update { indicator: Indicator::Gsm, lit: gsm },
            Update { indicator: Indicator::Tvp, lit: tv },
            Update { indicator: Indicator::Wmk, lit: wmk },
        ];
        self.indicator.mirror(&plan);
        Ok(())
    }
}

impl<C, D, I> DisplayController for AsciiCommandDisplay<C, D, I>
where
    C: SerialChannel,
    D: DelayNs + Send,
    I: I2c + Send,
{
    fn info(&self) -> &DisplayInfo {
        &self.info
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.engine.clear_all()?;
        self.indicator.clear();
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.engine.set_brightness(level)
    }

    fn send(&mut self, top: &str, bottom: &str, mode: DisplayMode) -> Result<(), DisplayError> {
        if mode != DisplayMode::Viewership {
            return Err(DisplayError::InvalidFormat(format!(
                "{} mode needs a bitmap display",
                mode
            )));
        }
        let plan = self.engine.send(top, bottom)?;
        self.indicator.mirror(&plan);
        Ok(())
    }

    fn read_remote_cmd(&mut self) -> Result<Option<RemoteCode>, DisplayError> {
        Ok(RemoteDecoder::FramedAscii.read_code(self.engine.channel_mut())?)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.engine.channel_mut().flush_buffers()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), DisplayError> {
        self.clear()?;
        info!("Display {} closed", self.info);
        Ok(())
    }
}
