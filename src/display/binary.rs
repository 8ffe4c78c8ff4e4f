/*
 *  display/binary.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Bitmap display family: render, pack, stream
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

use std::io::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::display::bitmap::{self, PackedFrame};
use crate::display::canvas::Renderer;
use crate::display::channel::SerialChannel;
use crate::display::error::DisplayError;
use crate::display::indicator::IndicatorSink;
use crate::display::remote::{RemoteCode, RemoteDecoder};
use crate::display::state::plan_updates;
use crate::display::traits::{DeviceFamily, DisplayController, DisplayInfo};
use crate::display::transport::{ChunkedTransport, Pacing, BRIGHTNESS_PREFIX, POWER_OFF};
use crate::display::DisplayMode;

/// Panel that takes whole 256x64 frames (vendor 0x2047 family)
pub struct BinaryBitmapDisplay<C, D, I> {
    info: DisplayInfo,
    renderer: Renderer,
    transport: ChunkedTransport<C, D>,
    indicator: IndicatorSink<I>,
}

impl<C, D, I> BinaryBitmapDisplay<C, D, I>
where
    C: SerialChannel,
    D: DelayNs,
    I: I2c,
{
    pub fn new(channel: C, delay: D, vid: u16, pid: u16, indicator: IndicatorSink<I>) -> Self {
        Self::with_pacing(channel, delay, vid, pid, indicator, Pacing::default())
    }

    pub fn with_pacing(
        channel: C,
        delay: D,
        vid: u16,
        pid: u16,
        indicator: IndicatorSink<I>,
        pacing: Pacing,
    ) -> Self {
        info!("Display {:04x}:{:04x} initialized (bitmap)", vid, pid);
        Self {
            info: DisplayInfo { family: DeviceFamily::BinaryBitmap, vid, pid },
            renderer: Renderer::new(),
            transport: ChunkedTransport::with_pacing(channel, delay, pacing),
            indicator,
        }
    }

    /// Render and pack a request without sending it
    pub fn prepare(&self, top: &str, bottom: &str, mode: DisplayMode) -> Result<PackedFrame, DisplayError> {
        let canvas = self.renderer.render(top, bottom, mode)?;
        Ok(bitmap::encode(&bitmap::to_bmp(&canvas)))
    }

    /// Stream an already packed frame and wait for the panel to take it
    pub fn send_frame(&mut self, frame: &PackedFrame) -> Result<(), DisplayError> {
        self.transport.send(frame.as_bytes())?;
        let settle = self.transport.pacing().frame_settle_ms;
        self.transport.delay_mut().delay_ms(settle);
        Ok(())
    }

    pub fn power_on(&mut self) -> Result<(), DisplayError> {
        self.transport.power_on()
    }
}

impl<C, D, I> DisplayController for BinaryBitmapDisplay<C, D, I>
where
    C: SerialChannel,
    D: DelayNs + Send,
    I: I2c + Send,
{
    fn info(&self) -> &DisplayInfo {
        &self.info
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let settle = self.transport.pacing().power_on_settle_ms;
        let channel = self.transport.channel_mut();
        channel.flush_buffers()?;
        channel.write_all(&POWER_OFF)?;
        self.transport.delay_mut().delay_ms(settle);
        self.indicator.clear();
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        let channel = self.transport.channel_mut();
        channel.flush_buffers()?;
        channel.write_all(&[BRIGHTNESS_PREFIX[0], BRIGHTNESS_PREFIX[1], level])?;
        Ok(())
    }

    fn send(&mut self, top: &str, bottom: &str, mode: DisplayMode) -> Result<(), DisplayError> {
        let frame = self.prepare(top, bottom, mode)?;
        debug!("Packed {} mode frame: {} bytes", mode, frame.len());
        self.send_frame(&frame)?;

        // the panel draws any composite value; the LEDs only take a valid plan
        if mode == DisplayMode::Viewership && self.indicator.is_active() {
            match plan_updates(top, bottom) {
                Ok(plan) => self.indicator.mirror(&plan),
                Err(e) => warn!("LED mirror skipped: {}", e),
            }
        }
        Ok(())
    }

    fn read_remote_cmd(&mut self) -> Result<Option<RemoteCode>, DisplayError> {
        Ok(RemoteDecoder::Binary.read_code(self.transport.channel_mut())?)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.transport.channel_mut().flush_buffers()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), DisplayError> {
        self.clear()?;
        info!("Display {} closed", self.info);
        Ok(())
    }
}
