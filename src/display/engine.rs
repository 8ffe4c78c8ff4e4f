/*
 *  display/engine.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Minimal-diff command engine for the ASCII-command display family
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
use log::{debug, info};

use crate::display::channel::SerialChannel;
use crate::display::error::DisplayError;
use crate::display::state::{plan_updates, CharacterState, Indicator, Update};

/// Command terminator
pub const LF: u8 = b'\n';

/// Settle time after a light/clear command
pub const CHAR_SETTLE_MS: u32 = 120;

/// Settle time after clear-all and brightness commands
pub const PANEL_SETTLE_MS: u32 = 100;

const CMD_LIGHT: u16 = 9002;
const CMD_CLEAR: u16 = 9003;
const CMD_BRIGHTNESS: u16 = 9005;
const CMD_ALL_OFF: u16 = 9009;

/// Format one `$<cmd>"<arg>"1&\n` command
pub fn command(code: u16, arg: &str) -> Vec<u8> {
    let mut cmd = format!("${}\"{}\"1&", code, arg).into_bytes();
    cmd.push(LF);
    cmd
}

/// Drives an ASCII-command panel, writing only the commands needed to move
/// the recorded [`CharacterState`] to the requested one.
pub struct CharacterStateEngine<C, D> {
    channel: C,
    delay: D,
    state: CharacterState,
}

impl<C: SerialChannel, D: DelayNs> CharacterStateEngine<C, D> {
    /// Assumes a blank panel
    pub fn new(channel: C, delay: D) -> Self {
        Self { channel, delay, state: CharacterState::new() }
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Apply a 12 + 6 viewership request.
    ///
    /// The request is fully validated before the channel is touched, so a
    /// rejected request leaves both the panel and the recorded state alone.
    pub fn send(&mut self, top: &str, bottom: &str) -> Result<Vec<Update>, DisplayError> {
        let plan = plan_updates(top, bottom)?;

        self.channel.flush_buffers()?;
        for update in &plan {
            self.apply(*update)?;
        }

        debug!("Current info: {}", self.state);
        Ok(plan)
    }

    /// Apply one update; a no-op if the recorded state already matches
    pub fn apply(&mut self, update: Update) -> Result<bool, DisplayError> {
        if update.lit {
            self.light(update.indicator)
        } else {
            self.clear(update.indicator)
        }
    }

    /// Returns whether a command was actually written
    pub fn light(&mut self, indicator: Indicator) -> Result<bool, DisplayError> {
        self.transition(indicator, true)
    }

    /// Returns whether a command was actually written
    pub fn clear(&mut self, indicator: Indicator) -> Result<bool, DisplayError> {
        self.transition(indicator, false)
    }

    fn transition(&mut self, indicator: Indicator, lit: bool) -> Result<bool, DisplayError> {
        if self.state.get(indicator) == Some(lit) {
            return Ok(false);
        }
        self.write_lamp(indicator, lit)?;
        self.state.set(indicator, lit);
        Ok(true)
    }

    fn write_lamp(&mut self, indicator: Indicator, lit: bool) -> Result<(), DisplayError> {
        let code = if lit { CMD_LIGHT } else { CMD_CLEAR };
        debug!("{} char: {}", if lit { "Lighting" } else { "Clearing" }, indicator);
        self.channel.write_all(&command(code, indicator.label()))?;
        self.delay.delay_ms(CHAR_SETTLE_MS);
        Ok(())
    }

    /// Switch every position off with one broadcast command
    pub fn clear_all(&mut self) -> Result<(), DisplayError> {
        self.channel.flush_buffers()?;
        self.channel.write_all(&command(CMD_ALL_OFF, "ALLOFF"))?;
        self.state.reset();
        self.delay.delay_ms(PANEL_SETTLE_MS);
        Ok(())
    }

    pub fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.channel.flush_buffers()?;
        self.channel.write_all(&command(CMD_BRIGHTNESS, &level.to_string()))?;
        self.delay.delay_ms(PANEL_SETTLE_MS);
        Ok(())
    }

    /// Drive the GSM/TV/watermark status lamps.
    ///
    /// These are not tracked, so every call writes all three.
    pub fn show_info(&mut self, gsm: bool, tv: bool, wmk: bool) -> Result<(), DisplayError> {
        info!("Status lamps: gsm={} tv={} wmk={}", gsm, tv, wmk);
        for (indicator, lit) in [(Indicator::Gsm, gsm), (Indicator::Tvp, tv), (Indicator::Wmk, wmk)] {
            self.write_lamp(indicator, lit)?;
        }
        Ok(())
    }
}
