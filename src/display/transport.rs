/*
 *  display/transport.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Paced chunk writer for the bitmap display family
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
use log::debug;

use crate::display::channel::SerialChannel;
use crate::display::error::DisplayError;

pub const POWER_ON: [u8; 5] = [0x1F, 0x28, 0x61, 0x40, 0x01];
pub const POWER_OFF: [u8; 5] = [0x1F, 0x28, 0x61, 0x40, 0x00];
pub const BRIGHTNESS_PREFIX: [u8; 2] = [0x1F, 0x58];

/// Pacing for a link with no acknowledgement: the waits are the only flow
/// control the panel has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub chunk_size: usize,
    pub chunk_delay_ms: u32,
    pub power_on_settle_ms: u32,
    /// Quiet time after the last chunk while the panel unpacks the frame
    pub frame_settle_ms: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_delay_ms: 5,
            power_on_settle_ms: 100,
            frame_settle_ms: 200,
        }
    }
}

/// Writes packed frames in fixed-size, paced chunks
pub struct ChunkedTransport<C, D> {
    channel: C,
    delay: D,
    pacing: Pacing,
}

impl<C: SerialChannel, D: DelayNs> ChunkedTransport<C, D> {
    pub fn new(channel: C, delay: D) -> Self {
        Self::with_pacing(channel, delay, Pacing::default())
    }

    pub fn with_pacing(channel: C, delay: D, pacing: Pacing) -> Self {
        Self { channel, delay, pacing }
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Flush, wake the panel and give it time to come up
    pub fn power_on(&mut self) -> Result<(), DisplayError> {
        self.channel.flush_buffers()?;
        self.channel.write_all(&POWER_ON)?;
        self.delay.delay_ms(self.pacing.power_on_settle_ms);
        Ok(())
    }

    /// Power on, then stream `frame`. Returns the number of chunks written.
    pub fn send(&mut self, frame: &[u8]) -> Result<usize, DisplayError> {
        self.power_on()?;

        let mut chunks = 0;
        for chunk in frame.chunks(self.pacing.chunk_size.max(1)) {
            self.channel.write_all(chunk)?;
            self.delay.delay_ms(self.pacing.chunk_delay_ms);
            chunks += 1;
        }

        debug!("Sent {} bytes in {} chunks", frame.len(), chunks);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mock::{MockChannel, MockDelay};

    fn transport() -> (ChunkedTransport<MockChannel, MockDelay>, MockChannel, MockDelay) {
        let ch = MockChannel::new();
        let delay = MockDelay::new();
        (ChunkedTransport::new(ch.clone(), delay.clone()), ch, delay)
    }

    #[test]
    fn test_2500_bytes_in_three_chunks() {
        let (mut t, ch, delay) = transport();
        let frame = vec![0xAAu8; 2500];

        assert_eq!(t.send(&frame).unwrap(), 3);

        let writes = ch.writes();
        assert_eq!(writes[0], POWER_ON.to_vec());
        let sizes: Vec<usize> = writes[1..].iter().map(|w| w.len()).collect();
        assert_eq!(sizes, vec![1024, 1024, 452]);
        assert_eq!(delay.delays_ms(), vec![100, 5, 5, 5]);
        assert_eq!(ch.flush_count(), 1);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_write() {
        let (mut t, ch, _) = transport();
        t.send(&vec![0u8; 2048]).unwrap();
        let writes = ch.writes();
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn test_empty_frame_only_powers_on() {
        let (mut t, ch, delay) = transport();
        assert_eq!(t.send(&[]).unwrap(), 0);
        assert_eq!(ch.writes(), vec![POWER_ON.to_vec()]);
        assert_eq!(delay.delays_ms(), vec![100]);
    }

    #[test]
    fn test_chunks_preserve_order() {
        let (mut t, ch, _) = transport();
        let frame: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
        t.send(&frame).unwrap();
        let rebuilt: Vec<u8> = ch.writes()[1..].concat();
        assert_eq!(rebuilt, frame);
    }

    #[test]
    fn test_write_failure_stops_transfer() {
        let (mut t, ch, delay) = transport();
        ch.state().lock().unwrap().simulate_write_failure = true;
        let err = t.send(&vec![0u8; 4096]).unwrap_err();
        assert!(matches!(err, DisplayError::Channel(_)));
        assert!(delay.delays_ms().is_empty());
    }
}
