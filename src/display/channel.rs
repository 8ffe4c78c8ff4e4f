/*
 *  display/channel.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Byte channel abstraction over the display's serial link
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

use std::io::{self, Read, Write};

use serialport::{ClearBuffer, SerialPort};

/// Byte-oriented, acknowledgement-free link to a display.
///
/// Reads are expected to be non-blocking: an empty channel reports either a
/// zero-length read or `TimedOut`/`WouldBlock`.
pub trait SerialChannel: Read + Write + Send {
    /// Drop anything pending in the input and output buffers
    fn flush_buffers(&mut self) -> io::Result<()>;
}

impl SerialChannel for Box<dyn SerialPort> {
    fn flush_buffers(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All).map_err(io::Error::from)
    }
}

#[inline]
fn is_idle(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// Read into `buf`, mapping "nothing available" to `Ok(0)`
pub fn read_available<C: Read + ?Sized>(channel: &mut C, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match channel.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_idle(&e) => return Ok(0),
            Err(e) => return Err(e),
        }
    }
}

/// Read a single byte, `None` when the channel is idle
pub fn read_byte<C: Read + ?Sized>(channel: &mut C) -> io::Result<Option<u8>> {
    let mut b = [0u8; 1];
    match read_available(channel, &mut b)? {
        0 => Ok(None),
        _ => Ok(Some(b[0])),
    }
}
