/*
 *  display/remote.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  IR remote frame decoding for both display families
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

use std::io::{self, Read};

use log::{debug, trace};

use crate::display::channel::{read_available, read_byte};

/// Decoded remote command
pub type RemoteCode = u32;

/// High bits the ASCII-family firmware strips from the RC5 code
pub const RESTORED_BITS: RemoteCode = 0xC000;

const FRAME_PREFIX: &[u8] = b"$9001\"";
const FRAME_SUFFIX: &[u8] = b"\"0&\r\n";
const TERMINATOR: u8 = b'\n';

/// Lines this long without a terminator are noise
pub const MAX_LINE: usize = 256;

/// How remote frames arrive on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecoder {
    /// Two raw bytes, little-endian
    Binary,
    /// `$9001"<digits>"0&\r\n`
    FramedAscii,
}

impl RemoteDecoder {
    /// Read the next remote code.
    ///
    /// `Ok(None)` means the channel had nothing (the normal idle case).
    /// Malformed ASCII frames are dropped and reading continues.
    pub fn read_code<R: Read + ?Sized>(&self, channel: &mut R) -> io::Result<Option<RemoteCode>> {
        match self {
            RemoteDecoder::Binary => read_binary(channel),
            RemoteDecoder::FramedAscii => read_framed(channel),
        }
    }
}

/// `(b1 << 8) + b0`, no masking. A lone byte is dropped.
pub fn read_binary<R: Read + ?Sized>(channel: &mut R) -> io::Result<Option<RemoteCode>> {
    let mut buf = [0u8; 2];
    let mut got = read_available(channel, &mut buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got == 1 {
        got += read_available(channel, &mut buf[1..])?;
        if got < 2 {
            debug!("Dropping partial remote frame {:#04x}", buf[0]);
            return Ok(None);
        }
    }
    Ok(Some(((buf[1] as RemoteCode) << 8) + buf[0] as RemoteCode))
}

/// Read lines until one parses or the channel runs dry
pub fn read_framed<R: Read + ?Sized>(channel: &mut R) -> io::Result<Option<RemoteCode>> {
    let mut line = Vec::with_capacity(32);
    loop {
        line.clear();
        let terminated = read_line(channel, &mut line)?;
        if line.is_empty() {
            return Ok(None);
        }
        if let Some(code) = parse_frame(&line) {
            return Ok(Some(code));
        }
        trace!("Discarding remote line {:?}", String::from_utf8_lossy(&line));
        if !terminated {
            return Ok(None);
        }
    }
}

// true when the line ended on the terminator rather than on an idle channel
fn read_line<R: Read + ?Sized>(channel: &mut R, line: &mut Vec<u8>) -> io::Result<bool> {
    while let Some(b) = read_byte(channel)? {
        line.push(b);
        if b == TERMINATOR {
            return Ok(true);
        }
        if line.len() >= MAX_LINE {
            // keep consuming, but as a fresh line
            line.clear();
        }
    }
    Ok(false)
}

/// Match `$9001"<digits>"0&\r\n` at the end of `line` and restore the high
/// bits. Anything before the `$` is ignored.
pub fn parse_frame(line: &[u8]) -> Option<RemoteCode> {
    let body = line.strip_suffix(FRAME_SUFFIX)?;
    let digits_at = body
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    let digits = &body[digits_at..];
    if digits.is_empty() || !body[..digits_at].ends_with(FRAME_PREFIX) {
        return None;
    }
    let code: RemoteCode = std::str::from_utf8(digits).ok()?.parse().ok()?;
    Some(code | RESTORED_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_binary_little_endian() {
        let mut ch = Cursor::new(vec![0x01, 0x02]);
        assert_eq!(read_binary(&mut ch).unwrap(), Some(0x0201));
    }

    #[test]
    fn test_binary_idle() {
        let mut ch = Cursor::new(Vec::<u8>::new());
        assert_eq!(read_binary(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_binary_lone_byte_dropped() {
        let mut ch = Cursor::new(vec![0x7F]);
        assert_eq!(read_binary(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_binary_no_mask() {
        let mut ch = Cursor::new(vec![0xFF, 0x3F]);
        assert_eq!(RemoteDecoder::Binary.read_code(&mut ch).unwrap(), Some(0x3FFF));
    }

    #[test]
    fn test_framed_restores_high_bits() {
        let mut ch = Cursor::new(b"$9001\"42\"0&\r\n".to_vec());
        assert_eq!(read_framed(&mut ch).unwrap(), Some(0xC02A));
    }

    #[test]
    fn test_framed_garbage_is_idle() {
        let mut ch = Cursor::new(b"garbage\r\n".to_vec());
        assert_eq!(read_framed(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_framed_skips_noise_then_decodes() {
        let mut ch = Cursor::new(b"noise\r\n$9001\"\"0&\r\n$9001\"7\"0&\r\n$9001\"8\"0&\r\n".to_vec());
        assert_eq!(read_framed(&mut ch).unwrap(), Some(0xC007));
        // next call picks up where the last one stopped
        assert_eq!(read_framed(&mut ch).unwrap(), Some(0xC008));
        assert_eq!(read_framed(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_framed_partial_line_is_idle() {
        let mut ch = Cursor::new(b"$9001\"42\"0&".to_vec());
        assert_eq!(read_framed(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(parse_frame(b"$9001\"12345\"0&\r\n"), Some(12345 | 0xC000));
        assert_eq!(parse_frame(b"xx$9001\"1\"0&\r\n"), Some(0xC001));
        assert_eq!(parse_frame(b"$9001\"1\"0&\n"), None);
        assert_eq!(parse_frame(b"$9001\"1a\"0&\r\n"), None);
        assert_eq!(parse_frame(b"$9002\"1\"0&\r\n"), None);
        assert_eq!(parse_frame(b"$9001\"1\"1&\r\n"), None);
        assert_eq!(parse_frame(b"$9001\"99999999999999\"0&\r\n"), None);
    }

    #[test]
    fn test_overlong_line_discarded() {
        let mut data = vec![b'x'; MAX_LINE * 2];
        data.extend_from_slice(b"$9001\"5\"0&\r\n");
        let mut ch = Cursor::new(data);
        assert_eq!(read_framed(&mut ch).unwrap(), Some(0xC005));
    }
}
