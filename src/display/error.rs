/*
 *  display/error.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Unified error types for the display subsystem
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

use std::fmt;
use std::error::Error;
use std::io;

/// Unified error type for all display operations
///
/// Remote frames that fail to parse are not errors (they are dropped), and
/// an idle channel is reported as `Ok(None)` by the readers.
#[derive(Debug)]
pub enum DisplayError {
    /// Wrong row length, or a mode the display cannot show.
    /// Raised before any byte is written.
    InvalidFormat(String),

    /// Composite indicator value outside the accepted set.
    /// Raised before any byte is written.
    InvalidInput(char),

    /// Serial read/write failure. Never retried; tracked indicator state
    /// may no longer match the panel.
    Channel(io::Error),

    /// No known display is attached
    DeviceNotFound,

    /// Serial port could not be enumerated or opened
    Serial(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InvalidFormat(msg) =>
                write!(f, "Improper data format: {}", msg),
            DisplayError::InvalidInput(c) =>
                write!(f, "Invalid composite indicator value: {:?}", c),
            DisplayError::Channel(err) =>
                write!(f, "Serial channel error: {}", err),
            DisplayError::DeviceNotFound =>
                write!(f, "No supported display found"),
            DisplayError::Serial(msg) =>
                write!(f, "Serial port error: {}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Channel(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DisplayError {
    fn from(err: io::Error) -> Self {
        DisplayError::Channel(err)
    }
}

impl From<serialport::Error> for DisplayError {
    fn from(err: serialport::Error) -> Self {
        DisplayError::Serial(err.to_string())
    }
}

impl DisplayError {
    /// True for request errors raised before touching the channel
    pub fn is_request_error(&self) -> bool {
        matches!(self, DisplayError::InvalidFormat(_) | DisplayError::InvalidInput(_))
    }
}
