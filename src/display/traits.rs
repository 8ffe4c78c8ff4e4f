/*
 *  display/traits.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Capability interface shared by both display families
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
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::display::error::DisplayError;
use crate::display::remote::RemoteCode;
use crate::display::DisplayMode;

/// The two incompatible panel protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceFamily {
    /// Packed 4-bit bitmaps in paced 1024-byte chunks, binary remote codes
    #[serde(alias = "binary")]
    BinaryBitmap,

    /// `$9002`-style lamp commands, framed ASCII remote codes
    #[serde(alias = "ascii")]
    AsciiCommand,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::BinaryBitmap => write!(f, "binary-bitmap"),
            DeviceFamily::AsciiCommand => write!(f, "ascii-command"),
        }
    }
}

impl DeviceFamily {
    /// Link speed the family's firmware expects
    pub fn default_baud(&self) -> u32 {
        match self {
            DeviceFamily::BinaryBitmap => 230_400,
            DeviceFamily::AsciiCommand => 115_200,
        }
    }
}

impl FromStr for DeviceFamily {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bitmap" | "binary-bitmap" => Ok(DeviceFamily::BinaryBitmap),
            "ascii" | "ascii-command" => Ok(DeviceFamily::AsciiCommand),
            other => Err(DisplayError::InvalidFormat(format!("unknown device family {:?}", other))),
        }
    }
}

/// Identity of an opened display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub family: DeviceFamily,
    pub vid: u16,
    pub pid: u16,
}

impl fmt::Display for DisplayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:04x}:{:04x})", self.family, self.vid, self.pid)
    }
}

/// Everything a caller can ask of a display, regardless of family.
///
/// Exactly one implementation is chosen when the device is opened; callers
/// never branch on the family. Calls block for the protocol's settle times.
pub trait DisplayController: Send {
    /// Family and USB identity
    fn info(&self) -> &DisplayInfo;

    /// Blank the panel
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Set panel brightness (family-specific scale)
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Show a two-row request.
    ///
    /// Viewership requests must be exactly 12 + 6 characters; a malformed
    /// request fails before anything is written.
    fn send(&mut self, top: &str, bottom: &str, mode: DisplayMode) -> Result<(), DisplayError>;

    /// Next remote-control code, `None` when nothing is waiting
    fn read_remote_cmd(&mut self) -> Result<Option<RemoteCode>, DisplayError>;

    /// Drop pending bytes in both directions
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Blank the panel and release the port
    fn close(self: Box<Self>) -> Result<(), DisplayError>;
}
