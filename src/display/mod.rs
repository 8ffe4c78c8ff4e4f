/*
 *  display/mod.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Display subsystem - one controller interface over two panel families
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod channel;
pub mod factory;

// Bitmap family: render, pack, pace
pub mod canvas;
pub mod bitmap;
pub mod transport;
pub mod binary;

// ASCII family: per-character lamp commands
pub mod state;
pub mod engine;
pub mod ascii;

pub mod remote;
pub mod indicator;

// Test doubles, also used by the integration tests
pub mod mock;

pub use ascii::AsciiCommandDisplay;
pub use binary::BinaryBitmapDisplay;
pub use error::DisplayError;
pub use factory::{BoxedDisplay, DisplayFactory};
pub use remote::RemoteCode;
pub use traits::{DeviceFamily, DisplayController, DisplayInfo};

/// How a two-row request is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Fixed 12 + 6 indicator rows
    #[default]
    Viewership,
    /// Free text, both rows
    Messaging,
    /// Clock and date, rows ignored
    Screensaver,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Viewership => write!(f, "viewership"),
            DisplayMode::Messaging => write!(f, "messaging"),
            DisplayMode::Screensaver => write!(f, "screensaver"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewership" => Ok(DisplayMode::Viewership),
            "messaging" => Ok(DisplayMode::Messaging),
            "screensaver" => Ok(DisplayMode::Screensaver),
            other => Err(DisplayError::InvalidFormat(format!("unknown display mode {:?}", other))),
        }
    }
}
