/*
 *  display/state.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Indicator positions, lit-state tracking and request planning
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

use crate::display::error::DisplayError;

/// Characters on the top row (`A`..`L`)
pub const TOP_LEN: usize = 12;

/// Characters on the bottom row (`1`..`5` plus the composite)
pub const BOTTOM_LEN: usize = 6;

/// Index of the composite ABS/T-flag position on the bottom row
pub const COMPOSITE_INDEX: usize = 5;

/// Values accepted at the composite position
pub const COMPOSITE_VALUES: [char; 6] = ['0', '1', '-', ';', 'o', 'f'];

const TOP_LABELS: [&str; TOP_LEN] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];
const BOTTOM_LABELS: [&str; COMPOSITE_INDEX] = ["1", "2", "3", "4", "5"];

/// A single lightable position on the ASCII-command panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Top row, 0-based (`A` + index)
    Top(usize),
    /// Bottom row positions 1..5, 0-based (`1` + index)
    Bottom(usize),
    /// Composite ABS lamp (bottom position 6)
    Abs,
    /// Status lamps, not tracked
    Gsm,
    Tvp,
    Wmk,
}

impl Indicator {
    /// Label the panel firmware knows this position by
    pub fn label(&self) -> &'static str {
        match *self {
            Indicator::Top(i) => TOP_LABELS[i],
            Indicator::Bottom(i) => BOTTOM_LABELS[i],
            Indicator::Abs => "ABS",
            Indicator::Gsm => "GSM",
            Indicator::Tvp => "TVP",
            Indicator::Wmk => "WMK",
        }
    }

    /// The character that lights this position in a viewership request
    pub fn expected_char(&self) -> Option<char> {
        match *self {
            Indicator::Top(i) => Some((b'A' + i as u8) as char),
            Indicator::Bottom(i) => Some((b'1' + i as u8) as char),
            _ => None,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One planned change: light (`true`) or clear (`false`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    pub indicator: Indicator,
    pub lit: bool,
}

/// Check a viewership request is exactly 12 + 6 characters
pub fn validate_rows(top: &str, bottom: &str) -> Result<(Vec<char>, Vec<char>), DisplayError> {
    let top: Vec<char> = top.chars().collect();
    let bottom: Vec<char> = bottom.chars().collect();
    if top.len() != TOP_LEN || bottom.len() != BOTTOM_LEN {
        return Err(DisplayError::InvalidFormat(format!(
            "expected {}+{} characters, got {:?}, {:?}",
            TOP_LEN,
            BOTTOM_LEN,
            top.iter().collect::<String>(),
            bottom.iter().collect::<String>(),
        )));
    }
    Ok((top, bottom))
}

/// Translate a viewership request into light/clear updates, in panel order.
///
/// `-` and `*` leave a position untouched; its own letter/digit lights it;
/// anything else clears it. The composite position only accepts
/// [`COMPOSITE_VALUES`]. Fails before producing anything if the request is
/// malformed.
pub fn plan_updates(top: &str, bottom: &str) -> Result<Vec<Update>, DisplayError> {
    let (top, bottom) = validate_rows(top, bottom)?;

    let composite = bottom[COMPOSITE_INDEX];
    if !COMPOSITE_VALUES.contains(&composite) {
        return Err(DisplayError::InvalidInput(composite));
    }

    let mut plan = Vec::with_capacity(TOP_LEN + BOTTOM_LEN);

    let rows = top.iter().enumerate().map(|(i, &c)| (Indicator::Top(i), c))
        .chain(bottom[..COMPOSITE_INDEX].iter().enumerate().map(|(i, &c)| (Indicator::Bottom(i), c)));

    for (indicator, c) in rows {
        if Some(c) == indicator.expected_char() {
            plan.push(Update { indicator, lit: true });
        } else if c != '-' && c != '*' {
            plan.push(Update { indicator, lit: false });
        }
    }

    match composite {
        '1' => plan.push(Update { indicator: Indicator::Abs, lit: true }),
        '0' | ';' | 'o' | 'f' => plan.push(Update { indicator: Indicator::Abs, lit: false }),
        _ => {}
    }

    Ok(plan)
}

/// Lit/unlit state of every tracked position.
///
/// The panel has no read-back, so this is the only record of what is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterState {
    pub top: [bool; TOP_LEN],
    pub bottom: [bool; BOTTOM_LEN],
}

impl CharacterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state, `None` for untracked lamps
    pub fn get(&self, indicator: Indicator) -> Option<bool> {
        self.slot(indicator).map(|(row, i)| if row { self.top[i] } else { self.bottom[i] })
    }

    /// Record a new state; untracked lamps are ignored
    pub fn set(&mut self, indicator: Indicator, lit: bool) {
        match self.slot(indicator) {
            Some((true, i)) => self.top[i] = lit,
            Some((false, i)) => self.bottom[i] = lit,
            None => {}
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn lit_count(&self) -> usize {
        self.top.iter().chain(self.bottom.iter()).filter(|&&b| b).count()
    }

    // (is_top, index)
    fn slot(&self, indicator: Indicator) -> Option<(bool, usize)> {
        match indicator {
            Indicator::Top(i) if i < TOP_LEN => Some((true, i)),
            Indicator::Bottom(i) if i < COMPOSITE_INDEX => Some((false, i)),
            Indicator::Abs => Some((false, COMPOSITE_INDEX)),
            _ => None,
        }
    }
}

impl fmt::Display for CharacterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |bits: &[bool]| bits.iter().map(|&b| if b { '1' } else { '0' }).collect::<String>();
        write!(f, "top={} bottom={}", row(&self.top), row(&self.bottom))
    }
}
