/*
 *  lib.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
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

//! Driver for two-row status displays.
//!
//! Two incompatible panel families sit behind one
//! [`display::DisplayController`]: bitmap panels that take packed 256x64
//! frames, and lamp panels driven one character at a time with ASCII
//! commands. [`display::DisplayFactory`] picks the right one from the USB
//! identity of the attached serial bridge.

pub mod config;
pub mod display;
