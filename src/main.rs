/*
 *  main.rs
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

use std::{thread, time::Duration};

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, info, warn};

use display_handler::config::{self, Command, Config};
use display_handler::display::{factory, BoxedDisplay, DisplayFactory};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> Result<()> {
    let (config, cli) = config::load().context("loading configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("{} - two rows, two protocols", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    match cli.command.unwrap_or(Command::Devices) {
        Command::Devices => list_devices(),
        Command::Send { top, bottom, mode } => {
            let mut display = open(&config)?;
            display.send(&top, &bottom, mode)
                .with_context(|| format!("sending {:?} / {:?}", top, bottom))?;
            info!("Sent {} request", mode);
            Ok(())
        }
        Command::Clear => {
            let mut display = open(&config)?;
            display.clear().context("clearing display")?;
            Ok(())
        }
        Command::Brightness { level } => {
            let mut display = open(&config)?;
            display.set_brightness(level).context("setting brightness")?;
            Ok(())
        }
        Command::Remote { count, poll_ms } => {
            let display = open(&config)?;
            watch_remote(display, count, Duration::from_millis(poll_ms))
        }
    }
}

fn open(config: &Config) -> Result<BoxedDisplay> {
    let display = DisplayFactory::create_from_config(config).context("opening display")?;
    info!("Display {} ready", display.info());
    Ok(display)
}

fn list_devices() -> Result<()> {
    let found = factory::discover().context("enumerating serial ports")?;
    if found.is_empty() {
        warn!("No supported display attached");
    }
    for d in found {
        println!(
            "{}\t{:04x}:{:04x}\t{}\t{} baud",
            d.port, d.spec.vid, d.spec.pid, d.spec.family, d.spec.baud
        );
    }
    Ok(())
}

/// Print remote codes, one per line, until `count` have been seen
fn watch_remote(mut display: BoxedDisplay, count: Option<usize>, poll: Duration) -> Result<()> {
    display.flush().context("flushing channel")?;
    info!("Waiting for remote codes");

    let mut seen = 0usize;
    while count.is_none_or(|n| seen < n) {
        match display.read_remote_cmd().context("reading remote")? {
            Some(code) => {
                println!("{:#06x}", code);
                seen += 1;
            }
            None => thread::sleep(poll),
        }
    }

    debug!("Saw {} remote codes", seen);
    display.close().context("closing display")?;
    Ok(())
}
