use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use dirs_next::home_dir;
use log::LevelFilter;
use std::{fs, path::{Path, PathBuf}, str::FromStr};
use thiserror::Error;

use crate::display::indicator::DEFAULT_ADDRESS;
use crate::display::{DeviceFamily, DisplayMode};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// serial link to the panel; absent means auto-detect
    pub serial: Option<SerialConfig>,
    /// optional LED driver mirroring the indicators
    pub indicator: Option<IndicatorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SerialConfig {
    pub port: Option<String>,          // e.g. "/dev/ttyUSB0", bypasses enumeration
    pub family: Option<DeviceFamily>,  // required with an explicit port
    pub baud: Option<u32>,             // defaults per family
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IndicatorConfig {
    pub bus: Option<String>,           // e.g. "/dev/i2c-1"
    pub address: Option<u8>,           // 7-bit, default 0x3C
}

impl Config {
    /// Effective log filter, `info` unless configured
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn serial(&self) -> SerialConfig {
        self.serial.clone().unwrap_or_default()
    }

    /// Bus and address of the LED driver, if one is configured
    pub fn indicator_bus(&self) -> Option<(&str, u8)> {
        let ind = self.indicator.as_ref()?;
        let bus = ind.bus.as_deref()?;
        Some((bus, ind.address.unwrap_or(DEFAULT_ADDRESS)))
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "display-handler", about = "Two-row status display driver", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short = 'v', long, global = true, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// serial port, skips USB enumeration (needs --family)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub port: Option<String>,
    /// binary | ascii
    #[arg(long, global = true)]
    pub family: Option<DeviceFamily>,
    #[arg(long, global = true)]
    pub baud: Option<u32>,
    /// I2C bus of the indicator LED driver
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub i2c_bus: Option<String>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub dump_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Command {
    /// Show a two-row request
    Send {
        top: String,
        bottom: String,
        /// viewership | messaging | screensaver
        #[arg(long, default_value = "viewership")]
        mode: DisplayMode,
    },
    /// Blank the panel
    Clear,
    /// Set panel brightness
    Brightness { level: u8 },
    /// Print remote-control codes as they arrive
    Remote {
        /// stop after this many codes
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value_t = 50)]
        poll_ms: u64,
    },
    /// List attached displays
    Devices,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok((cfg, cli))
}

/// Layer defaults, YAML and `cli`, then validate.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/display-handler/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/display-handler/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/display-handler.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["display-handler.yaml", "config.yaml", "config/display-handler.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    match (&mut dst.serial, src.serial) {
        (None, Some(s)) => dst.serial = Some(s),
        (Some(d), Some(s)) => merge_serial(d, s),
        _ => {}
    }
    match (&mut dst.indicator, src.indicator) {
        (None, Some(s)) => dst.indicator = Some(s),
        (Some(d), Some(s)) => merge_indicator(d, s),
        _ => {}
    }
}

fn merge_serial(dst: &mut SerialConfig, src: SerialConfig) {
    if src.port.is_some()    { dst.port = src.port; }
    if src.family.is_some()  { dst.family = src.family; }
    if src.baud.is_some()    { dst.baud = src.baud; }
}

fn merge_indicator(dst: &mut IndicatorConfig, src: IndicatorConfig) {
    if src.bus.is_some()     { dst.bus = src.bus; }
    if src.address.is_some() { dst.address = src.address; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".into()); }

    if cli.port.is_some() || cli.family.is_some() || cli.baud.is_some() {
        let serial = cfg.serial.get_or_insert_with(SerialConfig::default);
        if cli.port.is_some()    { serial.port = cli.port.clone(); }
        if cli.family.is_some()  { serial.family = cli.family; }
        if cli.baud.is_some()    { serial.baud = cli.baud; }
    }

    if cli.i2c_bus.is_some() {
        cfg.indicator.get_or_insert_with(IndicatorConfig::default).bus = cli.i2c_bus.clone();
    }
}

/// Required fields and ranges
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        if LevelFilter::from_str(level).is_err() {
            return Err(ConfigError::Validation(format!("unknown log level {:?}", level)));
        }
    }
    if let Some(serial) = cfg.serial.as_ref() {
        if serial.baud == Some(0) {
            return Err(ConfigError::Validation("serial baud must be > 0".into()));
        }
        if serial.port.is_some() && serial.family.is_none() {
            return Err(ConfigError::Validation("serial family is required with an explicit port".into()));
        }
    }
    if let Some(addr) = cfg.indicator.as_ref().and_then(|i| i.address) {
        if addr > 0x7F {
            return Err(ConfigError::Validation(format!("indicator address 0x{:02X} is not 7-bit", addr)));
        }
    }
    Ok(())
}
