// This file is part of fpgaseq, an application to sequence programming runs across FPGA boards sharing one bus.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// fpgaseq is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// fpgaseq is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! Daemon configuration.
//!
//! Fixed identifiers (DBus names, object paths) are plain constants. Everything that
//! depends on the bench the daemon is installed on (which boards exist, how to reach
//! their enable line, which toolchain loads bitstreams) is read once at startup from a
//! TOML file:
//!
//! ```toml
//! [[boards]]
//! name = "left"
//! control_path = "/sys/bus/usb/devices/1-1.1/authorized"
//!
//! [[boards]]
//! name = "right"
//! control_path = "/sys/bus/usb/devices/1-1.2/authorized"
//!
//! [loader]
//! program = "vivado"
//! prepare_args = ["-mode", "batch", "-source", "/usr/share/fpgaseq/hw_server.tcl"]
//! program_args = ["-mode", "batch", "-source", "/usr/share/fpgaseq/program.tcl", "-tclargs", "{bitstream}"]
//! prepare_on_add = false
//! ```
//!
//! A missing or unreadable file is not fatal: the daemon warns and starts with the
//! hardcoded defaults (no boards, `vivado` as the loader).

use crate::error::FpgaseqError;
use crate::system_io::fs_read;
use log::{trace, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Well-known bus name of the daemon.
pub static DBUS_SERVICE_NAME: &str = "com.canonical.fpgaseq";

/// Object path of the control interface (requests that touch hardware or the step list).
pub static CONTROL_OBJECT_PATH: &str = "/com/canonical/fpgaseq/control";

/// Object path of the read-only status interface.
pub static STATUS_OBJECT_PATH: &str = "/com/canonical/fpgaseq/status";

/// Default location of the configuration file.
pub static CONFIG_PATH: &str = "/etc/fpgaseq/config.toml";

/// Environment variable overriding [`CONFIG_PATH`].
pub static CONFIG_PATH_ENV: &str = "FPGASEQ_CONFIG";

/// Placeholder substituted with the bitstream path in `loader.program_args`.
pub static BITSTREAM_PLACEHOLDER: &str = "{bitstream}";

static DEFAULT_LOADER_PROGRAM: &str = "vivado";

/// One board as seen by the sysfs driver link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    /// Attribute file controlling the board's bus access: `1` enables, `0` disables.
    pub control_path: PathBuf,
}

/// How to drive the vendor toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub program: String,
    pub prepare_args: Vec<String>,
    pub program_args: Vec<String>,
    /// Warm up the toolchain in the background as soon as a bitstream step is added.
    pub prepare_on_add: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            program: DEFAULT_LOADER_PROGRAM.to_string(),
            prepare_args: Vec::new(),
            program_args: vec![
                "-mode".to_string(),
                "batch".to_string(),
                "-nojournal".to_string(),
                "-nolog".to_string(),
                "-source".to_string(),
                "/usr/share/fpgaseq/program.tcl".to_string(),
                "-tclargs".to_string(),
                BITSTREAM_PLACEHOLDER.to_string(),
            ],
            prepare_on_add: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemConfig {
    pub boards: Vec<BoardConfig>,
    pub loader: LoaderConfig,
}

/// This is the top level struct which holds all sections
#[derive(Debug, Deserialize)]
struct TomlConfig {
    boards: Option<Vec<BoardConfig>>,
    loader: Option<LoaderToml>,
}

#[derive(Debug, Deserialize)]
struct LoaderToml {
    program: Option<String>,
    prepare_args: Option<Vec<String>>,
    program_args: Option<Vec<String>>,
    prepare_on_add: Option<bool>,
}

impl From<LoaderToml> for LoaderConfig {
    fn from(value: LoaderToml) -> Self {
        trace!("User provided loader config: {value:?}");
        let defaults = LoaderConfig::default();
        LoaderConfig {
            program: value.program.unwrap_or_else(|| {
                trace!("No loader program provided. Using hardcoded value.");
                defaults.program
            }),
            prepare_args: value.prepare_args.unwrap_or(defaults.prepare_args),
            program_args: value.program_args.unwrap_or(defaults.program_args),
            prepare_on_add: value.prepare_on_add.unwrap_or(defaults.prepare_on_add),
        }
    }
}

impl From<TomlConfig> for SystemConfig {
    fn from(value: TomlConfig) -> Self {
        SystemConfig {
            boards: value.boards.unwrap_or_else(|| {
                warn!("Config file has no [[boards]] entries.");
                Vec::new()
            }),
            loader: value.loader.map(LoaderConfig::from).unwrap_or_default(),
        }
    }
}

/// Parse a configuration document.
pub fn parse_config(toml_string: &str, origin: &Path) -> Result<SystemConfig, FpgaseqError> {
    let config: TomlConfig = toml::from_str(toml_string).map_err(|e| FpgaseqError::TomlDe {
        file: origin.to_path_buf(),
        e,
    })?;
    Ok(config.into())
}

/// Read and parse the configuration file at `config_path`.
pub fn config_from_file(config_path: &Path) -> Result<SystemConfig, FpgaseqError> {
    if !config_path.is_file() {
        return Err(FpgaseqError::Internal(format!(
            "Config file not found in {config_path:?}."
        )));
    }
    let toml_string = fs_read(config_path)?;
    parse_config(&toml_string, config_path)
}

/// Location of the configuration file, honouring [`CONFIG_PATH_ENV`].
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
}

/// Load the system configuration, falling back to defaults on any failure.
pub fn load_system_config() -> SystemConfig {
    let path = config_path();
    match config_from_file(&path) {
        Ok(config) => {
            trace!("Successfully loaded config: {config:?}");
            config
        }
        Err(e) => {
            warn!("Using hardcoded defaults because failed to load config: {e}");
            SystemConfig::default()
        }
    }
}
