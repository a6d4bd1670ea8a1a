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

use log::error;
use std::path::PathBuf;
use zbus::fdo;

#[derive(Debug, thiserror::Error)]
pub enum FpgaseqError {
    #[error("FpgaseqError::DeviceIO: Failed to {action} board {}: {reason}", .device + 1)]
    DeviceIO {
        device: usize,
        action: &'static str,
        reason: String,
    },
    #[error("FpgaseqError::Loader: {0}")]
    Loader(String),
    #[error("FpgaseqError::ScriptExit: {path} exited with status {code:?}")]
    ScriptExit { path: String, code: Option<i32> },
    #[error("FpgaseqError::ScriptLaunch: Failed to start {path}: {e}")]
    ScriptLaunch { path: String, e: std::io::Error },
    #[error("FpgaseqError::UnknownStep: Ignoring unknown programming command {kind:?} ({parameter:?})")]
    UnknownStep { kind: String, parameter: String },
    #[error("FpgaseqError::Argument: {0}")]
    Argument(String),
    #[error("FpgaseqError::Busy: {0}")]
    Busy(String),
    #[error("FpgaseqError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("FpgaseqError::IOWrite: An IO error occurred when writing {data:?} to {file:?}: {e}")]
    IOWrite {
        data: String,
        file: PathBuf,
        e: std::io::Error,
    },
    #[error("FpgaseqError::TomlDe: Failed to parse {file:?}: {e}")]
    TomlDe { file: PathBuf, e: toml::de::Error },
    #[error("FpgaseqError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl From<FpgaseqError> for fdo::Error {
    fn from(err: FpgaseqError) -> Self {
        error!("{err}");
        match err {
            FpgaseqError::Argument(..) => fdo::Error::InvalidArgs(err.to_string()),
            FpgaseqError::UnknownStep { .. } => fdo::Error::InvalidArgs(err.to_string()),
            FpgaseqError::Busy(..) => fdo::Error::LimitsExceeded(err.to_string()),
            FpgaseqError::DeviceIO { .. } => fdo::Error::IOError(err.to_string()),
            FpgaseqError::IORead { .. } => fdo::Error::IOError(err.to_string()),
            FpgaseqError::IOWrite { .. } => fdo::Error::IOError(err.to_string()),
            _ => fdo::Error::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn device_io_displays_one_based_board() {
        let err = FpgaseqError::DeviceIO {
            device: 0,
            action: "enable",
            reason: "permission denied".into(),
        };
        expect_that!(
            err.to_string(),
            contains_substring("Failed to enable board 1: permission denied")
        );
    }

    #[gtest]
    fn argument_maps_to_invalid_args() {
        let err: fdo::Error = FpgaseqError::Argument("no such board".into()).into();
        expect_that!(
            matches!(err, fdo::Error::InvalidArgs(_)),
            eq(true),
            "argument errors should become InvalidArgs"
        );
    }
}
