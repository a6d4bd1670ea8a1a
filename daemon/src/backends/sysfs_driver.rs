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

//! Sysfs driver link.
//!
//! Each board is represented by one attribute file that gates its bus access. The
//! typical choice is the `authorized` attribute of the board's USB device:
//! ```text
//! /sys/bus/usb/devices/1-1.2/authorized
//! ```
//! Writing `1` lets the kernel bind the device (enabled), writing `0` unbinds it
//! (disabled). Reading the file returns the current value followed by a newline.

use crate::backends::DriverLink;
use crate::config::BoardConfig;
use crate::error::FpgaseqError;
use crate::system_io::{fs_read, fs_write};
use log::trace;

#[derive(Debug)]
pub struct SysfsDriverLink {
    boards: Vec<BoardConfig>,
}

impl SysfsDriverLink {
    pub fn new(boards: Vec<BoardConfig>) -> Self {
        SysfsDriverLink { boards }
    }

    fn board(&self, index: usize) -> Result<&BoardConfig, FpgaseqError> {
        self.boards.get(index).ok_or_else(|| {
            FpgaseqError::Argument(format!(
                "Board index {index} is out of range: {} board(s) configured.",
                self.boards.len()
            ))
        })
    }

    fn write_state(&self, index: usize, enabled: bool) -> Result<(), FpgaseqError> {
        let board = self.board(index)?;
        let value = if enabled { "1" } else { "0" };
        trace!("Writing {value} to {:?} for {}", board.control_path, board.name);
        fs_write(&board.control_path, false, value)
    }
}

/// Interpret the contents of a bus-enable attribute.
pub(crate) fn parse_enabled(contents: &str) -> Option<bool> {
    match contents.trim_end_matches(['\n', '\0']).trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

impl DriverLink for SysfsDriverLink {
    fn device_count(&self) -> usize {
        self.boards.len()
    }

    fn enable(&self, index: usize) -> Result<(), FpgaseqError> {
        self.write_state(index, true)
    }

    fn disable(&self, index: usize) -> Result<(), FpgaseqError> {
        self.write_state(index, false)
    }

    fn query_enabled(&self, index: usize) -> Result<bool, FpgaseqError> {
        let board = self.board(index)?;
        let contents = fs_read(&board.control_path)?;
        parse_enabled(&contents).ok_or_else(|| {
            FpgaseqError::Argument(format!(
                "Unexpected value {contents:?} in {:?}",
                board.control_path
            ))
        })
    }
}
