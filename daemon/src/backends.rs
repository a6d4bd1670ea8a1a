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

//! Collaborator abstractions for hardware and external tools.
//!
//! The orchestration core never touches a board, a toolchain or a script directly.
//! It goes through three traits, each constructed once in `main` and passed in
//! explicitly so that tests can substitute in-memory fakes:
//! - [`DriverLink`] - flips and queries a single board's bus-enable line
//! - [`Loader`] - the vendor toolchain that writes a bitstream to whichever board is enabled
//! - [`ScriptRunner`] - runs a user-provided script and reports its exit code
//!
//! The production implementations live in the submodules:
//! - [`sysfs_driver::SysfsDriverLink`]
//! - [`toolchain_loader::ToolchainLoader`]
//! - [`script_runner::CommandScriptRunner`]

pub mod script_runner;
pub mod sysfs_driver;
pub mod toolchain_loader;

use crate::error::FpgaseqError;

/// Single-device physical control primitives.
///
/// Indices are 0-based positions in the configured board list. Every call is a real
/// hardware side effect, issued immediately and never batched.
pub trait DriverLink: Send {
    /// Number of boards reachable through this link. Fixed for the link's lifetime.
    fn device_count(&self) -> usize;

    /// Give board `index` access to the shared bus.
    ///
    /// # Returns: `Result<(), FpgaseqError>`
    /// * `Ok(())` - Board enabled
    /// * `Err(FpgaseqError)` - The driver call failed
    fn enable(&self, index: usize) -> Result<(), FpgaseqError>;

    /// Remove board `index` from the shared bus.
    fn disable(&self, index: usize) -> Result<(), FpgaseqError>;

    /// Read back whether board `index` is currently enabled.
    fn query_enabled(&self, index: usize) -> Result<bool, FpgaseqError>;
}

/// External toolchain that writes bitstreams.
pub trait Loader: Send + Sync {
    /// Whether the toolchain can be found at all. Bitstream steps are refused when it can't.
    fn is_available(&self) -> bool;

    /// Initialise the toolchain. May be slow.
    ///
    /// # Arguments
    ///
    /// * `wait_ready` - block until the toolchain is ready; when `false` initialisation is
    ///   only started and a later `prepare(true)` or `program` waits for it.
    fn prepare(&self, wait_ready: bool) -> Result<(), FpgaseqError>;

    /// Load the bitstream at `path` onto whichever board is currently enabled.
    ///
    /// # Returns: `Result<(), FpgaseqError>`
    /// * `Ok(())` - Bitstream loaded
    /// * `Err(FpgaseqError::Loader)` - Toolchain unavailable or the file was rejected
    fn program(&self, path: &str) -> Result<(), FpgaseqError>;

    /// Release anything started by `prepare`.
    fn close(&self);
}

/// Runs a script step.
pub trait ScriptRunner: Send + Sync {
    /// Run `path` to completion and return its exit code (`None` if killed by a signal).
    fn run(&self, path: &str) -> Result<Option<i32>, FpgaseqError>;
}

#[cfg(any(test, feature = "test-fakes"))]
pub mod fake;
