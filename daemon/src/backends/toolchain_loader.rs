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

//! Vendor toolchain loader.
//!
//! Bitstreams are written by an external toolchain (Vivado by default). The toolchain is
//! driven entirely through its command line: an optional "prepare" invocation that brings
//! up the hardware server, and a "program" invocation that receives the bitstream path in
//! place of the `{bitstream}` placeholder. Both are configured in the `[loader]` section
//! of the config file, see [`crate::config`].

use crate::backends::Loader;
use crate::config::{BITSTREAM_PLACEHOLDER, LoaderConfig};
use crate::error::FpgaseqError;
use log::{info, trace, warn};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct ToolchainLoader {
    config: LoaderConfig,
    /// A prepare invocation started with `wait_ready = false`.
    pending: Mutex<Option<Child>>,
    ready: AtomicBool,
}

impl ToolchainLoader {
    pub fn new(config: LoaderConfig) -> Self {
        ToolchainLoader {
            config,
            pending: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.config.program);
        command.args(args);
        command
    }

    fn program_args(&self, bitstream: &str) -> Vec<String> {
        self.config
            .program_args
            .iter()
            .map(|arg| arg.replace(BITSTREAM_PLACEHOLDER, bitstream))
            .collect()
    }

    fn lock_pending(&self) -> Result<MutexGuard<'_, Option<Child>>, FpgaseqError> {
        self.pending
            .lock()
            .map_err(|e| FpgaseqError::Internal(format!("Failed to lock loader state: {e}")))
    }

    fn wait_child(&self, mut child: Child) -> Result<(), FpgaseqError> {
        trace!("Waiting for background toolchain initialisation");
        let status = child.wait().map_err(|e| {
            FpgaseqError::Loader(format!("Failed to wait for {}: {e}", self.config.program))
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(FpgaseqError::Loader(format!(
                "{} initialisation exited with {status}",
                self.config.program
            )))
        }
    }
}

/// Helper to run the toolchain binary with arguments and collect its output
fn run_toolchain(mut command: Command, program: &str) -> Result<String, FpgaseqError> {
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|e| FpgaseqError::Loader(format!("Failed to start {program}: {e}")))?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(FpgaseqError::Loader(format!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

impl Loader for ToolchainLoader {
    fn is_available(&self) -> bool {
        which::which(&self.config.program).is_ok()
    }

    fn prepare(&self, wait_ready: bool) -> Result<(), FpgaseqError> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }
        if self.config.prepare_args.is_empty() {
            trace!("No prepare command configured, toolchain is ready");
            self.ready.store(true, Ordering::Release);
            return Ok(());
        }

        // The state lock is only held to move the child in or out, never across a wait.
        let mut pending = self.lock_pending()?;
        if pending.is_some() && !wait_ready {
            return Ok(());
        }
        let running = pending.take();
        match running {
            Some(child) => {
                drop(pending);
                self.wait_child(child)?;
            }
            None if wait_ready => {
                drop(pending);
                info!("Initializing {} (may take a while)", self.config.program);
                run_toolchain(
                    self.command(&self.config.prepare_args),
                    &self.config.program,
                )?;
            }
            None => {
                info!("Initializing {} in the background", self.config.program);
                let child = self
                    .command(&self.config.prepare_args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .spawn()
                    .map_err(|e| {
                        FpgaseqError::Loader(format!("Failed to start {}: {e}", self.config.program))
                    })?;
                *pending = Some(child);
                return Ok(());
            }
        }
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn program(&self, path: &str) -> Result<(), FpgaseqError> {
        if !self.is_available() {
            return Err(FpgaseqError::Loader(format!(
                "{} is not available, cannot program {path}",
                self.config.program
            )));
        }
        self.prepare(true)?;
        info!("Programming {path}");
        let output = run_toolchain(
            self.command(&self.program_args(path)),
            &self.config.program,
        )?;
        trace!("{} output: {output}", self.config.program);
        Ok(())
    }

    fn close(&self) {
        let child = match self.lock_pending() {
            Ok(mut pending) => pending.take(),
            Err(e) => {
                warn!("{e}, not stopping the toolchain");
                None
            }
        };
        if let Some(mut child) = child {
            info!("Stopping background {}", self.config.program);
            if let Err(e) = child.kill() {
                warn!("Failed to stop {}: {e}", self.config.program);
            }
            let _ = child.wait();
        }
        self.ready.store(false, Ordering::Release);
    }
}
