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

//! In-memory collaborators for tests.
//!
//! All fakes append to a shared [`Journal`] so tests can assert on the global order of
//! hardware calls, toolchain calls and scripts. Integration tests reach this module
//! through the `test-fakes` feature.

use crate::backends::{DriverLink, Loader, ScriptRunner};
use crate::error::FpgaseqError;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: String) {
        self.0.lock().expect("journal lock").push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal lock").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[derive(Debug, Default)]
struct Boards {
    enabled: Vec<bool>,
    failing: HashSet<usize>,
    unreadable: HashSet<usize>,
}

/// Holds one enable/disable call until the test lets it through.
#[derive(Debug)]
struct Gate {
    entered: Sender<()>,
    release: Receiver<()>,
}

#[derive(Debug, Clone)]
pub struct FakeDriverLink {
    boards: Arc<Mutex<Boards>>,
    gate: Arc<Mutex<Option<Gate>>>,
    journal: Journal,
}

impl FakeDriverLink {
    pub fn new(enabled: &[bool], journal: Journal) -> Self {
        FakeDriverLink {
            boards: Arc::new(Mutex::new(Boards {
                enabled: enabled.to_vec(),
                ..Boards::default()
            })),
            gate: Arc::new(Mutex::new(None)),
            journal,
        }
    }

    /// Make every enable/disable of `index` fail.
    pub fn fail(&self, index: usize) {
        self.boards.lock().expect("boards lock").failing.insert(index);
    }

    /// Make queries of `index` fail.
    pub fn unreadable(&self, index: usize) {
        self.boards.lock().expect("boards lock").unreadable.insert(index);
    }

    /// Switch `index` from outside the daemon. Not journaled.
    pub fn force(&self, index: usize, enabled: bool) {
        self.boards.lock().expect("boards lock").enabled[index] = enabled;
    }

    /// Block the next enable/disable after it is journaled and before it takes effect.
    ///
    /// The returned receiver fires once the call is blocked; sending on the returned
    /// sender lets it complete.
    pub fn hold_next_switch(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().expect("gate lock") = Some(Gate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    pub fn states(&self) -> Vec<bool> {
        self.boards.lock().expect("boards lock").enabled.clone()
    }

    fn set(&self, index: usize, enabled: bool) -> Result<(), FpgaseqError> {
        let action = if enabled { "enable" } else { "disable" };
        self.journal.record(format!("{action}({index})"));
        let gate = self.gate.lock().expect("gate lock").take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }
        let mut boards = self.boards.lock().expect("boards lock");
        if boards.failing.contains(&index) {
            return Err(FpgaseqError::Internal(format!("injected {action} failure")));
        }
        boards.enabled[index] = enabled;
        Ok(())
    }
}

impl DriverLink for FakeDriverLink {
    fn device_count(&self) -> usize {
        self.boards.lock().expect("boards lock").enabled.len()
    }

    fn enable(&self, index: usize) -> Result<(), FpgaseqError> {
        self.set(index, true)
    }

    fn disable(&self, index: usize) -> Result<(), FpgaseqError> {
        self.set(index, false)
    }

    fn query_enabled(&self, index: usize) -> Result<bool, FpgaseqError> {
        let boards = self.boards.lock().expect("boards lock");
        if boards.unreadable.contains(&index) {
            return Err(FpgaseqError::Internal("injected query failure".into()));
        }
        Ok(boards.enabled[index])
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeLoader {
    journal: Journal,
    rejected: HashSet<String>,
}

impl FakeLoader {
    pub fn new(journal: Journal) -> Self {
        FakeLoader {
            journal,
            rejected: HashSet::new(),
        }
    }

    pub fn rejecting(mut self, path: &str) -> Self {
        self.rejected.insert(path.to_string());
        self
    }
}

impl Loader for FakeLoader {
    fn is_available(&self) -> bool {
        true
    }

    fn prepare(&self, wait_ready: bool) -> Result<(), FpgaseqError> {
        self.journal.record(format!("prepare({wait_ready})"));
        Ok(())
    }

    fn program(&self, path: &str) -> Result<(), FpgaseqError> {
        self.journal.record(format!("program({path})"));
        if self.rejected.contains(path) {
            return Err(FpgaseqError::Loader(format!("{path} is not a valid bitstream")));
        }
        Ok(())
    }

    fn close(&self) {
        self.journal.record("close".to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeScriptRunner {
    journal: Journal,
    exit_codes: HashMap<String, i32>,
}

impl FakeScriptRunner {
    pub fn new(journal: Journal) -> Self {
        FakeScriptRunner {
            journal,
            exit_codes: HashMap::new(),
        }
    }

    pub fn exiting(mut self, path: &str, code: i32) -> Self {
        self.exit_codes.insert(path.to_string(), code);
        self
    }
}

impl ScriptRunner for FakeScriptRunner {
    fn run(&self, path: &str) -> Result<Option<i32>, FpgaseqError> {
        self.journal.record(format!("script({path})"));
        Ok(Some(self.exit_codes.get(path).copied().unwrap_or(0)))
    }
}
