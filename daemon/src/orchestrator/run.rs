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

//! Executing a plan against the hardware.
//!
//! [`PlanRun`] records every failure as an [`Anomaly`] and carries on. After a cancel only
//! the restores of boards it already switched are still run.

use crate::backends::{Loader, ScriptRunner};
use crate::devices::{DeviceSet, RestoreAction};
use crate::error::FpgaseqError;
use crate::orchestrator::plan::{Operation, Plan, Request};
use crate::steps::Step;
use crate::task::{TaskContext, UnitOfWork};
use log::{info, trace, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// An enable or disable call failed; the board is now unknown.
    DeviceIO,
    /// Loader preparation failed or a bitstream was rejected.
    Loader,
    /// A script could not be started or exited unsuccessfully.
    Script,
    /// A board was not restored because its state is unknown.
    NotRestored,
    /// A board was skipped because its state is unknown.
    Skipped,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::DeviceIO => write!(f, "device-io"),
            AnomalyKind::Loader => write!(f, "loader"),
            AnomalyKind::Script => write!(f, "script"),
            AnomalyKind::NotRestored => write!(f, "not-restored"),
            AnomalyKind::Skipped => write!(f, "skipped"),
        }
    }
}

/// Something that went wrong during a run without stopping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    /// Label of the operation it happened in.
    pub operation: String,
    pub kind: AnomalyKind,
    pub message: String,
}

/// Outcome of one executed plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub request: Request,
    /// Operations actually executed.
    pub executed: usize,
    pub total: usize,
    /// Boards left in the unknown state.
    pub unknown_devices: Vec<usize>,
    pub cancelled: bool,
    pub anomalies: Vec<Anomaly>,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.anomalies.is_empty()
    }

    /// One-line description of the outcome.
    pub fn summary(&self) -> String {
        let outcome = if self.succeeded() {
            "succeeded"
        } else if self.cancelled {
            "was cancelled"
        } else {
            "finished with errors"
        };
        let mut summary = format!(
            "{} {outcome} ({}/{} operations)",
            self.request, self.executed, self.total
        );
        if !self.unknown_devices.is_empty() {
            let boards: Vec<String> = self
                .unknown_devices
                .iter()
                .map(|i| (i + 1).to_string())
                .collect();
            summary.push_str(&format!(", unknown board(s): {}", boards.join(", ")));
        }
        summary
    }
}

/// What a finished run hands back.
#[derive(Debug)]
pub struct Completed {
    pub result: RunResult,
    pub devices: DeviceSet,
}

/// A [`Plan`] bound to the collaborators that execute it.
pub struct PlanRun {
    request: Request,
    operations: Vec<Operation>,
    devices: DeviceSet,
    loader: Arc<dyn Loader>,
    scripts: Arc<dyn ScriptRunner>,
    touched: BTreeSet<usize>,
    anomalies: Vec<Anomaly>,
}

impl PlanRun {
    pub fn new(
        plan: Plan,
        devices: DeviceSet,
        loader: Arc<dyn Loader>,
        scripts: Arc<dyn ScriptRunner>,
    ) -> Self {
        let (request, operations) = plan.into_parts();
        PlanRun {
            request,
            operations,
            devices,
            loader,
            scripts,
            touched: BTreeSet::new(),
            anomalies: Vec::new(),
        }
    }

    fn record(&mut self, operation: &Operation, kind: AnomalyKind, message: String) {
        warn!("{}: {message}", operation.label());
        self.anomalies.push(Anomaly {
            operation: operation.label(),
            kind,
            message,
        });
    }

    /// Whether a cancelled run still has to execute `operation`.
    fn survives_cancel(&self, operation: &Operation) -> bool {
        match operation {
            Operation::Restore { device, .. } => self.touched.contains(device),
            _ => false,
        }
    }

    fn execute(&mut self, operation: &Operation, task: &mut TaskContext) {
        match operation {
            Operation::Enable(i) | Operation::Disable(i) => {
                self.touched.insert(*i);
                let result = if matches!(operation, Operation::Enable(_)) {
                    self.devices.enable(*i)
                } else {
                    self.devices.disable(*i)
                };
                if let Err(e) = result {
                    self.record(operation, AnomalyKind::DeviceIO, e.to_string());
                }
            }
            Operation::PrepareLoader => {
                if let Err(e) = self.loader.prepare(true) {
                    self.record(operation, AnomalyKind::Loader, e.to_string());
                }
            }
            Operation::RunStep { step, .. } => self.run_step(operation, step, task),
            Operation::Restore { device, state } => {
                match self.devices.restore_device(*device, *state) {
                    Ok(RestoreAction::Skipped) => self.record(
                        operation,
                        AnomalyKind::NotRestored,
                        format!("Board {} is in an unknown state", device + 1),
                    ),
                    Ok(action) => trace!("Restore of board {}: {action:?}", device + 1),
                    Err(e) => self.record(operation, AnomalyKind::DeviceIO, e.to_string()),
                }
            }
            Operation::Skip { device } => self.record(
                operation,
                AnomalyKind::Skipped,
                format!("Board {} is in an unknown state", device + 1),
            ),
        }
    }

    fn run_step(&mut self, operation: &Operation, step: &Step, task: &mut TaskContext) {
        match step {
            Step::Pause { label } => task.pause(label),
            Step::Script { path } => match self.scripts.run(path) {
                Ok(Some(0)) => trace!("{path} exited successfully"),
                Ok(code) => {
                    let e = FpgaseqError::ScriptExit {
                        path: path.clone(),
                        code,
                    };
                    self.record(operation, AnomalyKind::Script, e.to_string());
                }
                Err(e) => self.record(operation, AnomalyKind::Script, e.to_string()),
            },
            Step::Bitstream { path } => {
                if let Err(e) = self.loader.program(path) {
                    self.record(operation, AnomalyKind::Loader, e.to_string());
                }
            }
        }
    }
}

impl UnitOfWork for PlanRun {
    type Output = Completed;

    fn total(&self) -> usize {
        self.operations.len()
    }

    fn run(mut self, task: &mut TaskContext) -> Completed {
        let operations = std::mem::take(&mut self.operations);
        let total = operations.len();
        let mut executed = 0;
        let mut cancelled = false;
        for operation in &operations {
            if task.is_cancelled() {
                cancelled = true;
                if !self.survives_cancel(operation) {
                    trace!("Cancelled, skipping: {}", operation.label());
                    continue;
                }
            }
            task.step(operation.label());
            self.execute(operation, task);
            executed += 1;
        }
        let result = RunResult {
            request: self.request,
            executed,
            total,
            unknown_devices: self.devices.unknown_devices(),
            cancelled,
            anomalies: self.anomalies,
        };
        info!("{}", result.summary());
        Completed {
            result,
            devices: self.devices,
        }
    }
}
