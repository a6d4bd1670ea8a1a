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

//! Turning a [`Request`] into a [`Plan`]: the ordered list of operations a run will execute.
//!
//! Planning only reads the device states and the step list. Index errors surface here,
//! before any board is touched.

use crate::devices::{DeviceSet, EnabledState};
use crate::error::FpgaseqError;
use crate::orchestrator::Orchestrator;
use crate::steps::{Step, StepList};
use log::{debug, warn};
use std::fmt;

/// What a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Enable(usize),
    Disable(usize),
    Toggle(usize),
    EnableOnly(usize),
    EnableAll,
    DisableAll,
    ProgramOne(usize),
    ProgramAll,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Enable(i) => write!(f, "enable board {}", i + 1),
            Request::Disable(i) => write!(f, "disable board {}", i + 1),
            Request::Toggle(i) => write!(f, "toggle board {}", i + 1),
            Request::EnableOnly(i) => write!(f, "enable only board {}", i + 1),
            Request::EnableAll => write!(f, "enable all boards"),
            Request::DisableAll => write!(f, "disable all boards"),
            Request::ProgramOne(i) => write!(f, "program board {}", i + 1),
            Request::ProgramAll => write!(f, "program all boards"),
        }
    }
}

/// One entry of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Enable(usize),
    Disable(usize),
    PrepareLoader,
    /// Run `step` while `device` is the enabled board.
    RunStep { device: usize, step: Step },
    /// Bring `device` back to its pre-run `state`.
    Restore { device: usize, state: EnabledState },
    /// Report that `device` was left alone.
    Skip { device: usize },
}

impl Operation {
    /// Progress label of the operation.
    pub fn label(&self) -> String {
        match self {
            Operation::Enable(i) => format!("Enabling board {}", i + 1),
            Operation::Disable(i) => format!("Disabling board {}", i + 1),
            Operation::PrepareLoader => "Initializing loader (may take a while)".to_string(),
            Operation::RunStep { device, step } => {
                format!("Board {}: {}", device + 1, step.label())
            }
            Operation::Restore { device, state } => {
                format!("Restoring {state} board {}", device + 1)
            }
            Operation::Skip { device } => format!("Skipping board {}: state unknown", device + 1),
        }
    }

    /// Whether the operation issues an enable or disable call.
    pub fn is_device_operation(&self) -> bool {
        matches!(self, Operation::Enable(_) | Operation::Disable(_))
    }
}

/// The ordered operations of one request, fixed before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    request: Request,
    operations: Vec<Operation>,
}

impl Plan {
    pub fn request(&self) -> Request {
        self.request
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of progress ticks an uncancelled run emits.
    pub fn total(&self) -> usize {
        self.operations.len()
    }

    pub fn device_operations(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.is_device_operation())
            .count()
    }

    pub(crate) fn into_parts(self) -> (Request, Vec<Operation>) {
        (self.request, self.operations)
    }
}

fn select_only(operations: &mut Vec<Operation>, n: usize, index: usize) {
    operations.push(Operation::Enable(index));
    operations.extend((0..n).filter(|&j| j != index).map(Operation::Disable));
}

fn run_steps(
    operations: &mut Vec<Operation>,
    device: usize,
    steps: &StepList,
    prepare: &mut bool,
) {
    if *prepare {
        operations.push(Operation::PrepareLoader);
        *prepare = false;
    }
    operations.extend(steps.steps().iter().map(|step| Operation::RunStep {
        device,
        step: step.clone(),
    }));
}

fn restore_all(operations: &mut Vec<Operation>, devices: &DeviceSet) {
    operations.extend(
        devices
            .snapshot()
            .iter()
            .map(|(device, state)| Operation::Restore { device, state }),
    );
}

impl Orchestrator {
    /// Build the plan for `request`.
    pub fn plan(
        &self,
        request: Request,
        devices: &DeviceSet,
        steps: &StepList,
    ) -> Result<Plan, FpgaseqError> {
        let plan = match request {
            Request::Enable(i) => self.plan_enable(devices, i),
            Request::Disable(i) => self.plan_disable(devices, i),
            Request::Toggle(i) => self.plan_toggle(devices, i),
            Request::EnableOnly(i) => self.plan_enable_only(devices, i),
            Request::EnableAll => Ok(self.plan_enable_all(devices)),
            Request::DisableAll => Ok(self.plan_disable_all(devices)),
            Request::ProgramOne(i) => self.plan_program_one(devices, steps, i),
            Request::ProgramAll => Ok(self.plan_program_all(devices, steps)),
        }?;
        debug!("Planned {request}: {:?}", plan.operations);
        Ok(plan)
    }

    /// Enable board `index` and disable every other board.
    pub fn plan_enable(&self, devices: &DeviceSet, index: usize) -> Result<Plan, FpgaseqError> {
        devices.check_index(index)?;
        let mut operations = Vec::with_capacity(devices.len());
        select_only(&mut operations, devices.len(), index);
        Ok(Plan {
            request: Request::Enable(index),
            operations,
        })
    }

    pub fn plan_disable(&self, devices: &DeviceSet, index: usize) -> Result<Plan, FpgaseqError> {
        devices.check_index(index)?;
        Ok(Plan {
            request: Request::Disable(index),
            operations: vec![Operation::Disable(index)],
        })
    }

    /// Flip board `index`, or skip it when its state is unknown.
    pub fn plan_toggle(&self, devices: &DeviceSet, index: usize) -> Result<Plan, FpgaseqError> {
        devices.check_index(index)?;
        let operation = match devices.enabled(index) {
            EnabledState::Enabled => Operation::Disable(index),
            EnabledState::Disabled => Operation::Enable(index),
            EnabledState::Unknown => {
                warn!("Board {} is in an unknown state, not toggling it", index + 1);
                Operation::Skip { device: index }
            }
        };
        Ok(Plan {
            request: Request::Toggle(index),
            operations: vec![operation],
        })
    }

    pub fn plan_enable_only(
        &self,
        devices: &DeviceSet,
        index: usize,
    ) -> Result<Plan, FpgaseqError> {
        let mut plan = self.plan_enable(devices, index)?;
        plan.request = Request::EnableOnly(index);
        Ok(plan)
    }

    pub fn plan_enable_all(&self, devices: &DeviceSet) -> Plan {
        Plan {
            request: Request::EnableAll,
            operations: (0..devices.len()).map(Operation::Enable).collect(),
        }
    }

    pub fn plan_disable_all(&self, devices: &DeviceSet) -> Plan {
        Plan {
            request: Request::DisableAll,
            operations: (0..devices.len()).map(Operation::Disable).collect(),
        }
    }

    /// Run the step list on board `index` alone, then restore every board.
    pub fn plan_program_one(
        &self,
        devices: &DeviceSet,
        steps: &StepList,
        index: usize,
    ) -> Result<Plan, FpgaseqError> {
        devices.check_index(index)?;
        let n = devices.len();
        let mut operations = Vec::with_capacity(2 * n + steps.len() + 1);
        let mut prepare = steps.has_bitstream();
        select_only(&mut operations, n, index);
        run_steps(&mut operations, index, steps, &mut prepare);
        restore_all(&mut operations, devices);
        Ok(Plan {
            request: Request::ProgramOne(index),
            operations,
        })
    }

    /// Run the step list on every board in turn, then restore every board.
    pub fn plan_program_all(&self, devices: &DeviceSet, steps: &StepList) -> Plan {
        let n = devices.len();
        let mut operations = Vec::with_capacity(n * (n + steps.len()) + n + 1);
        let mut prepare = steps.has_bitstream();
        for index in 0..n {
            select_only(&mut operations, n, index);
            run_steps(&mut operations, index, steps, &mut prepare);
        }
        restore_all(&mut operations, devices);
        Plan {
            request: Request::ProgramAll,
            operations,
        }
    }
}
