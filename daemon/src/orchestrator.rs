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

//! Request planning and plan execution.
//!
//! The [`Orchestrator`] turns a caller's [`Request`] into a [`Plan`]: the complete,
//! ordered list of operations the request needs, computed before any hardware call is
//! made. Planning is pure; it reads the tracked board states and the step list and
//! fails fast on an invalid board index. Execution ([`Orchestrator::start`]) hands the
//! plan and the [`DeviceSet`] to a [`BackgroundTask`] and returns immediately.
//!
//! # Plans
//!
//! For `n` boards and a step list of `s` steps:
//!
//! | request        | operations                                                            |
//! |----------------|-----------------------------------------------------------------------|
//! | enable / only  | enable(i), disable(j) for every j != i ascending: `n`                 |
//! | disable        | disable(i): `1`                                                       |
//! | toggle         | one enable or disable, or a single skip when the state is unknown     |
//! | enable all     | enable(j) for every j: `n`                                            |
//! | disable all    | disable(j) for every j: `n`                                           |
//! | program        | `n` (target) + prepare if any bitstream + `s` + `n` restores          |
//! | program all    | `n * (n + s)` + prepare if any bitstream + `n` restores               |
//!
//! The loader is prepared at most once per plan, immediately before the first step
//! execution. Program plans always end by restoring every board, in ascending order, to
//! the state captured when the plan was built.
//!
//! # Execution guarantees
//!
//! No run-time failure aborts a plan. Failed board calls leave the board unknown, a
//! rejected bitstream or a failing script is recorded, and the run carries on. A
//! cancelled run skips everything except the restore operations of boards it already
//! touched. Every such event ends up in the [`RunResult`].

pub mod plan;
pub mod run;

pub use plan::{Operation, Plan, Request};
pub use run::{Anomaly, AnomalyKind, Completed, PlanRun, RunResult};

use crate::backends::{Loader, ScriptRunner};
use crate::devices::DeviceSet;
use crate::task::{BackgroundTask, TaskHandle};
use log::info;
use std::sync::Arc;

pub struct Orchestrator {
    loader: Arc<dyn Loader>,
    scripts: Arc<dyn ScriptRunner>,
}

impl Orchestrator {
    pub fn new(loader: Arc<dyn Loader>, scripts: Arc<dyn ScriptRunner>) -> Self {
        Orchestrator { loader, scripts }
    }

    pub fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    /// Execute `plan` in the background against `devices`.
    ///
    /// The device set is owned by the run until it completes and comes back inside
    /// [`Completed`].
    pub fn start(&self, plan: Plan, devices: DeviceSet) -> TaskHandle<Completed> {
        info!(
            "Starting {} with {} operation(s)",
            plan.request(),
            plan.total()
        );
        BackgroundTask::run(PlanRun::new(
            plan,
            devices,
            self.loader.clone(),
            self.scripts.clone(),
        ))
    }
}
