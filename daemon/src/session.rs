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

//! Daemon-wide state shared by the DBus interfaces.
//!
//! The session owns the [`DeviceSet`] while no run is active and hands it to the run
//! otherwise, so "busy" is simply the device set being away. The step list is only
//! editable while idle; a run works on the copy taken when it was planned.

use crate::backends::Loader;
use crate::devices::DeviceSet;
use crate::error::FpgaseqError;
use crate::orchestrator::{Completed, Orchestrator, Request, RunResult};
use crate::steps::{Step, StepList};
use crate::task::{Progress, TaskController, TaskEvent, TaskHandle};
use log::{error, info, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running(Progress),
    Paused(Progress),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running(p) => write!(f, "running [{}/{}] {}", p.index, p.total, p.label),
            RunStatus::Paused(p) => write!(f, "paused [{}/{}] {}", p.index, p.total, p.label),
        }
    }
}

/// What the relay reports to its listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Event(TaskEvent),
    Finished(RunResult),
    /// The worker died; its boards are no longer tracked.
    Abandoned,
}

pub struct Session {
    orchestrator: Orchestrator,
    devices: Option<DeviceSet>,
    board_names: Vec<String>,
    steps: StepList,
    active: Option<TaskController>,
    status: RunStatus,
    last_result: Option<RunResult>,
    prepare_on_add: bool,
}

impl Session {
    pub fn new(
        orchestrator: Orchestrator,
        devices: DeviceSet,
        board_names: Vec<String>,
        prepare_on_add: bool,
    ) -> Self {
        Session {
            orchestrator,
            devices: Some(devices),
            board_names,
            steps: StepList::new(),
            active: None,
            status: RunStatus::Idle,
            last_result: None,
            prepare_on_add,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    fn ensure_idle(&self, action: &str) -> Result<(), FpgaseqError> {
        if self.is_busy() {
            return Err(FpgaseqError::Busy(format!(
                "Cannot {action} while a run is in progress."
            )));
        }
        Ok(())
    }

    fn lost() -> FpgaseqError {
        FpgaseqError::Internal("Board states were lost by a failed run.".to_string())
    }

    /// One line per board: number, name and state.
    ///
    /// States are re-read from the hardware when no run is active.
    pub fn boards(&mut self) -> Result<String, FpgaseqError> {
        if self.is_busy() {
            return Err(FpgaseqError::Busy(
                "Board states are unavailable while a run is in progress.".to_string(),
            ));
        }
        let devices = self.devices.as_mut().ok_or_else(Self::lost)?;
        devices.refresh();
        let states = devices.states().to_vec();
        let lines: Vec<String> = states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let name = self.board_names.get(i).map(String::as_str).unwrap_or("");
                format!("{} {name} {state}", i + 1)
            })
            .collect();
        Ok(lines.join("\n"))
    }

    pub fn step_list(&self) -> &StepList {
        &self.steps
    }

    /// One line per step, the selected one marked with `>`.
    pub fn steps_listing(&self) -> String {
        self.steps
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let marker = if self.steps.selected() == Some(i) { ">" } else { " " };
                format!("{marker} {} {step}", i + 1)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    pub fn loader_available(&self) -> bool {
        self.orchestrator.loader().is_available()
    }

    /// Parse and insert a step. Returns its position.
    pub fn add_step(&mut self, kind: &str, parameter: &str) -> Result<usize, FpgaseqError> {
        self.ensure_idle("edit the step list")?;
        let step = Step::parse(kind, parameter)?;
        if step.is_bitstream() {
            let loader = self.orchestrator.loader();
            if !loader.is_available() {
                return Err(FpgaseqError::Argument(
                    "Bitstream steps need the loader toolchain, which is not installed."
                        .to_string(),
                ));
            }
            if self.prepare_on_add {
                if let Err(e) = loader.prepare(false) {
                    warn!("Could not start loader preparation: {e}");
                }
            }
        }
        Ok(self.steps.insert(step))
    }

    /// Select step `index`; a negative index clears the selection.
    pub fn select_step(&mut self, index: i32) -> Result<Option<usize>, FpgaseqError> {
        self.ensure_idle("edit the step list")?;
        self.steps.select(usize::try_from(index).ok());
        Ok(self.steps.selected())
    }

    pub fn move_step(&mut self, offset: isize) -> Result<bool, FpgaseqError> {
        self.ensure_idle("edit the step list")?;
        Ok(self.steps.move_selected(offset))
    }

    pub fn remove_step(&mut self) -> Result<Option<Step>, FpgaseqError> {
        self.ensure_idle("edit the step list")?;
        Ok(self.steps.remove_selected())
    }

    /// Plan `request` and start it in the background.
    pub fn begin(&mut self, request: Request) -> Result<TaskHandle<Completed>, FpgaseqError> {
        self.ensure_idle("start another run")?;
        // Boards can be switched behind our back between runs.
        let devices = self.devices.as_mut().ok_or_else(Self::lost)?;
        devices.refresh();
        let plan = self.orchestrator.plan(request, devices, &self.steps)?;
        let devices = self.devices.take().ok_or_else(Self::lost)?;
        self.status = RunStatus::Running(Progress {
            label: format!("Starting {request}"),
            index: 0,
            total: plan.total(),
        });
        let handle = self.orchestrator.start(plan, devices);
        self.active = Some(handle.controller());
        Ok(handle)
    }

    pub fn observe(&mut self, event: &TaskEvent) {
        self.status = match (event, &self.status) {
            (TaskEvent::Progress(progress), _) => RunStatus::Running(progress.clone()),
            (TaskEvent::Paused { label }, RunStatus::Running(p)) => RunStatus::Paused(Progress {
                label: label.clone(),
                ..p.clone()
            }),
            (TaskEvent::Resumed, RunStatus::Paused(p)) => RunStatus::Running(p.clone()),
            (_, status) => status.clone(),
        };
    }

    pub fn complete(&mut self, completed: Completed) {
        self.devices = Some(completed.devices);
        self.last_result = Some(completed.result);
        self.active = None;
        self.status = RunStatus::Idle;
    }

    /// Forget a run whose worker died. Its board states are gone with it.
    pub fn abandon(&mut self) {
        self.active = None;
        self.status = RunStatus::Idle;
    }

    pub fn resume(&self) -> Result<(), FpgaseqError> {
        match &self.active {
            Some(controller) if controller.resume() => Ok(()),
            _ => Err(FpgaseqError::Argument(
                "No run is waiting at a pause.".to_string(),
            )),
        }
    }

    pub fn cancel(&self) -> Result<(), FpgaseqError> {
        match &self.active {
            Some(controller) => {
                controller.cancel();
                Ok(())
            }
            None => Err(FpgaseqError::Argument("No run is in progress.".to_string())),
        }
    }

    /// Cancel any active run and hand back the loader so it can be closed off the runtime.
    pub fn shutdown(&self) -> Arc<dyn Loader> {
        if let Some(controller) = &self.active {
            controller.cancel();
        }
        Arc::clone(self.orchestrator.loader())
    }
}

/// Drain `handle` into `session` until the run completes, passing every notice on.
pub async fn relay<F, Fut>(session: SharedSession, mut handle: TaskHandle<Completed>, notify: F)
where
    F: Fn(Notice) -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(event) = handle.next_event().await {
        session.lock().await.observe(&event);
        notify(Notice::Event(event)).await;
    }
    match handle.finish().await {
        Ok(completed) => {
            let result = completed.result.clone();
            info!("Run finished: {}", result.summary());
            session.lock().await.complete(completed);
            notify(Notice::Finished(result)).await;
        }
        Err(e) => {
            error!("{e}");
            session.lock().await.abandon();
            notify(Notice::Abandoned).await;
        }
    }
}
