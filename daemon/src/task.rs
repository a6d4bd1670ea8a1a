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

//! Cancellable background execution with progress reporting.
//!
//! A [`UnitOfWork`] is a sequence of labeled sub-steps whose count is known up front.
//! [`BackgroundTask::run`] moves it onto a blocking worker thread and returns a
//! [`TaskHandle`] immediately. While the work runs:
//! - every [`TaskContext::step`] call publishes a [`TaskEvent::Progress`] tick carrying the
//!   label, the 1-based index and the precomputed total
//! - [`TaskContext::pause`] publishes [`TaskEvent::Paused`] and blocks the worker until
//!   [`TaskController::resume`] (or a cancellation) arrives; there is no timeout
//! - [`TaskController::cancel`] raises a flag that the work checks between sub-steps;
//!   nothing is interrupted mid-call
//!
//! When the work returns, the event stream ends and [`TaskHandle::finish`] yields its output.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use fpgaseqd::task::{BackgroundTask, TaskContext, TaskEvent, UnitOfWork};
//! struct Countdown(usize);
//!
//! impl UnitOfWork for Countdown {
//!     type Output = usize;
//!     fn total(&self) -> usize {
//!         self.0
//!     }
//!     fn run(self, task: &mut TaskContext) -> usize {
//!         for i in (1..=self.0).rev() {
//!             task.step(format!("{i}..."));
//!         }
//!         self.0
//!     }
//! }
//!
//! # async fn example() -> Result<(), fpgaseqd::error::FpgaseqError> {
//! let mut handle = BackgroundTask::run(Countdown(3));
//! while let Some(TaskEvent::Progress(p)) = handle.next_event().await {
//!     println!("{} ({}/{})", p.label, p.index, p.total);
//! }
//! let counted = handle.finish().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::FpgaseqError;
use log::{debug, trace};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One progress tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub label: String,
    /// 1-based.
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Progress(Progress),
    /// The worker is blocked until resumed.
    Paused { label: String },
    Resumed,
}

/// Work that can be moved onto a background worker.
pub trait UnitOfWork: Send + 'static {
    type Output: Send + 'static;

    /// Number of [`TaskContext::step`] calls an uncancelled run makes.
    fn total(&self) -> usize;

    fn run(self, task: &mut TaskContext) -> Self::Output;
}

enum Control {
    Resume,
    /// Sent on cancellation so that a paused worker notices the flag.
    Wake,
}

#[derive(Debug, Default)]
struct Flags {
    cancelled: AtomicBool,
    paused: AtomicBool,
}

/// The worker's side of a running task.
pub struct TaskContext {
    flags: Arc<Flags>,
    control: mpsc::UnboundedReceiver<Control>,
    events: mpsc::UnboundedSender<TaskEvent>,
    index: usize,
    total: usize,
}

impl TaskContext {
    /// Publish the next progress tick.
    pub fn step(&mut self, label: impl Into<String>) {
        self.index += 1;
        let progress = Progress {
            label: label.into(),
            index: self.index,
            total: self.total,
        };
        debug!("[{}/{}] {}", progress.index, progress.total, progress.label);
        // Nobody listening is fine: the work still has to run to completion.
        let _ = self.events.send(TaskEvent::Progress(progress));
    }

    /// Number of ticks published so far.
    pub fn steps_done(&self) -> usize {
        self.index
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::Acquire)
    }

    /// Block until resumed or cancelled.
    pub fn pause(&mut self, label: &str) {
        // Resumes sent before this pause began do not count.
        while self.control.try_recv().is_ok() {}
        if self.is_cancelled() {
            return;
        }
        self.flags.paused.store(true, Ordering::Release);
        let _ = self.events.send(TaskEvent::Paused {
            label: label.to_string(),
        });
        trace!("Worker paused: {label}");
        loop {
            match self.control.blocking_recv() {
                Some(Control::Resume) => break,
                Some(Control::Wake) if self.is_cancelled() => break,
                Some(Control::Wake) => continue,
                None => {
                    // Every controller is gone, nobody can resume us.
                    self.flags.cancelled.store(true, Ordering::Release);
                    break;
                }
            }
        }
        self.flags.paused.store(false, Ordering::Release);
        let _ = self.events.send(TaskEvent::Resumed);
        trace!("Worker resumed");
    }
}

/// The caller's control over a running task. Cheap to clone.
#[derive(Clone)]
pub struct TaskController {
    flags: Arc<Flags>,
    control: mpsc::UnboundedSender<Control>,
}

impl TaskController {
    /// Request cancellation at the next sub-step boundary.
    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.flags.cancelled.store(true, Ordering::Release);
        let _ = self.control.send(Control::Wake);
    }

    /// Release a paused worker. Returns `false` if the worker was not paused.
    pub fn resume(&self) -> bool {
        if !self.is_paused() {
            return false;
        }
        self.control.send(Control::Resume).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }
}

/// Subscription to a running task's progress and result.
pub struct TaskHandle<T> {
    controller: TaskController,
    events: mpsc::UnboundedReceiver<TaskEvent>,
    join: JoinHandle<T>,
    total: usize,
}

impl<T> TaskHandle<T> {
    pub fn controller(&self) -> TaskController {
        self.controller.clone()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn cancel(&self) {
        self.controller.cancel();
    }

    pub fn resume(&self) -> bool {
        self.controller.resume()
    }

    /// Next event, or `None` once the work has returned and every event was delivered.
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        self.events.recv().await
    }

    /// Wait for the work to return.
    ///
    /// # Returns: `Result<T, FpgaseqError>`
    /// * `Ok(T)` - Output of the work
    /// * `Err(FpgaseqError::Internal)` - The worker panicked or was aborted
    pub async fn finish(self) -> Result<T, FpgaseqError> {
        self.join
            .await
            .map_err(|e| FpgaseqError::Internal(format!("Background task failed: {e}")))
    }
}

/// Entry point for background execution.
pub struct BackgroundTask;

impl BackgroundTask {
    /// Start `work` on a blocking worker thread.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run<W: UnitOfWork>(work: W) -> TaskHandle<W::Output> {
        let flags = Arc::new(Flags::default());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let total = work.total();
        let mut context = TaskContext {
            flags: flags.clone(),
            control: control_rx,
            events: events_tx,
            index: 0,
            total,
        };
        trace!("Spawning background task with {total} step(s)");
        let join = tokio::task::spawn_blocking(move || work.run(&mut context));
        TaskHandle {
            controller: TaskController {
                flags,
                control: control_tx,
            },
            events: events_rx,
            join,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use std::sync::mpsc as std_mpsc;

    /// Emits `n` ticks, stopping early when cancelled. Blocks on `gate` before each tick
    /// when one is given so tests can cancel at a known point.
    struct Ticks {
        n: usize,
        gate: Option<std_mpsc::Receiver<()>>,
        pause_at: Option<usize>,
    }

    impl UnitOfWork for Ticks {
        type Output = (usize, bool);

        fn total(&self) -> usize {
            self.n
        }

        fn run(self, task: &mut TaskContext) -> (usize, bool) {
            for i in 0..self.n {
                if let Some(gate) = &self.gate {
                    let _ = gate.recv();
                }
                if task.is_cancelled() {
                    return (task.steps_done(), true);
                }
                if self.pause_at == Some(i) {
                    task.pause("Paused");
                }
                task.step(format!("tick {}", i + 1));
            }
            (task.steps_done(), task.is_cancelled())
        }
    }

    async fn drain<T>(handle: &mut TaskHandle<T>) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn ticks_match_total() {
        let mut handle = BackgroundTask::run(Ticks {
            n: 4,
            gate: None,
            pause_at: None,
        });
        assert_that!(handle.total(), eq(4));
        let events = drain(&mut handle).await;
        let ticks: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Progress(p) => Some((p.index, p.total)),
                _ => None,
            })
            .collect();
        assert_that!(ticks, eq(&vec![(1, 4), (2, 4), (3, 4), (4, 4)]));
        let output = handle.finish().await.expect("task failed");
        assert_that!(output, eq((4, false)));
    }

    #[tokio::test]
    async fn cancel_stops_at_boundary() {
        let (gate_tx, gate_rx) = std_mpsc::channel();
        let mut handle = BackgroundTask::run(Ticks {
            n: 5,
            gate: Some(gate_rx),
            pause_at: None,
        });
        gate_tx.send(()).expect("gate");
        gate_tx.send(()).expect("gate");
        // wait until both ticks are out before cancelling
        let mut seen = 0;
        while seen < 2 {
            if let Some(TaskEvent::Progress(_)) = handle.next_event().await {
                seen += 1;
            }
        }
        handle.cancel();
        gate_tx.send(()).expect("gate");
        drop(gate_tx);
        let _ = drain(&mut handle).await;
        let output = handle.finish().await.expect("task failed");
        assert_that!(output, eq((2, true)));
    }

    #[tokio::test]
    async fn pause_blocks_until_resumed() {
        let mut handle = BackgroundTask::run(Ticks {
            n: 2,
            gate: None,
            pause_at: Some(1),
        });
        let mut events = Vec::new();
        loop {
            let event = handle.next_event().await.expect("stream ended early");
            let paused = matches!(event, TaskEvent::Paused { .. });
            events.push(event);
            if paused {
                break;
            }
        }
        assert_that!(handle.controller().is_paused(), eq(true));
        assert_that!(handle.resume(), eq(true));
        events.extend(drain(&mut handle).await);
        let output = handle.finish().await.expect("task failed");
        assert_that!(output, eq((2, false)));
        assert_that!(
            events,
            eq(&vec![
                TaskEvent::Progress(Progress {
                    label: "tick 1".into(),
                    index: 1,
                    total: 2
                }),
                TaskEvent::Paused {
                    label: "Paused".into()
                },
                TaskEvent::Resumed,
                TaskEvent::Progress(Progress {
                    label: "tick 2".into(),
                    index: 2,
                    total: 2
                }),
            ])
        );
    }

    #[tokio::test]
    async fn cancel_wakes_a_paused_worker() {
        let mut handle = BackgroundTask::run(Ticks {
            n: 3,
            gate: None,
            pause_at: Some(0),
        });
        while let Some(event) = handle.next_event().await {
            if matches!(event, TaskEvent::Paused { .. }) {
                break;
            }
        }
        handle.cancel();
        let _ = drain(&mut handle).await;
        let output = handle.finish().await.expect("task failed");
        // the tick after the pause still goes out, the next boundary sees the flag
        assert_that!(output, eq((1, true)));
    }

    #[tokio::test]
    async fn resume_without_pause_is_refused() {
        let handle = BackgroundTask::run(Ticks {
            n: 0,
            gate: None,
            pause_at: None,
        });
        assert_that!(handle.resume(), eq(false));
        let output = handle.finish().await.expect("task failed");
        assert_that!(output, eq((0, false)));
    }
}
