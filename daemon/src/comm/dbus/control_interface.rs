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

use crate::comm::dbus::{board_index, wire_count};
use crate::config::CONTROL_OBJECT_PATH;
use crate::orchestrator::Request;
use crate::session::{Notice, SharedSession, relay};
use crate::task::TaskEvent;
use log::{info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, fdo, interface};

pub struct ControlInterface {
    session: SharedSession,
}

impl ControlInterface {
    pub fn new(session: SharedSession) -> Self {
        ControlInterface { session }
    }

    /// Plan and launch `request`, relaying its progress as signals.
    async fn start(&self, conn: &Connection, request: Request) -> Result<String, fdo::Error> {
        let emitter = SignalEmitter::new(conn, CONTROL_OBJECT_PATH)?.into_owned();
        let handle = self.session.lock().await.begin(request)?;
        let total = handle.total();
        tokio::spawn(relay(self.session.clone(), handle, move |notice| {
            let emitter = emitter.clone();
            async move { emit_notice(&emitter, notice).await }
        }));
        Ok(format!("Started {request}: {total} operation(s)"))
    }
}

async fn emit_notice(emitter: &SignalEmitter<'_>, notice: Notice) {
    let sent = match notice {
        Notice::Event(TaskEvent::Progress(p)) => {
            ControlInterface::progress(emitter, &p.label, wire_count(p.index), wire_count(p.total))
                .await
        }
        Notice::Event(TaskEvent::Paused { label }) => {
            ControlInterface::paused(emitter, &label).await
        }
        Notice::Event(TaskEvent::Resumed) => Ok(()),
        Notice::Finished(result) => {
            let unknown: Vec<u32> = result.unknown_devices.iter().map(|i| wire_count(*i)).collect();
            ControlInterface::finished(emitter, result.succeeded(), unknown, result.cancelled).await
        }
        Notice::Abandoned => ControlInterface::finished(emitter, false, Vec::new(), false).await,
    };
    if let Err(e) = sent {
        warn!("Failed to emit signal: {e}");
    }
}

#[interface(name = "com.canonical.fpgaseq.control")]
impl ControlInterface {
    async fn enable(
        &self,
        #[zbus(connection)] conn: &Connection,
        board: u32,
    ) -> Result<String, fdo::Error> {
        info!("enable called with board: {board}");
        self.start(conn, Request::Enable(board_index(board)?)).await
    }

    async fn disable(
        &self,
        #[zbus(connection)] conn: &Connection,
        board: u32,
    ) -> Result<String, fdo::Error> {
        info!("disable called with board: {board}");
        self.start(conn, Request::Disable(board_index(board)?)).await
    }

    async fn toggle(
        &self,
        #[zbus(connection)] conn: &Connection,
        board: u32,
    ) -> Result<String, fdo::Error> {
        info!("toggle called with board: {board}");
        self.start(conn, Request::Toggle(board_index(board)?)).await
    }

    async fn enable_only(
        &self,
        #[zbus(connection)] conn: &Connection,
        board: u32,
    ) -> Result<String, fdo::Error> {
        info!("enable_only called with board: {board}");
        self.start(conn, Request::EnableOnly(board_index(board)?))
            .await
    }

    async fn enable_all(&self, #[zbus(connection)] conn: &Connection) -> Result<String, fdo::Error> {
        info!("enable_all called");
        self.start(conn, Request::EnableAll).await
    }

    async fn disable_all(
        &self,
        #[zbus(connection)] conn: &Connection,
    ) -> Result<String, fdo::Error> {
        info!("disable_all called");
        self.start(conn, Request::DisableAll).await
    }

    async fn program(
        &self,
        #[zbus(connection)] conn: &Connection,
        board: u32,
    ) -> Result<String, fdo::Error> {
        info!("program called with board: {board}");
        self.start(conn, Request::ProgramOne(board_index(board)?))
            .await
    }

    async fn program_all(
        &self,
        #[zbus(connection)] conn: &Connection,
    ) -> Result<String, fdo::Error> {
        info!("program_all called");
        self.start(conn, Request::ProgramAll).await
    }

    async fn add_step(&self, kind: &str, parameter: &str) -> Result<String, fdo::Error> {
        info!("add_step called with kind: {kind} and parameter: {parameter}");
        let mut session = self.session.lock().await;
        let position = session.add_step(kind, parameter)?;
        let step = &session.step_list().steps()[position];
        Ok(format!("Added {step} as step {}", position + 1))
    }

    /// A negative index clears the selection.
    async fn select_step(&self, index: i32) -> Result<String, fdo::Error> {
        info!("select_step called with index: {index}");
        Ok(match self.session.lock().await.select_step(index)? {
            Some(selected) => format!("Selected step {}", selected + 1),
            None => "Selection cleared".to_string(),
        })
    }

    async fn move_step_up(&self) -> Result<String, fdo::Error> {
        info!("move_step_up called");
        self.move_step(-1).await
    }

    async fn move_step_down(&self) -> Result<String, fdo::Error> {
        info!("move_step_down called");
        self.move_step(1).await
    }

    async fn remove_step(&self) -> Result<String, fdo::Error> {
        info!("remove_step called");
        Ok(match self.session.lock().await.remove_step()? {
            Some(step) => format!("Removed {step}"),
            None => "No step selected".to_string(),
        })
    }

    async fn resume(&self) -> Result<String, fdo::Error> {
        info!("resume called");
        self.session.lock().await.resume()?;
        Ok("Resumed".to_string())
    }

    async fn cancel(&self) -> Result<String, fdo::Error> {
        info!("cancel called");
        self.session.lock().await.cancel()?;
        Ok("Cancellation requested".to_string())
    }

    #[zbus(signal)]
    async fn progress(
        emitter: &SignalEmitter<'_>,
        label: &str,
        index: u32,
        total: u32,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn paused(emitter: &SignalEmitter<'_>, label: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn finished(
        emitter: &SignalEmitter<'_>,
        succeeded: bool,
        unknown: Vec<u32>,
        cancelled: bool,
    ) -> zbus::Result<()>;
}

impl ControlInterface {
    async fn move_step(&self, offset: isize) -> Result<String, fdo::Error> {
        let mut session = self.session.lock().await;
        if session.move_step(offset)? {
            let selected = session.step_list().selected().map_or(0, |i| i + 1);
            Ok(format!("Step moved to position {selected}"))
        } else {
            Ok("Nothing to move".to_string())
        }
    }
}
