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

use fpgaseqd::backends::fake::{FakeDriverLink, FakeLoader, FakeScriptRunner, Journal};
use fpgaseqd::devices::DeviceSet;
use fpgaseqd::orchestrator::{Orchestrator, Request, RunResult};
use fpgaseqd::session::{Notice, Session, SharedSession, relay};
use fpgaseqd::task::TaskEvent;
use std::sync::{Arc, Mutex};

pub struct Rig {
    pub session: SharedSession,
    pub boards: FakeDriverLink,
    pub log: Journal,
}

/// A session over in-memory boards with the given initial states.
pub fn rig(enabled: &[bool]) -> Rig {
    let log = Journal::default();
    let boards = FakeDriverLink::new(enabled, log.clone());
    let orchestrator = Orchestrator::new(
        Arc::new(FakeLoader::new(log.clone())),
        Arc::new(FakeScriptRunner::new(log.clone())),
    );
    let names = (1..=enabled.len()).map(|i| format!("board-{i}")).collect();
    let session = Session::new(
        orchestrator,
        DeviceSet::new(Box::new(boards.clone())),
        names,
        false,
    );
    Rig {
        session: session.shared(),
        boards,
        log,
    }
}

/// What to do when the run stops at a pause step.
#[derive(Debug, Clone, Copy)]
pub enum OnPause {
    Resume,
    Cancel,
}

/// Run `request` to completion and collect every notice the relay produced.
pub async fn drive(rig: &Rig, request: Request, on_pause: OnPause) -> Vec<Notice> {
    let handle = rig.session.lock().await.begin(request).unwrap();
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    let session = rig.session.clone();
    relay(rig.session.clone(), handle, move |notice| {
        sink.lock().unwrap().push(notice.clone());
        let session = session.clone();
        async move {
            if let Notice::Event(TaskEvent::Paused { .. }) = notice {
                let session = session.lock().await;
                match on_pause {
                    OnPause::Resume => session.resume().unwrap(),
                    OnPause::Cancel => session.cancel().unwrap(),
                }
            }
        }
    })
    .await;
    let notices = notices.lock().unwrap().clone();
    notices
}

/// The result carried by the final notice.
pub fn finished(notices: &[Notice]) -> RunResult {
    match notices.last() {
        Some(Notice::Finished(result)) => result.clone(),
        other => panic!("run did not finish: {other:?}"),
    }
}

/// Labels of every progress tick, in order.
pub fn progress_labels(notices: &[Notice]) -> Vec<String> {
    notices
        .iter()
        .filter_map(|notice| match notice {
            Notice::Event(TaskEvent::Progress(p)) => Some(p.label.clone()),
            _ => None,
        })
        .collect()
}
