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

use crate::common::fakes::{OnPause, drive, finished, progress_labels, rig};
use fpgaseqd::orchestrator::Request;
use fpgaseqd::session::RunStatus;
use googletest::prelude::*;

#[tokio::test]
async fn cancel_at_pause_skips_the_rest_and_restores() {
    let rig = rig(&[false, true, false]);
    {
        let mut session = rig.session.lock().await;
        session.add_step("pause", "").unwrap();
        session.add_step("bitstream", "/srv/a.bit").unwrap();
    }
    let notices = drive(&rig, Request::ProgramAll, OnPause::Cancel).await;
    let result = finished(&notices);
    assert_that!(result.cancelled, eq(true));
    assert_that!(result.succeeded(), eq(false));
    assert_that!(result.total, eq(19));
    assert_that!(result.executed, eq(8));
    assert_that!(
        rig.log.entries(),
        elements_are![
            eq("enable(0)"),
            eq("disable(1)"),
            eq("disable(2)"),
            eq("prepare(true)"),
            eq("disable(0)"),
            eq("enable(1)"),
        ]
    );
    assert_that!(rig.boards.states(), eq(&vec![false, true, false]));
    let labels = progress_labels(&notices);
    assert_that!(
        labels.last().map(String::as_str),
        some(eq("Restoring disabled board 3"))
    );
}

#[tokio::test]
async fn session_is_idle_again_after_cancel() {
    let rig = rig(&[false, false]);
    rig.session.lock().await.add_step("pause", "").unwrap();
    drive(&rig, Request::ProgramOne(0), OnPause::Cancel).await;
    let session = rig.session.lock().await;
    assert_that!(session.status(), eq(&RunStatus::Idle));
    assert_that!(session.is_busy(), eq(false));
    assert_that!(session.last_result().is_some_and(|r| r.cancelled), eq(true));
    assert_that!(session.cancel(), err(anything()));
}
