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
use fpgaseqd::session::Notice;
use fpgaseqd::task::TaskEvent;
use googletest::prelude::*;

#[tokio::test]
async fn program_one_touches_hardware_in_plan_order() {
    let rig = rig(&[false, false, false]);
    rig.session
        .lock()
        .await
        .add_step("bitstream", "/srv/a.bit")
        .unwrap();
    let notices = drive(&rig, Request::ProgramOne(1), OnPause::Resume).await;
    assert_that!(
        rig.log.entries(),
        elements_are![
            eq("enable(1)"),
            eq("disable(0)"),
            eq("disable(2)"),
            eq("prepare(true)"),
            eq("program(/srv/a.bit)"),
            eq("disable(1)"),
        ]
    );
    assert_that!(
        progress_labels(&notices),
        elements_are![
            eq("Enabling board 2"),
            eq("Disabling board 1"),
            eq("Disabling board 3"),
            eq("Initializing loader (may take a while)"),
            eq("Board 2: Program \"a.bit\""),
            eq("Restoring disabled board 1"),
            eq("Restoring disabled board 2"),
            eq("Restoring disabled board 3"),
        ]
    );
    let result = finished(&notices);
    assert_that!(result.succeeded(), eq(true));
    assert_that!(result.total, eq(8));
}

#[tokio::test]
async fn program_all_visits_every_board_and_restores() {
    let rig = rig(&[false, true, false]);
    {
        let mut session = rig.session.lock().await;
        session.add_step("script", "/opt/erase.sh").unwrap();
        session.add_step("bitstream", "/srv/a.bit").unwrap();
    }
    let notices = drive(&rig, Request::ProgramAll, OnPause::Resume).await;
    let result = finished(&notices);
    assert_that!(result.succeeded(), eq(true));
    // 3 * (3 + 2) + prepare + 3 restores.
    assert_that!(result.total, eq(19));
    assert_that!(result.executed, eq(19));
    assert_that!(rig.log.count("prepare("), eq(1));
    assert_that!(rig.log.count("program("), eq(3));
    assert_that!(rig.log.count("script("), eq(3));
    assert_that!(rig.boards.states(), eq(&vec![false, true, false]));

    // The first board is the only enabled one while its steps run.
    let calls = rig.log.entries();
    let first_program = calls.iter().position(|c| c.starts_with("program(")).unwrap();
    assert_that!(
        calls[..first_program].to_vec(),
        elements_are![
            eq("enable(0)"),
            eq("disable(1)"),
            eq("disable(2)"),
            eq("prepare(true)"),
            eq("script(/opt/erase.sh)"),
        ]
    );
}

#[tokio::test]
async fn boards_switched_between_runs_are_restored_to_their_live_state() {
    let rig = rig(&[false, false, false]);
    rig.session
        .lock()
        .await
        .add_step("script", "/opt/check.sh")
        .unwrap();
    // Someone switches boards 1 and 3 by hand after the daemon last looked.
    rig.boards.force(0, true);
    rig.boards.force(2, true);

    let notices = drive(&rig, Request::ProgramOne(1), OnPause::Resume).await;
    assert_that!(finished(&notices).succeeded(), eq(true));
    assert_that!(rig.boards.states(), eq(&vec![true, false, true]));
    assert_that!(
        rig.log.entries(),
        elements_are![
            eq("enable(1)"),
            eq("disable(0)"),
            eq("disable(2)"),
            eq("script(/opt/check.sh)"),
            eq("enable(0)"),
            eq("disable(1)"),
            eq("enable(2)"),
        ]
    );
}

#[tokio::test]
async fn toggle_follows_a_board_switched_between_runs() {
    let rig = rig(&[false, false]);
    rig.boards.force(1, true);
    let notices = drive(&rig, Request::Toggle(1), OnPause::Resume).await;
    assert_that!(finished(&notices).succeeded(), eq(true));
    assert_that!(rig.log.entries(), elements_are![eq("disable(1)")]);
    assert_that!(rig.boards.states(), eq(&vec![false, false]));
}

#[tokio::test]
async fn pause_waits_for_resume() {
    let rig = rig(&[true, false]);
    rig.session.lock().await.add_step("pause", "Swap cables").unwrap();
    let notices = drive(&rig, Request::ProgramOne(1), OnPause::Resume).await;
    assert_that!(
        notices,
        contains(eq(&Notice::Event(TaskEvent::Paused {
            label: "Swap cables".to_string()
        })))
    );
    assert_that!(notices, contains(eq(&Notice::Event(TaskEvent::Resumed))));
    assert_that!(finished(&notices).succeeded(), eq(true));
    assert_that!(rig.boards.states(), eq(&vec![true, false]));
}

#[tokio::test]
async fn enable_leaves_a_single_board_enabled() {
    let rig = rig(&[true, true, false, true]);
    let notices = drive(&rig, Request::Enable(2), OnPause::Resume).await;
    assert_that!(finished(&notices).succeeded(), eq(true));
    assert_that!(rig.boards.states(), eq(&vec![false, false, true, false]));
    assert_that!(
        rig.session.lock().await.boards(),
        ok(eq("1 board-1 disabled\n2 board-2 disabled\n3 board-3 enabled\n4 board-4 disabled"))
    );
}

#[tokio::test]
async fn enable_all_is_exempt_from_single_enable() {
    let rig = rig(&[false, false]);
    drive(&rig, Request::EnableAll, OnPause::Resume).await;
    assert_that!(rig.boards.states(), eq(&vec![true, true]));
    drive(&rig, Request::Toggle(0), OnPause::Resume).await;
    assert_that!(rig.boards.states(), eq(&vec![false, true]));
    drive(&rig, Request::DisableAll, OnPause::Resume).await;
    assert_that!(rig.boards.states(), eq(&vec![false, false]));
}
