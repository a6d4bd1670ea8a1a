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

use crate::common::fakes::rig;
use googletest::prelude::*;
use rstest::*;

#[rstest]
#[case::script("script", "/opt/flash.sh", "  1 script: /opt/erase.sh\n> 2 script: /opt/flash.sh")]
#[case::pause("pause", "", "  1 script: /opt/erase.sh\n> 2 pause: Paused")]
#[case::bitstream("BITSTREAM", "/srv/a.bit", "  1 script: /opt/erase.sh\n> 2 bitstream: /srv/a.bit")]
#[tokio::test]
async fn add_goes_below_selection(
    #[case] kind: &str,
    #[case] parameter: &str,
    #[case] listing: &str,
) {
    let rig = rig(&[false]);
    let mut session = rig.session.lock().await;
    session.add_step("script", "/opt/erase.sh").unwrap();
    session.add_step(kind, parameter).unwrap();
    assert_that!(session.steps_listing(), eq(listing));
}

#[tokio::test]
async fn reorder_and_remove() {
    let rig = rig(&[false]);
    let mut session = rig.session.lock().await;
    session.add_step("script", "/opt/a.sh").unwrap();
    session.add_step("script", "/opt/b.sh").unwrap();
    session.add_step("script", "/opt/c.sh").unwrap();

    assert_that!(session.move_step(1), ok(eq(&false)));
    assert_that!(session.move_step(-2), ok(eq(&true)));
    assert_that!(
        session.steps_listing(),
        eq("> 1 script: /opt/c.sh\n  2 script: /opt/b.sh\n  3 script: /opt/a.sh")
    );

    session.select_step(2).unwrap();
    session.remove_step().unwrap();
    assert_that!(
        session.steps_listing(),
        eq("  1 script: /opt/c.sh\n> 2 script: /opt/b.sh")
    );
    session.remove_step().unwrap();
    session.remove_step().unwrap();
    assert_that!(session.steps_listing(), eq(""));
    assert_that!(session.remove_step(), ok(none()));
}

#[tokio::test]
async fn out_of_range_selection_clears() {
    let rig = rig(&[false]);
    let mut session = rig.session.lock().await;
    session.add_step("pause", "").unwrap();
    assert_that!(session.select_step(5), ok(none()));
    assert_that!(session.move_step(1), ok(eq(&false)));
}
