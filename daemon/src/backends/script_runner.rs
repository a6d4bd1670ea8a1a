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

//! Script step runner.
//!
//! The path of a script step is executed directly as a command, without a shell and
//! without arguments. Output is inherited from the daemon; only the exit status is
//! reported back to the run.

use crate::backends::ScriptRunner;
use crate::error::FpgaseqError;
use log::{info, trace};
use std::process::{Command, Stdio};

#[derive(Debug, Default)]
pub struct CommandScriptRunner;

impl ScriptRunner for CommandScriptRunner {
    fn run(&self, path: &str) -> Result<Option<i32>, FpgaseqError> {
        info!("Running script {path}");
        let status = Command::new(path)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| FpgaseqError::ScriptLaunch {
                path: path.to_string(),
                e,
            })?;
        trace!("{path} finished with {status}");
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn exit_codes_are_reported() {
        let runner = CommandScriptRunner;
        if which::which("true").is_err() {
            return;
        }
        expect_that!(&runner.run("true"), ok(eq(&Some(0))));
        expect_that!(&runner.run("false"), ok(eq(&Some(1))));
    }

    #[gtest]
    fn missing_script_fails_to_launch() {
        let runner = CommandScriptRunner;
        expect_that!(
            &runner.run("/nonexistent/fpgaseq/script.sh"),
            err(displays_as(contains_substring("FpgaseqError::ScriptLaunch")))
        );
    }
}
