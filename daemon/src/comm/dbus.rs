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

pub mod control_interface;
pub mod status_interface;

use crate::error::FpgaseqError;
use crate::orchestrator::RunResult;

/// Board index as received over DBus.
pub(crate) fn board_index(board: u32) -> Result<usize, FpgaseqError> {
    usize::try_from(board)
        .map_err(|_| FpgaseqError::Argument(format!("Board index {board} is not addressable.")))
}

/// Saturating conversion for counts sent over DBus.
pub(crate) fn wire_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Human-readable report of a finished run: the summary, then one line per anomaly.
pub(crate) fn describe_result(result: &RunResult) -> String {
    let mut lines = vec![result.summary()];
    lines.extend(
        result
            .anomalies
            .iter()
            .map(|a| format!("  [{}] {}: {}", a.kind, a.operation, a.message)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{Anomaly, AnomalyKind, Request};
    use googletest::prelude::*;

    #[gtest]
    fn result_lists_every_anomaly() {
        let result = RunResult {
            request: Request::ProgramOne(0),
            executed: 5,
            total: 5,
            unknown_devices: vec![1],
            cancelled: false,
            anomalies: vec![Anomaly {
                operation: "Disabling board 2".to_string(),
                kind: AnomalyKind::DeviceIO,
                message: "write failed".to_string(),
            }],
        };
        expect_that!(
            describe_result(&result),
            eq("program board 1 finished with errors (5/5 operations), unknown board(s): 2\n  \
                [device-io] Disabling board 2: write failed")
        );
    }

    #[gtest]
    fn counts_saturate() {
        expect_that!(wire_count(7), eq(7));
        expect_that!(wire_count(usize::MAX), eq(u32::MAX));
    }
}
