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

//! Status command implementation: boards, steps, run state and last result.

use crate::proxies::status_proxy;
use zbus::Connection;

pub async fn call_get_last_result(connection: &Connection) -> Result<String, zbus::Error> {
    let proxy = status_proxy::StatusProxy::new(connection).await?;
    proxy.get_last_result().await
}

pub async fn call_get_steps(connection: &Connection) -> Result<String, zbus::Error> {
    let proxy = status_proxy::StatusProxy::new(connection).await?;
    proxy.get_steps().await
}

/// Boards are unavailable while a run holds them; say so instead of failing.
async fn boards_section(proxy: &status_proxy::StatusProxy<'_>) -> Result<String, zbus::Error> {
    match proxy.get_boards().await {
        Ok(boards) if boards.is_empty() => Ok("(no boards configured)".to_string()),
        Ok(boards) => Ok(boards),
        Err(zbus::Error::MethodError(name, _, _))
            if name.as_str() == "org.freedesktop.DBus.Error.LimitsExceeded" =>
        {
            Ok("(busy: a run is in progress)".to_string())
        }
        Err(e) => Err(e),
    }
}

/// Builds the full status report as an ascii listing.
pub async fn status_handler() -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = status_proxy::StatusProxy::new(&connection).await?;
    let mut report = String::from("---- BOARDS ----\n");
    report += &boards_section(&proxy).await?;
    report += "\n\n---- STEPS ----\n";
    let steps = proxy.get_steps().await?;
    report += if steps.is_empty() { "(empty)" } else { &steps };
    report += "\n\n---- RUN ----\n";
    report += &proxy.get_run_status().await?;
    report += "\n";
    report += &proxy.get_last_result().await?;
    if !proxy.is_loader_available().await? {
        report += "\n\nwarning: loader toolchain not found, bitstream steps are unavailable";
    }
    Ok(report)
}
