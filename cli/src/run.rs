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

//! Run-starting commands, resume, cancel and the `--wait` progress follower.

use crate::RunCommand;
use crate::proxies::control_proxy::ControlProxy;
use crate::status::call_get_last_result;
use futures::StreamExt;
use log::debug;
use zbus::Connection;

/// Boards are numbered from 1 on the command line and from 0 on the bus.
fn board_index(board: u32) -> Result<u32, zbus::Error> {
    board
        .checked_sub(1)
        .ok_or_else(|| zbus::Error::Failure("Boards are numbered from 1".to_string()))
}

fn progress_line(label: &str, index: u32, total: u32) -> String {
    format!("[{index}/{total}] {label}")
}

fn paused_line(label: &str) -> String {
    format!("paused: {label} (continue with `fpgaseq resume`)")
}

/// Names the boards a run left in an unknown state, 1-based.
fn unknown_line(unknown: &[u32]) -> String {
    let boards: Vec<String> = unknown.iter().map(|i| (i + 1).to_string()).collect();
    format!("Boards in an unknown state: {}", boards.join(", "))
}

async fn start(proxy: &ControlProxy<'_>, command: &RunCommand) -> Result<String, zbus::Error> {
    match command {
        RunCommand::Enable { board, .. } => proxy.enable(board_index(*board)?).await,
        RunCommand::Disable { board, .. } => proxy.disable(board_index(*board)?).await,
        RunCommand::Toggle { board, .. } => proxy.toggle(board_index(*board)?).await,
        RunCommand::Only { board, .. } => proxy.enable_only(board_index(*board)?).await,
        RunCommand::EnableAll { .. } => proxy.enable_all().await,
        RunCommand::DisableAll { .. } => proxy.disable_all().await,
        RunCommand::Program { board, .. } => proxy.program(board_index(*board)?).await,
        RunCommand::ProgramAll { .. } => proxy.program_all().await,
    }
}

/// Start `command` and print its progress signals until the Finished signal arrives,
/// then return the daemon's report of the run.
async fn follow_run(
    connection: &Connection,
    proxy: &ControlProxy<'_>,
    command: &RunCommand,
) -> Result<String, zbus::Error> {
    // Subscribe first so the run cannot finish unseen.
    let mut progress = proxy.receive_progress().await?;
    let mut paused = proxy.receive_paused().await?;
    let mut finished = proxy.receive_finished().await?;

    let started = start(proxy, command).await?;
    debug!("{started}");
    println!("{started}");
    loop {
        tokio::select! {
            biased;
            Some(signal) = progress.next() => {
                let args = signal.args()?;
                println!("{}", progress_line(args.label(), *args.index(), *args.total()));
            }
            Some(signal) = paused.next() => {
                let args = signal.args()?;
                println!("{}", paused_line(args.label()));
            }
            signal = finished.next() => {
                let Some(signal) = signal else {
                    return Err(zbus::Error::Failure(
                        "Lost the daemon's run signals".to_string(),
                    ));
                };
                let args = signal.args()?;
                debug!(
                    "Run finished, succeeded: {}, cancelled: {}",
                    args.succeeded(),
                    args.cancelled()
                );
                if !args.unknown().is_empty() {
                    println!("{}", unknown_line(args.unknown()));
                }
                return call_get_last_result(connection).await;
            }
        }
    }
}

/// Argument parser for the run-starting commands
pub async fn run_handler(command: &RunCommand) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = ControlProxy::new(&connection).await?;
    if command.wait() {
        follow_run(&connection, &proxy, command).await
    } else {
        start(&proxy, command).await
    }
}

pub async fn resume_handler() -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = ControlProxy::new(&connection).await?;
    proxy.resume().await
}

pub async fn cancel_handler() -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = ControlProxy::new(&connection).await?;
    proxy.cancel().await
}
