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

//! fpgaseq daemon (fpgaseqd) - System service sequencing programming runs across FPGA boards.
//!
//! The daemon owns the enable lines of every configured board, the loader toolchain and
//! the programming sequence, and serves them on the system bus.
//!
//! # DBus Service
//!
//! - **Service Name**: `com.canonical.fpgaseq`
//! - **Status Interface**: `/com/canonical/fpgaseq/status` - Read-only operations
//! - **Control Interface**: `/com/canonical/fpgaseq/control` - Runs and step editing
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). Defaults to `info`
//! - `FPGASEQ_CONFIG` - Path of the configuration file. Defaults to
//!   `/etc/fpgaseq/config.toml`

use fpgaseqd::backends::script_runner::CommandScriptRunner;
use fpgaseqd::backends::sysfs_driver::SysfsDriverLink;
use fpgaseqd::backends::toolchain_loader::ToolchainLoader;
use fpgaseqd::comm::dbus::{control_interface::ControlInterface, status_interface::StatusInterface};
use fpgaseqd::config::{self, CONTROL_OBJECT_PATH, DBUS_SERVICE_NAME, STATUS_OBJECT_PATH};
use fpgaseqd::devices::DeviceSet;
use fpgaseqd::orchestrator::Orchestrator;
use fpgaseqd::session::Session;
use log::{info, warn};
use std::error::Error;
use std::sync::Arc;
use zbus::connection;

/// Main entry point for the fpgaseq daemon.
///
/// Loads the configuration, builds the board, loader and script collaborators, serves
/// both DBus interfaces and runs until interrupted. On shutdown the loader is closed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let system_config = config::load_system_config();
    if system_config.boards.is_empty() {
        warn!("No boards configured, only step editing will be useful");
    }
    let board_names = system_config
        .boards
        .iter()
        .map(|board| board.name.clone())
        .collect();
    let devices = DeviceSet::new(Box::new(SysfsDriverLink::new(system_config.boards)));
    let prepare_on_add = system_config.loader.prepare_on_add;
    let orchestrator = Orchestrator::new(
        Arc::new(ToolchainLoader::new(system_config.loader)),
        Arc::new(CommandScriptRunner),
    );
    let session = Session::new(orchestrator, devices, board_names, prepare_on_add).shared();

    let _conn = connection::Builder::system()?
        .name(DBUS_SERVICE_NAME)?
        .serve_at(STATUS_OBJECT_PATH, StatusInterface::new(session.clone()))?
        .serve_at(CONTROL_OBJECT_PATH, ControlInterface::new(session.clone()))?
        .build()
        .await?;

    info!("Started {DBUS_SERVICE_NAME} dbus service");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    let loader = session.lock().await.shutdown();
    // Stopping the toolchain may block on the child process.
    tokio::task::spawn_blocking(move || loader.close()).await?;
    Ok(())
}
