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

//! Step list editing commands.

use crate::StepsSubcommand;
use crate::proxies::control_proxy;
use crate::status::call_get_steps;
use zbus::Connection;

/// Argument parser for the steps command
pub async fn steps_handler(sub_command: &StepsSubcommand) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = control_proxy::ControlProxy::new(&connection).await?;
    match sub_command {
        StepsSubcommand::List => {
            let steps = call_get_steps(&connection).await?;
            Ok(if steps.is_empty() {
                "(empty)".to_string()
            } else {
                steps
            })
        }
        StepsSubcommand::Add { kind, parameter } => {
            proxy
                .add_step(kind, parameter.as_deref().unwrap_or(""))
                .await
        }
        StepsSubcommand::Select { position } => {
            // Position 0 clears the selection.
            let index = i32::try_from(*position).unwrap_or(i32::MAX) - 1;
            proxy.select_step(index).await
        }
        StepsSubcommand::Up => proxy.move_step_up().await,
        StepsSubcommand::Down => proxy.move_step_down().await,
        StepsSubcommand::Remove => proxy.remove_step().await,
    }
}
