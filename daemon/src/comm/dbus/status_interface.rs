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

use crate::comm::dbus::describe_result;
use crate::session::SharedSession;
use log::info;
use zbus::{fdo, interface};

pub struct StatusInterface {
    session: SharedSession,
}

impl StatusInterface {
    pub fn new(session: SharedSession) -> Self {
        StatusInterface { session }
    }
}

#[interface(name = "com.canonical.fpgaseq.status")]
impl StatusInterface {
    /// One line per board: `<number> <name> <enabled|disabled|unknown>`.
    async fn get_boards(&self) -> Result<String, fdo::Error> {
        info!("get_boards called");
        Ok(self.session.lock().await.boards()?)
    }

    async fn get_steps(&self) -> Result<String, fdo::Error> {
        info!("get_steps called");
        Ok(self.session.lock().await.steps_listing())
    }

    async fn get_run_status(&self) -> Result<String, fdo::Error> {
        info!("get_run_status called");
        Ok(self.session.lock().await.status().to_string())
    }

    async fn get_last_result(&self) -> Result<String, fdo::Error> {
        info!("get_last_result called");
        Ok(self
            .session
            .lock()
            .await
            .last_result()
            .map(describe_result)
            .unwrap_or_else(|| "No run has finished yet".to_string()))
    }

    async fn is_loader_available(&self) -> Result<bool, fdo::Error> {
        info!("is_loader_available called");
        Ok(self.session.lock().await.loader_available())
    }
}
