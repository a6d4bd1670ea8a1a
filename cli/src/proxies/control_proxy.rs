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

use zbus::{Result, proxy};
#[proxy(
    default_service = "com.canonical.fpgaseq",
    interface = "com.canonical.fpgaseq.control",
    default_path = "/com/canonical/fpgaseq/control"
)]
pub trait Control {
    async fn enable(&self, board: u32) -> Result<String>;
    async fn disable(&self, board: u32) -> Result<String>;
    async fn toggle(&self, board: u32) -> Result<String>;
    async fn enable_only(&self, board: u32) -> Result<String>;
    async fn enable_all(&self) -> Result<String>;
    async fn disable_all(&self) -> Result<String>;
    async fn program(&self, board: u32) -> Result<String>;
    async fn program_all(&self) -> Result<String>;
    async fn add_step(&self, kind: &str, parameter: &str) -> Result<String>;
    async fn select_step(&self, index: i32) -> Result<String>;
    async fn move_step_up(&self) -> Result<String>;
    async fn move_step_down(&self) -> Result<String>;
    async fn remove_step(&self) -> Result<String>;
    async fn resume(&self) -> Result<String>;
    async fn cancel(&self) -> Result<String>;

    #[zbus(signal)]
    fn progress(&self, label: String, index: u32, total: u32) -> Result<()>;

    #[zbus(signal)]
    fn paused(&self, label: String) -> Result<()>;

    #[zbus(signal)]
    fn finished(&self, succeeded: bool, unknown: Vec<u32>, cancelled: bool) -> Result<()>;
}
