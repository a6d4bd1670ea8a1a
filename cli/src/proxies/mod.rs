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

//! DBus proxy interfaces for the fpgaseq daemon.
//!
//! - [`control_proxy`] - Runs, step editing, resume and cancel
//! - [`status_proxy`] - Read-only queries
//!
//! Both talk to `com.canonical.fpgaseq` on the system bus.

pub mod control_proxy;
pub mod status_proxy;
