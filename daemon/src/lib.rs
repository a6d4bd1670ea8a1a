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

//! Board sequencing core of the fpgaseq daemon.
//!
//! Several FPGA boards share one programming cable; only one of them may be enabled at a
//! time. This crate tracks which board is enabled ([`devices`]), holds the programming
//! sequence ([`steps`]), turns requests into plans and executes them in the background
//! ([`orchestrator`], [`task`]) and exposes all of it on DBus ([`comm`]).

pub mod backends;
pub mod comm;
pub mod config;
pub mod devices;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod steps;
pub mod system_io;
pub mod task;
