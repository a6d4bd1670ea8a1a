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

//! The set of boards sharing the bus.
//!
//! [`DeviceSet`] owns the [`DriverLink`] and tracks the last known state of every board.
//! Tracked state changes only through [`DeviceSet::enable`], [`DeviceSet::disable`],
//! [`DeviceSet::refresh`] and the restore helpers; a failing driver call leaves the board
//! [`EnabledState::Unknown`] until the next successful call or refresh.
//!
//! There is no internal locking. A running plan takes the `DeviceSet` by value and hands
//! it back when it completes, which is what keeps two plans from interleaving their
//! hardware calls.

use crate::backends::DriverLink;
use crate::error::FpgaseqError;
use log::{trace, warn};
use std::fmt;

/// Bus state of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledState {
    Enabled,
    Disabled,
    /// The last query or control call failed; callers should skip the board.
    Unknown,
}

impl EnabledState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            EnabledState::Enabled
        } else {
            EnabledState::Disabled
        }
    }

    /// `Some(true)` / `Some(false)` for known states.
    pub fn known(self) -> Option<bool> {
        match self {
            EnabledState::Enabled => Some(true),
            EnabledState::Disabled => Some(false),
            EnabledState::Unknown => None,
        }
    }
}

impl fmt::Display for EnabledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnabledState::Enabled => write!(f, "enabled"),
            EnabledState::Disabled => write!(f, "disabled"),
            EnabledState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Enabled state of every board, captured before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    states: Vec<EnabledState>,
}

impl StateSnapshot {
    pub fn new(states: Vec<EnabledState>) -> Self {
        StateSnapshot { states }
    }

    pub fn get(&self, index: usize) -> Option<EnabledState> {
        self.states.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// `(index, state)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, EnabledState)> + '_ {
        self.states.iter().copied().enumerate()
    }
}

/// What a single-board restore ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreAction {
    /// Already in the captured state, no call issued.
    Unchanged,
    Enabled,
    Disabled,
    /// Either the captured or the current state is unknown; the board was left alone.
    Skipped,
}

pub struct DeviceSet {
    link: Box<dyn DriverLink>,
    states: Vec<EnabledState>,
}

impl fmt::Debug for DeviceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSet")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl DeviceSet {
    /// Wrap `link` and query the initial state of every board.
    pub fn new(link: Box<dyn DriverLink>) -> Self {
        let states = vec![EnabledState::Unknown; link.device_count()];
        let mut devices = DeviceSet { link, states };
        devices.refresh();
        devices
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Fail with `Argument` unless `index` names a board.
    pub fn check_index(&self, index: usize) -> Result<(), FpgaseqError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(FpgaseqError::Argument(format!(
                "Board index {index} is out of range: {} board(s) available.",
                self.len()
            )))
        }
    }

    /// Last known state of board `index`. Out-of-range indices are `Unknown`.
    pub fn enabled(&self, index: usize) -> EnabledState {
        self.states
            .get(index)
            .copied()
            .unwrap_or(EnabledState::Unknown)
    }

    pub fn states(&self) -> &[EnabledState] {
        &self.states
    }

    /// Re-query every board through the driver link.
    pub fn refresh(&mut self) {
        for index in 0..self.states.len() {
            self.states[index] = match self.link.query_enabled(index) {
                Ok(enabled) => EnabledState::from_enabled(enabled),
                Err(e) => {
                    warn!("Failed to query board {}: {e}", index + 1);
                    EnabledState::Unknown
                }
            };
        }
        trace!("Refreshed board states: {:?}", self.states);
    }

    pub fn enable(&mut self, index: usize) -> Result<(), FpgaseqError> {
        self.set(index, true)
    }

    pub fn disable(&mut self, index: usize) -> Result<(), FpgaseqError> {
        self.set(index, false)
    }

    fn set(&mut self, index: usize, enabled: bool) -> Result<(), FpgaseqError> {
        self.check_index(index)?;
        let action = if enabled { "enable" } else { "disable" };
        trace!("Issuing {action} for board {}", index + 1);
        let result = if enabled {
            self.link.enable(index)
        } else {
            self.link.disable(index)
        };
        match result {
            Ok(()) => {
                self.states[index] = EnabledState::from_enabled(enabled);
                Ok(())
            }
            Err(e) => {
                self.states[index] = EnabledState::Unknown;
                Err(FpgaseqError::DeviceIO {
                    device: index,
                    action,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Capture the tracked state of every board.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(self.states.clone())
    }

    /// Bring board `index` back to `target`.
    ///
    /// No call is issued when the board already matches. Boards whose current or target
    /// state is unknown are skipped rather than guessed at.
    pub fn restore_device(
        &mut self,
        index: usize,
        target: EnabledState,
    ) -> Result<RestoreAction, FpgaseqError> {
        self.check_index(index)?;
        let current = self.states[index];
        match (current.known(), target.known()) {
            (None, _) | (_, None) => Ok(RestoreAction::Skipped),
            (Some(now), Some(wanted)) if now == wanted => Ok(RestoreAction::Unchanged),
            (Some(_), Some(true)) => self.enable(index).map(|_| RestoreAction::Enabled),
            (Some(_), Some(false)) => self.disable(index).map(|_| RestoreAction::Disabled),
        }
    }

    /// Restore every board to `snapshot`, in ascending order.
    ///
    /// Returns the boards that could not be restored: skipped as unknown, or whose
    /// control call failed. Failures are not retried.
    pub fn restore(&mut self, snapshot: &StateSnapshot) -> Vec<usize> {
        let mut unrestored = Vec::new();
        for (index, target) in snapshot.iter() {
            match self.restore_device(index, target) {
                Ok(RestoreAction::Skipped) => {
                    warn!("Not restoring board {}: state unknown", index + 1);
                    unrestored.push(index);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("{e}");
                    unrestored.push(index);
                }
            }
        }
        unrestored
    }

    /// Boards currently in the `Unknown` state.
    pub fn unknown_devices(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == EnabledState::Unknown)
            .map(|(index, _)| index)
            .collect()
    }
}
