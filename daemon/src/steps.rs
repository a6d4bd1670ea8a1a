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

//! User-authored programming sequence.
//!
//! A [`StepList`] is edited through its selection, the way the list is edited on screen:
//! new steps go below the selected one, and the selected step can be moved or removed.
//! Runs never see the list itself, only a copy taken when the plan is built.

use crate::error::FpgaseqError;
use log::warn;
use std::fmt;
use std::path::Path;

/// One unit of a programming sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Block the run until it is resumed.
    Pause { label: String },
    /// Run an external command and observe its exit status.
    Script { path: String },
    /// Load a bitstream onto the enabled board.
    Bitstream { path: String },
}

impl Step {
    pub fn pause() -> Self {
        Step::Pause {
            label: "Paused".to_string(),
        }
    }

    /// Build a step from its textual tag (`pause`, `script` or `bitstream`).
    ///
    /// # Returns: `Result<Step, FpgaseqError>`
    /// * `Ok(Step)` - Recognized tag
    /// * `Err(FpgaseqError::UnknownStep)` - Unrecognized tag
    /// * `Err(FpgaseqError::Argument)` - Script or bitstream tag without a path
    pub fn parse(kind: &str, parameter: &str) -> Result<Step, FpgaseqError> {
        let needs_path = |what: &str| {
            if parameter.is_empty() {
                Err(FpgaseqError::Argument(format!("A {what} step needs a file path.")))
            } else {
                Ok(parameter.to_string())
            }
        };
        match kind.to_ascii_lowercase().as_str() {
            "pause" if parameter.is_empty() => Ok(Step::pause()),
            "pause" => Ok(Step::Pause {
                label: parameter.to_string(),
            }),
            "script" => Ok(Step::Script {
                path: needs_path("script")?,
            }),
            "bitstream" => Ok(Step::Bitstream {
                path: needs_path("bitstream")?,
            }),
            _ => {
                let err = FpgaseqError::UnknownStep {
                    kind: kind.to_string(),
                    parameter: parameter.to_string(),
                };
                warn!("{err}");
                Err(err)
            }
        }
    }

    pub fn is_bitstream(&self) -> bool {
        matches!(self, Step::Bitstream { .. })
    }

    /// Short label shown in step listings.
    pub fn label(&self) -> String {
        match self {
            Step::Pause { .. } => "Pause".to_string(),
            Step::Script { path } => format!("Run \"{}\"", file_name(path)),
            Step::Bitstream { path } => format!("Program \"{}\"", file_name(path)),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Pause { label } => write!(f, "pause: {label}"),
            Step::Script { path } => write!(f, "script: {path}"),
            Step::Bitstream { path } => write!(f, "bitstream: {path}"),
        }
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepList {
    steps: Vec<Step>,
    selected: Option<usize>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn has_bitstream(&self) -> bool {
        self.steps.iter().any(Step::is_bitstream)
    }

    /// Select `index`, or clear the selection. Returns whether something is selected.
    ///
    /// An index past the end clears the selection.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        self.selected = index.filter(|i| *i < self.steps.len());
        self.selected.is_some()
    }

    /// Add `step` below the selection, or at the end when nothing is selected.
    ///
    /// The new step becomes the selection. Returns its position.
    pub fn insert(&mut self, step: Step) -> usize {
        let position = match self.selected {
            None => self.steps.len(),
            Some(selected) => selected + 1,
        };
        self.steps.insert(position, step);
        self.selected = Some(position);
        position
    }

    /// Swap the selected step with the one `offset` positions away.
    ///
    /// Does nothing (and returns `false`) without a selection or when the target
    /// position is outside the list.
    pub fn move_selected(&mut self, offset: isize) -> bool {
        let Some(selected) = self.selected else {
            return false;
        };
        let Some(target) = selected.checked_add_signed(offset) else {
            return false;
        };
        if target >= self.steps.len() {
            return false;
        }
        self.steps.swap(selected, target);
        self.selected = Some(target);
        true
    }

    /// Delete the selected step and return it.
    ///
    /// The selection moves to the step that took its place, else to the new last step,
    /// else it is cleared.
    pub fn remove_selected(&mut self) -> Option<Step> {
        let selected = self.selected?;
        let removed = self.steps.remove(selected);
        self.selected = if selected < self.steps.len() {
            Some(selected)
        } else {
            self.steps.len().checked_sub(1)
        };
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    fn bitstream(path: &str) -> Step {
        Step::Bitstream {
            path: path.to_string(),
        }
    }

    fn list_of(paths: &[&str]) -> StepList {
        let mut list = StepList::new();
        for path in paths {
            list.insert(bitstream(path));
        }
        list
    }

    #[gtest]
    fn insert_without_selection_appends() {
        let mut list = list_of(&["a.bit", "b.bit"]);
        list.select(None);
        expect_that!(list.insert(bitstream("c.bit")), eq(2));
        expect_that!(list.selected(), eq(Some(2)));
    }

    #[gtest]
    fn insert_goes_below_selection() {
        let mut list = list_of(&["a.bit", "b.bit"]);
        list.select(Some(0));
        expect_that!(list.insert(Step::pause()), eq(1));
        expect_that!(list.selected(), eq(Some(1)));
        let expected = vec![bitstream("a.bit"), Step::pause(), bitstream("b.bit")];
        expect_that!(list.steps(), eq(expected.as_slice()));
    }

    #[gtest]
    #[rstest]
    #[case::up_from_top(0, -1)]
    #[case::down_from_bottom(2, 1)]
    #[case::far_down(0, 5)]
    fn move_out_of_bounds_is_noop(#[case] selected: usize, #[case] offset: isize) {
        let mut list = list_of(&["a.bit", "b.bit", "c.bit"]);
        list.select(Some(selected));
        let before = list.clone();
        expect_that!(list.move_selected(offset), eq(false));
        expect_that!(&list, eq(&before));
    }

    #[gtest]
    fn move_swaps_and_follows_selection() {
        let mut list = list_of(&["a.bit", "b.bit", "c.bit"]);
        list.select(Some(0));
        expect_that!(list.move_selected(1), eq(true));
        expect_that!(list.selected(), eq(Some(1)));
        let expected = vec![bitstream("b.bit"), bitstream("a.bit"), bitstream("c.bit")];
        expect_that!(list.steps(), eq(expected.as_slice()));
    }

    #[gtest]
    fn move_without_selection_is_noop() {
        let mut list = list_of(&["a.bit", "b.bit"]);
        list.select(None);
        expect_that!(list.move_selected(1), eq(false));
    }

    #[gtest]
    fn remove_single_entry_empties_list() {
        let mut list = list_of(&["a.bit"]);
        expect_that!(list.remove_selected(), eq(&Some(bitstream("a.bit"))));
        expect_that!(list.is_empty(), eq(true));
        expect_that!(list.selected(), eq(None));
    }

    #[gtest]
    #[rstest]
    #[case::middle_selects_successor(1, Some(1), "c.bit")]
    #[case::last_selects_new_last(2, Some(1), "b.bit")]
    #[case::first_selects_successor(0, Some(0), "b.bit")]
    fn remove_moves_selection(
        #[case] selected: usize,
        #[case] expected: Option<usize>,
        #[case] expected_step: &str,
    ) {
        let mut list = list_of(&["a.bit", "b.bit", "c.bit"]);
        list.select(Some(selected));
        list.remove_selected();
        expect_that!(list.selected(), eq(expected));
        let now_selected = expected.map(|i| list.steps()[i].clone());
        expect_that!(now_selected, eq(&Some(bitstream(expected_step))));
    }

    #[gtest]
    fn selection_past_end_is_cleared() {
        let mut list = list_of(&["a.bit"]);
        expect_that!(list.select(Some(1)), eq(false));
        expect_that!(list.selected(), eq(None));
        expect_that!(list.remove_selected(), eq(&None));
    }

    #[gtest]
    #[rstest]
    #[case::pause("pause", "", Step::pause())]
    #[case::labelled_pause("Pause", "swap cables", Step::Pause { label: "swap cables".into() })]
    #[case::script("script", "/opt/reset.sh", Step::Script { path: "/opt/reset.sh".into() })]
    #[case::bitstream("bitstream", "/lib/firmware/a.bit", bitstream("/lib/firmware/a.bit"))]
    fn parse_known_tags(#[case] kind: &str, #[case] parameter: &str, #[case] expected: Step) {
        expect_that!(Step::parse(kind, parameter), ok(eq(&expected)));
    }

    #[gtest]
    fn parse_unknown_tag_fails() {
        expect_that!(
            &Step::parse("flash", "x.bin"),
            err(displays_as(contains_substring(
                "FpgaseqError::UnknownStep: Ignoring unknown programming command"
            )))
        );
    }

    #[gtest]
    fn parse_bitstream_without_path_fails() {
        expect_that!(
            &Step::parse("bitstream", ""),
            err(displays_as(contains_substring("FpgaseqError::Argument")))
        );
    }

    #[gtest]
    fn labels_use_file_names() {
        expect_that!(
            bitstream("/lib/firmware/top.bit").label(),
            eq("Program \"top.bit\"")
        );
        expect_that!(
            Step::Script {
                path: "/opt/scripts/reset.sh".into()
            }
            .label(),
            eq("Run \"reset.sh\"")
        );
        expect_that!(Step::pause().label(), eq("Pause"));
    }

    #[gtest]
    fn has_bitstream_detects_any_bitstream() {
        let mut list = StepList::new();
        list.insert(Step::pause());
        expect_that!(list.has_bitstream(), eq(false));
        list.insert(bitstream("a.bit"));
        expect_that!(list.has_bitstream(), eq(true));
    }
}
