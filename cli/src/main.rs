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

//! Command-line client for the fpgaseq daemon.
//!
//! Boards are addressed by the 1-based numbers shown by `fpgaseq status`; steps by their
//! 1-based position in `fpgaseq steps list`. Commands that start a run return as soon as
//! the daemon accepts it, unless `--wait` is given, in which case progress is printed
//! until the run ends and its result is shown.

mod proxies;
mod run;
mod status;
mod steps;

use crate::run::{cancel_handler, resume_handler, run_handler};
use crate::status::status_handler;
use crate::steps::steps_handler;
use clap::{Args, Parser, Subcommand};
use log::{debug, error};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fpgaseq")]
#[command(bin_name = "fpgaseq")]
#[command(about = "Sequence programming runs across FPGA boards sharing one cable")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct WaitFlag {
    /// Print progress until the run finishes
    #[arg(long)]
    wait: bool,
}

#[derive(Subcommand, Debug)]
pub enum RunCommand {
    /// Enable a board and disable all others
    Enable {
        board: u32,
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Disable a board
    Disable {
        board: u32,
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Flip a board's enabled state
    Toggle {
        board: u32,
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Enable only this board
    Only {
        board: u32,
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Enable every board
    EnableAll {
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Disable every board
    DisableAll {
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Run the step list on one board
    Program {
        board: u32,
        #[command(flatten)]
        wait: WaitFlag,
    },
    /// Run the step list on every board in turn
    ProgramAll {
        #[command(flatten)]
        wait: WaitFlag,
    },
}

impl RunCommand {
    pub fn wait(&self) -> bool {
        let flag = match self {
            RunCommand::Enable { wait, .. }
            | RunCommand::Disable { wait, .. }
            | RunCommand::Toggle { wait, .. }
            | RunCommand::Only { wait, .. }
            | RunCommand::EnableAll { wait }
            | RunCommand::DisableAll { wait }
            | RunCommand::Program { wait, .. }
            | RunCommand::ProgramAll { wait } => wait,
        };
        flag.wait
    }
}

#[derive(Subcommand, Debug)]
pub enum StepsSubcommand {
    /// Show the step list
    List,
    /// Add a step below the selection (or at the end)
    Add {
        /// pause, script or bitstream
        kind: String,
        /// Pause label, script path or bitstream path
        parameter: Option<String>,
    },
    /// Select a step; 0 clears the selection
    Select { position: u32 },
    /// Move the selected step up
    Up,
    /// Move the selected step down
    Down,
    /// Remove the selected step
    Remove,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show boards, steps and the state of the current run
    Status,
    #[command(flatten)]
    Run(RunCommand),
    /// Edit the step list
    Steps {
        #[command(subcommand)]
        command: StepsSubcommand,
    },
    /// Continue a run waiting at a pause step
    Resume,
    /// Stop the current run and restore the boards
    Cancel,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");
    let result = match &cli.command {
        Commands::Status => status_handler().await,
        Commands::Run(command) => run_handler(command).await,
        Commands::Steps { command } => steps_handler(command).await,
        Commands::Resume => resume_handler().await,
        Commands::Cancel => cancel_handler().await,
    };
    match result {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
