//! CLI definitions for vesselharbor
//!
//! This module defines the CLI structure using clap's derive macros. Flags that
//! feed configuration keys are read back through `ArgMatches` so that only the
//! ones the user actually typed override other tiers.

pub mod config;

use clap::{ArgAction, Parser, Subcommand};
use config::ConfigArgs;
use std::path::PathBuf;

/// VesselHarbor command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Configuration file to read instead of the system and user files
    #[arg(short = 'C', long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Write the configuration to ./vesselharbor.toml and exit
    #[arg(short = 'w', long)]
    pub write: bool,

    /// Write the configuration to FILE and exit
    #[arg(short = 'W', long, value_name = "FILE")]
    pub write_conf: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// IP address of the VesselHarbor server
    #[arg(short = 'A', long, value_name = "ADDRESS")]
    pub ip_address: Option<String>,

    /// Port of the VesselHarbor server
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Unix socket of the VesselHarbor server
    #[arg(short = 'S', long, value_name = "PATH")]
    pub socket: Option<String>,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(long, default_value = "2")]
    pub log: String,

    #[arg(long = "debug-do-not-use", id = "debug_do_not_use", hide = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    #[arg(long = "development-do-not-use", id = "development_do_not_use", hide = true, action = ArgAction::SetTrue)]
    pub development: bool,

    #[arg(long = "simulate-do-not-use", id = "simulate_do_not_use", hide = true, action = ArgAction::SetTrue)]
    pub simulate: bool,

    #[arg(long = "noauth-do-not-use", id = "noauth_do_not_use", hide = true, action = ArgAction::SetTrue)]
    pub noauth: bool,

    #[arg(long, hide = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and edit configuration
    Config(ConfigArgs),
}
