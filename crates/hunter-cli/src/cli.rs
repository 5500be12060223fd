//! CLI argument definitions for hunter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hunter_core::TextEncoding;
use hunter_core::config::polling;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "hunter")]
#[command(about = "Live process memory browser and signature scanner", version)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Session options file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    pub options: Option<PathBuf>,

    /// Read values straight from the process instead of the cached catalog
    #[arg(long, global = true)]
    pub direct: bool,

    /// Re-read a region on every touch instead of once per refresh
    #[arg(long, global = true)]
    pub no_dirty: bool,

    /// Allocate buffers for new regions as soon as they appear
    #[arg(long, global = true)]
    pub eager: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the cataloged memory regions
    Regions {
        /// Target process ID
        #[arg(long, env = "HUNTER_PID", conflicts_with = "replay")]
        pid: Option<i32>,
        /// Directory of region dumps to read instead of a live process
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Snapshot a process and store every region on disk
    Dump {
        /// Target process ID
        #[arg(long, env = "HUNTER_PID")]
        pid: i32,
        /// Output directory
        #[arg(short, long, default_value = "dump")]
        dir: PathBuf,
    },
    /// Search for signatures
    Scan {
        /// Target process ID
        #[arg(long, env = "HUNTER_PID", conflicts_with = "replay")]
        pid: Option<i32>,
        /// Directory of region dumps to read instead of a live process
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        /// Pattern set file (JSON); the built-in set is used when omitted
        #[arg(short, long, value_name = "FILE")]
        patterns: Option<PathBuf>,
        /// Also resolve each match as a RIP-relative instruction
        #[arg(long)]
        relative: bool,
        /// Log the compiled layout of every pattern
        #[arg(long)]
        debug_all: bool,
    },
    /// Resolve an address and read a value
    Read {
        /// Target process ID
        #[arg(long, env = "HUNTER_PID", conflicts_with = "replay")]
        pid: Option<i32>,
        /// Directory of region dumps to read instead of a live process
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        /// Start address (hex, e.g., 0x7f3a2c001000)
        #[arg(long)]
        address: String,
        /// Treat the address as a RIP-relative instruction first
        #[arg(long)]
        relative: bool,
        /// Pointer chain offsets (hex, comma separated, e.g., 0x48,0x10)
        #[arg(long)]
        chain: Option<String>,
        /// Value type
        #[arg(long = "type", value_enum, default_value = "u64")]
        value_type: ValueType,
        /// Read a text field of this many bytes instead of a number
        #[arg(long, value_name = "LEN")]
        text: Option<usize>,
        /// Source encoding of text fields
        #[arg(long, default_value = "utf8")]
        encoding: TextEncoding,
    },
    /// Poll a process and display a set of watched values
    Watch {
        /// Target process ID
        #[arg(long, env = "HUNTER_PID")]
        pid: i32,
        /// Watch list file (JSON)
        #[arg(short, long, value_name = "FILE")]
        watches: PathBuf,
        /// Refresh interval in milliseconds
        #[arg(long, default_value_t = polling::DEFAULT_REFRESH_INTERVAL.as_millis() as u64)]
        interval: u64,
        /// Paint into this file instead of the terminal
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Numeric value types that can be read and displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    #[default]
    U64,
    I64,
    F32,
    F64,
}
