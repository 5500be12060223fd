//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without executing the commands (which would require a target process).

use std::path::PathBuf;

use clap::Parser;

// Re-create Args structure for testing since the binary does not export it
#[derive(Parser)]
#[command(name = "hunter")]
struct Args {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_name = "FILE", global = true)]
    options: Option<PathBuf>,

    #[arg(long, global = true)]
    direct: bool,

    #[arg(long, global = true)]
    no_dirty: bool,

    #[arg(long, global = true)]
    eager: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    Regions {
        #[arg(long, conflicts_with = "replay")]
        pid: Option<i32>,
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    Dump {
        #[arg(long)]
        pid: i32,
        #[arg(short, long, default_value = "dump")]
        dir: PathBuf,
    },
    Scan {
        #[arg(long, conflicts_with = "replay")]
        pid: Option<i32>,
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        patterns: Option<PathBuf>,
        #[arg(long)]
        relative: bool,
        #[arg(long)]
        debug_all: bool,
    },
    Read {
        #[arg(long, conflicts_with = "replay")]
        pid: Option<i32>,
        #[arg(long, value_name = "DIR")]
        replay: Option<PathBuf>,
        #[arg(long)]
        address: String,
        #[arg(long)]
        relative: bool,
        #[arg(long)]
        chain: Option<String>,
        #[arg(long = "type", value_enum, default_value = "u64")]
        value_type: ValueType,
        #[arg(long, value_name = "LEN")]
        text: Option<usize>,
        #[arg(long, default_value = "utf8")]
        encoding: hunter_core::TextEncoding,
    },
    Watch {
        #[arg(long)]
        pid: i32,
        #[arg(short, long, value_name = "FILE")]
        watches: PathBuf,
        #[arg(long, default_value = "1000")]
        interval: u64,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

#[test]
fn test_subcommand_required() {
    assert!(Args::try_parse_from(["hunter"]).is_err());
}

#[test]
fn test_parse_regions_replay() {
    let args = Args::try_parse_from(["hunter", "regions", "--replay", "dump", "--json"]).unwrap();
    match args.command {
        Command::Regions { pid, replay, json } => {
            assert!(pid.is_none());
            assert_eq!(replay, Some(PathBuf::from("dump")));
            assert!(json);
        }
        _ => panic!("Expected Regions command"),
    }
}

#[test]
fn test_pid_conflicts_with_replay() {
    let result = Args::try_parse_from(["hunter", "regions", "--pid", "1234", "--replay", "dump"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_dump_defaults() {
    let args = Args::try_parse_from(["hunter", "dump", "--pid", "1234"]).unwrap();
    match args.command {
        Command::Dump { pid, dir } => {
            assert_eq!(pid, 1234);
            assert_eq!(dir, PathBuf::from("dump"));
        }
        _ => panic!("Expected Dump command"),
    }
}

#[test]
fn test_dump_requires_pid() {
    assert!(Args::try_parse_from(["hunter", "dump"]).is_err());
}

#[test]
fn test_parse_scan_flags() {
    let args = Args::try_parse_from([
        "hunter",
        "scan",
        "--pid",
        "77",
        "-p",
        "patterns.json",
        "--relative",
        "--debug-all",
    ])
    .unwrap();
    match args.command {
        Command::Scan {
            pid,
            patterns,
            relative,
            debug_all,
            ..
        } => {
            assert_eq!(pid, Some(77));
            assert_eq!(patterns, Some(PathBuf::from("patterns.json")));
            assert!(relative);
            assert!(debug_all);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn test_parse_read_defaults() {
    let args = Args::try_parse_from(["hunter", "read", "--pid", "1", "--address", "0x1000"]).unwrap();
    match args.command {
        Command::Read {
            address,
            value_type,
            text,
            encoding,
            chain,
            relative,
            ..
        } => {
            assert_eq!(address, "0x1000");
            assert_eq!(value_type, ValueType::U64);
            assert!(text.is_none());
            assert!(chain.is_none());
            assert!(!relative);
            assert_eq!(encoding, hunter_core::TextEncoding::Utf8);
        }
        _ => panic!("Expected Read command"),
    }
}

#[test]
fn test_parse_read_text_chain() {
    let args = Args::try_parse_from([
        "hunter",
        "read",
        "--replay",
        "dump",
        "--address",
        "7f001000",
        "--relative",
        "--chain",
        "0x48,0x0",
        "--type",
        "f32",
        "--text",
        "32",
        "--encoding",
        "shift-jis",
    ])
    .unwrap();
    match args.command {
        Command::Read {
            value_type,
            text,
            encoding,
            chain,
            relative,
            ..
        } => {
            assert_eq!(value_type, ValueType::F32);
            assert_eq!(text, Some(32));
            assert_eq!(encoding, hunter_core::TextEncoding::ShiftJis);
            assert_eq!(chain.as_deref(), Some("0x48,0x0"));
            assert!(relative);
        }
        _ => panic!("Expected Read command"),
    }
}

#[test]
fn test_parse_read_invalid_type() {
    let result = Args::try_parse_from([
        "hunter", "read", "--pid", "1", "--address", "0x1000", "--type", "u128",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_watch() {
    let args = Args::try_parse_from([
        "hunter",
        "watch",
        "--pid",
        "9",
        "-w",
        "watches.json",
        "--interval",
        "250",
        "-o",
        "frame.txt",
    ])
    .unwrap();
    match args.command {
        Command::Watch {
            pid,
            watches,
            interval,
            output,
        } => {
            assert_eq!(pid, 9);
            assert_eq!(watches, PathBuf::from("watches.json"));
            assert_eq!(interval, 250);
            assert_eq!(output, Some(PathBuf::from("frame.txt")));
        }
        _ => panic!("Expected Watch command"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = Args::try_parse_from([
        "hunter", "regions", "--pid", "5", "-vv", "--direct", "--no-dirty", "--eager",
    ])
    .unwrap();
    assert_eq!(args.verbose, 2);
    assert!(args.direct);
    assert!(args.no_dirty);
    assert!(args.eager);
    assert!(args.options.is_none());
}
