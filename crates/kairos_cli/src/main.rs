//! Kairos CLI: static timing analysis of placed and routed designs.
//!
//! Provides `kairos analyze` to estimate net delays, propagate timing, and
//! report the critical path of a design snapshot, and `kairos check-data` to
//! validate a device series' delay data files.

#![warn(missing_docs)]

mod analyze;
mod check_data;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Kairos: FPGA interconnect delay estimation and timing analysis.
#[derive(Parser, Debug)]
#[command(name = "kairos", version, about = "Kairos timing analyzer")]
pub struct Cli {
    /// Print only errors and the report itself.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output. Repeat for trace-level logging.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to a `kairos.toml` file or the directory holding one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of `kairos`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a routed design snapshot.
    Analyze(AnalyzeArgs),
    /// Parse a series' delay data files and print a summary.
    CheckData(CheckDataArgs),
}

/// Arguments for the `kairos analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Design snapshot (JSON).
    #[arg(long)]
    pub design: String,

    /// Device tile grid (JSON).
    #[arg(long)]
    pub device: String,

    /// Timing requirement (e.g. "4ns", "4000ps", "250MHz"). Overrides the config.
    #[arg(long)]
    pub requirement: Option<String>,

    /// Output format for the report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Also write the timing graph in Graphviz format to this path.
    #[arg(long)]
    pub dot: Option<String>,
}

/// Arguments for the `kairos check-data` subcommand.
#[derive(Parser, Debug)]
pub struct CheckDataArgs {
    /// Root data directory. Overrides `device.data_dir`.
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Device series. Overrides `device.series`.
    #[arg(long)]
    pub series: Option<String>,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Plain text for the terminal.
    Text,
    /// A single JSON document.
    Json,
}

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    /// Suppresses progress lines on stderr.
    pub quiet: bool,
    /// Verbosity level.
    pub verbose: u8,
    /// Colors diagnostics and log lines.
    pub color: bool,
    /// Optional path to a config file or directory.
    pub config: Option<String>,
}

fn init_logging(global: &GlobalArgs) {
    use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
    let level = match (global.quiet, global.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    let color = if global.color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    // A logger may already be installed; keep the existing one.
    let _ = TermLogger::init(
        level,
        ConfigBuilder::new()
            .set_location_level(LevelFilter::Trace)
            .set_thread_level(LevelFilter::Off)
            .build(),
        TerminalMode::Stderr,
        color,
    );
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color: std::env::var("TERM").is_ok() && std::env::var("NO_COLOR").is_err(),
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Analyze(ref args) => analyze::run(args, &global),
        Command::CheckData(ref args) => check_data::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_analyze_minimal() {
        let cli = Cli::parse_from([
            "kairos",
            "analyze",
            "--design",
            "top.json",
            "--device",
            "xcvu3p.json",
        ]);
        match cli.command {
            Command::Analyze(ref args) => {
                assert_eq!(args.design, "top.json");
                assert_eq!(args.device, "xcvu3p.json");
                assert!(args.requirement.is_none());
                assert_eq!(args.format, ReportFormat::Text);
                assert!(args.dot.is_none());
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn parse_analyze_full() {
        let cli = Cli::parse_from([
            "kairos",
            "analyze",
            "--design",
            "top.json",
            "--device",
            "grid.json",
            "--requirement",
            "4ns",
            "--format",
            "json",
            "--dot",
            "out.dot",
        ]);
        match cli.command {
            Command::Analyze(ref args) => {
                assert_eq!(args.requirement.as_deref(), Some("4ns"));
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.dot.as_deref(), Some("out.dot"));
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn parse_check_data() {
        let cli = Cli::parse_from([
            "kairos",
            "check-data",
            "--data-dir",
            "/opt/data",
            "--series",
            "ultrascaleplus",
        ]);
        match cli.command {
            Command::CheckData(ref args) => {
                assert_eq!(args.data_dir.as_deref(), Some("/opt/data"));
                assert_eq!(args.series.as_deref(), Some("ultrascaleplus"));
            }
            _ => panic!("expected CheckData command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kairos", "--quiet", "--config", "k.toml", "check-data"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.config.as_deref(), Some("k.toml"));
    }

    #[test]
    fn parse_repeated_verbose() {
        let cli = Cli::parse_from(["kairos", "-vv", "check-data"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn analyze_requires_design() {
        let result = Cli::try_parse_from(["kairos", "analyze", "--device", "g.json"]);
        assert!(result.is_err());
    }
}
