use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};

use crate::config;
use crate::distro;
use crate::pm;
use crate::registry;
use crate::runner;

const BASIC_USAGE: &str = "Basic usage: use -l to list tools or -t <tool> followed by its parameters.";

#[derive(Parser, Debug)]
#[command(name = "metanstain", version, about = "DFIR launcher for command-line metadata and forensic tools.")]
pub struct Cli {
    /// List tools and exit
    #[arg(short = 'l', long)]
    list: bool,
    /// Print the tool list as JSON (with --list)
    #[arg(long, requires = "list")]
    json: bool,
    /// Number or name of the tool to run
    #[arg(short = 't', long, value_name = "ID|NAME")]
    tool: Option<String>,
    /// File to save the tool's standard output to
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Skip the check for missing tools
    #[arg(long, default_value_t = false)]
    no_install: bool,
    /// Show the package-manager commands instead of running them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Report host and tool availability, then exit
    #[arg(long, default_value_t = false)]
    doctor: bool,
    /// Log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
    /// Parameters passed to the selected tool (use `--` before ones that clash with these flags)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "PARAMS")]
    params: Vec<String>,
}

pub fn run() -> Result<i32> {
    if std::env::args_os().len() <= 1 {
        println!("{}", BASIC_USAGE);
        return Ok(0);
    }
    let matches = Cli::command().after_help(registry::listing()).get_matches();
    let cli = Cli::from_arg_matches(&matches).context("parsing arguments")?;
    init_logger(cli.log_level);
    dispatch(cli)
}

fn dispatch(cli: Cli) -> Result<i32> {
    let cfg = config::load_config();
    log::debug!("config: {:?}", cfg);

    if cli.doctor {
        doctor();
        return Ok(0);
    }

    if cfg.auto_install && !cli.no_install {
        let opts = pm::Options { host: distro::detect_host(), sudo: cfg.sudo, dry_run: cli.dry_run };
        let report = pm::check_and_install(registry::all(), opts, &pm::default_context());
        log::debug!("install check: {}", pm::summarize(&report));
    }

    if cli.list {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(registry::all()).context("serializing tool list")?);
        } else {
            println!("{}", registry::listing());
        }
        return Ok(0);
    }

    let Some(selection) = cli.tool.as_deref() else {
        println!("A tool must be given with -t or --tool. Use -l to see the options.");
        return Ok(0);
    };
    let Some(tool) = registry::resolve(selection) else {
        println!("The given tool does not exist. Use -l to see the available options.");
        return Ok(0);
    };
    log::debug!("resolved '{}' to {} ({})", selection, tool.name, tool.package);
    runner::run_tool(tool.name, &cli.params, cli.output.as_deref())
}

fn doctor() {
    println!("metanstain doctor:");
    match distro::detect_host() {
        Some(f) => println!("- host family: {} (auto-install {})", f.as_str(), if distro::is_debian_like(Some(f)) { "available" } else { "unavailable" }),
        None => println!("- host family: unknown (auto-install unavailable)"),
    }
    for helper in ["apt-get", "sudo"] {
        match which::which(helper) {
            Ok(path) => println!("- {}: found at {}", helper, path.display()),
            Err(_) => println!("- {}: NOT FOUND", helper),
        }
    }
    let cfg_path = config::config_path();
    println!("- config: {} (present: {})", cfg_path.display(), yes_no(cfg_path.exists()));
    for t in registry::all() {
        match which::which(t.name) {
            Ok(path) => println!("- {}. {}: {}", t.id, t.name, path.display()),
            Err(_) => println!("- {}. {}: NOT FOUND (package {})", t.id, t.name, t.package),
        }
    }
}

fn yes_no(b: bool) -> &'static str { if b { "yes" } else { "no" } }

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel { Trace, Debug, Info, Warn, Error }

fn init_logger(level: Option<LogLevel>) {
    let filter = match level.unwrap_or(LogLevel::Info) {
        LogLevel::Trace => log::LevelFilter::Trace,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter);
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("metanstain").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tool_and_params() {
        let cli = parse(&["-t", "exiftool", "-o", "meta.txt", "-a", "-G1", "photo.jpg"]);
        assert_eq!(cli.tool.as_deref(), Some("exiftool"));
        assert_eq!(cli.output, Some(PathBuf::from("meta.txt")));
        assert_eq!(cli.params, ["-a", "-G1", "photo.jpg"]);
    }

    #[test]
    fn double_dash_protects_clashing_flags() {
        let cli = parse(&["-t", "xxd", "--", "-l", "16", "dump.bin"]);
        assert!(!cli.list);
        assert_eq!(cli.params, ["-l", "16", "dump.bin"]);
    }

    #[test]
    fn list_flags() {
        let cli = parse(&["-l", "--json", "--no-install"]);
        assert!(cli.list && cli.json && cli.no_install);
        assert!(Cli::try_parse_from(["metanstain", "--json"]).is_err());
    }

    #[test]
    fn unknown_tool_exits_zero_without_running() {
        let cli = parse(&["--no-install", "-t", "volatility"]);
        assert_eq!(dispatch(cli).unwrap(), 0);
    }
}
