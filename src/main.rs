//! batlog - Battery History Logger
//!
//! Samples the battery on a fixed interval and summarizes the resulting log
//! as an ASCII sparkline. Run with `RUST_LOG=debug batlog ...` for details.

use batlog::{
    BatlogResult, Config, LogReport, Monitor, SampleLog, TickOutcome, get_sampler,
    monitor::status_block,
};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("quiet"));

    if let Err(e) = run(matches).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over the default level
fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build command line interface
fn build_cli() -> Command {
    Command::new("batlog")
        .version(VERSION)
        .about("Logs battery charge over time and draws it as an ASCII sparkline")
        .long_about(
            "batlog samples the battery level, charging state and the most \
             memory-hungry processes, appends changes to a log file, and \
             summarizes the log as a charge-level histogram with a digest of \
             the latest charge or discharge episode.",
        )
        .arg(
            Arg::new("log-file")
                .short('l')
                .long("log-file")
                .value_name("PATH")
                .help("Sample log to append to and read from")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress warnings")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("monitor")
                .about("Sample on a fixed interval until interrupted")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECS")
                        .help("Seconds between samples")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("sample")
                .about("Take a single sample and print it")
                .arg(
                    Arg::new("no-log")
                        .long("no-log")
                        .help("Print the sample without appending it to the log")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Draw the logged history and summarize the latest episode")
                .arg(
                    Arg::new("width")
                        .short('w')
                        .long("width")
                        .value_name("POINTS")
                        .help("Maximum number of points to draw")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("height")
                        .short('H')
                        .long("height")
                        .value_name("ROWS")
                        .help("Number of histogram rows above the axis")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("window")
                        .long("window")
                        .value_name("RECORDS")
                        .help("Only summarize the most recent records")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format")
                        .value_parser(["text", "json", "yaml"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            Command::new("check-platform").about("Check platform compatibility and exit"),
        )
}

/// Merge command line overrides into the environment configuration
fn resolve_config(matches: &ArgMatches) -> BatlogResult<Config> {
    let mut config = Config::from_env()?;

    if let Some(path) = matches.get_one::<PathBuf>("log-file") {
        config.log_file = path.clone();
    }

    match matches.subcommand() {
        Some(("monitor", sub)) => {
            if let Some(&secs) = sub.get_one::<u64>("interval") {
                config.interval = Duration::from_secs(secs);
            }
        }
        Some(("summary", sub)) => {
            if let Some(&width) = sub.get_one::<usize>("width") {
                config.render.max_width = width;
            }
            if let Some(&height) = sub.get_one::<u32>("height") {
                config.render.max_height = height;
            }
            if let Some(&window) = sub.get_one::<usize>("window") {
                config.window = Some(window);
            }
        }
        _ => {}
    }

    config.validate()?;
    Ok(config)
}

/// Run main logic
async fn run(matches: ArgMatches) -> BatlogResult<()> {
    if let Some(("check-platform", _)) = matches.subcommand() {
        return check_platform_command();
    }

    let config = resolve_config(&matches)?;
    let log = SampleLog::new(&config.log_file);

    match matches.subcommand() {
        Some(("monitor", _)) => {
            batlog::check_platform()?;
            Monitor::new(get_sampler(), log, config.interval).run().await
        }
        Some(("sample", sub)) => sample_command(log, sub.get_flag("no-log")).await,
        Some(("summary", sub)) => {
            let format = sub
                .get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("text");
            summary_command(&log, &config, format)
        }
        _ => summary_command(&log, &config, "text"),
    }
}

/// Check platform compatibility command
fn check_platform_command() -> BatlogResult<()> {
    match batlog::check_platform() {
        Ok(()) => {
            println!("Platform check: OK ({})", batlog::get_platform_name());
            println!("Battery sampling is supported on this system.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Platform check: FAILED");
            eprintln!("Current platform: {}", batlog::get_platform_name());
            Err(e)
        }
    }
}

/// Take one sample, print it, and log it unless told not to
async fn sample_command(log: SampleLog, no_log: bool) -> BatlogResult<()> {
    batlog::check_platform()?;

    if no_log {
        let sample = get_sampler().take_sample().await?;
        println!("{}", status_block(&sample));
        return Ok(());
    }

    let monitor = Monitor::new(get_sampler(), log, Duration::from_secs(1));
    match monitor.tick().await? {
        TickOutcome::Logged(sample) => {
            println!("{}", status_block(&sample));
        }
        TickOutcome::Unchanged(sample) => {
            println!("{}", status_block(&sample));
            println!("\n(unchanged since last logged sample, not appended)");
        }
    }
    Ok(())
}

/// Summarize the log in the requested format
fn summary_command(log: &SampleLog, config: &Config, format: &str) -> BatlogResult<()> {
    let report = batlog::summarize_log(log, config.window, &config.render)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "yaml" => println!("{}", serde_yaml::to_string(&report)?),
        _ => print_text_report(log, &report),
    }

    Ok(())
}

/// Default text output
fn print_text_report(log: &SampleLog, report: &LogReport) {
    if report.rendering.points.is_empty() {
        println!("No battery history in {}", log.path().display());
        return;
    }

    println!();
    println!("{}", report.rendering.to_text());
    if report.skipped > 0 {
        println!(
            "\n{} of {} records skipped as malformed",
            report.skipped, report.records
        );
    }
}
