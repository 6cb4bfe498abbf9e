use anyhow::{Result, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::process::exit;

use evtx_transform::{RunConfig, RunController, RunError, RunOutcome};

fn command() -> Command {
    Command::new("evtx_transform")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Applies an XSLT stylesheet to every record of an EVTX file")
        .long_about(indoc!(
            r#"
            Applies an XSLT stylesheet to every record of an EVTX file.

            Every record is rendered to XML, transformed, and written as one line of
            OUTPUT. Progress and errors are written to LOG; both files are overwritten.
        "#
        ))
        .arg(
            Arg::new("EVENT_LOG")
                .required(true)
                .help("Event log file (.evtx) to read."),
        )
        .arg(
            Arg::new("XSLT")
                .required(true)
                .help("XSLT stylesheet applied to every record."),
        )
        .arg(
            Arg::new("OUTPUT")
                .required(true)
                .help("Output file, receives one line per record."),
        )
        .arg(
            Arg::new("LOG")
                .required(true)
                .help("Log file, receives the progress of the run."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace. Diagnostics are printed to stderr."),
        )
}

fn try_to_initialize_logging(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => return,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        3 => LevelFilter::Trace,
        _ => {
            eprintln!("using more than -vvv does not affect verbosity level");
            LevelFilter::Trace
        }
    };

    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn config_from_matches(matches: &ArgMatches) -> Result<RunConfig> {
    let path = |name: &str| {
        matches
            .get_one::<String>(name)
            .cloned()
            .ok_or_else(|| format_err!("missing required argument `{}`", name))
    };

    Ok(RunConfig::new(
        path("EVENT_LOG")?,
        path("XSLT")?,
        path("OUTPUT")?,
        path("LOG")?,
    ))
}

fn main() -> Result<()> {
    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            // Usage goes to stdout, including when arguments are missing.
            println!("{}", e.render());
            exit(e.exit_code());
        }
    };

    try_to_initialize_logging(&matches);

    let config = config_from_matches(&matches)?;
    let report = RunController::new(config).run();

    // Everything past opening the run log is reported in the run log itself.
    match report.outcome {
        RunOutcome::Failure(failure) => match failure.error {
            RunError::Configuration { .. } => {
                Err(format_err!("{}", failure.error).context("Error initializing log file"))
            }
            _ => Ok(()),
        },
        RunOutcome::Success { .. } => Ok(()),
    }
}
