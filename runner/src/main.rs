use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{info, LevelFilter};
use serde::Serialize;

use scheduler::{
    run_policy, FinalReport, PolicyKind, RecordingSink, RunOutcome, SimulationConfig, TickEvent,
    Workload,
};

mod format;
mod sample;

use format::TextSink;

fn cli() -> Command {
    Command::new("runner")
        .about("Simulates CPU scheduling policies over a workload of cpu and i/o bursts")
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .value_name("POLICY")
                .default_value("all")
                .help("fcfs, sjf, mlfq or all"),
        )
        .arg(
            Arg::new("workload")
                .short('w')
                .long("workload")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON workload; the built-in sample is used when omitted"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON simulation settings"),
        )
        .arg(
            Arg::new("horizon")
                .long("horizon")
                .value_name("TICKS")
                .value_parser(value_parser!(usize))
                .help("Stop after this many ticks even if processes remain"),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .action(ArgAction::SetTrue)
                .help("Print one line per tick"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the results as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("More log output, repeat for trace level"),
        )
}

#[derive(Debug)]
struct Options {
    policies: Vec<PolicyKind>,
    workload: Option<PathBuf>,
    config: Option<PathBuf>,
    horizon: Option<usize>,
    trace: bool,
    json: bool,
    verbose: u8,
}

impl Options {
    fn from_matches(matches: &ArgMatches) -> Result<Options> {
        let selector = matches
            .get_one::<String>("policy")
            .map(String::as_str)
            .unwrap_or("all");

        Ok(Options {
            policies: policies(selector)?,
            workload: matches.get_one::<PathBuf>("workload").cloned(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            horizon: matches.get_one::<usize>("horizon").copied(),
            trace: matches.get_flag("trace"),
            json: matches.get_flag("json"),
            verbose: matches.get_count("verbose"),
        })
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn policies(selector: &str) -> Result<Vec<PolicyKind>> {
    if selector.eq_ignore_ascii_case("all") {
        return Ok(PolicyKind::ALL.to_vec());
    }
    Ok(vec![selector.parse()?])
}

fn load_workload(path: Option<&Path>) -> Result<Workload> {
    let Some(path) = path else {
        return Ok(sample::workload());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read workload {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed workload {}", path.display()))
}

fn load_config(path: Option<&Path>, horizon: Option<usize>) -> Result<SimulationConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("malformed config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(horizon) = horizon {
        config.horizon = horizon;
    }
    Ok(config)
}

/// JSON shape of one policy run
#[derive(Serialize)]
struct PolicyRun {
    report: FinalReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    trace: Vec<TickEvent>,
}

/// Runs every selected policy and writes the results to `out`
///
/// Returns the policies that hit the horizon before completing.
fn run(options: &Options, out: &mut dyn Write) -> Result<Vec<PolicyKind>> {
    let workload = load_workload(options.workload.as_deref())?;
    let config = load_config(options.config.as_deref(), options.horizon)?;
    info!(
        "{} processes, horizon {}, policies {:?}",
        workload.len(),
        config.horizon,
        options.policies
    );

    let mut unbounded = Vec::new();
    let mut runs = Vec::new();
    for (idx, &kind) in options.policies.iter().enumerate() {
        let outcome = if options.json {
            let mut sink = RecordingSink::new();
            let outcome = run_policy(kind, &workload, &config, &mut sink)
                .with_context(|| format!("{kind} simulation failed"))?;
            runs.push(PolicyRun {
                report: outcome.report().clone(),
                trace: if options.trace { sink.ticks } else { Vec::new() },
            });
            outcome
        } else {
            let mut sink = TextSink::new(options.trace);
            let outcome = run_policy(kind, &workload, &config, &mut sink)
                .with_context(|| format!("{kind} simulation failed"))?;
            if idx > 0 {
                writeln!(out)?;
            }
            let text = sink
                .into_text()
                .with_context(|| format!("cannot render the {kind} report"))?;
            out.write_all(text.as_bytes())?;
            outcome
        };

        if let RunOutcome::Unbounded { .. } = outcome {
            unbounded.push(kind);
        }
    }

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &runs)?;
        writeln!(out)?;
    }
    Ok(unbounded)
}

fn main() -> Result<()> {
    let options = Options::from_matches(&cli().get_matches())?;

    env_logger::Builder::new()
        .filter_level(options.log_level())
        .parse_default_env()
        .init();

    let stdout = io::stdout();
    let unbounded = run(&options, &mut stdout.lock())?;
    if !unbounded.is_empty() {
        bail!("{unbounded:?} did not complete within the horizon");
    }
    Ok(())
}
