use std::{fs, io::Write, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use prio_sched_model::{
    Metrics, PolicyKind, SimConfig, SimError,
    core::Ticks,
    io::{self, WorkloadParams},
    sim::{MemoryConfig, config::DEFAULT_PARTITIONS},
    simulate,
};

// Applied when neither the flag nor the config file sets one
const DEFAULT_MAX_TICKS: Ticks = 1_000_000;

#[derive(Parser)]
#[command(name = "prio-sched", version, about = "External-priority CPU scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a workload file and print the transition table
    Run(RunArgs),
    /// Compute scheduling metrics from a transition table
    Metrics {
        trace: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print a random workload in workload-file format
    Generate(GenerateArgs),
}

#[derive(Args)]
struct RunArgs {
    workload: PathBuf,
    #[arg(short, long, value_enum, default_value_t = PolicyKind::Ep)]
    policy: PolicyKind,
    /// JSON file with `quantum`, `max_ticks` and `memory`
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    quantum: Option<Ticks>,
    #[arg(long)]
    max_ticks: Option<Ticks>,
    /// Fixed memory partitions in MB (`--partitions=8,2`); bare flag uses 40,25,15,10,8,2
    #[arg(long, value_delimiter = ',', num_args = 0..=1, require_equals = true)]
    partitions: Option<Vec<u32>>,
    /// Keep simulating until every process in the file has arrived and finished
    #[arg(long)]
    drain_late_arrivals: bool,
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    json: bool,
    /// Also print throughput, waiting, turnaround and response times
    #[arg(long)]
    metrics: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long, default_value_t = 500)]
    ticks: Ticks,
    #[arg(long, default_value_t = 0.05)]
    p_arrival: f64,
    #[arg(long, default_value_t = 0.3)]
    p_short: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), SimError> {
    match command {
        Command::Run(args) => run_simulation(args),
        Command::Metrics { trace, json } => {
            let log = io::read_table(&trace)?;
            let metrics = Metrics::from_transitions(log.entries())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("===== Metrics for {} =====", trace.display());
                println!("{metrics}");
            }
            Ok(())
        }
        Command::Generate(args) => {
            let params = WorkloadParams {
                ticks: args.ticks,
                p_arrival: args.p_arrival,
                p_short: args.p_short,
                ..WorkloadParams::default()
            };
            print!(
                "{}",
                io::render_workload(&io::bernoulli_workload(&params, args.seed))
            );
            Ok(())
        }
    }
}

fn run_simulation(args: RunArgs) -> Result<(), SimError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(quantum) = args.quantum {
        config.quantum = quantum;
    }
    config.max_ticks = args.max_ticks.or(config.max_ticks).or(Some(DEFAULT_MAX_TICKS));
    if let Some(sizes) = args.partitions {
        let sizes = if sizes.is_empty() {
            DEFAULT_PARTITIONS.to_vec()
        } else {
            sizes
        };
        config.memory = MemoryConfig::Partitions { sizes };
    }
    config.drain_late_arrivals |= args.drain_late_arrivals;

    let workload = io::load_workload(&args.workload)?;
    let report = simulate(args.policy, workload, &config)?;

    match &args.output {
        Some(path) if args.json => fs::write(path, io::render_json(&report.transitions)?)?,
        Some(path) => io::write_table(path, report.transitions.entries())?,
        None if args.json => print!("{}", io::render_json(&report.transitions)?),
        None => print!("{}", io::render_table(report.transitions.entries())),
    }

    if args.metrics {
        let metrics = Metrics::from_transitions(report.transitions.entries())?;
        println!("===== Metrics for {} =====", args.policy.label());
        println!("{metrics}");
        println!("CPU Utilization:   {:.2} %", report.cpu_utilization * 100.0);
        println!("Peak Ready Queue:  {} processes", report.max_ready_len);
    }
    Ok(())
}
