/*!
 * Scheduler Simulator - Main Entry Point
 *
 * Interactive shell over the simulator:
 * - add / del tasks
 * - ps to inspect them
 * - start to run (or resume) the simulation, Ctrl+C to pause it
 */

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use scheduler_sim::{
    init_tracing, Priority, ResourceWaitPolicy, RunOutcome, Scheduler, SchedulerConfig,
    SchedulingPolicy, TimeQuantum,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scheduler-sim")]
#[command(about = "Educational CPU scheduler simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Scheduling policy: FCFS, RR or PP
    policy: SchedulingPolicy,

    /// Timer tick in milliseconds (overrides SCHED_TICK_MS)
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Round-robin slice in ticks (overrides SCHED_QUANTUM_TICKS)
    #[arg(long)]
    quantum: Option<u32>,

    /// How tasks blocked on resources are retried: polling or wake_on_release
    #[arg(long)]
    resource_wait: Option<ResourceWaitPolicy>,

    /// Return a task's resources to the pool when it terminates
    #[arg(long)]
    reclaim: bool,
}

impl Cli {
    fn into_config(self) -> Result<SchedulerConfig> {
        let mut config = SchedulerConfig::from_env(self.policy)?;
        if let Some(ms) = self.tick_ms {
            config = config.with_tick_interval(Duration::from_millis(ms));
        }
        if let Some(ticks) = self.quantum {
            config = config.with_quantum(TimeQuantum::new(ticks)?);
        }
        if let Some(policy) = self.resource_wait {
            config = config.with_resource_wait(policy);
        }
        if self.reclaim {
            config = config.with_reclaim_on_terminate(true);
        }
        config.validate()?;
        Ok(config)
    }
}

/// One line typed at the prompt
#[derive(Parser)]
#[command(no_binary_name = true, disable_help_subcommand = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Create a task: add NAME WORKLOAD [PRIORITY]
    Add {
        name: String,
        workload: String,
        #[arg(default_value_t = 0)]
        priority: Priority,
    },
    /// Terminate a task by name
    Del { name: String },
    /// List tasks
    Ps {
        #[arg(long)]
        json: bool,
    },
    /// Start or resume the simulation
    Start,
    /// Show the active configuration
    Config,
    /// List commands and workloads
    Help,
    /// Leave the shell
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let scheduler = Arc::new(Scheduler::new(cli.into_config()?)?);
    info!(policy = %scheduler.policy(), "Scheduler simulator ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        match ShellLine::try_parse_from(words) {
            Ok(ShellLine { command }) => {
                if !execute(&scheduler, command).await? {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

/// Run one shell command. Returns false when the shell should exit.
async fn execute(scheduler: &Arc<Scheduler>, command: ShellCommand) -> Result<bool> {
    match command {
        ShellCommand::Add {
            name,
            workload,
            priority,
        } => {
            if let Err(e) = scheduler.create_and_enqueue(&name, &workload, priority) {
                eprintln!("{:?}", miette::Report::new(e));
            }
        }
        ShellCommand::Del { name } => {
            if let Err(e) = scheduler.request_termination(&name) {
                println!("{}.", e);
            }
        }
        ShellCommand::Ps { json } => {
            let report = scheduler.report();
            if json {
                println!("{}", report.to_json().into_diagnostic()?);
            } else {
                print!("{}", report);
            }
        }
        ShellCommand::Start => run_simulation(scheduler).await?,
        ShellCommand::Config => {
            println!(
                "{}",
                serde_json::to_string_pretty(&scheduler.config()).into_diagnostic()?
            );
        }
        ShellCommand::Help => print_help(scheduler),
        ShellCommand::Exit => return Ok(false),
    }
    Ok(true)
}

/// Drive the dispatcher on a blocking thread; Ctrl+C pauses it
async fn run_simulation(scheduler: &Arc<Scheduler>) -> Result<()> {
    let mut runner = {
        let scheduler = Arc::clone(scheduler);
        tokio::task::spawn_blocking(move || scheduler.start_or_resume())
    };

    let joined = tokio::select! {
        joined = &mut runner => joined,
        _ = tokio::signal::ctrl_c() => {
            scheduler.pause();
            runner.await
        }
    };

    match joined.into_diagnostic()? {
        Ok(RunOutcome::Completed) => {}
        Ok(RunOutcome::Paused) => println!("Simulation paused. Type `start` to resume."),
        Err(e) => warn!(error = %e, "Simulation stopped"),
    }
    Ok(())
}

fn print_help(scheduler: &Scheduler) {
    println!("add NAME WORKLOAD [PRIORITY]   create a task");
    println!("del NAME                       terminate a task");
    println!("ps [--json]                    list tasks");
    println!("start                          run or resume; Ctrl+C pauses");
    println!("config                         show configuration");
    println!("exit                           leave");
    let workloads: Vec<&str> = scheduler.registry().names().collect();
    println!("workloads: {}", workloads.join(", "));
}

fn prompt() {
    print!("$ ");
    let _ = std::io::stdout().flush();
}
