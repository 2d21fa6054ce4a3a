use anyhow::{Context, Result};
use backend::{Config, ProcessService, Snapshot, TerminationResult};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use ui::header::Header;
use ui::process_table::{ProcessTable, SortColumn};
use ui::status_bar::StatusBar;

mod ui;

/// List and kill processes on this machine
#[derive(Parser)]
#[command(name = "procctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    policy: PolicyOpts,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Print the operating system name
    Os {
        /// Include the distribution and version
        #[arg(long)]
        long: bool,
    },
    /// List running processes
    List(ListArgs),
    /// Terminate a process by id
    Kill(KillArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Only show processes whose name or id contains this text
    #[arg(long, short = 'f', default_value = "")]
    filter: String,

    #[arg(long, value_enum, default_value_t = SortColumn::None)]
    sort: SortColumn,

    /// Reverse the sort order
    #[arg(long)]
    desc: bool,

    /// Emit the raw snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Refresh every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,
}

#[derive(Args)]
struct KillArgs {
    id: u32,

    /// Send SIGKILL if the process ignores the graceful signal
    #[arg(long, conflicts_with = "no_escalate")]
    escalate: bool,

    /// Only send the graceful signal
    #[arg(long)]
    no_escalate: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

/// Overrides for the kill policy. Unset flags fall back to `PROCCTL_*` env vars.
#[derive(Args)]
struct PolicyOpts {
    /// Milliseconds a graceful signal gets before escalation
    #[arg(long, global = true, value_name = "MS")]
    grace_ms: Option<u64>,

    /// Milliseconds to wait for a forceful kill to take effect
    #[arg(long, global = true, value_name = "MS")]
    recheck_ms: Option<u64>,

    /// Refuse to kill this process's own pid
    #[arg(long, global = true)]
    forbid_self_kill: bool,
}

impl PolicyOpts {
    fn load(&self) -> Result<Config> {
        let mut config = Config::from_env().context("reading PROCCTL_* environment")?;
        if let Some(ms) = self.grace_ms {
            config.kill.grace_period_ms = ms;
        }
        if let Some(ms) = self.recheck_ms {
            config.kill.recheck_window_ms = ms;
        }
        if self.forbid_self_kill {
            config.kill.allow_self_termination = false;
        }
        config.validate().context("invalid kill policy")?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.policy.load()?;
    debug!(?config, "loaded configuration");
    let service = Arc::new(ProcessService::with_config(config));

    match cli.command {
        Command::Os { long } => {
            let description = long.then(|| service.os_description());
            println!("{}", Header::render(service.get_os_name(), description));
            Ok(ExitCode::SUCCESS)
        }
        Command::List(args) => list(service, args).await,
        Command::Kill(args) => kill(service, args).await,
    }
}

async fn snapshot(service: &Arc<ProcessService>) -> Result<Snapshot> {
    let service = Arc::clone(service);
    let snapshot = tokio::task::spawn_blocking(move || service.list_processes())
        .await
        .context("listing task panicked")??;
    Ok(snapshot)
}

fn print_list(
    service: &ProcessService,
    table: &ProcessTable,
    snapshot: &Snapshot,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    let (text, shown) = table.render(snapshot);
    println!("{}", Header::render(service.get_os_name(), None));
    print!("{}", text);
    println!("{}", StatusBar::render(snapshot.len(), shown));
    Ok(())
}

async fn list(service: Arc<ProcessService>, args: ListArgs) -> Result<ExitCode> {
    let table = ProcessTable {
        sort_column: args.sort,
        sort_descending: args.desc,
        search_text: args.filter,
    };

    let Some(secs) = args.watch else {
        return match snapshot(&service).await {
            Ok(snapshot) => {
                print_list(&service, &table, &snapshot, args.json)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!("{:#}", e);
                Ok(ExitCode::FAILURE)
            }
        };
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed refresh is shown and the loop keeps going.
                match snapshot(&service).await {
                    Ok(snapshot) => print_list(&service, &table, &snapshot, args.json)?,
                    Err(e) => error!("{:#}", e),
                }
                println!();
            }
            _ = tokio::signal::ctrl_c() => return Ok(ExitCode::SUCCESS),
        }
    }
}

async fn kill(service: Arc<ProcessService>, args: KillArgs) -> Result<ExitCode> {
    let escalate = if args.escalate {
        true
    } else if args.no_escalate {
        false
    } else {
        service.config().kill.escalate_by_default
    };
    let id = args.id;

    let svc = Arc::clone(&service);
    let result = tokio::task::spawn_blocking(move || svc.kill_detailed(id, escalate))
        .await
        .context("kill task panicked")?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "success": result.is_success(), "result": result })
        );
    } else {
        println!("Process {}: {}", id, result);
    }

    Ok(match result {
        TerminationResult::Terminated => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
