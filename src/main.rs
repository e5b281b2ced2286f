//! # Bluepos CLI
//!
//! Command-line front end for a Bluetooth receipt printer.
//!
//! ## Usage
//!
//! ```bash
//! # Check the radio
//! bluepos status
//!
//! # Look for a printer
//! bluepos scan --device-filter pt-210
//!
//! # Print the built-in sample label
//! bluepos print --logo logo.png
//!
//! # Print a job file on an 80 mm printer
//! bluepos print --profile 80mm receipt.json
//!
//! # Dry run against the simulated printer, status as JSON lines
//! bluepos --simulate --json print
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use tokio::task::JoinHandle;

use bluepos::{
    BlueposError, ConnectionManager, Dispatch, ManagerConfig, PrintJob, PrinterProfile,
    job::{JobSpec, sample},
    manager::{Command, StatusStream},
    transport::{PrinterTransport, RfcommConfig, RfcommTransport, SimulatedTransport},
};

/// Bluepos - Bluetooth receipt printer client
#[derive(Parser, Debug)]
#[command(name = "bluepos")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use the simulated printer instead of the Bluetooth adapter
    #[arg(long, global = true)]
    simulate: bool,

    /// Printer name fragment to accept during a scan (repeatable)
    #[arg(long = "device-filter", value_name = "NAME", global = true)]
    device_filter: Vec<String>,

    /// rfcomm channel index (/dev/rfcommN)
    #[arg(long, default_value_t = 0, global = true)]
    channel: u8,

    /// Printer profile: 58mm or 80mm
    #[arg(long, default_value = "58mm", value_parser = parse_profile, global = true)]
    profile: PrinterProfile,

    /// Seconds to listen for printers during a scan
    #[arg(long, default_value_t = 8, value_name = "SECS", global = true)]
    scan_window: u64,

    /// Print status snapshots as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check Bluetooth readiness and show the status
    Status,

    /// Scan for a printer
    Scan,

    /// Scan, connect, print a job and disconnect
    Print {
        /// JSON job file (omit to print the sample label)
        job: Option<PathBuf>,

        /// Logo image for the sample label
        #[arg(long, value_name = "FILE", conflicts_with = "job")]
        logo: Option<PathBuf>,
    },
}

fn parse_profile(name: &str) -> Result<PrinterProfile, String> {
    PrinterProfile::by_name(name).ok_or_else(|| {
        let known: Vec<&str> = PrinterProfile::ALL.iter().map(|p| p.name).collect();
        format!("unknown profile '{}' (expected one of: {})", name, known.join(", "))
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// What the chosen subcommand drives the manager through.
enum Plan {
    Status,
    Scan,
    Print(PrintJob),
}

async fn run(cli: Cli) -> Result<(), BlueposError> {
    // Jobs are validated before the printer is touched.
    let plan = match &cli.command {
        Commands::Status => Plan::Status,
        Commands::Scan => Plan::Scan,
        Commands::Print { job, logo } => Plan::Print(load_job(job.as_deref(), logo.as_deref())?),
    };

    let config = ManagerConfig {
        scan_window: Duration::from_secs(cli.scan_window),
        scan_timeout: Duration::from_secs(cli.scan_window + 4),
        profile: cli.profile,
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::new(transport(&cli), config);
    let observer = observe(manager.connection_state(), cli.json);

    let result = drive(&manager, plan).await;

    // Dropping the last handle closes the status stream.
    drop(manager);
    if let Err(e) = observer.await {
        tracing::error!(error = %e, "status observer failed");
    }
    result
}

async fn drive(manager: &ConnectionManager, plan: Plan) -> Result<(), BlueposError> {
    step(manager, Command::Init).await?;
    if matches!(plan, Plan::Status) {
        return Ok(());
    }

    step(manager, Command::Scan).await?;
    let Plan::Print(job) = plan else {
        return Ok(());
    };

    step(manager, Command::Connect).await?;
    let printed = step(manager, Command::Print(job)).await;
    // A failed print keeps the link; dismiss the error and close it anyway.
    manager.acknowledge_error().await;
    step(manager, Command::Disconnect).await?;
    printed
}

/// Run one command as a task and turn a published error into `Err`.
async fn step(manager: &ConnectionManager, command: Command) -> Result<(), BlueposError> {
    let name = command.name();
    let is_init = matches!(command, Command::Init);
    let dispatch = manager
        .spawn(command)
        .await
        .map_err(|e| BlueposError::Task(format!("{} task failed: {}", name, e)))?;

    let status = manager.status();
    if let Some(err) = status.last_error {
        return Err(err.into());
    }
    // init is a no-op when the radio is already known to be ready.
    if dispatch == Dispatch::Rejected && !is_init {
        return Err(BlueposError::Rejected(format!(
            "{} not possible while {}",
            name,
            status.phase.as_str()
        )));
    }
    Ok(())
}

fn transport(cli: &Cli) -> Arc<dyn PrinterTransport> {
    if cli.simulate {
        return Arc::new(SimulatedTransport::new().with_latency(Duration::from_millis(250)));
    }
    let mut config = RfcommConfig {
        channel: cli.channel,
        ..RfcommConfig::default()
    };
    if !cli.device_filter.is_empty() {
        config.name_filter = cli.device_filter.clone();
    }
    Arc::new(RfcommTransport::new(config))
}

fn load_job(path: Option<&Path>, logo: Option<&Path>) -> Result<PrintJob, BlueposError> {
    if let Some(path) = path {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BlueposError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        return JobSpec::from_json(&json)?.into_job(base_dir);
    }

    let logo = logo
        .map(|path| {
            std::fs::read(path).map_err(|e| {
                BlueposError::Config(format!("cannot read {}: {}", path.display(), e))
            })
        })
        .transpose()?;
    Ok(sample::shipping_label(logo)?)
}

/// Print every snapshot until the manager is dropped.
fn observe(mut stream: StatusStream, json: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(status) = stream.recv().await {
            if json {
                match serde_json::to_string(&status.flags()) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!(error = %e, "cannot serialize status"),
                }
            } else {
                println!("{}", status);
            }
        }
    })
}
