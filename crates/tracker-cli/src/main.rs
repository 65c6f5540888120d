mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{CliError, Service};
use std::path::PathBuf;
use std::process::ExitCode;
use tracker_core::{ClientId, ParcelNumber, ParcelService, ParcelStatus};
use tracker_store::{SqliteParcelStore, TrackerConfig};

#[derive(Debug, Parser)]
#[command(name = "tracker", version, about = "Parcel registration and delivery tracking")]
struct Cli {
    /// Path to the SQLite database (overrides the config file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a JSON config file (default: ~/.config/tracker/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a new parcel for a client.
    Register {
        #[arg(long)]
        client: ClientId,
        #[arg(long)]
        address: String,
    },
    /// Change the delivery address of a registered parcel.
    ChangeAddress {
        number: ParcelNumber,
        address: String,
    },
    /// Move a parcel to its next status.
    Advance { number: ParcelNumber },
    /// Set a parcel's status (forward single steps only).
    SetStatus {
        number: ParcelNumber,
        /// One of: registered, sent, delivered.
        status: ParcelStatus,
    },
    /// Show a single parcel.
    Show { number: ParcelNumber },
    /// List all parcels of a client.
    List { client: ClientId },
    /// Count the parcels of a client.
    Count { client: ClientId },
    /// Delete a registered parcel.
    Delete { number: ParcelNumber },
    /// Run a short lifecycle walkthrough against the database.
    Demo {
        #[arg(long, default_value = "1000")]
        client: ClientId,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn open_service(db: Option<PathBuf>, config: Option<PathBuf>) -> Result<Service, CliError> {
    let mut config = match config {
        Some(path) => TrackerConfig::load(&path)?,
        None => TrackerConfig::load_default()?,
    };
    if let Some(db) = db {
        config.database = db;
    }
    tracing::debug!(
        "opening {} (busy timeout {:?})",
        config.database.display(),
        config.busy_timeout()
    );
    let store = SqliteParcelStore::from_config(&config)?;
    Ok(ParcelService::new(store))
}

fn dispatch(cli: Cli) -> Result<u8, CliError> {
    let json = cli.json;
    let command = match cli.command {
        Commands::Completions { shell } => return commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => return commands::man_pages::run::<Cli>(&dir),
        command => command,
    };

    let service = open_service(cli.db, cli.config)?;
    match command {
        Commands::Register { client, address } => {
            commands::register::run(&service, client, &address, json)
        }
        Commands::ChangeAddress { number, address } => {
            commands::change_address::run(&service, number, &address, json)
        }
        Commands::Advance { number } => commands::advance::run(&service, number, json),
        Commands::SetStatus { number, status } => {
            commands::set_status::run(&service, number, status, json)
        }
        Commands::Show { number } => commands::show::run(&service, number, json),
        Commands::List { client } => commands::list::run(&service, client, json),
        Commands::Count { client } => commands::count::run(&service, client, json),
        Commands::Delete { number } => commands::delete::run(&service, number, json),
        Commands::Demo { client } => commands::demo::run(&service, client),
        Commands::Completions { .. } | Commands::ManPages { .. } => Ok(commands::EXIT_SUCCESS),
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TRACKER_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
