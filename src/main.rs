use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rowdesk::commands::{self, OutputFormat};
use rowdesk::{open_store, Config, JsonStore, SqliteStore};
use rowdesk_core::integrity::ColumnRef;
use rowdesk_store::backup::backup_now;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rowdesk", version, about = "Rowdesk — browse, search, edit and export database tables")]
struct Cli {
    /// Config file (default: ~/.config/rowdesk/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write debug logs to --log-file (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[arg(long, global = true, default_value = "/tmp/rowdesk-debug.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON HTTP API (the default).
    Serve {
        /// Override `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Write one table to a CSV file.
    ExportCsv {
        database: String,
        table: String,
        output: PathBuf,
    },
    /// Run a SQL statement against a SQLite database.
    Sql {
        query: String,
        #[arg(short, long)]
        database: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Check that the database opens.
    Check {
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Copy every SQLite table into JSON snapshots.
    Dump {
        /// Override `store.data_dir`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy the configured database files into a timestamped folder.
    Backup,
    /// Report child values with no matching parent.
    Integrity {
        /// `Table.Column`, default `integrity.child`.
        #[arg(long)]
        child: Option<String>,
        /// `Table.Column`, default `integrity.parent`.
        #[arg(long)]
        parent: Option<String>,
        #[arg(short, long)]
        database: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    let sqlite = SqliteStore::new(&config.store.sqlite_dir, &config.store.key_column);

    match command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let store = open_store(&config.store);
            tokio::runtime::Runtime::new()?.block_on(rowdesk::serve(config, store))?;
        }
        Command::ExportCsv {
            database,
            table,
            output,
        } => {
            let store = open_store(&config.store);
            let count = commands::export_csv(store.as_ref(), &database, &table, &output)?;
            println!("Exported {count} rows to {}", output.display());
        }
        Command::Sql {
            query,
            database,
            output,
        } => {
            let database = database.unwrap_or(config.store.default_database);
            println!("{}", commands::run_sql(&sqlite, &database, &query, output)?);
        }
        Command::Check { database } => {
            let database = database.unwrap_or(config.store.default_database);
            commands::check(&sqlite, &database)?;
            println!("Connection to {database} OK");
        }
        Command::Dump { out } => {
            let out = out.unwrap_or(config.store.data_dir);
            let target = JsonStore::new(&out, &config.store.key_column);
            let report = commands::dump(&sqlite, &target)?;
            println!("Dumped {} tables to {}", report.written.len(), out.display());
            for (table, err) in &report.failed {
                eprintln!("Failed {table}: {err}");
            }
        }
        Command::Backup => {
            let path = backup_now(&config.backup)?;
            println!("Backup created at: {}", path.display());
        }
        Command::Integrity {
            child,
            parent,
            database,
        } => {
            let child: ColumnRef = child.unwrap_or(config.integrity.child).parse()?;
            let parent: ColumnRef = parent.unwrap_or(config.integrity.parent).parse()?;
            let database = database.unwrap_or_else(|| config.store.default_database.clone());
            let store = open_store(&config.store);
            let missing = commands::integrity(store.as_ref(), &database, &child, &parent)?;
            if !missing.is_empty() {
                for value in &missing {
                    println!("{value}");
                }
                bail!("{} {child} values have no matching {parent}", missing.len());
            }
            println!("Integrity check passed");
        }
    }
    Ok(())
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = |default: &str| {
        tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    };

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.log_file)
            .with_context(|| format!("cannot open {}", cli.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(filter("debug"))
            .init();
        tracing::info!("rowdesk debug log started, tail -f {}", cli.log_file.display());
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("info"))
            .init();
    }
    Ok(())
}
