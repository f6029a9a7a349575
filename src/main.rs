use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use loupe::cli::{self, CliError, EntriesOptions, ItemsFollower};
use loupe::core::config::{self, ResolvedConfig};
use loupe::core::reference::ItemReference;
use loupe::service::{HttpLogService, LogService};

#[derive(Parser)]
#[command(name = "loupe", version, about = "Browse and tail remote log streams")]
struct Args {
    /// Base URL of the log service
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Debug logging on stderr for one-shot commands
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List log groups
    Collections {
        #[arg(long)]
        json: bool,
    },
    /// List the streams of a group (group ids from stdin when omitted)
    Items {
        collection: Option<String>,
        #[arg(long)]
        json: bool,
        /// Keep listing and print streams as they appear
        #[arg(short, long)]
        follow: bool,
    },
    /// Print the events of streams (references from stdin when omitted)
    Entries {
        reference: Option<String>,
        #[arg(long, requires = "item", conflicts_with = "reference")]
        collection: Option<String>,
        #[arg(long, requires = "collection", conflicts_with = "reference")]
        item: Option<String>,
        /// Start at the newest events and keep polling
        #[arg(short, long)]
        follow: bool,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_color: bool,
    },
    /// Write events to a stream, creating it if needed
    Put {
        reference: String,
        /// Event text; each stdin line becomes an event when omitted
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.command.is_none(), args.verbose);

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            exit_with(&CliError::Config(e));
        }
    };
    let resolved = config::resolve(&config, args.endpoint.as_deref());
    info!("Loupe starting against {}", resolved.endpoint);

    let service: Arc<dyn LogService> = match HttpLogService::new(
        &resolved.endpoint,
        resolved.token.clone(),
        resolved.request_timeout,
    ) {
        Ok(service) => Arc::new(service),
        Err(e) => exit_with(&CliError::Service(e)),
    };

    let result = match args.command {
        None => loupe::tui::run(resolved, service).map_err(CliError::from),
        Some(command) => run_command(command, &resolved, service).await,
    };
    if let Err(e) = result {
        exit_with(&e);
    }
}

fn init_logging(interactive: bool, verbose: bool) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if interactive {
        // The terminal belongs to ratatui; log to loupe.log in the current directory
        if let Ok(log_file) = File::create("loupe.log") {
            let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
        }
        return;
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn exit_with(error: &CliError) -> ! {
    eprintln!("loupe: {error}");
    std::process::exit(error.exit_code());
}

fn stdin_lines() -> Box<dyn BufRead + Send> {
    Box::new(BufReader::new(io::stdin()))
}

fn single_line(line: String) -> Box<dyn BufRead + Send> {
    Box::new(io::Cursor::new(line.into_bytes()))
}

/// Run a blocking command on the blocking pool.
async fn blocking<F>(f: F) -> Result<(), CliError>
where
    F: FnOnce() -> Result<(), CliError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CliError::Io(io::Error::other(e)))?
}

async fn run_command(
    command: Command,
    config: &ResolvedConfig,
    service: Arc<dyn LogService>,
) -> Result<(), CliError> {
    match command {
        Command::Collections { json } => {
            blocking(move || {
                cli::collections(service.as_ref(), json, &mut io::stdout().lock())?;
                Ok(())
            })
            .await
        }
        Command::Items {
            collection,
            json,
            follow,
        } => {
            let input = collection.map(single_line).unwrap_or_else(stdin_lines);
            let poll = config.follow_poll_state();
            blocking(move || {
                let mut out = io::stdout().lock();
                if follow {
                    let ids = cli::read_collection_ids(input)?;
                    ItemsFollower::new(ids, poll, json).run(service.as_ref(), &mut out)
                } else {
                    cli::items(service.as_ref(), input, json, &mut out)?;
                    Ok(())
                }
            })
            .await
        }
        Command::Entries {
            reference,
            collection,
            item,
            follow,
            json,
            no_color,
        } => {
            let input = match (reference, collection, item) {
                (Some(reference), None, None) => single_line(reference),
                (None, Some(collection), Some(item)) => {
                    single_line(ItemReference::new(collection, item).to_string())
                }
                (None, None, None) => stdin_lines(),
                _ => {
                    return Err(CliError::Usage(
                        "give a reference or both --collection and --item".to_string(),
                    ));
                }
            };
            let options = EntriesOptions {
                follow,
                json,
                no_color,
                poll: config.follow_poll_state(),
            };
            let mut out = cli::entries(service, input, options, io::stdout()).await?;
            out.flush()?;
            Ok(())
        }
        Command::Put { reference, message } => {
            let input = message.map(single_line).unwrap_or_else(stdin_lines);
            blocking(move || {
                cli::put(service.as_ref(), &reference, input)?;
                Ok(())
            })
            .await
        }
    }
}
