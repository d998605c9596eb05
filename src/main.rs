//! rtconf CLI - run key-value scripts against an in-memory store
//!
//! Each script command prints one JSON object on stdout. Logs go to stderr
//! and are controlled by `RUST_LOG` or `--log-level`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rtconf::script::{parse_line, Command};
use rtconf::{Kv, MemStore, RtConf, StoreConfig, Watcher};
use serde_json::{json, Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

#[derive(Parser)]
#[command(name = "rtconf")]
#[command(about = "A hierarchical key-value store with change notification")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file (defaults to ~/.config/rtconf/config.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace to store keys under
    #[arg(short, long)]
    namespace: Option<String>,

    /// How long `watch` waits for an update, in milliseconds
    #[arg(short = 't', long)]
    watch_timeout_ms: Option<u64>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script of store commands, one per line
    Run {
        /// Script file (reads stdin when omitted)
        script: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config,
}

/// What a script command produced
enum Reply {
    Done(Value),
    Watching(Watcher),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Config => {
            output(cli.format, &serde_json::to_value(&config)?);
        }

        Commands::Run { script } => {
            let source = read_script(script.as_deref())?;
            let store = MemStore::with_config(&config)?;
            let failures = run_script(&store, &source, cli.format);
            if failures > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Run every command in `source`, returning the number that failed
fn run_script(store: &MemStore, source: &str, format: OutputFormat) -> usize {
    let mut failures = 0;
    let mut watches: Vec<JoinHandle<()>> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                failures += 1;
                output(
                    format,
                    &json!({ "line": line_no, "status": "error", "message": e.to_string() }),
                );
                continue;
            }
        };

        match execute(store, &command) {
            Ok(Reply::Done(fields)) => output(format, &reply(line_no, &command, fields)),
            Ok(Reply::Watching(watcher)) => {
                let key = command.key().to_string();
                watches.push(thread::spawn(move || {
                    let event = watcher.wait();
                    output(
                        format,
                        &json!({
                            "line": line_no,
                            "op": "watch",
                            "key": key,
                            "status": "ok",
                            "event": event
                        }),
                    );
                }));
            }
            Err(e) => {
                failures += 1;
                output(
                    format,
                    &json!({
                        "line": line_no,
                        "op": command.op(),
                        "key": command.key(),
                        "status": "error",
                        "message": e.to_string()
                    }),
                );
            }
        }
    }

    for handle in watches {
        if handle.join().is_err() {
            failures += 1;
        }
    }

    failures
}

fn execute(store: &MemStore, command: &Command) -> rtconf::Result<Reply> {
    let fields = match command {
        Command::Get { key } => {
            let value = store.get(key)?;
            json!({ "value": String::from_utf8_lossy(&value), "len": value.len() })
        }
        Command::Set { key, value } => {
            store.set(key, value)?;
            json!({})
        }
        Command::Update { key, value } => {
            store.update(key, value)?;
            json!({})
        }
        Command::Delete { key } => {
            store.delete(key)?;
            json!({})
        }
        Command::Enumerate { prefix } => {
            let keys = store.enumerate(prefix)?;
            json!({ "count": keys.len(), "keys": keys })
        }
        Command::Watch { key } => return Ok(Reply::Watching(store.subscribe(key)?)),
    };
    Ok(Reply::Done(fields))
}

fn reply(line_no: usize, command: &Command, fields: Value) -> Value {
    let mut object = Map::new();
    object.insert("line".into(), json!(line_no));
    object.insert("op".into(), json!(command.op()));
    object.insert("key".into(), json!(command.key()));
    object.insert("status".into(), json!("ok"));
    if let Value::Object(extra) = fields {
        object.extend(extra);
    }
    Value::Object(object)
}

fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = StoreConfig::load_or_default(cli.config.as_deref())?;
    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(timeout) = cli.watch_timeout_ms {
        config.watch_timeout_ms = timeout;
    }
    config.validate()?;
    Ok(config)
}

fn read_script(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read script from stdin")?;
            Ok(source)
        }
    }
}

/// Initialize logging to stderr, preferring RUST_LOG over `level`
fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

fn output(format: OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Text => println!("{:#}", value),
    }
}
