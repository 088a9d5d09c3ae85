use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use errata::config::{self, ConfigBuilder};
use errata::serialization::{self, OUTPUT_KEY};
use errata::{Config, Error, ResourceId, StringTable};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, error, trace};

/// Inspect serialized error chains
#[derive(Parser)]
#[command(name = "errata")]
#[command(about = "Decode and render serialized error chains", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a chain (JSON array or output map) and show id, text and stack
    Inspect {
        /// Serialized payload; read from --file or stdin when omitted
        payload: Option<String>,

        /// Read the payload from a file
        #[arg(short, long, conflicts_with = "payload")]
        file: Option<PathBuf>,

        /// Show the original cause when no message resolves
        #[arg(long)]
        debug: bool,

        /// Prefix rendered text with the error id
        #[arg(long)]
        with_id: bool,

        /// Message text for a resource key, as ID=TEXT (repeatable)
        #[arg(short, long = "string", value_name = "ID=TEXT")]
        strings: Vec<String>,

        /// Print a JSON summary instead of plain text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Summary {
    kind: String,
    id: String,
    text: String,
    log: String,
    stack: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("errata started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match cli.command {
        Commands::Inspect {
            payload,
            file,
            debug,
            with_id,
            strings,
            json,
        } => run_inspect(payload, file, debug, with_id, strings, json),
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run_inspect(
    payload: Option<String>,
    file: Option<PathBuf>,
    debug: bool,
    with_id: bool,
    strings: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut builder = ConfigBuilder::from_env();
    if debug {
        builder = builder.debug(true);
    }
    if with_id {
        builder = builder.add_error_id(true);
    }
    config::configure(builder.build());
    let config = config::current();

    let table = parse_strings(&strings)?;
    let raw = read_payload(payload, file)?;
    let value: Value = serde_json::from_str(&raw).context("Payload is not valid JSON")?;
    let error = decode_payload(&value, config.as_ref())?;

    let summary = Summary {
        kind: error.kind().to_string(),
        id: error.id_with(config.as_ref()),
        text: error.text_with(&table, config.as_ref()),
        log: error.log_with(config.as_ref()),
        stack: error
            .stack_with(config.as_ref())
            .lines()
            .map(str::to_string)
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("kind:  {}", summary.kind);
        println!("id:    {}", summary.id);
        println!("text:  {}", summary.text);
        println!("log:   {}", summary.log);
        println!("stack:");
        for line in &summary.stack {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn read_payload(payload: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(payload) = payload {
        return Ok(payload);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read payload from stdin")?;
    Ok(buffer)
}

fn decode_payload(value: &Value, config: &dyn Config) -> anyhow::Result<Error> {
    let error = match value {
        Value::Array(_) => serialization::decode(value, config)?,
        Value::Object(map) if map.contains_key(OUTPUT_KEY) => {
            serialization::from_output_map(map, config)?
        }
        _ => bail!("Expected a JSON array or an object with an '{}' entry", OUTPUT_KEY),
    };
    Ok(error)
}

fn parse_strings(entries: &[String]) -> anyhow::Result<StringTable> {
    let mut table = StringTable::new();
    for entry in entries {
        let Some((id, text)) = entry.split_once('=') else {
            bail!("Invalid --string '{}', expected ID=TEXT", entry);
        };
        let id: i32 = id
            .trim()
            .parse()
            .with_context(|| format!("Invalid resource id in '{}'", entry))?;
        table.insert(ResourceId(id), text);
    }
    Ok(table)
}
