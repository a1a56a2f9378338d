use callframe::config::Settings;
use callframe::{CallArgs, Engine, Frame};
use callframe_connector_filesystem::CsvTable;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to load
    input: PathBuf,

    /// Calls applied in order, e.g. filter_age_gt_30 sort_by_age_desc
    calls: Vec<String>,

    /// External table for joins and appends, as NAME=CSV
    #[arg(short, long = "with", value_parser = parse_named_table)]
    with: Vec<(String, PathBuf)>,

    /// Maximum number of rows to print
    #[arg(short, long)]
    limit: Option<usize>,

    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_named_table(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=CSV, got '{}'", arg)),
    }
}

fn open(path: &Path, settings: &Settings, engine: &Arc<Engine>) -> callframe::Result<Frame> {
    let table = CsvTable::new_with_header(path, settings.csv.has_header)
        .with_delimiter(settings.delimiter()?);
    Frame::load(&table, Arc::clone(engine))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::new()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = Arc::new(Engine::with_config(settings.engine_config())?);
    tracing::debug!(batch_size = engine.config().batch_size, "engine ready");
    let mut frame = open(&args.input, &settings, &engine)?;
    tracing::info!(path = %args.input.display(), shape = ?frame.shape(), "loaded table");

    let mut call_args = CallArgs::new();
    for (name, path) in &args.with {
        call_args = call_args.with_table(name, open(path, &settings, &engine)?);
    }

    for call in &args.calls {
        frame = frame.call_with(call, &call_args).inspect_err(|e| {
            if e.is_parse_error() {
                tracing::error!(call = %call, "not a valid call name");
            }
        })?;
        tracing::info!(call = %call, shape = ?frame.shape(), "applied call");
    }

    let limit = args.limit.unwrap_or(settings.display_rows);
    println!("{}", frame.head(limit));
    let (rows, cols) = frame.shape();
    if rows > limit {
        println!("... showing {} of {} rows", limit, rows);
    }
    println!("[{} rows x {} columns]", rows, cols);
    Ok(())
}
