mod transport;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use classifier::Classifier;
use keeper::{Keeper, KeeperConfig, MetricsSource, ProcMetrics};
use pet::tuning::DEFAULT_NAME;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::transport::Request;

#[derive(Parser)]
#[command(name = "syspet", version)]
#[command(about = "A virtual pet that lives on your system and eats parity checks", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a file, or every file under a directory.
    Classify {
        path: PathBuf,
    },
    /// Feed one snippet to a fresh pet and print the outcome.
    Feed {
        /// Source file, or `-` for stdin.
        input: String,
        #[command(flatten)]
        keeper: KeeperArgs,
    },
    /// Print one CPU/memory sample.
    Stats,
    /// Keep a pet alive, reading line commands from stdin.
    Run {
        #[command(flatten)]
        keeper: KeeperArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct KeeperArgs {
    /// Tick period in milliseconds.
    #[arg(long, env = "SYSPET_TICK_MS", default_value_t = 1000)]
    tick_ms: u64,
    /// Metrics read deadline in milliseconds.
    #[arg(long, env = "SYSPET_METRICS_TIMEOUT_MS", default_value_t = 500)]
    metrics_timeout_ms: u64,
    /// Pet name.
    #[arg(long, env = "SYSPET_NAME", default_value = DEFAULT_NAME)]
    name: String,
}

impl From<&KeeperArgs> for KeeperConfig {
    fn from(args: &KeeperArgs) -> Self {
        KeeperConfig::default()
            .with_name(args.name.clone())
            .with_tick_period(Duration::from_millis(args.tick_ms))
            .with_metrics_timeout(Duration::from_millis(args.metrics_timeout_ms))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: .env: {}", e);
        }
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Classify { path } => cmd_classify(path, cli.pretty)?,
        Commands::Feed { input, keeper } => cmd_feed(input, keeper, cli.pretty).await?,
        Commands::Stats => cmd_stats(cli.pretty).await?,
        Commands::Run { keeper } => cmd_run(keeper, cli.pretty).await?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn render<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn build_keeper(args: &KeeperArgs) -> anyhow::Result<Keeper> {
    let classifier = Classifier::new().context("compiling the rule catalog")?;
    Ok(Keeper::new(
        KeeperConfig::from(args),
        Arc::new(classifier),
        Arc::new(ProcMetrics::default()),
    ))
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FileClassification<'a> {
    path: &'a Path,
    #[serde(flatten)]
    result: common::ClassificationResult,
}

fn cmd_classify(path: &Path, pretty: bool) -> anyhow::Result<()> {
    let classifier = Classifier::new().context("compiling the rule catalog")?;
    let files = collect_files(path)?;
    if files.is_empty() {
        anyhow::bail!("no files under {}", path.display());
    }

    for file in &files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let line = FileClassification {
            path: file,
            result: classifier.analyze(&text),
        };
        println!("{}", render(&line, pretty)?);
    }
    Ok(())
}

fn collect_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    use walkdir::WalkDir;
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// feed
// ---------------------------------------------------------------------------

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading snippet from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))
    }
}

async fn cmd_feed(input: &str, args: &KeeperArgs, pretty: bool) -> anyhow::Result<()> {
    let snippet = read_input(input)?;
    if snippet.trim().is_empty() {
        anyhow::bail!("nothing to feed: {} is empty", input);
    }
    let keeper = build_keeper(args)?;
    let outcome = keeper.feed(&snippet).await;
    println!("{}", render(&outcome, pretty)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Stats {
    cpu_percent: f64,
    ram_percent: f64,
    ram_used_mb: u64,
    ram_total_mb: u64,
}

const MIB: u64 = 1024 * 1024;

async fn cmd_stats(pretty: bool) -> anyhow::Result<()> {
    let source = ProcMetrics::default();
    // The first read only establishes the CPU baseline.
    source.sample().await.context("reading system metrics")?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let sample = source.sample().await.context("reading system metrics")?;

    let stats = Stats {
        cpu_percent: common::snapshot::round1(sample.cpu_percent),
        ram_percent: common::snapshot::round1(sample.memory_percent),
        ram_used_mb: sample.memory_used_bytes / MIB,
        ram_total_mb: sample.memory_total_bytes / MIB,
    };
    println!("{}", render(&stats, pretty)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(args: &KeeperArgs, pretty: bool) -> anyhow::Result<()> {
    let keeper = build_keeper(args)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = keeper.spawn_ticker(shutdown_rx);
    tracing::info!(name = %args.name, "pet is awake");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match line.parse::<Request>() {
            Ok(Request::Quit) => break,
            Ok(request) => transport::dispatch(&keeper, request).await?,
            Err(e) => transport::error_reply(&e),
        };
        println!("{}", render(&reply, pretty)?);
    }

    drop(shutdown_tx);
    ticker.await.context("tick loop panicked")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_files_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x % 2 == 0").unwrap();
        assert_eq!(collect_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_files_walks_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.c"), "").unwrap();
        fs::write(dir.path().join("a.py"), "").unwrap();
        fs::write(dir.path().join("sub").join("c.py"), "").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.py"),
                PathBuf::from("b.c"),
                PathBuf::from("sub").join("c.py"),
            ]
        );
    }

    #[test]
    fn test_collect_files_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snippet.c");
        fs::write(&file, "return !(n & 1);").unwrap();
        let text = read_input(file.to_str().unwrap()).unwrap();
        assert_eq!(text, "return !(n & 1);");
        assert!(read_input(dir.path().join("missing").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_keeper_args_into_config() {
        let args = KeeperArgs {
            tick_ms: 250,
            metrics_timeout_ms: 100,
            name: "rex".into(),
        };
        let config = KeeperConfig::from(&args);
        assert_eq!(config.tick_period, Duration::from_millis(250));
        assert_eq!(config.metrics_timeout, Duration::from_millis(100));
        assert_eq!(config.name, "rex");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["syspet", "-vv", "--pretty", "classify", "src"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.pretty);
        assert!(matches!(cli.command, Commands::Classify { .. }));

        let cli = Cli::try_parse_from(["syspet", "run", "--tick-ms", "50", "--name", "rex"]).unwrap();
        match cli.command {
            Commands::Run { keeper } => {
                assert_eq!(keeper.tick_ms, 50);
                assert_eq!(keeper.name, "rex");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_render_compact_and_pretty() {
        let value = serde_json::json!({ "a": 1 });
        assert_eq!(render(&value, false).unwrap(), r#"{"a":1}"#);
        assert!(render(&value, true).unwrap().contains('\n'));
    }
}
