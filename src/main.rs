//! CLI entry point for `mailsift`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailsift::config::{self, Config};
use mailsift::export::ExportFormat;
use mailsift::ingest::{run_ingestion, IngestOptions, IngestRun};
use mailsift::stats;

/// Recover clean message records from malformed email-header CSV exports.
#[derive(Parser)]
#[command(name = "mailsift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing the *.csv exports (overrides config)
    #[arg(long, global = true, env = "MAILSIFT_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for the cached table and log file (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Re-parse every export even if the cache is fresh
    #[arg(short, long, global = true)]
    force: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the exports and report what was kept and dropped
    Ingest {
        #[arg(long)]
        json: bool,
    },
    /// Show statistics for the parsed table
    Stats {
        #[arg(long)]
        json: bool,
        /// Number of top senders and domains to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write the parsed table to a file
    Export {
        #[arg(short = 'F', long, value_enum, default_value = "csv")]
        format: ExportFormat,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config();
    if let Some(dir) = cli.data_dir.clone() {
        config.general.data_dir = dir;
    }
    if let Some(dir) = cli.cache_dir.clone() {
        config.general.cache_dir = Some(dir);
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    match cli.command {
        Commands::Ingest { json } => cmd_ingest(&config, cli.force, json),
        Commands::Stats { json, top } => cmd_stats(&config, cli.force, json, top),
        Commands::Export { format, output } => cmd_export(&config, cli.force, format, &output),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = config::log_file_path(config);
    let log_dir = log_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config::cache_dir(config));
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailsift.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Run the cache-aware pipeline with a progress bar over files.
fn ingest(config: &Config, force: bool) -> anyhow::Result<IngestRun> {
    let options = IngestOptions {
        data_dir: config.general.data_dir.clone(),
        cache_dir: config::cache_dir(config),
        force,
    };

    let pb = ProgressBar::new(0);
    pb.set_style(progress_style()?);

    let run = run_ingestion(
        &options,
        &config.dataset,
        Some(&|done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }),
    )
    .with_context(|| format!("ingesting {}", options.data_dir.display()))?;

    pb.finish_and_clear();
    Ok(run)
}

fn progress_style() -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} Ingesting [{bar:40.cyan/blue}] {pos}/{len} files")?
        .progress_chars("#>-"))
}

/// Parse the exports and print the per-file summary.
fn cmd_ingest(config: &Config, force: bool, json: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let run = ingest(config, force)?;
    let elapsed = start.elapsed();

    if json {
        print_summary_json(&run, elapsed)
    } else {
        print_summary_table(&run, elapsed);
        Ok(())
    }
}

fn print_summary_table(run: &IngestRun, elapsed: std::time::Duration) {
    let summary = &run.summary;
    println!();
    if summary.from_cache {
        println!("  Loaded {} record(s) from cache", run.table.len());
        println!();
        return;
    }
    if summary.files.is_empty() {
        println!("  No CSV files found");
        println!();
        return;
    }

    println!(
        "  {:<32} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "File", "Lines", "Records", "Dropped", "Time", "Sender", "Recips"
    );
    println!("  {}", "-".repeat(88));
    for file in &summary.files {
        let name = file
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.file.display().to_string());
        let name: String = name.chars().take(31).collect();
        println!(
            "  {:<32} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            name,
            file.logical_lines,
            file.records,
            file.dropped(),
            file.errors.malformed_timestamp,
            file.errors.unresolved_sender,
            file.errors.no_valid_recipients,
        );
    }
    println!("  {}", "-".repeat(88));

    let totals = summary.total_errors();
    println!("  {:<25} {}", "Records emitted", summary.total_records());
    println!("  {:<25} {}", "Rows dropped", summary.total_dropped());
    println!("  {:<25} {}", "Sizes defaulted to 0", totals.malformed_size);
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!();
}

fn print_summary_json(run: &IngestRun, elapsed: std::time::Duration) -> anyhow::Result<()> {
    let summary = &run.summary;
    let output = serde_json::json!({
        "from_cache": summary.from_cache,
        "records": run.table.len(),
        "dropped": summary.total_dropped(),
        "errors": summary.total_errors(),
        "files": summary.files,
        "elapsed_ms": elapsed.as_millis(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Show statistics for the parsed table.
fn cmd_stats(config: &Config, force: bool, json: bool, top: usize) -> anyhow::Result<()> {
    let run = ingest(config, force)?;
    let table = &run.table;
    let domains = &config.dataset.internal_domains;

    let headline = stats::summarize(table, domains);
    let senders = stats::top_senders(table, top);
    let recipient_domains = stats::top_recipient_domains(table, top);
    let range = stats::date_range(table);

    if json {
        let output = serde_json::json!({
            "stats": headline,
            "date_range": range.map(|(min, max)| serde_json::json!({
                "oldest": min.to_string(),
                "newest": max.to_string(),
            })),
            "top_senders": senders.iter().map(|(sender, count)| serde_json::json!({
                "sender": sender,
                "count": count,
            })).collect::<Vec<_>>(),
            "top_recipient_domains": recipient_domains.iter().map(|(domain, count)| serde_json::json!({
                "domain": domain,
                "count": count,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};

    let pct = |n: usize| {
        if headline.messages == 0 {
            0.0
        } else {
            n as f64 / headline.messages as f64 * 100.0
        }
    };

    println!();
    println!("  {:<25} {}", "Dataset", config.dataset.name);
    println!("  {:<25} {}", "Messages", headline.messages);
    println!("  {:<25} {}", "Total size", format_size(headline.total_bytes, BINARY));
    println!("  {:<25} {}", "Deliveries", headline.deliveries);
    if let Some((min, max)) = range {
        println!(
            "  {:<25} {} to {}",
            "Date range",
            min.format("%Y-%m-%d"),
            max.format("%Y-%m-%d")
        );
    }
    println!(
        "  {:<25} {} ({:.1}%)",
        "Internal senders",
        headline.internal_senders,
        pct(headline.internal_senders)
    );
    println!("  {:<25} {}", "External deliveries", headline.external_deliveries);
    println!(
        "  {:<25} {} ({:.1}%)",
        "After hours",
        headline.after_hours,
        pct(headline.after_hours)
    );
    println!(
        "  {:<25} {} ({:.1}%)",
        "Weekend",
        headline.weekend,
        pct(headline.weekend)
    );
    println!(
        "  {:<25} {}",
        "Group-alias senders", headline.distribution_list_senders
    );

    if !senders.is_empty() {
        println!();
        println!("  Top senders:");
        for (sender, count) in &senders {
            println!("    {count:>6}  {sender}");
        }
    }
    if !recipient_domains.is_empty() {
        println!();
        println!("  Top recipient domains:");
        for (domain, count) in &recipient_domains {
            println!("    {count:>6}  {domain}");
        }
    }
    println!();
    Ok(())
}

/// Write the parsed table to a file.
fn cmd_export(
    config: &Config,
    force: bool,
    format: ExportFormat,
    output: &Path,
) -> anyhow::Result<()> {
    let run = ingest(config, force)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => mailsift::export::csv::export_csv(&run.table, output)?,
        ExportFormat::Json => mailsift::export::json::export_json(&run.table, output)?,
    }

    println!(
        "  Exported {} record(s) as {:?} to {}",
        run.table.len(),
        format,
        output.display()
    );
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailsift", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
