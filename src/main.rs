use stampede::client::{HttpExecutor, LoadOrchestrator, ProgressUpdate};
use stampede::config::{Config, OutputFormat};
use stampede::errors::Result;

use std::io::Write;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Stress test failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Main application logic; returns the process exit code
async fn run() -> Result<i32> {
    // Parse and validate configuration
    let config = Config::from_args()?;

    init_logging(&config);

    info!("Stampede - HTTP Load Generator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    config.print_summary();

    let executor = Arc::new(HttpExecutor::new()?);
    let mut orchestrator = LoadOrchestrator::new(config.run.clone(), executor)?;

    if !config.output.quiet {
        orchestrator.on_progress(progress_printer());
    }

    let orchestrator = Arc::new(orchestrator);
    setup_signal_handler(Arc::clone(&orchestrator));

    println!("Starting stress test...\n");
    let summary = orchestrator.run().await?;

    if !config.output.quiet {
        println!("\n");
    }

    match config.output.format {
        OutputFormat::Text => println!("{}", summary),
        OutputFormat::Json => println!("{}", summary.to_json()?),
    }

    if summary.exceeds_failure_rate(config.output.max_failure_rate) {
        warn!(
            "Failure rate {:.2}% exceeds the allowed {:.2}%",
            summary.failure_ratio() * 100.0,
            config.output.max_failure_rate
        );
        return Ok(1);
    }

    Ok(0)
}

/// Progress line redrawn whenever the whole-number percentage advances
fn progress_printer() -> impl Fn(ProgressUpdate) + Send + Sync + 'static {
    let last_percent = AtomicU64::new(0);
    move |update: ProgressUpdate| {
        let percent = update.percent();
        if last_percent.fetch_max(percent, Ordering::Relaxed) < percent {
            print!(
                "\rProgress: {}% ({}/{}) | RPS: {:.2}",
                percent, update.completed, update.total, update.throughput
            );
            let _ = std::io::stdout().flush();
        }
    }
}

/// Cancel the run on Ctrl+C
fn setup_signal_handler(orchestrator: Arc<LoadOrchestrator>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
            return;
        }
        println!("\n\nCancelling test...");
        orchestrator.cancel();
    });
}

/// Initialize logging based on configuration
fn init_logging(config: &Config) {
    let level = if config.output.verbose {
        "debug"
    } else {
        "info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [format!("stampede={}", level), "reqwest=warn".into(), "hyper=warn".into()] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    if config.output.verbose {
        info!("Verbose logging enabled");
    }
}
