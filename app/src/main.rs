use std::path::{Path, PathBuf};

use clap::Parser;
use common::{
    ReportError,
    config::Settings,
    plot::PlottersRenderer,
    report::build_report,
};
use eyre::Result;
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Plot speedup curves from a benchmark results table
#[derive(Parser)]
struct Cli {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Benchmark table, overrides the settings
    #[arg(short, long)]
    data_file: Option<PathBuf>,
    /// Directory for the rendered charts, overrides the settings
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Extra tracing filter directives
    #[arg(short, long)]
    log: Vec<String>,
    /// Mirror logs into this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let guard = init_tracing(&args)?;

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(data_file) = args.data_file {
        settings.data_file = data_file;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    debug!("Settings: {settings:?}");

    match build_report(&settings, &PlottersRenderer) {
        Ok(_) => {}
        Err(err @ ReportError::MissingInput { .. }) => {
            println!("Error: {err}");
            drop(guard);
            std::process::exit(1);
        }
        Err(err) => {
            error!("{err:#?}");
            return Err(err.into());
        }
    }

    println!("Plotting complete.");
    Ok(())
}

fn init_tracing(args: &Cli) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let mut env_filter = EnvFilter::new(format!("speedup_plot={log_level},common={log_level}"));
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("Invalid log file {}", path.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(layer().with_writer(non_blocking).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_writer(std::io::stderr)
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
