use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use platform_report::model::{MetricsSnapshot, ReportFilters, ReportWindow};
use platform_report::orchestrator::{
    FileSaver, MetricsProvider, NotificationLevel, NotificationSink, ReportOrchestrator,
};
use platform_report::{FetchError, ReportConfig};
use tracing_subscriber::EnvFilter;

/// Generates an analytics report from a metrics snapshot stored as JSON.
///
/// Fonts must be present under `assets/fonts` next to the binary or in the `platform_report`
/// crate, or be provided via the `PLATFORM_REPORT_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about = "Render analytics reports to PDF")]
struct Cli {
    #[command(flatten)]
    options: ReportOptions,

    #[command(subcommand)]
    window: WindowCommand,
}

#[derive(Args)]
struct ReportOptions {
    /// JSON file holding the aggregated metrics snapshot.
    #[arg(long, short = 's')]
    snapshot: PathBuf,

    /// Optional TOML file overriding the report configuration.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory the generated PDF is written to.
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Title printed below the brand.
    #[arg(long, default_value = "Analytics Report")]
    title: String,

    /// Only include feedback with this star rating.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: Option<u8>,

    /// Only include feedback in this category.
    #[arg(long)]
    category: Option<String>,

    /// Embed a PDF outline with one entry per report section.
    #[cfg(feature = "bookmarks")]
    #[arg(long)]
    bookmarks: bool,
}

#[derive(Subcommand)]
enum WindowCommand {
    /// Everything up to today.
    Current,
    /// A calendar month.
    Monthly {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// A calendar quarter.
    Quarterly {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        quarter: u32,
    },
    /// An inclusive range of days, e.g. `--start 2024-01-01 --end 2024-01-31`.
    Custom {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

impl From<WindowCommand> for ReportWindow {
    fn from(command: WindowCommand) -> Self {
        match command {
            WindowCommand::Current => ReportWindow::Current,
            WindowCommand::Monthly { year, month } => ReportWindow::Monthly { year, month },
            WindowCommand::Quarterly { year, quarter } => ReportWindow::Quarterly { year, quarter },
            WindowCommand::Custom { start, end } => ReportWindow::Custom { start, end },
        }
    }
}

/// Serves the snapshot stored in a JSON file, whatever window is requested.
struct JsonFileProvider {
    path: PathBuf,
}

#[async_trait]
impl MetricsProvider for JsonFileProvider {
    async fn fetch_snapshot(
        &self,
        window: &ReportWindow,
        _filters: &ReportFilters,
    ) -> Result<MetricsSnapshot, FetchError> {
        tracing::debug!(
            path = %self.path.display(),
            kind = window.kind_label(),
            "reading snapshot"
        );
        let content = fs::read_to_string(&self.path).map_err(|err| {
            FetchError::Network(format!("failed to read {}: {}", self.path.display(), err))
        })?;
        MetricsSnapshot::from_json(&content).map_err(|err| FetchError::Server {
            status: 422,
            message: err.to_string(),
        })
    }
}

struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        match level {
            NotificationLevel::Info => tracing::info!("{message}"),
            NotificationLevel::Success => tracing::info!(outcome = "success", "{message}"),
            NotificationLevel::Error => tracing::error!("{message}"),
        }
    }
}

struct DirectorySaver {
    directory: PathBuf,
}

impl FileSaver for DirectorySaver {
    fn save(&self, bytes: &[u8], filename: &str) -> io::Result<()> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(filename);
        fs::write(&path, bytes)?;
        println!("Generated {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(feature = "bookmarks")]
struct BookmarkedPdfRenderer {
    config: ReportConfig,
}

#[cfg(feature = "bookmarks")]
impl platform_report::orchestrator::ReportRenderer for BookmarkedPdfRenderer {
    fn render(
        &self,
        request: &platform_report::ReportRequest,
        now: chrono::NaiveDateTime,
    ) -> platform_report::Result<platform_report::GeneratedReport> {
        platform_report::build_report_with_bookmarks(request, &self.config, now)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let options = cli.options;
    let config = match &options.config {
        Some(path) => ReportConfig::load_from_path(path)?,
        None => ReportConfig::default(),
    };

    #[cfg(feature = "bookmarks")]
    let bookmark_config = options.bookmarks.then(|| config.clone());

    let orchestrator = ReportOrchestrator::new(
        JsonFileProvider {
            path: options.snapshot.clone(),
        },
        TracingNotifier,
        DirectorySaver {
            directory: options.output_dir.clone(),
        },
        config,
    );

    #[cfg(feature = "bookmarks")]
    let orchestrator = match bookmark_config {
        Some(config) => orchestrator.with_renderer(BookmarkedPdfRenderer { config }),
        None => orchestrator,
    };

    let filters = ReportFilters {
        rating: options.rating,
        category: options.category,
    };
    orchestrator
        .generate(options.title, cli.window.into(), filters)
        .await?;
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
