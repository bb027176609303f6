//! Census viewer CLI.
//!
//! Runs the choropleth view engine headless against a census data server.

use std::path::PathBuf;

use anyhow::Context;
use census_common::{BoundaryLevel, BoundingBox, FeatureBatch, MapType};
use clap::{Parser, Subcommand, ValueEnum};
use classifier::binning::breaks_for_batch;
use classifier::BinningMethod;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use view_engine::{HttpCensusSource, RefreshOutcome, Session, ViewEvent, ViewerConfig};

use census_viewer::{ReportFormat, ResultsReport, Scenario, ScenarioRunner, TracingSink};

#[derive(Parser, Debug)]
#[command(name = "census-viewer")]
#[command(about = "Headless census choropleth viewer", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "CENSUS_JSON_LOGS", global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario of view events against the data server
    Run {
        /// Viewer configuration YAML
        #[arg(short, long, env = "CENSUS_CONFIG")]
        config: Option<PathBuf>,

        /// Scenario YAML
        #[arg(short, long)]
        scenario: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        output: ReportFormat,
    },

    /// Fetch and classify one view at a fixed boundary level
    Snapshot {
        #[arg(short, long, env = "CENSUS_CONFIG")]
        config: Option<PathBuf>,

        /// Boundary level id (e.g. sa2)
        #[arg(short, long)]
        level: String,

        /// Population below which areas are shown as low population
        #[arg(long, default_value = "0")]
        threshold: f64,

        /// Statistic id; defaults to the first configured statistic
        #[arg(short, long)]
        stat: Option<String>,

        /// Bounds as "west,south,east,north"; defaults to the initial view
        #[arg(short, long)]
        bbox: Option<String>,

        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        output: ReportFormat,
    },

    /// Compute class breaks from a saved GeoJSON response
    Breaks {
        /// GeoJSON FeatureCollection from the data endpoint
        #[arg(short, long)]
        file: PathBuf,

        /// Statistic id the values are stored under
        #[arg(short, long)]
        stat: String,

        #[arg(short, long, value_enum, default_value_t = MapTypeArg::Values)]
        map_type: MapTypeArg,

        /// Binning method: equal-count, equal-interval, kmeans or max-fraction
        #[arg(long, default_value = "equal-count")]
        method: BinningMethod,

        /// Population below which features are left out of the sample
        #[arg(long, default_value = "0")]
        threshold: f64,

        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        output: ReportFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MapTypeArg {
    Values,
    Density,
    Percent,
}

impl From<MapTypeArg> for MapType {
    fn from(arg: MapTypeArg) -> Self {
        match arg {
            MapTypeArg::Values => MapType::Values,
            MapTypeArg::Density => MapType::Density,
            MapTypeArg::Percent => MapType::Percent,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        fmt().with_env_filter(filter).with_target(true).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    // The session is single-threaded: requests overlap on one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, run(cli.command))
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            config,
            scenario,
            output,
        } => {
            let config = ViewerConfig::load(config.as_deref())?;
            let scenario = Scenario::from_file(&scenario)?;
            info!(
                base_url = %config.base_url,
                scenario = %scenario.name,
                "Starting census viewer"
            );

            let source = HttpCensusSource::from_config(&config)?;
            let runner = ScenarioRunner::bootstrap(source, &config).await?;
            let report = runner.run(&scenario).await;

            match output {
                ReportFormat::Json => println!("{}", ResultsReport::format_json(&report)?),
                ReportFormat::Table => println!("{}", ResultsReport::format_table(&report)),
            }
            Ok(())
        }

        Commands::Snapshot {
            config,
            level,
            threshold,
            stat,
            bbox,
            output,
        } => {
            let mut config = ViewerConfig::load(config.as_deref())?;
            config.boundary_override = Some(BoundaryLevel::new(level, threshold));
            if let Some(stat) = stat {
                config.stats.retain(|s| !s.eq_ignore_ascii_case(&stat));
                config.stats.insert(0, stat);
            }
            config.validate()?;

            let source = HttpCensusSource::from_config(&config)?;
            let session = Session::bootstrap_with_sink(source, &config, TracingSink).await?;
            let outcome = match bbox {
                Some(bbox) => {
                    let bounds = BoundingBox::from_edge_string(&bbox)?;
                    session
                        .handle(ViewEvent::Moved {
                            zoom: config.initial_view.zoom,
                            bounds,
                        })
                        .await?
                }
                None => session.refresh().await?,
            };

            let RefreshOutcome::Applied(layer) = outcome else {
                anyhow::bail!("snapshot response was superseded");
            };
            match output {
                ReportFormat::Json => {
                    let infos: Vec<_> = layer
                        .batch
                        .iter()
                        .filter_map(|feature| layer.info(&feature.id))
                        .collect();
                    let body = serde_json::json!({
                        "level": layer.request.level,
                        "stat": layer.request.stat.id,
                        "bounds": layer.request.bounds,
                        "legend": layer.legend(),
                        "features": infos,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                ReportFormat::Table => println!("{}", ResultsReport::format_layer(&layer)),
            }
            Ok(())
        }

        Commands::Breaks {
            file,
            stat,
            map_type,
            method,
            threshold,
            output,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)?;
            let batch = FeatureBatch::from_geojson(value, &stat)?
                .with_context(|| format!("{} holds no features", file.display()))?;

            let map_type = MapType::from(map_type);
            let level = BoundaryLevel::new("file", threshold);
            let breaks = breaks_for_batch(&batch, map_type, &level, method)?;
            info!(
                features = batch.len(),
                method = method.as_str(),
                "Computed breaks"
            );

            match output {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&breaks)?),
                ReportFormat::Table => println!("{}", ResultsReport::format_breaks(&breaks, map_type)),
            }
            Ok(())
        }
    }
}
