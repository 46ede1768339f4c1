use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use water_quality_charts::batch::{self, BatchOptions};
use water_quality_charts::config::Config;
use water_quality_charts::providers::{DataProvider, ExcelProvider};

#[derive(Parser)]
#[command(name = "water-quality-charts")]
#[command(about = "Read water quality workbooks and render measurement charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the measurement points of a workbook
    Points {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one point's measurements as JSON
    Measurements { file: PathBuf, point_id: String },

    /// Render both charts for one point
    Render {
        file: PathBuf,
        point_id: String,

        /// Directory for the PNG files
        #[arg(long, env = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Render charts for every point of many workbooks
    Batch {
        /// Workbook files or directories containing workbooks
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory for the PNG files
        #[arg(long, env = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Maximum number of workbooks
        #[arg(long, env = "BATCH_MAX_FILES")]
        max_files: Option<usize>,

        /// Number of workbooks processed in parallel
        #[arg(long, env = "BATCH_CONCURRENCY")]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,water_quality_charts=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Points { file, json } => list_points(&file, json),
        Command::Measurements { file, point_id } => print_measurements(&file, &point_id),
        Command::Render {
            file,
            point_id,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            render_point(&file, &point_id, &output_dir, config.chart_size()).await
        }
        Command::Batch {
            paths,
            output_dir,
            max_files,
            concurrency,
        } => {
            let mut options = BatchOptions::from_config(&config);
            if let Some(dir) = output_dir {
                options.output_dir = dir;
            }
            if let Some(max) = max_files {
                options.max_files = max;
            }
            if let Some(n) = concurrency {
                options.concurrency = n;
            }
            run_batch(&paths, &options).await
        }
    }
}

fn list_points(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut provider = ExcelProvider::new(file);
    let points = provider.list_points()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    for point in &points {
        match point.coordinates() {
            Some(c) => println!(
                "{}  [{:.5}, {:.5}]",
                point.display_label(),
                c.latitude,
                c.longitude
            ),
            None => println!("{}", point.display_label()),
        }
    }
    println!("\n{} points", points.len());
    Ok(())
}

fn print_measurements(file: &Path, point_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut provider = ExcelProvider::new(file);
    let measurements = provider.list_measurements(point_id)?;
    println!("{}", serde_json::to_string_pretty(&measurements)?);
    Ok(())
}

async fn render_point(
    file: &Path,
    point_id: &str,
    output_dir: &Path,
    chart_size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let file = file.to_path_buf();
    let point_id = point_id.to_string();
    let output_dir = output_dir.to_path_buf();

    let written = tokio::task::spawn_blocking(
        move || -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
            let mut provider = ExcelProvider::new(&file);
            let point = provider
                .find_point(&point_id)?
                .ok_or_else(|| format!("Unknown point id: {point_id}"))?;
            let measurements = provider.list_measurements(&point.id)?;

            std::fs::create_dir_all(&output_dir)?;
            Ok(batch::export_point_charts(
                &point,
                &measurements,
                &output_dir,
                chart_size,
            )?)
        },
    )
    .await?
    .map_err(|e| e.to_string())?;

    for path in written {
        println!("✓ {}", path.display());
    }
    Ok(())
}

async fn run_batch(paths: &[PathBuf], options: &BatchOptions) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let files = batch::collect_inputs(paths, options.max_files)?;
    info!("Processing {} workbooks", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} workbooks ({msg})")?
            .progress_chars("##-"),
    );

    let mut succeeded = 0;
    let mut failed = 0;
    let report = batch::process_files(files, options, |file| {
        if file.is_success() {
            succeeded += 1;
        } else {
            failed += 1;
        }
        pb.set_message(format!("{succeeded} successful, {failed} failed"));
        pb.inc(1);
    })
    .await;
    pb.finish_with_message(format!("Complete: {succeeded} successful, {failed} failed"));

    println!("\n============================================================");
    println!("Chart Export Summary");
    println!("============================================================");
    println!("Workbooks:          {}", report.files.len());
    println!("Successful:         {}", report.succeeded());
    println!("Charts written:     {}", report.charts().count());
    println!("Output directory:   {}", options.output_dir.display());
    println!("Total Time:         {:.2}s", start.elapsed().as_secs_f64());
    println!("============================================================");

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed Workbooks:");
        for file in &failures {
            println!(
                "  {}: {}",
                file.input.display(),
                file.error.as_deref().unwrap_or_default()
            );
        }
        return Err(format!("{} workbooks failed to export", failures.len()).into());
    }

    Ok(())
}
