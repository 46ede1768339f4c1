/// Batch chart export for many workbooks
///
/// Every workbook is read and rendered on a blocking thread; workbooks run in
/// parallel up to the configured concurrency and fail independently.
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::charts::{render_concentration_chart, render_time_series, ChartError};
use crate::config::Config;
use crate::domain::{Measurement, MeasurementPoint};
use crate::providers::{DataProvider, ExcelProvider, ProviderError};

/// Prefix of office lock files left next to open workbooks
const LOCK_FILE_PREFIX: &str = "~$";
const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Too many input files: {found} (maximum {max})")]
    TooManyFiles { found: usize, max: usize },

    #[error("No workbook files to process")]
    NoInputFiles,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub chart_size: (u32, u32),
    pub max_files: usize,
    pub concurrency: usize,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            chart_size: config.chart_size(),
            max_files: config.batch_max_files,
            concurrency: config.batch_concurrency,
        }
    }
}

/// Result of one workbook
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub charts: Vec<PathBuf>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One entry per input workbook, ordered by path
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn charts(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .flat_map(|f| f.charts.iter().map(PathBuf::as_path))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }
}

/// File-system friendly version of a point name
///
/// Anything but alphanumerics, spaces, `-` and `_` becomes `_`.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOCK_FILE_PREFIX))
}

fn has_workbook_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|w| e.eq_ignore_ascii_case(w))
        })
}

/// Expand inputs into the workbook files to process
///
/// Directories contribute their `.xlsx`/`.xls` files (not recursive, sorted by
/// name); explicit files are taken as given. Lock files are always skipped.
pub fn collect_inputs(paths: &[PathBuf], max_files: usize) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_workbook_extension(p))
                .collect();
            entries.sort();
            debug!("Found {} workbooks in {}", entries.len(), path.display());
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    files.retain(|p| !is_lock_file(p));

    if files.is_empty() {
        return Err(BatchError::NoInputFiles);
    }
    if files.len() > max_files {
        return Err(BatchError::TooManyFiles {
            found: files.len(),
            max: max_files,
        });
    }
    Ok(files)
}

/// Directory for one workbook's charts, named after its file stem
pub fn workbook_output_dir(output_dir: &Path, workbook: &Path) -> PathBuf {
    let stem = workbook
        .file_stem()
        .map(|s| safe_name(&s.to_string_lossy()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "workbook".to_string());
    output_dir.join(stem)
}

/// Output directories for a batch, one per workbook in input order.
///
/// Workbooks sharing a file stem (`2023/pomiary.xlsx`, `2024/pomiary.xlsx`)
/// get `_2`, `_3`, ... suffixes so their charts never overwrite each other.
pub fn workbook_output_dirs(output_dir: &Path, workbooks: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    workbooks
        .iter()
        .map(|workbook| {
            let base = workbook_output_dir(output_dir, workbook);
            let mut target = base.clone();
            let mut n = 2;
            while !taken.insert(target.clone()) {
                let mut name = base.as_os_str().to_os_string();
                name.push(format!("_{n}"));
                target = PathBuf::from(name);
                n += 1;
            }
            target
        })
        .collect()
}

/// Write the physicochemical and chemical charts of one point as PNG files
pub fn export_point_charts(
    point: &MeasurementPoint,
    measurements: &[Measurement],
    output_dir: &Path,
    chart_size: (u32, u32),
) -> Result<Vec<PathBuf>, BatchError> {
    let file_name = safe_name(&point.name);

    let physicochemical = render_time_series(
        measurements,
        Some(&format!("Physicochemical parameters - {}", point.name)),
    )?;
    let first = output_dir.join(format!("{file_name}_physicochemical.png"));
    physicochemical.save_png(&first, chart_size)?;

    let chemical = render_concentration_chart(
        measurements,
        Some(&format!("Chemical compounds - {}", point.name)),
    )?;
    let second = output_dir.join(format!("{file_name}_chemical.png"));
    chemical.save_png(&second, chart_size)?;

    Ok(vec![first, second])
}

/// Render both charts for every point with data; returns the written files
///
/// Blocking: reads the workbook and writes PNG files.
pub fn export_workbook(
    workbook: &Path,
    output_dir: &Path,
    chart_size: (u32, u32),
) -> Result<Vec<PathBuf>, BatchError> {
    let mut provider = ExcelProvider::new(workbook);
    let points = provider.list_points()?;
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for point in points {
        let measurements = provider.list_measurements(&point.id)?;
        if measurements.is_empty() {
            debug!("Point {} has no measurements, skipping", point.id);
            continue;
        }

        written.extend(export_point_charts(
            &point,
            &measurements,
            output_dir,
            chart_size,
        )?);
    }

    info!(
        "Exported {} charts from {}",
        written.len(),
        workbook.display()
    );
    Ok(written)
}

/// Export already-collected workbooks in parallel
///
/// `on_file` runs once per finished workbook, in completion order.
pub async fn process_files<F>(files: Vec<PathBuf>, options: &BatchOptions, mut on_file: F) -> BatchReport
where
    F: FnMut(&FileReport),
{
    let chart_size = options.chart_size;
    let targets = workbook_output_dirs(&options.output_dir, &files);

    let mut outcomes = stream::iter(files.into_iter().zip(targets))
        .map(|(input, target)| {
            async move {
                let path = input.clone();
                let result = tokio::task::spawn_blocking(move || {
                    export_workbook(&path, &target, chart_size)
                })
                .await
                .map_err(|e| BatchError::Join(e.to_string()))
                .and_then(|r| r);
                (input, result)
            }
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut report = BatchReport::default();
    while let Some((input, result)) = outcomes.next().await {
        let file = match result {
            Ok(charts) => FileReport {
                input,
                charts,
                error: None,
            },
            Err(e) => {
                warn!("Failed to export {}: {}", input.display(), e);
                FileReport {
                    input,
                    charts: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        on_file(&file);
        report.files.push(file);
    }

    report.files.sort_by(|a, b| a.input.cmp(&b.input));
    report
}

/// Collect inputs and export them
pub async fn run_batch(paths: &[PathBuf], options: &BatchOptions) -> Result<BatchReport, BatchError> {
    let files = collect_inputs(paths, options.max_files)?;
    info!("Processing {} workbooks", files.len());
    Ok(process_files(files, options, |_| {}).await)
}
