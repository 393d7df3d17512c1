use crate::cluster::Series;
use crate::error::{RepoplotError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;

/// Drawing-target container declared by `:figure`: either one whole figure
/// or a rows-by-cols grid of subplots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSpec {
    pub width: u32,
    pub height: u32,
    pub grid: Option<(u32, u32)>,
}

/// Destination of one draw request. Cell coordinates are 0-based and
/// validated against the grid before the backend sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawTarget {
    Whole,
    Cell { row: u32, col: u32 },
}

/// One grouped-bar chart request: N labeled series over a shared category
/// axis, log-scaled values, tick labels, a legend, and a title.
#[derive(Debug, Clone)]
pub struct BarChart<'a> {
    pub title: Option<&'a str>,
    pub categories: &'a [String],
    pub series: Vec<&'a Series>,
    pub log_scale: bool,
}

/// Consumer interface for the actual rendering machinery. The interpreter
/// only ever talks to this trait; rasterization lives behind it.
pub trait RenderBackend {
    fn configure(&mut self, spec: &FigureSpec) -> Result<()>;
    fn draw_bars(&mut self, target: &DrawTarget, chart: &BarChart) -> Result<()>;
    fn save(&mut self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRecord {
    pub target: DrawTarget,
    pub title: Option<String>,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub log_scale: bool,
}

impl ChartRecord {
    fn from_request(target: &DrawTarget, chart: &BarChart) -> Self {
        Self {
            target: *target,
            title: chart.title.map(str::to_string),
            categories: chart.categories.to_vec(),
            series: chart.series.iter().map(|s| (*s).clone()).collect(),
            log_scale: chart.log_scale,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureOutput {
    pub version: u32,
    pub generated_at: chrono::DateTime<Utc>,
    pub figure: FigureSpec,
    pub charts: Vec<ChartRecord>,
}

/// Backend that persists the figure description as pretty-printed JSON
/// instead of rasterizing. Useful on its own for piping into external
/// plotters, and as the default sink for the CLI.
#[derive(Debug, Default)]
pub struct JsonBackend {
    figure: Option<FigureSpec>,
    charts: Vec<ChartRecord>,
}

impl JsonBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for JsonBackend {
    fn configure(&mut self, spec: &FigureSpec) -> Result<()> {
        self.figure = Some(*spec);
        self.charts.clear();
        Ok(())
    }

    fn draw_bars(&mut self, target: &DrawTarget, chart: &BarChart) -> Result<()> {
        if self.figure.is_none() {
            return Err(RepoplotError::Render("no figure configured".to_string()));
        }
        self.charts.push(ChartRecord::from_request(target, chart));
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let figure = self
            .figure
            .ok_or_else(|| RepoplotError::Render("no figure configured".to_string()))?;
        let output = FigureOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            figure,
            charts: self.charts.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&output)?)?;
        Ok(())
    }
}

/// Backend call captured by [`RecordingBackend`].
#[derive(Debug, Clone)]
pub enum RenderOp {
    Configure(FigureSpec),
    DrawBars(ChartRecord),
    Save(PathBuf),
}

/// Test double that records every backend call in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub ops: Vec<RenderOp>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for RecordingBackend {
    fn configure(&mut self, spec: &FigureSpec) -> Result<()> {
        self.ops.push(RenderOp::Configure(*spec));
        Ok(())
    }

    fn draw_bars(&mut self, target: &DrawTarget, chart: &BarChart) -> Result<()> {
        self.ops
            .push(RenderOp::DrawBars(ChartRecord::from_request(target, chart)));
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.ops.push(RenderOp::Save(path.to_path_buf()));
        Ok(())
    }
}
