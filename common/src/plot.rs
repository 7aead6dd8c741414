use core::fmt;
use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use itertools::{Itertools, MinMaxResult};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Settings,
    error::{ReportError, Result},
    group::{ChartGroup, GroupKey, Panel},
    record::Implementation,
};

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 24;
const CAPTION_SIZE: u32 = 18;
const LABEL_AREA: u32 = 50;
const MARGIN: u32 = 12;
const STROKE_WIDTH: u32 = 2;
const MARKER_SIZE: u32 = 4;

/// Which subplots of a chart carry a legend
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPlacement {
    /// Only the leftmost subplot, the others share its series
    #[default]
    FirstPanel,
    EveryPanel,
    Hidden,
}

impl LegendPlacement {
    pub fn shows(&self, panel_idx: usize) -> bool {
        match self {
            LegendPlacement::FirstPanel => panel_idx == 0,
            LegendPlacement::EveryPanel => true,
            LegendPlacement::Hidden => false,
        }
    }
}

/// A fully laid out chart: one row of subplots, one per kernel size.
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    pub key: GroupKey,
    pub title: String,
    pub panels: &'a [Panel],
    pub legend: LegendPlacement,
    /// Pixel size of the whole figure
    pub size: (u32, u32),
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> ChartSpec<'a> {
    pub fn new(group: &'a ChartGroup, settings: &'a Settings) -> Result<Self> {
        let width = u32::try_from(group.panels.len().max(1))
            .ok()
            .and_then(|columns| settings.panel_width.checked_mul(columns))
            .ok_or_else(|| {
                ReportError::Config(format!(
                    "{} panels of {} px do not fit in one image",
                    group.panels.len(),
                    settings.panel_width
                ))
            })?;
        Ok(Self {
            key: group.key,
            title: format!("Speedup vs Image Size ({})", group.key),
            panels: &group.panels,
            legend: settings.legend,
            size: (width, settings.height),
            x_label: &settings.x_label,
            y_label: &settings.y_label,
        })
    }

    pub fn panel_title(&self, panel: &Panel) -> String {
        format!("Kernel Size: {}", panel.kernel_size)
    }

    pub fn shows_legend(&self, panel_idx: usize) -> bool {
        self.legend.shows(panel_idx)
    }
}

/// Turns a chart into an image file at `path`.
pub trait Renderer {
    fn render(&self, chart: &ChartSpec<'_>, path: &Path) -> Result<()>;
}

/// Renders PNG files with the plotters bitmap backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersRenderer;

impl Renderer for PlottersRenderer {
    fn render(&self, chart: &ChartSpec<'_>, path: &Path) -> Result<()> {
        debug!("Rendering {} panels to {}", chart.panels.len(), path.display());
        let root = BitMapBackend::new(path, chart.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error(path))?;
        let root = root
            .titled(&chart.title, (FONT, TITLE_SIZE).into_font())
            .map_err(render_error(path))?;

        let areas = root.split_evenly((1, chart.panels.len()));
        for (idx, (area, panel)) in areas.iter().zip(chart.panels).enumerate() {
            let (x_range, y_range) = axis_bounds(panel);
            let mut ctx = ChartBuilder::on(area)
                .caption(chart.panel_title(panel), (FONT, CAPTION_SIZE).into_font())
                .margin(MARGIN)
                .x_label_area_size(LABEL_AREA)
                .y_label_area_size(LABEL_AREA + 10)
                .build_cartesian_2d(x_range, y_range)
                .map_err(render_error(path))?;

            ctx.configure_mesh()
                .x_desc(chart.x_label)
                .y_desc(chart.y_label)
                .x_labels(6)
                .x_label_formatter(&|x| format!("{x:.0}"))
                .y_label_formatter(&|y| format!("{y:.2}"))
                .draw()
                .map_err(render_error(path))?;

            for series in &panel.series {
                let color = series_color(series.implementation);
                let mut segments = series.segments();
                if segments.is_empty() {
                    // keep the legend entry for an implementation with no values
                    segments.push(Vec::new());
                }
                for (n, segment) in segments.into_iter().enumerate() {
                    let drawn = ctx
                        .draw_series(
                            LineSeries::new(segment, color.stroke_width(STROKE_WIDTH))
                                .point_size(MARKER_SIZE),
                        )
                        .map_err(render_error(path))?;
                    if n == 0 {
                        drawn
                            .label(series.implementation.name())
                            .legend(move |(x, y)| {
                                PathElement::new(
                                    vec![(x, y), (x + 20, y)],
                                    color.stroke_width(STROKE_WIDTH),
                                )
                            });
                    }
                }
            }

            if chart.shows_legend(idx) {
                ctx.configure_series_labels()
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()
                    .map_err(render_error(path))?;
            }
        }

        root.present().map_err(render_error(path))?;
        Ok(())
    }
}

fn render_error<E: fmt::Display>(path: &Path) -> impl Fn(E) -> ReportError + '_ {
    move |err| ReportError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Fixed colour per implementation, so the same line looks the same in every
/// chart.
pub fn series_color(implementation: Implementation) -> RGBColor {
    match implementation {
        Implementation::Multithreaded => RGBColor(0x1f, 0x77, 0xb4),
        Implementation::Distributed => RGBColor(0xff, 0x7f, 0x0e),
        Implementation::Shared => RGBColor(0x2c, 0xa0, 0x2c),
    }
}

/// X and Y ranges covering every present value of a panel, with a margin.
pub fn axis_bounds(panel: &Panel) -> (Range<f64>, Range<f64>) {
    let (xs, ys): (Vec<f64>, Vec<f64>) = panel.present_values().unzip();
    (padded_range(&xs), padded_range(&ys))
}

fn padded_range(values: &[f64]) -> Range<f64> {
    let (min, max) = match values.iter().copied().filter(|v| v.is_finite()).minmax() {
        MinMaxResult::NoElements => return 0.0..1.0,
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.05
    } else if min != 0.0 {
        min.abs() * 0.05
    } else {
        0.5
    };
    (min - pad)..(max + pad)
}

pub fn ensure_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}
