use std::{ops::Range, path::{Path, PathBuf}, process::Command};

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{error::{PlotError, Result}, type_lib::{NumericData, Point}};

/// tab10, the cycle used when a trace has no color of its own.
pub const DEFAULT_CYCLE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#d62728", "#2ca02c", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    UpperLeft,
    #[default]
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl LegendPosition {
    fn to_series_label_position(self) -> SeriesLabelPosition {
        match self {
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

#[derive(Clone)]
pub struct Trace {
    pub label: String,
    pub points: Vec<Point>,
    pub color: Option<RGBColor>,
    pub style: LineStyle,
}

impl Trace {
    pub fn solid(label: impl Into<String>, points: Vec<Point>) -> Self {
        Trace { label: label.into(), points, color: None, style: LineStyle::Solid }
    }

    pub fn dashed(label: impl Into<String>, points: Vec<Point>) -> Self {
        Trace { style: LineStyle::Dashed, ..Trace::solid(label, points) }
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend: LegendPosition,
    pub grid: bool,
    pub traces: Vec<Trace>,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Figure {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            legend: LegendPosition::default(),
            grid: true,
            traces: Vec::new(),
        }
    }

    pub fn legend(mut self, legend: LegendPosition) -> Self {
        self.legend = legend;
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Colors in drawing order, filling unset ones from the default cycle.
    pub fn resolved_colors(&self) -> Result<Vec<RGBColor>> {
        let mut cycle = DEFAULT_CYCLE.iter().cycle();
        self.traces.iter().map(|trace| match trace.color {
            Some(color) => Ok(color),
            None => parse_hex_color(cycle.next().unwrap_or(&DEFAULT_CYCLE[0])),
        }).collect()
    }

    /// Axis ranges over every finite point, padded by 5%.
    pub fn ranges(&self) -> Result<(Range<NumericData>, Range<NumericData>)> {
        let finite = self.traces.iter()
            .flat_map(|trace| trace.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        let mut bounds: Option<(NumericData, NumericData, NumericData, NumericData)> = None;
        for &(x, y) in finite {
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            });
        }
        let (x_min, x_max, y_min, y_max) = bounds.ok_or_else(|| PlotError::EmptyFigure(self.title.clone()))?;
        Ok((padded(x_min, x_max), padded(y_min, y_max)))
    }

    pub fn save(&self, path: &Path, size: (u32, u32)) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(PlotError::MissingOutputDir(dir.to_path_buf()));
            }
        }
        let colors = self.resolved_colors()?;
        let (x_spec, y_spec) = self.ranges()?;
        debug!(title = %self.title, ?x_spec, ?y_spec, "axis ranges");

        self.draw(path, size, &colors, x_spec, y_spec).map_err(|e| PlotError::Drawing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), traces = self.traces.len(), "saved figure");
        Ok(())
    }

    fn draw(&self, path: &Path, size: (u32, u32), colors: &[RGBColor], x_spec: Range<NumericData>, y_spec: Range<NumericData>) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_spec, y_spec)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(self.x_label.as_str()).y_desc(self.y_label.as_str());
        if !self.grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;

        for (trace, &color) in self.traces.iter().zip(colors.iter()) {
            let style = color.stroke_width(2);
            // non-finite samples (a diverged explicit run) would poison the path
            let points = trace.points.iter()
                .copied()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect::<Vec<_>>();

            let mut anno = match trace.style {
                LineStyle::Solid => chart.draw_series(LineSeries::new(points, style))?,
                LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(points, 8, 5, style))?,
            };
            anno.label(trace.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .position(self.legend.to_series_label_position())
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;

        Ok(())
    }
}

fn padded(min: NumericData, max: NumericData) -> Range<NumericData> {
    if max - min <= NumericData::EPSILON * min.abs().max(1.0) {
        return (min - 1.0)..(max + 1.0);
    }
    // scaled before subtracting so samples near f64::MAX keep a finite pad
    let pad = 0.05 * max - 0.05 * min;
    (min - pad).max(NumericData::MIN)..(max + pad).min(NumericData::MAX)
}

pub fn parse_hex_color(hex: &str) -> Result<RGBColor> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(PlotError::Color(hex.to_string()));
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| PlotError::Color(hex.to_string()));
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Opens a saved image in the desktop viewer. Failures only warn.
pub fn show(path: &Path) {
    let path: PathBuf = path.to_path_buf();
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };

    // the launchers hand off to the viewer and exit, so waiting reaps them promptly
    match command.arg(&path).status() {
        Ok(status) if status.success() => info!(path = %path.display(), "opened viewer"),
        Ok(status) => warn!(path = %path.display(), %status, "viewer launcher failed"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not open a viewer"),
    }
}
