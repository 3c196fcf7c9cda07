//! Chart dataset derivation
//!
//! Projects the filtered set into two datasets for a chart renderer:
//!
//! - **bar**: location x case count
//! - **scatter**: case count x death count
//!
//! Every point is classified high or normal by its case count, and the
//! classification picks the color. Derivation is a pure function of the
//! filtered records; absent counts pass through as absent points.

use serde::Serialize;
use std::fmt;

use crate::records::Record;

/// Case count above which a record is drawn as high
pub const HIGH_CASES_THRESHOLD: u64 = 100;

/// Binary case-count classification used for coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseLevel {
    High,
    Normal,
}

impl CaseLevel {
    /// `High` when `cases > HIGH_CASES_THRESHOLD`; absent counts are normal
    pub fn classify(cases: Option<u64>) -> Self {
        match cases {
            Some(n) if n > HIGH_CASES_THRESHOLD => CaseLevel::High,
            _ => CaseLevel::Normal,
        }
    }

    /// Palette color at the given alpha
    pub fn color(&self, alpha: f32) -> Rgba {
        match self {
            CaseLevel::High => Rgba::new(255, 99, 132, alpha),
            CaseLevel::Normal => Rgba::new(54, 162, 235, alpha),
        }
    }
}

/// CSS-style color, serialized as `rgba(r, g, b, a)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bar chart: one bar per record, labelled by location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDataset {
    pub label: &'static str,
    pub labels: Vec<String>,
    pub data: Vec<Option<u64>>,
    pub levels: Vec<CaseLevel>,
    pub background_color: Vec<Rgba>,
    pub border_color: Vec<Rgba>,
    pub border_width: u32,
    pub border_radius: u32,
    pub hover_background_color: Rgba,
    pub hover_border_color: Rgba,
    pub bar_thickness: u32,
}

/// One scatter point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: Option<u64>,
    pub y: Option<u64>,
    pub label: String,
    pub level: CaseLevel,
}

/// Scatter plot: cases against deaths
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterDataset {
    pub label: &'static str,
    pub data: Vec<ScatterPoint>,
    pub background_color: Vec<Rgba>,
    pub border_color: Vec<Rgba>,
    pub border_width: u32,
    pub point_radius: u32,
    pub point_hover_radius: u32,
}

/// Both datasets derived from one filtered set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatasets {
    pub bar: BarDataset,
    pub scatter: ScatterDataset,
}

impl ChartDatasets {
    pub fn is_empty(&self) -> bool {
        self.bar.data.is_empty()
    }
}

/// Derive both chart datasets from the filtered records
pub fn derive_datasets<'a, I>(records: I) -> ChartDatasets
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let levels: Vec<CaseLevel> = records
        .iter()
        .map(|r| CaseLevel::classify(r.fields.cases))
        .collect();

    let bar = BarDataset {
        label: "Number of Cases",
        labels: records.iter().map(|r| r.fields.location.clone()).collect(),
        data: records.iter().map(|r| r.fields.cases).collect(),
        background_color: levels.iter().map(|l| l.color(0.6)).collect(),
        border_color: levels.iter().map(|l| l.color(1.0)).collect(),
        levels: levels.clone(),
        border_width: 2,
        border_radius: 8,
        hover_background_color: CaseLevel::High.color(0.8),
        hover_border_color: CaseLevel::High.color(1.0),
        bar_thickness: 30,
    };

    let scatter = ScatterDataset {
        label: "Cases vs Deaths",
        data: records
            .iter()
            .zip(&levels)
            .map(|(r, level)| ScatterPoint {
                x: r.fields.cases,
                y: r.fields.deaths,
                label: r.fields.location.clone(),
                level: *level,
            })
            .collect(),
        background_color: levels.iter().map(|l| l.color(0.8)).collect(),
        border_color: levels.iter().map(|l| l.color(1.0)).collect(),
        border_width: 2,
        point_radius: 8,
        point_hover_radius: 12,
    };

    ChartDatasets { bar, scatter }
}

// ============================================
// Static display options
// ============================================

/// Where the legend sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Right,
}

/// Axis title and tick settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOptions {
    pub title: &'static str,
    pub begin_at_zero: bool,
    pub step_size: Option<u32>,
    /// Tick label rotation in degrees
    pub tick_rotation: Option<u32>,
    pub auto_skip: bool,
}

impl AxisOptions {
    fn titled(title: &'static str) -> Self {
        Self {
            title,
            begin_at_zero: false,
            step_size: None,
            tick_rotation: None,
            auto_skip: false,
        }
    }
}

/// Display options handed to the renderer alongside a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub title: &'static str,
    pub legend: LegendPosition,
    /// Tooltip template; `{value}`, `{x}` and `{y}` are substituted
    pub tooltip: &'static str,
    pub x_axis: AxisOptions,
    pub y_axis: AxisOptions,
}

impl ChartOptions {
    pub fn bar() -> Self {
        Self {
            title: "Cases by Location",
            legend: LegendPosition::Right,
            tooltip: "Cases: {value}",
            x_axis: AxisOptions {
                tick_rotation: Some(45),
                auto_skip: true,
                ..AxisOptions::titled("Location")
            },
            y_axis: AxisOptions {
                begin_at_zero: true,
                step_size: Some(10),
                ..AxisOptions::titled("Number of Cases")
            },
        }
    }

    pub fn scatter() -> Self {
        Self {
            title: "Cases vs Deaths",
            legend: LegendPosition::Top,
            tooltip: "Cases: {x}, Deaths: {y}",
            x_axis: AxisOptions::titled("Number of Cases"),
            y_axis: AxisOptions::titled("Number of Deaths"),
        }
    }

    /// Render the bar tooltip for one value
    pub fn bar_tooltip(&self, value: Option<u64>) -> String {
        self.tooltip.replace("{value}", &format_count(value))
    }

    /// Render the scatter tooltip for one point
    pub fn scatter_tooltip(&self, point: &ScatterPoint) -> String {
        self.tooltip
            .replace("{x}", &format_count(point.x))
            .replace("{y}", &format_count(point.y))
    }
}

/// Display form of a possibly absent count
pub fn format_count(count: Option<u64>) -> String {
    count.map(|n| n.to_string()).unwrap_or_else(|| "NaN".to_string())
}
