//! Chart rendering for dashboard tables.
//!
//! Charts are drawn with plotters into an in-memory RGB buffer and encoded
//! to PNG, so the HTTP layer can stream them without touching the filesystem.

use crate::table::Table;
use plotters::element::Pie;
use plotters::prelude::*;
use std::error::Error;
use std::io::Cursor;

/// Available chart types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    /// Line chart - trends over an ordered axis
    Line,
    /// Bar chart - comparisons across categories
    Bar,
    /// Pie chart - shares of a whole
    Pie,
    /// Area chart - like a line chart with the area below filled in
    Area,
}

/// Configuration options for chart generation.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,
    /// Label for the X-axis
    pub x_label: String,
    /// Label for the Y-axis
    pub y_label: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            width: 800,
            height: 600,
        }
    }
}

/// A categorical series: one label per value.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(labels.len(), values.len());
        Self { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn max_value(&self) -> f64 {
        self.values.iter().fold(0.0f64, |acc, v| acc.max(*v))
    }
}

/// Extracts a labeled series from two table columns. Null or non-numeric
/// values count as 0.
pub fn series_from_table(
    table: &Table,
    label_column: &str,
    value_column: &str,
) -> Result<Series, Box<dyn Error>> {
    let label_idx = table
        .column_index(label_column)
        .ok_or_else(|| format!("unknown column '{}'", label_column))?;
    let value_idx = table
        .column_index(value_column)
        .ok_or_else(|| format!("unknown column '{}'", value_column))?;

    let mut labels = Vec::with_capacity(table.len());
    let mut values = Vec::with_capacity(table.len());
    for row in &table.rows {
        labels.push(row[label_idx].to_display());
        values.push(row[value_idx].as_number().unwrap_or(0.0));
    }
    Ok(Series { labels, values })
}

/// Like [`series_from_table`] but sums the value column per distinct label,
/// preserving first-seen label order.
pub fn grouped_series_from_table(
    table: &Table,
    label_column: &str,
    value_column: &str,
) -> Result<Series, Box<dyn Error>> {
    let flat = series_from_table(table, label_column, value_column)?;
    let mut labels: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for (label, value) in flat.labels.into_iter().zip(flat.values) {
        match labels.iter().position(|l| *l == label) {
            Some(i) => values[i] += value,
            None => {
                labels.push(label);
                values.push(value);
            }
        }
    }
    Ok(Series { labels, values })
}

const SERIES_COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn color_for(index: usize) -> RGBColor {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Renders a series as PNG bytes.
pub fn render(series: &Series, kind: ChartKind, options: &ChartOptions) -> Result<Vec<u8>, Box<dyn Error>> {
    if series.is_empty() {
        return Err("cannot chart an empty series".into());
    }

    let width = options.width;
    let height = options.height;
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        match kind {
            ChartKind::Pie => draw_pie(&root, series, options)?,
            ChartKind::Line | ChartKind::Bar | ChartKind::Area => {
                draw_cartesian(&root, series, kind, options)?
            }
        }

        root.present()?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer)
        .ok_or("chart buffer has unexpected dimensions")?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}

fn draw_cartesian<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &Series,
    kind: ChartKind,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let n = series.values.len();
    let max_y = series.max_value();
    let y_range = 0.0..if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n as f64, y_range)?;

    let labels = series.labels.clone();
    chart
        .configure_mesh()
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .x_labels(n.min(12))
        .x_label_formatter(&move |x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    let points = || {
        series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64 + 0.5, *v))
    };

    match kind {
        ChartKind::Line => {
            chart.draw_series(LineSeries::new(points(), &color_for(0)))?;
            chart.draw_series(
                points().map(|(x, y)| Circle::new((x, y), 3, color_for(0).filled())),
            )?;
        }
        ChartKind::Bar => {
            chart.draw_series(series.values.iter().enumerate().map(|(i, v)| {
                Rectangle::new(
                    [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *v)],
                    color_for(i).filled(),
                )
            }))?;
        }
        ChartKind::Area => {
            chart.draw_series(
                AreaSeries::new(points(), 0.0, color_for(0).mix(0.3))
                    .border_style(color_for(0)),
            )?;
        }
        ChartKind::Pie => unreachable!(),
    }

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &Series,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (title_area, pie_area) = root.split_vertically(50);
    title_area.titled(&options.title, ("sans-serif", 30).into_font())?;

    let (w, h) = (options.width as i32, options.height as i32 - 50);
    let center = (w / 2, h / 2);
    let radius = (w.min(h) as f64) * 0.35;

    let colors: Vec<RGBColor> = (0..series.values.len()).map(color_for).collect();
    let pie = Pie::new(&center, &radius, &series.values, &colors, &series.labels);
    pie_area.draw(&pie)?;
    Ok(())
}

/// One entry of the chart catalog.
#[derive(Clone, Copy, Debug)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub label_column: &'static str,
    pub value_column: &'static str,
    /// When set, the value column is summed per distinct value of this
    /// column instead of plotted row by row.
    pub group_by: Option<&'static str>,
    pub title: &'static str,
}

/// Maps a `(data_key, view)` pair to a chart.
pub fn chart_spec(data_key: &str, view: &str) -> Option<ChartSpec> {
    use ChartKind::*;
    let spec = |kind, label_column, value_column, title| ChartSpec {
        kind,
        label_column,
        value_column,
        group_by: None,
        title,
    };
    Some(match (data_key, view) {
        ("monthly", "revenue") => spec(Line, "month", "revenue", "Monthly revenue"),
        ("monthly", "sales") => spec(Line, "month", "sales", "Monthly sales"),
        ("monthly", "leads") => spec(Area, "month", "leads", "Monthly leads"),
        ("monthly", "conversion") => spec(Line, "month", "conversion", "Conversion rate"),
        ("monthly", "avg_ticket") => spec(Bar, "month", "avg_ticket", "Average ticket"),
        ("states", "sales") => spec(Bar, "state", "sales", "Sales by state"),
        ("states", "regions") => ChartSpec {
            kind: Pie,
            label_column: "region",
            value_column: "sales",
            group_by: Some("region"),
            title: "Sales by region",
        },
        ("brands", "sales") => spec(Bar, "brand", "sales", "Sales by brand"),
        ("brands", "categories") => ChartSpec {
            kind: Pie,
            label_column: "category",
            value_column: "sales",
            group_by: Some("category"),
            title: "Sales by category",
        },
        ("stores", "sales") => spec(Bar, "store", "sales", "Sales by store"),
        ("visits", "visits") => spec(Area, "weekday", "visits", "Visits by weekday"),
        ("gender", "leads") => spec(Pie, "gender", "leads", "Leads by gender"),
        ("job_status", "leads") => spec(Bar, "status", "leads_percent", "Leads by occupation"),
        ("age_band", "leads") => spec(Bar, "band", "leads_percent", "Leads by age band"),
        ("income_band", "leads") => spec(Bar, "band", "leads_percent", "Leads by income band"),
        ("vehicle_condition", "visits") => spec(Pie, "condition", "visits", "New vs used visits"),
        ("vehicle_age", "visits") => spec(Bar, "band", "visits_percent", "Visits by vehicle age"),
        ("vehicles_visited", "brands") => ChartSpec {
            kind: Bar,
            label_column: "brand",
            value_column: "visits",
            group_by: Some("brand"),
            title: "Visits by brand",
        },
        _ => return None,
    })
}

/// Renders one catalog chart for a table.
pub fn chart_for_table(table: &Table, spec: &ChartSpec) -> Result<Vec<u8>, Box<dyn Error>> {
    let series = match spec.group_by {
        Some(group) => grouped_series_from_table(table, group, spec.value_column)?,
        None => series_from_table(table, spec.label_column, spec.value_column)?,
    };
    let options = ChartOptions {
        title: spec.title.to_string(),
        ..ChartOptions::default()
    };
    render(&series, spec.kind, &options)
}
