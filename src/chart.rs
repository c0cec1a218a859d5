// ISOPLOT: Confidence-Interval Charts of Scalar Results Pivoted over Iteration Variables
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Building the chart: one line per iso value, with confidence intervals
//! drawn as error bars or as a translucent band.
use std::path::PathBuf;

use itertools::Itertools;
use plotly::{
    common::{ErrorData, ErrorType, Fill, Line, Mode},
    layout::Axis,
    Plot, Scatter,
};
use thiserror::Error;

use crate::{
    config::{ChartProps, ErrorStyle},
    filter::{FilterError, FilterExpr},
    pivot::{pick_two_columns, PivotError, PivotTable},
    results::{self, QueryError, QueryOpts, ScalarRow},
    style,
};

/// Errors raised while building a chart. All of them describe problems with
/// the input data or the chart properties.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("the result filter returned no data")]
    NoData,
    #[error("the x-axis and iso-line columns are not set and could not be inferred from the data; set both xaxis_itervar and iso_itervar")]
    NoAxisVariables,
    #[error("column {0:?} does not exist on every row of the filtered results")]
    MissingColumn(String),
    #[error("the filtered scalars must share a single name, found: {}", .0.iter().join(", "))]
    AmbiguousScalarName(Vec<String>),
    #[error("the x-axis column {column:?} is not numeric: cannot parse {value:?}")]
    NonNumericXAxis { column: String, value: String },
    #[error("Filter Error: {0}")]
    Filter(#[from] FilterError),
    #[error("Query Error: {0}")]
    Query(#[from] QueryError),
}

impl From<PivotError> for ChartError {
    fn from(e: PivotError) -> Self {
        match e {
            PivotError::Empty => Self::NoData,
            PivotError::MissingColumn(column) => Self::MissingColumn(column),
            PivotError::NonNumericX { column, value } => Self::NonNumericXAxis { column, value },
        }
    }
}

/// A fully built chart, together with the pivoted data behind it.
pub struct XyChart {
    pub plot: Plot,
    pub table: PivotTable,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Load the result files and build the chart described by `props`.
///
/// This runs the whole pipeline: parse the filter, query the scalar rows,
/// pivot them over the two columns and render one line per iso value.
pub fn draw_xy_chart(paths: &[PathBuf], props: &ChartProps) -> Result<XyChart, ChartError> {
    let filter = FilterExpr::parse(&props.filter)?;
    let rows = results::get_scalars(paths, &filter, QueryOpts::default())?;
    chart_from_rows(&rows, props)
}

/// Build the chart from rows that have already been queried.
pub fn chart_from_rows(rows: &[ScalarRow], props: &ChartProps) -> Result<XyChart, ChartError> {
    if rows.is_empty() {
        return Err(ChartError::NoData);
    }

    let (xaxis, iso) = match (props.xaxis_itervar.as_str(), props.iso_itervar.as_str()) {
        ("", "") => {
            let (xaxis, iso) = pick_two_columns(rows).ok_or(ChartError::NoAxisVariables)?;
            log::info!("Inferred x-axis column {xaxis:?} and iso column {iso:?}");
            (xaxis, iso)
        }
        ("", _) | (_, "") => return Err(ChartError::NoAxisVariables),
        (xaxis, iso) => (xaxis.to_string(), iso.to_string()),
    };

    for column in [&xaxis, &iso] {
        if let Some(row) = rows.iter().find(|r| r.column(column).is_none()) {
            log::debug!("run {} lacks column {column:?}", row.run);
            return Err(ChartError::MissingColumn(column.clone()));
        }
    }

    let names = rows.iter().map(|r| r.name.as_str()).unique().collect_vec();
    if names.len() > 1 {
        return Err(ChartError::AmbiguousScalarName(
            names.into_iter().map(str::to_string).collect(),
        ));
    }

    let table = PivotTable::build(rows, &xaxis, &iso)?;
    log::info!(
        "Pivoted {} rows into {} x values and {} iso lines",
        rows.len(),
        table.x_values().len(),
        table.iso_values().len()
    );

    let title = props
        .title
        .clone()
        .unwrap_or_else(|| format!("{} vs. {}", table.scalar_name, table.xaxis));
    let x_label = props.x_label.clone().unwrap_or_else(|| table.xaxis.clone());
    let y_label = props
        .y_label
        .clone()
        .unwrap_or_else(|| table.scalar_name.clone());

    let plot = render(&table, props, &title, &x_label, &y_label);
    Ok(XyChart {
        plot,
        table,
        title,
        x_label,
        y_label,
    })
}

fn render(
    table: &PivotTable,
    props: &ChartProps,
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Plot {
    let mut plot = Plot::new();

    for (iso_idx, iso_value) in table.iso_values().iter().enumerate() {
        let xs = table.x_values().to_vec();
        let ys = table.means(iso_idx);
        let series_name = format!("{}={}", table.iso, iso_value);

        let mut trace = Scatter::new(xs.clone(), ys.clone())
            .name(&series_name)
            .mode(props.draw_style.mode())
            .line(style::series_line(props, iso_idx))
            .marker(style::series_marker(props, iso_idx));

        let half_widths = table.half_widths(iso_idx, props.confidence_level);
        if let (Some(widths), ErrorStyle::Bars) = (&half_widths, props.error_style) {
            trace = trace.error_y(
                ErrorData::new(ErrorType::Data)
                    .array(widths.clone())
                    .width(props.cap_size),
            );
        }
        plot.add_trace(trace);

        if let (Some(widths), ErrorStyle::Band) = (half_widths, props.error_style) {
            add_band(&mut plot, props, iso_idx, &series_name, xs, ys, widths);
        }
    }

    let mut layout = plot
        .layout()
        .clone()
        .title(title.to_string())
        .x_axis(Axis::new().title(x_label.to_string()).show_grid(props.grid))
        .y_axis(Axis::new().title(y_label.to_string()).show_grid(props.grid))
        .show_legend(props.legend);
    if let Some(width) = props.width {
        layout = layout.width(width);
    }
    if let Some(height) = props.height {
        layout = layout.height(height);
    }
    plot.set_layout(layout);

    plot
}

/// Add the confidence band around one line as a pair of boundary traces,
/// filling the area between them. The boundaries stay out of the legend.
fn add_band(
    plot: &mut Plot,
    props: &ChartProps,
    iso_idx: usize,
    series_name: &str,
    xs: Vec<f64>,
    ys: Vec<f64>,
    widths: Vec<f64>,
) {
    let color = style::series_color(props, iso_idx);
    let fill = style::color_opacity(&color, props.band_alpha);

    let upper: Vec<f64> = ys.iter().zip(&widths).map(|(y, w)| y + w).collect();
    let lower: Vec<f64> = ys.iter().zip(&widths).map(|(y, w)| y - w).collect();

    let upper_trace = Scatter::new(xs.clone(), upper)
        .name(series_name)
        .mode(Mode::Lines)
        .line(Line::new().color(color.clone()).width(0.0))
        .show_legend(false);
    // filling to the previous trace draws the band between the boundaries
    let lower_trace = Scatter::new(xs, lower)
        .name(series_name)
        .mode(Mode::Lines)
        .line(Line::new().color(color).width(0.0))
        .fill(Fill::ToNextY)
        .fill_color(fill)
        .show_legend(false);
    plot.add_trace(upper_trace);
    plot.add_trace(lower_trace);
}
