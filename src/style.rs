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
//! Line and marker styling of the chart traces.
use clap::ValueEnum;
use plotly::common::{DashType, Line, Marker, MarkerSymbol, Mode};
use serde::{Deserialize, Serialize};

use crate::config::ChartProps;

/// Color palette cycled through by the iso lines.
const PALETTE: [&str; 10] = [
    "#2563eb", "#d97706", "#16a34a", "#dc2626", "#7c3aed", "#0891b2", "#c026d3", "#65a30d",
    "#e11d48", "#78716c",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
/// What to draw at the data points of a line.
pub enum DrawStyle {
    Lines,
    Markers,
    #[default]
    LinesMarkers,
}

impl DrawStyle {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Lines => Mode::Lines,
            Self::Markers => Mode::Markers,
            Self::LinesMarkers => Mode::LinesMarkers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
/// Dash pattern of the lines.
pub enum LineStyleKind {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyleKind {
    pub fn dash(&self) -> DashType {
        match self {
            Self::Solid => DashType::Solid,
            Self::Dashed => DashType::Dash,
            Self::Dotted => DashType::Dot,
            Self::DashDot => DashType::DashDot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
/// Symbol drawn at the data points.
pub enum MarkerKind {
    #[default]
    Circle,
    Square,
    Diamond,
    Cross,
    X,
    TriangleUp,
}

impl MarkerKind {
    pub fn symbol(&self) -> MarkerSymbol {
        match self {
            Self::Circle => MarkerSymbol::Circle,
            Self::Square => MarkerSymbol::Square,
            Self::Diamond => MarkerSymbol::Diamond,
            Self::Cross => MarkerSymbol::Cross,
            Self::X => MarkerSymbol::X,
            Self::TriangleUp => MarkerSymbol::TriangleUp,
        }
    }
}

/// The line color of the series at `index`, honoring the override from the
/// chart properties.
pub fn series_color(props: &ChartProps, index: usize) -> String {
    match &props.color {
        Some(color) if !color.is_empty() => color.clone(),
        _ => PALETTE[index % PALETTE.len()].to_string(),
    }
}

/// The fully styled line settings of the series at `index`.
pub fn series_line(props: &ChartProps, index: usize) -> Line {
    Line::new()
        .color(series_color(props, index))
        .width(props.line_width)
        .dash(props.line_style.dash())
}

/// The marker settings of the series at `index`.
pub fn series_marker(props: &ChartProps, index: usize) -> Marker {
    Marker::new()
        .color(series_color(props, index))
        .symbol(props.marker.symbol())
}

fn split_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Translucent `rgba(...)` version of a `#rrggbb` color. Colors in any other
/// notation are returned unchanged.
pub fn color_opacity(color: &str, opacity: f64) -> String {
    match split_rgb(color) {
        Some((r, g, b)) => format!("rgba({}, {}, {}, {})", r, g, b, opacity),
        None => color.to_string(),
    }
}
