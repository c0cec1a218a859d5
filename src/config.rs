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
//! Chart properties controlling the query, the statistics and the looks.
use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    confidence::ConfidenceLevel,
    style::{DrawStyle, LineStyleKind, MarkerKind},
};

/// Errors raised while loading a chart properties file.
#[derive(Debug, Error)]
pub enum PropsError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
/// How to display the confidence interval around each mean.
pub enum ErrorStyle {
    /// Symmetric error bars with caps at every point.
    #[default]
    Bars,
    /// A translucent band around the line.
    Band,
    /// Do not draw the interval even when a confidence level is set.
    None,
}

/// All properties of a chart, as read from a JSON properties file.
///
/// Every field has a default, so an empty object is a valid properties file,
/// but unknown keys are rejected to catch typos early.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChartProps {
    /// Filter expression selecting the scalar rows to chart.
    #[serde(default)]
    pub filter: String,
    /// Metadata column spanning the x axis. Leave empty to infer it.
    #[serde(default)]
    pub xaxis_itervar: String,
    /// Metadata column selecting the iso lines. Leave empty to infer it.
    #[serde(default)]
    pub iso_itervar: String,
    /// Confidence level of the interval drawn around each mean.
    #[serde(default)]
    pub confidence_level: ConfidenceLevel,
    /// How to display the confidence intervals.
    #[serde(default)]
    pub error_style: ErrorStyle,
    /// Opacity of the error band.
    #[serde(default = "ChartProps::default_band_alpha")]
    pub band_alpha: f64,
    /// Width of the error bar caps, in pixels.
    #[serde(default = "ChartProps::default_cap_size")]
    pub cap_size: usize,
    /// What to draw at the data points.
    #[serde(default)]
    pub draw_style: DrawStyle,
    /// Dash pattern of the lines.
    #[serde(default)]
    pub line_style: LineStyleKind,
    /// Width of the lines.
    #[serde(default = "ChartProps::default_line_width")]
    pub line_width: f64,
    /// Symbol drawn at the data points.
    #[serde(default)]
    pub marker: MarkerKind,
    /// A single `#rrggbb` color for all lines instead of the palette.
    #[serde(default)]
    pub color: Option<String>,
    /// Chart title. Defaults to `<scalar> vs. <x column>`.
    #[serde(default)]
    pub title: Option<String>,
    /// Label of the x axis. Defaults to the x column name.
    #[serde(default)]
    pub x_label: Option<String>,
    /// Label of the y axis. Defaults to the scalar name.
    #[serde(default)]
    pub y_label: Option<String>,
    /// Show the legend.
    #[serde(default = "ChartProps::default_true")]
    pub legend: bool,
    /// Show the grid lines.
    #[serde(default = "ChartProps::default_true")]
    pub grid: bool,
    /// Fixed chart width, in pixels.
    #[serde(default)]
    pub width: Option<usize>,
    /// Fixed chart height, in pixels.
    #[serde(default)]
    pub height: Option<usize>,
    /// Also write the chart as plotly JSON next to the HTML file.
    #[serde(default)]
    pub export_json: bool,
    /// Also write the pivoted statistics as CSV next to the HTML file.
    #[serde(default)]
    pub export_data: bool,
    /// Directory receiving all output files.
    #[serde(default = "ChartProps::default_export_dir")]
    pub export_dir: PathBuf,
    /// File name stem of the outputs. Defaults to a sanitized scalar name.
    #[serde(default)]
    pub export_stem: Option<String>,
}

impl ChartProps {
    fn default_band_alpha() -> f64 {
        0.25
    }

    fn default_cap_size() -> usize {
        4
    }

    fn default_line_width() -> f64 {
        2.0
    }

    fn default_true() -> bool {
        true
    }

    fn default_export_dir() -> PathBuf {
        PathBuf::from("./charts")
    }

    /// Load chart properties from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PropsError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for ChartProps {
    fn default() -> Self {
        Self {
            filter: String::new(),
            xaxis_itervar: String::new(),
            iso_itervar: String::new(),
            confidence_level: ConfidenceLevel::default(),
            error_style: ErrorStyle::default(),
            band_alpha: Self::default_band_alpha(),
            cap_size: Self::default_cap_size(),
            draw_style: DrawStyle::default(),
            line_style: LineStyleKind::default(),
            line_width: Self::default_line_width(),
            marker: MarkerKind::default(),
            color: None,
            title: None,
            x_label: None,
            y_label: None,
            legend: true,
            grid: true,
            width: None,
            height: None,
            export_json: false,
            export_data: false,
            export_dir: Self::default_export_dir(),
            export_stem: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let props: ChartProps = serde_json::from_str("{}").unwrap();
        assert_eq!(props, ChartProps::default());
        assert_eq!(props.confidence_level, ConfidenceLevel::P95);
        assert_eq!(props.error_style, ErrorStyle::Bars);
        assert_eq!(props.band_alpha, 0.25);
        assert_eq!(props.cap_size, 4);
        assert_eq!(props.export_dir, PathBuf::from("./charts"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<ChartProps>("{\"filtr\": \"x\"}").is_err());
    }

    #[test]
    fn parse_props() {
        let raw = r#"{
            "filter": "channelUtilization:*",
            "xaxis_itervar": "iaMean",
            "iso_itervar": "numHosts",
            "confidence_level": "99%",
            "error_style": "band",
            "band_alpha": 0.4,
            "line_style": "dashed",
            "marker": "square",
            "legend": false,
            "height": 800,
            "export_data": true,
            "export_dir": "out"
        }"#;
        let props: ChartProps = serde_json::from_str(raw).unwrap();
        assert_eq!(props.filter, "channelUtilization:*");
        assert_eq!(props.xaxis_itervar, "iaMean");
        assert_eq!(props.iso_itervar, "numHosts");
        assert_eq!(props.confidence_level, ConfidenceLevel::P99);
        assert_eq!(props.error_style, ErrorStyle::Band);
        assert_eq!(props.band_alpha, 0.4);
        assert_eq!(props.line_style, LineStyleKind::Dashed);
        assert_eq!(props.marker, MarkerKind::Square);
        assert!(!props.legend);
        assert_eq!(props.height, Some(800));
        assert!(props.export_data);
        assert_eq!(props.export_dir, PathBuf::from("out"));
    }

    #[test]
    fn load_props_file() {
        let path = std::env::temp_dir().join(format!("isoplot-props-{}.json", std::process::id()));
        fs::write(&path, r#"{"filter": "rcvdPk:*", "confidence_level": "none"}"#).unwrap();
        let props = ChartProps::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(props.filter, "rcvdPk:*");
        assert_eq!(props.confidence_level, ConfidenceLevel::None);
        assert_eq!(props.error_style, ErrorStyle::Bars);
    }
}
