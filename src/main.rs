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
//! Chart scalar result files from the command line.

use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;

use isoplot::{
    chart,
    config::{ChartProps, ErrorStyle},
    confidence::ConfidenceLevel,
    export,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Result files to read. Each argument may be a glob pattern.
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Chart properties file (JSON). The flags below override its values.
    #[arg(short, long)]
    props: Option<PathBuf>,
    /// Filter expression selecting the scalars to chart.
    #[arg(short, long)]
    filter: Option<String>,
    /// Metadata column spanning the x axis.
    #[arg(short, long)]
    xaxis_itervar: Option<String>,
    /// Metadata column selecting the lines.
    #[arg(short, long)]
    iso_itervar: Option<String>,
    /// Confidence level of the interval around each mean.
    #[arg(short, long, value_enum)]
    confidence_level: Option<ConfidenceLevel>,
    /// How to draw the confidence intervals.
    #[arg(short, long, value_enum)]
    error_style: Option<ErrorStyle>,
    /// Opacity of the error band.
    #[arg(long)]
    band_alpha: Option<f64>,
    /// Width of the error bar caps, in pixels.
    #[arg(long)]
    cap_size: Option<usize>,
    /// Chart title.
    #[arg(short, long)]
    title: Option<String>,
    /// Directory to write the chart into.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// File name stem of all written files.
    #[arg(short, long)]
    stem: Option<String>,
    /// Also write the chart as plotly JSON.
    #[arg(long)]
    export_json: bool,
    /// Also write the pivoted statistics as CSV.
    #[arg(long)]
    export_data: bool,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    let inputs = match expand_inputs(&args.inputs) {
        Ok(inputs) => inputs,
        Err(e) => {
            log::error!("{e:#}");
            process::exit(1);
        }
    };

    let props = match load_props(&args) {
        Ok(props) => props,
        Err(e) => {
            log::error!("{e:#}");
            process::exit(1);
        }
    };

    let chart = match chart::draw_xy_chart(&inputs, &props) {
        Ok(chart) => chart,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };

    let stem = props
        .export_stem
        .clone()
        .unwrap_or_else(|| export::default_stem(&chart.table.scalar_name));

    let written = export::export_chart(&chart, &props.export_dir, &stem, props.export_json)
        .with_context(|| format!("Cannot write the chart to {:?}", props.export_dir))?;
    for path in &written {
        log::info!("Written chart to: {}", path.display());
    }

    if props.export_data {
        let path = export::export_data(&chart.table, &props.export_dir, &stem)
            .with_context(|| format!("Cannot write the statistics to {:?}", props.export_dir))?;
        log::info!("Written statistics to: {}", path.display());
    }

    Ok(())
}

/// Expand each input argument as a glob pattern.
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern)
            .with_context(|| format!("Invalid input pattern {pattern:?}"))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Cannot list the files matching {pattern:?}"))?;
        if matches.is_empty() {
            anyhow::bail!("No result files match {pattern:?}");
        }
        paths.extend(matches);
    }
    Ok(paths)
}

/// Load the properties file (if any) and apply the command-line overrides.
fn load_props(args: &Args) -> anyhow::Result<ChartProps> {
    let mut props = match &args.props {
        Some(path) => ChartProps::from_json_file(path)
            .with_context(|| format!("Cannot load the chart properties from {path:?}"))?,
        None => ChartProps::default(),
    };
    if let Some(filter) = &args.filter {
        props.filter = filter.clone();
    }
    if let Some(xaxis) = &args.xaxis_itervar {
        props.xaxis_itervar = xaxis.clone();
    }
    if let Some(iso) = &args.iso_itervar {
        props.iso_itervar = iso.clone();
    }
    if let Some(level) = args.confidence_level {
        props.confidence_level = level;
    }
    if let Some(style) = args.error_style {
        props.error_style = style;
    }
    if let Some(alpha) = args.band_alpha {
        props.band_alpha = alpha;
    }
    if let Some(cap) = args.cap_size {
        props.cap_size = cap;
    }
    if let Some(title) = &args.title {
        props.title = Some(title.clone());
    }
    if let Some(dir) = &args.output_dir {
        props.export_dir = dir.clone();
    }
    if let Some(stem) = &args.stem {
        props.export_stem = Some(stem.clone());
    }
    props.export_json |= args.export_json;
    props.export_data |= args.export_data;
    Ok(props)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let args = Args::parse_from(["main", "results.csv"]);
        assert_eq!(args.inputs, vec!["results.csv".to_string()]);
        let props = load_props(&args).unwrap();
        assert_eq!(props, ChartProps::default());
    }

    #[test]
    fn cli_overrides_props() {
        let args = Args::parse_from([
            "main",
            "results.csv",
            "--filter",
            "name =~ channelUtilization*",
            "--xaxis-itervar",
            "iaMean",
            "--iso-itervar",
            "numHosts",
            "--confidence-level",
            "99%",
            "--error-style",
            "band",
            "--band-alpha",
            "0.4",
            "--output-dir",
            "out",
            "--export-data",
        ]);
        let props = load_props(&args).unwrap();
        assert_eq!(props.filter, "name =~ channelUtilization*");
        assert_eq!(props.xaxis_itervar, "iaMean");
        assert_eq!(props.iso_itervar, "numHosts");
        assert_eq!(props.confidence_level, ConfidenceLevel::P99);
        assert_eq!(props.error_style, ErrorStyle::Band);
        assert_eq!(props.band_alpha, 0.4);
        assert_eq!(props.cap_size, 4);
        assert_eq!(props.export_dir, PathBuf::from("out"));
        assert!(props.export_data);
        assert!(!props.export_json);
    }

    #[test]
    fn short_flags_parse() {
        let args =
            Args::parse_from(["main", "results.csv", "-x", "iaMean", "-i", "numHosts", "-c", "none"]);
        let props = load_props(&args).unwrap();
        assert_eq!(props.xaxis_itervar, "iaMean");
        assert_eq!(props.iso_itervar, "numHosts");
        assert_eq!(props.confidence_level, ConfidenceLevel::None);
    }
}
