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
//! Writing the chart and the pivoted statistics to disk.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::{chart::XyChart, pivot::PivotTable};

/// Errors raised while writing output files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

/// One exported row of the pivoted statistics.
#[derive(Debug, Serialize)]
struct StatsRecord<'a> {
    x: f64,
    iso: &'a str,
    mean: f64,
    std: f64,
    count: usize,
}

/// Derive a file name stem from the scalar name, replacing every character
/// that does not belong in a file name.
pub fn default_stem(scalar_name: &str) -> String {
    let stem: String = scalar_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "chart".to_string()
    } else {
        stem
    }
}

/// Write the chart below `dir` and return the paths written: the HTML file,
/// plus the plotly JSON of the figure when `with_json` is set.
pub fn export_chart(
    chart: &XyChart,
    dir: &Path,
    stem: &str,
    with_json: bool,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;

    let html_path = dir.join(format!("{stem}.html"));
    log::debug!("Plotting {html_path:?}");
    chart.plot.write_html(&html_path);
    let mut written = vec![html_path];

    if with_json {
        let json_path = dir.join(format!("{stem}.json"));
        fs::write(&json_path, chart.plot.to_json())?;
        written.push(json_path);
    }
    Ok(written)
}

/// Write the pivoted statistics as long-format CSV with the columns
/// `x,iso,mean,std,count`, skipping empty cells. Returns the path written.
pub fn export_data(table: &PivotTable, dir: &Path, stem: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let csv_path = dir.join(format!("{stem}.csv"));
    log::debug!("Writing statistics to {csv_path:?}");

    let mut csv = csv::WriterBuilder::new().has_headers(true).from_writer(
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&csv_path)?,
    );
    for (xi, &x) in table.x_values().iter().enumerate() {
        for (ci, iso) in table.iso_values().iter().enumerate() {
            if let Some(cell) = table.cell(xi, ci) {
                csv.serialize(StatsRecord {
                    x,
                    iso,
                    mean: cell.mean,
                    std: cell.std,
                    count: cell.count,
                })?;
            }
        }
    }
    csv.flush()?;
    Ok(csv_path)
}

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::BTreeMap;

    use crate::{chart::chart_from_rows, config::ChartProps, results::ScalarRow};

    fn row(x: &str, iso: &str, value: f64) -> ScalarRow {
        ScalarRow {
            run: format!("r-{x}-{iso}"),
            module: "net.server".to_string(),
            name: "channelUtilization:last".to_string(),
            value,
            itervars: BTreeMap::from([
                ("iaMean".to_string(), x.to_string()),
                ("numHosts".to_string(), iso.to_string()),
            ]),
            runattrs: BTreeMap::new(),
            attrs: BTreeMap::new(),
        }
    }

    fn rows() -> Vec<ScalarRow> {
        vec![
            row("0.1", "10", 0.25),
            row("0.1", "10", 0.75),
            row("0.1", "20", 1.0),
            row("0.2", "10", 0.5),
        ]
    }

    fn tmp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("isoplot-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn stem_sanitization() {
        assert_eq!(default_stem("channelUtilization:last"), "channelUtilization_last");
        assert_eq!(default_stem("end-to-end delay"), "end-to-end_delay");
        assert_eq!(default_stem("rcvdPk.count"), "rcvdPk.count");
        assert_eq!(default_stem(""), "chart");
    }

    #[test]
    fn data_export_roundtrip() {
        let chart = chart_from_rows(&rows(), &ChartProps::default()).unwrap();
        let dir = tmp_dir("data");
        let path = export_data(&chart.table, &dir, "stats").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(
            raw,
            "x,iso,mean,std,count\n\
             0.1,10,0.5,0.25,2\n\
             0.1,20,1.0,0.0,1\n\
             0.2,10,0.5,0.0,1\n"
        );
    }

    #[test]
    fn chart_export_writes_html_and_json() {
        let chart = chart_from_rows(&rows(), &ChartProps::default()).unwrap();
        let dir = tmp_dir("chart");
        let written = export_chart(&chart, &dir, "util", true).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0], dir.join("util.html"));
        assert_eq!(written[1], dir.join("util.json"));
        assert!(fs::metadata(&written[0]).unwrap().len() > 0);

        let figure: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(figure["data"].as_array().unwrap().len(), 2);
        fs::remove_dir_all(&dir).ok();
    }
}
