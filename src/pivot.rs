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
//! Pivoting scalar rows into a table of per-group statistics.
//!
//! The pivot groups rows by two metadata columns: the x-axis column, whose
//! values must be numeric, and the iso column, whose values stay strings. Each
//! cell aggregates all scalar values falling into that group.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
};

use itertools::Itertools;
use ordered_float::NotNan;
use thiserror::Error;

use crate::{confidence::ConfidenceLevel, results::ScalarRow};

/// Errors raised while pivoting rows.
#[derive(Debug, Error)]
pub enum PivotError {
    #[error("no rows to pivot")]
    Empty,
    #[error("column {0:?} does not exist on every row of the filtered results")]
    MissingColumn(String),
    #[error("the x-axis column {column:?} is not numeric: cannot parse {value:?}")]
    NonNumericX { column: String, value: String },
}

/// Aggregated statistics of one pivot cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub mean: f64,
    /// Population standard deviation of the cell values.
    pub std: f64,
    pub count: usize,
}

impl CellStats {
    fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Self {
            mean,
            std: var.sqrt(),
            count,
        }
    }
}

/// Scalar values pivoted over two metadata columns.
///
/// The x values are sorted ascending. The iso values are sorted numerically
/// when all of them parse as numbers, and in natural string order otherwise,
/// so that `"2"` precedes `"10"` either way. Cells with no matching rows are
/// [`None`] and turn into gaps when charted.
#[derive(Debug, Clone)]
pub struct PivotTable {
    /// Name shared by all pivoted scalars.
    pub scalar_name: String,
    /// Name of the column spanning the x axis.
    pub xaxis: String,
    /// Name of the column selecting the iso lines.
    pub iso: String,
    xs: Vec<f64>,
    iso_values: Vec<String>,
    cells: Vec<Option<CellStats>>,
}

impl PivotTable {
    /// Pivot the rows by `xaxis` and `iso`. Both columns must exist on every
    /// row, and every `xaxis` value must parse as a (non-NaN) number.
    pub fn build(rows: &[ScalarRow], xaxis: &str, iso: &str) -> Result<Self, PivotError> {
        if rows.is_empty() {
            return Err(PivotError::Empty);
        }
        let scalar_name = rows[0].name.clone();

        let mut groups: BTreeMap<NotNan<f64>, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
        for row in rows {
            let x_raw = row
                .column(xaxis)
                .ok_or_else(|| PivotError::MissingColumn(xaxis.to_string()))?;
            let x = x_raw
                .parse::<f64>()
                .ok()
                .and_then(|x| NotNan::new(x).ok())
                .ok_or_else(|| PivotError::NonNumericX {
                    column: xaxis.to_string(),
                    value: x_raw.to_string(),
                })?;
            let iso_value = row
                .column(iso)
                .ok_or_else(|| PivotError::MissingColumn(iso.to_string()))?;
            groups
                .entry(x)
                .or_default()
                .entry(iso_value.to_string())
                .or_default()
                .push(row.value);
        }

        let xs: Vec<f64> = groups.keys().map(|x| x.into_inner()).collect();
        let iso_values = sort_iso_values(
            groups
                .values()
                .flat_map(|per_iso| per_iso.keys())
                .unique()
                .map(|v| v.as_str()),
        );

        let n_iso = iso_values.len();
        let mut cells = vec![None; xs.len() * n_iso];
        for (xi, per_iso) in groups.values().enumerate() {
            for (ci, iso_value) in iso_values.iter().enumerate() {
                cells[xi * n_iso + ci] = per_iso
                    .get(iso_value)
                    .map(|values| CellStats::from_values(values));
            }
        }

        Ok(Self {
            scalar_name,
            xaxis: xaxis.to_string(),
            iso: iso.to_string(),
            xs,
            iso_values,
            cells,
        })
    }

    /// The x values, sorted ascending.
    pub fn x_values(&self) -> &[f64] {
        &self.xs
    }

    /// The iso values, one per line of the chart.
    pub fn iso_values(&self) -> &[String] {
        &self.iso_values
    }

    /// The statistics of a single cell, or [`None`] if no row fell into it.
    /// Indices must be in range.
    pub fn cell(&self, x_idx: usize, iso_idx: usize) -> Option<&CellStats> {
        self.cells[x_idx * self.iso_values.len() + iso_idx].as_ref()
    }

    /// The mean per x value of one iso line, with NaN marking empty cells.
    pub fn means(&self, iso_idx: usize) -> Vec<f64> {
        (0..self.xs.len())
            .map(|xi| self.cell(xi, iso_idx).map(|c| c.mean).unwrap_or(f64::NAN))
            .collect()
    }

    /// The confidence half-width per x value of one iso line, or [`None`] if
    /// the level disables confidence intervals. Empty cells yield NaN.
    pub fn half_widths(&self, iso_idx: usize, level: ConfidenceLevel) -> Option<Vec<f64>> {
        level.z()?;
        Some(
            (0..self.xs.len())
                .map(|xi| {
                    self.cell(xi, iso_idx)
                        .and_then(|c| level.half_width(c.std, c.count))
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        )
    }
}

/// Sort iso values numerically if they all parse as numbers, and in natural
/// string order otherwise.
fn sort_iso_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let values = values.collect_vec();
    match values
        .iter()
        .map(|v| v.parse::<f64>().map(|x| (x, *v)))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(mut numeric) => {
            numeric.sort_by(|a, b| a.0.total_cmp(&b.0));
            numeric.into_iter().map(|(_, v)| v.to_string()).collect()
        }
        Err(_) => {
            let mut values: Vec<String> = values.into_iter().map(str::to_string).collect();
            values.sort_by(|a, b| human_sort::compare(a, b));
            values
        }
    }
}

/// Infer the two pivot columns from the iteration variables of the rows.
///
/// Candidates are itervar columns that exist on every row and take at least
/// two distinct values. The candidate with the most distinct values spans the
/// x axis and the runner-up selects the iso lines; ties break on column name.
pub fn pick_two_columns(rows: &[ScalarRow]) -> Option<(String, String)> {
    let mut seen: BTreeMap<&str, (BTreeSet<&str>, usize)> = BTreeMap::new();
    for row in rows {
        for (key, value) in &row.itervars {
            let entry = seen.entry(key).or_default();
            entry.0.insert(value);
            entry.1 += 1;
        }
    }
    let ordered = seen
        .into_iter()
        .filter(|(_, (values, occurrences))| values.len() > 1 && *occurrences == rows.len())
        .sorted_by_key(|(_, (values, _))| Reverse(values.len()))
        .map(|(key, _)| key)
        .collect_vec();
    match ordered[..] {
        [x, iso, ..] => Some((x.to_string(), iso.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

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

    #[test]
    fn pivot_shape_and_stats() {
        let rows = vec![
            row("0.2", "10", 0.1),
            row("0.2", "10", 0.3),
            row("0.2", "20", 0.4),
            row("0.1", "10", 0.2),
            row("0.1", "20", 0.5),
            row("0.3", "20", 0.6),
        ];
        let table = PivotTable::build(&rows, "iaMean", "numHosts").unwrap();

        assert_eq!(table.scalar_name, "channelUtilization:last");
        assert_eq!(table.x_values(), &[0.1, 0.2, 0.3]);
        assert_eq!(table.iso_values(), &["10".to_string(), "20".to_string()]);

        let cell = table.cell(1, 0).unwrap();
        assert_eq!(cell.count, 2);
        assert_eq!(cell.mean, 0.2);
        assert!((cell.std - 0.1).abs() < 1e-12);

        // x = 0.3 was never sampled with numHosts = 10
        assert!(table.cell(2, 0).is_none());
        let means = table.means(0);
        assert_eq!(means[0], 0.2);
        assert_eq!(means[1], 0.2);
        assert!(means[2].is_nan());
    }

    #[test]
    fn population_std() {
        let rows = vec![
            row("1", "a", 2.0),
            row("1", "a", 4.0),
            row("1", "a", 4.0),
            row("1", "a", 4.0),
            row("1", "a", 5.0),
            row("1", "a", 5.0),
            row("1", "a", 7.0),
            row("1", "a", 9.0),
        ];
        let table = PivotTable::build(&rows, "iaMean", "numHosts").unwrap();
        let cell = table.cell(0, 0).unwrap();
        assert_eq!(cell.mean, 5.0);
        assert_eq!(cell.std, 2.0);
        assert_eq!(cell.count, 8);
    }

    #[test]
    fn iso_values_sort_numerically() {
        let rows = vec![
            row("1", "10", 0.1),
            row("1", "2", 0.2),
            row("1", "0.10", 0.3),
            row("1", "0.2", 0.4),
        ];
        let table = PivotTable::build(&rows, "iaMean", "numHosts").unwrap();
        assert_eq!(
            table.iso_values(),
            &[
                "0.10".to_string(),
                "0.2".to_string(),
                "2".to_string(),
                "10".to_string(),
            ]
        );
    }

    #[test]
    fn iso_values_fall_back_to_natural_order() {
        let rows = vec![
            row("1", "host-10", 0.1),
            row("1", "host-2", 0.2),
            row("1", "fast", 0.3),
        ];
        let table = PivotTable::build(&rows, "iaMean", "numHosts").unwrap();
        assert_eq!(
            table.iso_values(),
            &[
                "fast".to_string(),
                "host-2".to_string(),
                "host-10".to_string(),
            ]
        );
    }

    #[test]
    fn non_numeric_x_is_an_error() {
        let rows = vec![row("0.1", "10", 0.1), row("high", "10", 0.2)];
        let err = PivotTable::build(&rows, "iaMean", "numHosts").unwrap_err();
        assert!(matches!(
            err,
            PivotError::NonNumericX { column, value } if column == "iaMean" && value == "high"
        ));
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut incomplete = row("0.1", "10", 0.1);
        incomplete.itervars.remove("numHosts");
        let rows = vec![row("0.2", "10", 0.2), incomplete];
        let err = PivotTable::build(&rows, "iaMean", "numHosts").unwrap_err();
        assert!(matches!(err, PivotError::MissingColumn(c) if c == "numHosts"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            PivotTable::build(&[], "iaMean", "numHosts"),
            Err(PivotError::Empty)
        ));
    }

    #[test]
    fn half_width_plumbing() {
        let rows = vec![
            row("1", "a", 3.0),
            row("1", "a", 7.0),
            row("2", "a", 5.0),
        ];
        let table = PivotTable::build(&rows, "iaMean", "numHosts").unwrap();

        assert!(table.half_widths(0, ConfidenceLevel::None).is_none());

        // cell (x=1, a): std = 2, count = 2
        let widths = table.half_widths(0, ConfidenceLevel::P95).unwrap();
        assert!((widths[0] - 1.960 * 2.0 / 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((widths[1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn infers_columns_by_distinct_values() {
        let rows = vec![
            row("0.1", "10", 0.1),
            row("0.2", "10", 0.2),
            row("0.3", "20", 0.3),
        ];
        // iaMean has three distinct values, numHosts two
        assert_eq!(
            pick_two_columns(&rows),
            Some(("iaMean".to_string(), "numHosts".to_string()))
        );

        let rows = vec![
            row("0.1", "10", 0.1),
            row("0.1", "20", 0.2),
            row("0.2", "30", 0.3),
        ];
        // now numHosts has more distinct values and becomes the x axis
        assert_eq!(
            pick_two_columns(&rows),
            Some(("numHosts".to_string(), "iaMean".to_string()))
        );
    }

    #[test]
    fn inference_ties_break_on_name() {
        let rows = vec![row("0.1", "10", 0.1), row("0.2", "20", 0.2)];
        assert_eq!(
            pick_two_columns(&rows),
            Some(("iaMean".to_string(), "numHosts".to_string()))
        );
    }

    #[test]
    fn inference_skips_constant_and_partial_columns() {
        // numHosts is constant, and extra is missing from the last row
        let mut first = row("0.1", "10", 0.1);
        first.itervars.insert("extra".to_string(), "a".to_string());
        let mut second = row("0.2", "10", 0.2);
        second.itervars.insert("extra".to_string(), "b".to_string());
        let rows = vec![first, second, row("0.3", "10", 0.3)];
        assert_eq!(pick_two_columns(&rows), None);
    }
}
