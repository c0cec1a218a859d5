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
//! Library for charting scalar results pivoted over two iteration variables.

pub mod chart;
pub mod config;
pub mod confidence;
pub mod export;
pub mod filter;
pub mod pivot;
pub mod records;
pub mod results;
pub mod style;

pub mod prelude {
    pub use super::{
        chart::{chart_from_rows, draw_xy_chart, ChartError, XyChart},
        config::{ChartProps, ErrorStyle},
        confidence::ConfidenceLevel,
        filter::FilterExpr,
        pivot::{pick_two_columns, CellStats, PivotTable},
        results::{get_scalars, get_scalars_from_reader, QueryOpts, ScalarRow},
    };
}
