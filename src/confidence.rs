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
//! Confidence levels and their two-sided z scores.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Confidence level of the interval drawn around each mean.
///
/// The z scores are the usual two-sided normal quantiles, so the interval of
/// a cell with standard deviation `std` and `count` samples spans the mean
/// plus/minus `z * std / sqrt(count)`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Deserialize,
    Serialize,
    ValueEnum,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
pub enum ConfidenceLevel {
    /// Do not draw confidence intervals at all.
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    #[value(name = "none")]
    None,
    #[serde(rename = "80%")]
    #[strum(serialize = "80%")]
    #[value(name = "80%")]
    P80,
    #[serde(rename = "85%")]
    #[strum(serialize = "85%")]
    #[value(name = "85%")]
    P85,
    #[serde(rename = "90%")]
    #[strum(serialize = "90%")]
    #[value(name = "90%")]
    P90,
    #[default]
    #[serde(rename = "95%")]
    #[strum(serialize = "95%")]
    #[value(name = "95%")]
    P95,
    #[serde(rename = "99%")]
    #[strum(serialize = "99%")]
    #[value(name = "99%")]
    P99,
    #[serde(rename = "99.5%")]
    #[strum(serialize = "99.5%")]
    #[value(name = "99.5%")]
    P995,
    #[serde(rename = "99.9%")]
    #[strum(serialize = "99.9%")]
    #[value(name = "99.9%")]
    P999,
}

impl ConfidenceLevel {
    /// The two-sided z score of the level, or [`None`] when disabled.
    pub fn z(&self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::P80 => Some(1.282),
            Self::P85 => Some(1.440),
            Self::P90 => Some(1.645),
            Self::P95 => Some(1.960),
            Self::P99 => Some(2.576),
            Self::P995 => Some(2.807),
            Self::P999 => Some(3.291),
        }
    }

    /// The level as a fraction, e.g. `0.95`, or [`None`] when disabled.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::P80 => Some(0.80),
            Self::P85 => Some(0.85),
            Self::P90 => Some(0.90),
            Self::P95 => Some(0.95),
            Self::P99 => Some(0.99),
            Self::P995 => Some(0.995),
            Self::P999 => Some(0.999),
        }
    }

    /// Half-width of the confidence interval around the mean of `count`
    /// samples with standard deviation `std`.
    pub fn half_width(&self, std: f64, count: usize) -> Option<f64> {
        Some(self.z()? * std / (count as f64).sqrt())
    }
}
