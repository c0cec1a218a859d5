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
//! Module defining record data types to (de-)serialize result rows from CSV.
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
/// Kinds of rows found in a long-format result file.
pub enum RowKind {
    /// A recorded scalar value, one per run, module and name.
    #[serde(rename = "scalar")]
    #[strum(serialize = "scalar")]
    Scalar,
    /// An iteration variable of the run, stored in `attrname`/`attrvalue`.
    #[serde(rename = "itervar")]
    #[strum(serialize = "itervar")]
    Itervar,
    /// A run-level attribute, stored in `attrname`/`attrvalue`.
    #[serde(rename = "runattr")]
    #[strum(serialize = "runattr")]
    Runattr,
    /// A result-level attribute attached to the scalar named by `module`/`name`.
    #[serde(rename = "attr")]
    #[strum(serialize = "attr")]
    Attr,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// One row of a long-format result file.
///
/// Which fields are populated depends on [`RowKind`]: scalar rows carry
/// `module`, `name` and `value`, while metadata rows carry `attrname` and
/// `attrvalue`. Absent fields are stored as empty strings.
pub struct ResultRow {
    pub run: String,
    #[serde(rename = "type")]
    pub kind: RowKind,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attrname: String,
    #[serde(default)]
    pub attrvalue: String,
    #[serde(default)]
    pub value: Option<f64>,
}

impl ResultRow {
    /// A scalar row recorded by `module` under `name`.
    pub fn scalar(
        run: impl Into<String>,
        module: impl Into<String>,
        name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            run: run.into(),
            kind: RowKind::Scalar,
            module: module.into(),
            name: name.into(),
            attrname: String::new(),
            attrvalue: String::new(),
            value: Some(value),
        }
    }

    /// An iteration variable `name = value` of the given run.
    pub fn itervar(
        run: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            run: run.into(),
            kind: RowKind::Itervar,
            module: String::new(),
            name: String::new(),
            attrname: name.into(),
            attrvalue: value.into(),
            value: None,
        }
    }

    /// A run attribute `name = value` of the given run.
    pub fn runattr(
        run: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            run: run.into(),
            kind: RowKind::Runattr,
            module: String::new(),
            name: String::new(),
            attrname: name.into(),
            attrvalue: value.into(),
            value: None,
        }
    }

    /// A result attribute `attrname = attrvalue` of the scalar `module`/`name`.
    pub fn attr(
        run: impl Into<String>,
        module: impl Into<String>,
        name: impl Into<String>,
        attrname: impl Into<String>,
        attrvalue: impl Into<String>,
    ) -> Self {
        Self {
            run: run.into(),
            kind: RowKind::Attr,
            module: module.into(),
            name: name.into(),
            attrname: attrname.into(),
            attrvalue: attrvalue.into(),
            value: None,
        }
    }
}
