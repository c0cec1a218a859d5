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
//! Loading result files and joining run metadata onto the scalar rows.
//!
//! Result files are long-format CSV: scalar rows carry the recorded values,
//! while `itervar`, `runattr` and `attr` rows carry metadata that applies to
//! a whole run or to a single result. Queries return one [`ScalarRow`] per
//! scalar, with the relevant metadata joined on, so that downstream code can
//! treat iteration variables like columns of a wide table.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use thiserror::Error;

use crate::{
    filter::FilterExpr,
    records::{ResultRow, RowKind},
};

/// Errors raised while loading result files.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("scalar {name:?} recorded by {module:?} in run {run:?} has no value")]
    MissingValue {
        run: String,
        module: String,
        name: String,
    },
}

/// A scalar result with its run metadata joined on.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRow {
    pub run: String,
    pub module: String,
    pub name: String,
    pub value: f64,
    pub itervars: BTreeMap<String, String>,
    pub runattrs: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
}

impl ScalarRow {
    /// Look up a metadata column by name, checking iteration variables first,
    /// then run attributes, then result attributes.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.itervars
            .get(name)
            .or_else(|| self.runattrs.get(name))
            .or_else(|| self.attrs.get(name))
            .map(String::as_str)
    }
}

/// Options controlling which metadata kinds get joined onto the scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOpts {
    pub include_itervars: bool,
    pub include_runattrs: bool,
    pub include_attrs: bool,
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self {
            include_itervars: true,
            include_runattrs: true,
            include_attrs: true,
        }
    }
}

/// Load the given result files and return the scalar rows matching `filter`.
///
/// Files are parsed in parallel, then joined globally, so metadata of a run
/// may live in a different file than its scalars. Row order follows the file
/// order on disk.
pub fn get_scalars(
    paths: &[PathBuf],
    filter: &FilterExpr,
    opts: QueryOpts,
) -> Result<Vec<ScalarRow>, QueryError> {
    let per_file = paths
        .par_iter()
        .map(|path| read_rows(path))
        .collect::<Result<Vec<_>, _>>()?;
    let rows: Vec<ResultRow> = per_file.into_iter().flatten().collect();
    log::debug!("Loaded {} result rows from {} files", rows.len(), paths.len());
    join_scalars(rows, filter, opts)
}

/// Like [`get_scalars`], but reading a single result file from a reader.
pub fn get_scalars_from_reader(
    reader: impl Read,
    filter: &FilterExpr,
    opts: QueryOpts,
) -> Result<Vec<ScalarRow>, QueryError> {
    let mut csv = csv::Reader::from_reader(reader);
    let rows = csv.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
    join_scalars(rows, filter, opts)
}

fn read_rows(path: &Path) -> Result<Vec<ResultRow>, QueryError> {
    log::debug!("Loading result file {path:?}");
    let file = fs::File::open(path)?;
    let mut csv = csv::Reader::from_reader(file);
    Ok(csv.deserialize().collect::<Result<Vec<ResultRow>, _>>()?)
}

/// Join run metadata onto the scalar rows in two passes: the first collects
/// the metadata rows, the second attaches them to every scalar and applies
/// the filter. Metadata may thus appear before or after its scalars.
fn join_scalars(
    rows: Vec<ResultRow>,
    filter: &FilterExpr,
    opts: QueryOpts,
) -> Result<Vec<ScalarRow>, QueryError> {
    let mut itervars: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    let mut runattrs: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    let mut attrs: HashMap<(String, String, String), BTreeMap<String, String>> = HashMap::new();
    for row in &rows {
        match row.kind {
            RowKind::Itervar if opts.include_itervars => {
                itervars
                    .entry(row.run.clone())
                    .or_default()
                    .insert(row.attrname.clone(), row.attrvalue.clone());
            }
            RowKind::Runattr if opts.include_runattrs => {
                runattrs
                    .entry(row.run.clone())
                    .or_default()
                    .insert(row.attrname.clone(), row.attrvalue.clone());
            }
            RowKind::Attr if opts.include_attrs => {
                attrs
                    .entry((row.run.clone(), row.module.clone(), row.name.clone()))
                    .or_default()
                    .insert(row.attrname.clone(), row.attrvalue.clone());
            }
            _ => {}
        }
    }

    let mut scalars = Vec::new();
    for row in rows {
        if row.kind != RowKind::Scalar {
            continue;
        }
        let value = row.value.ok_or_else(|| QueryError::MissingValue {
            run: row.run.clone(),
            module: row.module.clone(),
            name: row.name.clone(),
        })?;
        let scalar = ScalarRow {
            itervars: itervars.get(&row.run).cloned().unwrap_or_default(),
            runattrs: runattrs.get(&row.run).cloned().unwrap_or_default(),
            attrs: attrs
                .get(&(row.run.clone(), row.module.clone(), row.name.clone()))
                .cloned()
                .unwrap_or_default(),
            run: row.run,
            module: row.module,
            name: row.name,
            value,
        };
        if filter.matches(&scalar) {
            scalars.push(scalar);
        }
    }
    log::debug!("Query matched {} scalar rows", scalars.len());
    Ok(scalars)
}

#[cfg(test)]
mod test {
    use super::*;

    const RAW: &str = "run,type,module,name,attrname,attrvalue,value\n\
                       r0,runattr,,,configname,PureAloha,\n\
                       r0,itervar,,,iaMean,0.2,\n\
                       r0,itervar,,,numHosts,10,\n\
                       r0,scalar,net.server,channelUtilization:last,,,0.156\n\
                       r0,scalar,net.server,rcvdPk:count,,,421\n\
                       r0,attr,net.server,channelUtilization:last,unit,ratio,\n\
                       r1,scalar,net.server,channelUtilization:last,,,0.198\n\
                       r1,itervar,,,iaMean,0.4,\n\
                       r1,itervar,,,numHosts,10,\n\
                       r1,runattr,,,configname,PureAloha,\n";

    fn query(filter: &str, opts: QueryOpts) -> Vec<ScalarRow> {
        let filter = FilterExpr::parse(filter).unwrap();
        get_scalars_from_reader(RAW.as_bytes(), &filter, opts).unwrap()
    }

    #[test]
    fn join_attaches_metadata() {
        let rows = query("", QueryOpts::default());
        assert_eq!(rows.len(), 3);

        // metadata joins on regardless of whether it precedes or follows the scalar
        assert_eq!(rows[0].run, "r0");
        assert_eq!(rows[0].name, "channelUtilization:last");
        assert_eq!(rows[0].value, 0.156);
        assert_eq!(rows[0].column("iaMean"), Some("0.2"));
        assert_eq!(rows[0].column("numHosts"), Some("10"));
        assert_eq!(rows[0].column("configname"), Some("PureAloha"));
        assert_eq!(rows[0].column("unit"), Some("ratio"));

        // result attributes only attach to their own scalar
        assert_eq!(rows[1].name, "rcvdPk:count");
        assert_eq!(rows[1].column("unit"), None);

        assert_eq!(rows[2].run, "r1");
        assert_eq!(rows[2].column("iaMean"), Some("0.4"));
    }

    #[test]
    fn include_flags_drop_metadata() {
        let opts = QueryOpts {
            include_itervars: false,
            include_runattrs: true,
            include_attrs: false,
        };
        let rows = query("", opts);
        assert!(rows[0].itervars.is_empty());
        assert!(rows[0].attrs.is_empty());
        assert_eq!(rows[0].column("configname"), Some("PureAloha"));
        assert_eq!(rows[0].column("iaMean"), None);
    }

    #[test]
    fn filter_selects_rows() {
        let rows = query("channelUtilization:* and itervar:iaMean =~ 0.4", QueryOpts::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].run, "r1");
    }

    #[test]
    fn missing_scalar_value_is_an_error() {
        let raw = "run,type,module,name,attrname,attrvalue,value\n\
                   r0,scalar,net.server,rcvdPk:count,,,\n";
        let err = get_scalars_from_reader(raw.as_bytes(), &FilterExpr::All, QueryOpts::default())
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingValue { .. }));
    }

    #[test]
    fn itervars_shadow_runattrs() {
        let raw = "run,type,module,name,attrname,attrvalue,value\n\
                   r0,runattr,,,load,high,\n\
                   r0,itervar,,,load,0.9,\n\
                   r0,scalar,net.server,rcvdPk:count,,,7\n";
        let rows = get_scalars_from_reader(raw.as_bytes(), &FilterExpr::All, QueryOpts::default())
            .unwrap();
        assert_eq!(rows[0].column("load"), Some("0.9"));
    }
}
