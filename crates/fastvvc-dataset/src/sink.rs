//! Feature and cost CSV writers
//!
//! File naming follows the training pipeline's convention:
//! `split_features_<basename>_QP_<qp>.csv` and
//! `split_cost_<basename>_QP_<qp>.csv`. One writer exists per file per
//! encoder run; every row is written whole and flushed before the call
//! returns, so rows never interleave and reruns produce byte-identical
//! output.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Dataset sink failures
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("cannot open dataset file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot append dataset row: {0}")]
    Write(#[from] std::io::Error),
}

/// Identity of the CU a row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHeader {
    pub poc: i32,
    pub height: u32,
    pub width: u32,
    pub x: u32,
    pub y: u32,
    /// Bit-packed walk of the partition tree down to this CU
    pub split_series: u64,
}

impl RowHeader {
    fn write_prefix(&self, out: &mut String) {
        let _ = write!(
            out,
            "{};{};{};{};{};{};",
            self.poc, self.height, self.width, self.x, self.y, self.split_series
        );
    }
}

/// Which feature layout a feature row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRowKind {
    /// 34-dim QT-vs-MTT vector
    QtMtt,
    /// 45-dim Hor-vs-Ver vector
    HorVer,
}

impl FeatureRowKind {
    fn tag(&self) -> u32 {
        match self {
            FeatureRowKind::QtMtt => 0,
            FeatureRowKind::HorVer => 1,
        }
    }
}

/// Paired feature/cost writers for one encoder run
#[derive(Debug)]
pub struct DatasetSink {
    features: BufWriter<File>,
    costs: BufWriter<File>,
    feature_path: PathBuf,
    cost_path: PathBuf,
}

impl DatasetSink {
    /// Open (append) the two CSV files for `basename` at `qp` in `dir`
    pub fn create(dir: &Path, basename: &str, qp: i32) -> Result<Self, DatasetError> {
        let feature_path = dir.join(format!("split_features_{basename}_QP_{qp}.csv"));
        let cost_path = dir.join(format!("split_cost_{basename}_QP_{qp}.csv"));
        let open = |path: &PathBuf| -> Result<BufWriter<File>, DatasetError> {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(BufWriter::new)
                .map_err(|source| DatasetError::Open {
                    path: path.clone(),
                    source,
                })
        };
        debug!(?feature_path, ?cost_path, "dataset sinks opened");
        Ok(Self {
            features: open(&feature_path)?,
            costs: open(&cost_path)?,
            feature_path,
            cost_path,
        })
    }

    pub fn feature_path(&self) -> &Path {
        &self.feature_path
    }

    pub fn cost_path(&self) -> &Path {
        &self.cost_path
    }

    /// Append one feature row:
    /// `poc;height;width;x;y;splitSeries;kind;f0;f1;...;`
    pub fn write_feature_row(
        &mut self,
        header: RowHeader,
        kind: FeatureRowKind,
        values: &[f32],
    ) -> Result<(), DatasetError> {
        let mut row = String::with_capacity(16 * values.len() + 48);
        header.write_prefix(&mut row);
        let _ = write!(row, "{};", kind.tag());
        for v in values {
            let _ = write!(row, "{v:.6};");
        }
        row.push('\n');
        self.features.write_all(row.as_bytes())?;
        self.features.flush()?;
        Ok(())
    }

    /// Append one cost row:
    /// `poc;height;width;x;y;splitSeries;modeType;cost;`
    pub fn write_cost_row(
        &mut self,
        header: RowHeader,
        mode_tag: u32,
        cost: f64,
    ) -> Result<(), DatasetError> {
        let mut row = String::with_capacity(64);
        header.write_prefix(&mut row);
        let _ = write!(row, "{mode_tag};{cost:.1};");
        row.push('\n');
        self.costs.write_all(row.as_bytes())?;
        self.costs.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("sink_test.rs");
}
