use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use super::{ColumnSpec, DataError, ResolvedColumns};
use crate::panel::{Panel, PanelLengths};

/// A validated panel together with the unit identifiers it was built from.
#[derive(Debug, Clone)]
pub struct PanelFrame {
    panel: Panel,
    unit_ids: Vec<String>,
    columns: ResolvedColumns,
}

impl PanelFrame {
    /// Extract a panel from a long-format table.
    ///
    /// Rows are stably sorted by (identity, time). Units appear in sorted
    /// identity order and each unit's length is its row count. Null cells
    /// are reported by their row in `df`, before sorting.
    pub fn from_dataframe(df: &DataFrame, spec: &ColumnSpec) -> Result<Self, DataError> {
        let header: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let columns = spec.resolve(&header)?;
        reject_nulls(df, &columns)?;

        let sorted = df
            .clone()
            .lazy()
            .sort(
                [columns.identity.as_str(), columns.time.as_str()],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;

        let ids = string_values(&sorted, &columns.identity)?;
        let times = string_values(&sorted, &columns.time)?;
        let y = float_values(&sorted, &columns.dependent)?;
        let x = float_values(&sorted, &columns.independent)?;

        let mut unit_ids: Vec<String> = Vec::new();
        let mut lengths: Vec<usize> = Vec::new();
        for row in 0..ids.len() {
            let continues_unit = row > 0 && ids[row] == ids[row - 1];
            if continues_unit {
                if times[row] == times[row - 1] {
                    return Err(DataError::DuplicateObservation {
                        unit: ids[row].clone(),
                        time: times[row].clone(),
                    });
                }
                if let Some(last) = lengths.last_mut() {
                    *last += 1;
                }
            } else {
                unit_ids.push(ids[row].clone());
                lengths.push(1);
            }
        }

        let lengths = PanelLengths::new(lengths)?;
        let panel = Panel::new(y, x, lengths)?;
        debug!(
            units = panel.units(),
            observations = panel.observations(),
            "panel extracted"
        );
        Ok(Self {
            panel,
            unit_ids,
            columns,
        })
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Unit identifiers in stacking order.
    pub fn unit_ids(&self) -> &[String] {
        &self.unit_ids
    }

    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    pub fn into_panel(self) -> Panel {
        self.panel
    }
}

/// Read a `.csv` or `.parquet` file and extract its panel.
pub fn load_panel(path: &Path, spec: &ColumnSpec) -> Result<PanelFrame, DataError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let df = match extension.as_str() {
        // whole-file inference: a column typed i64 from its leading rows
        // would reject a later decimal
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()?
            .collect()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
        _ => return Err(DataError::UnsupportedFormat(path.display().to_string())),
    };
    info!(path = %path.display(), rows = df.height(), "loaded panel table");

    PanelFrame::from_dataframe(&df, spec)
}

fn first_null(column: &Column) -> Option<usize> {
    if column.null_count() == 0 {
        return None;
    }
    (0..column.len()).find(|&i| matches!(column.get(i), Ok(AnyValue::Null)))
}

fn reject_nulls(df: &DataFrame, columns: &ResolvedColumns) -> Result<(), DataError> {
    for name in [
        &columns.identity,
        &columns.time,
        &columns.dependent,
        &columns.independent,
    ] {
        if let Some(row) = first_null(df.column(name)?) {
            return Err(DataError::NullValue {
                column: name.clone(),
                row,
            });
        }
    }
    Ok(())
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>, DataError> {
    let column = df.column(name)?;
    let as_text = column.cast(&DataType::String)?;
    let text = as_text.str()?;
    let mut out = Vec::with_capacity(text.len());
    for (row, value) in text.into_iter().enumerate() {
        match value {
            Some(v) => out.push(v.to_string()),
            None => {
                return Err(DataError::NullValue {
                    column: name.to_string(),
                    row,
                })
            }
        }
    }
    Ok(out)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, DataError> {
    let column = df.column(name)?;
    let non_numeric = || DataError::NonNumericColumn {
        column: name.to_string(),
        dtype: column.dtype().to_string(),
    };
    if matches!(column.dtype(), DataType::Boolean) {
        return Err(non_numeric());
    }

    // values that fail the cast come back as nulls
    let cast = column.cast(&DataType::Float64).map_err(|_| non_numeric())?;
    if cast.null_count() > 0 {
        return Err(non_numeric());
    }
    let values = cast.f64()?;
    Ok(values.into_no_null_iter().collect())
}
