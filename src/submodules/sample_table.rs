use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;
use tracing::{debug, info};

use super::{error::{PlotError, Result}, type_lib::{NumericData, Point}};

/// One whitespace-delimited numeric file, reduced to the selected columns.
///
/// Column `k` of `data` holds file column `columns[k]`. Rows keep file order.
#[derive(Debug, Clone, Serialize)]
pub struct SampleTable {
    pub path: PathBuf,
    pub columns: Vec<usize>,
    pub data: Array2<NumericData>,
}

impl SampleTable {
    /// Reads `path` and keeps the columns listed in `usecols`.
    /// An empty `usecols` keeps every column of the first row.
    pub fn load(path: impl AsRef<Path>, usecols: &[usize]) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PlotError::io(path, e))?;
        let table = SampleTable::parse(&text, usecols, path)?;
        info!(path = %path.display(), rows = table.rows(), "loaded sample table");
        Ok(table)
    }

    pub fn parse(text: &str, usecols: &[usize], path: &Path) -> Result<Self> {
        let mut columns = usecols.to_vec();
        let mut values: Vec<NumericData> = Vec::new();
        let mut n_rows = 0;

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
            if columns.is_empty() {
                columns = (0..tokens.len()).collect();
            }

            for &column in columns.iter() {
                let token = tokens.get(column).ok_or_else(|| PlotError::ColumnOutOfRange {
                    path: path.to_path_buf(),
                    line: line_number,
                    column,
                    width: tokens.len(),
                })?;
                let value = token.parse::<NumericData>().map_err(|_| PlotError::MalformedRow {
                    path: path.to_path_buf(),
                    line: line_number,
                    token: token.to_string(),
                })?;
                values.push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(PlotError::EmptyTable { path: path.to_path_buf() });
        }

        let data = Array2::from_shape_vec((n_rows, columns.len()), values)?;
        debug!(path = %path.display(), shape = ?data.shape(), "parsed rows");

        Ok(SampleTable { path: path.to_path_buf(), columns, data })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// The `k`-th selected column (not the `k`-th file column).
    pub fn column(&self, k: usize) -> Result<ArrayView1<'_, NumericData>> {
        if k >= self.width() {
            return Err(PlotError::ColumnOutOfRange {
                path: self.path.clone(),
                line: 0,
                column: k,
                width: self.width(),
            });
        }
        Ok(self.data.index_axis(Axis(1), k))
    }

    pub fn points(&self, kx: usize, ky: usize) -> Result<Vec<Point>> {
        let x = self.column(kx)?;
        let y = self.column(ky)?;
        Ok(x.iter().zip(y.iter()).map(|(&x, &y)| (x, y)).collect())
    }

    /// Writes rows as `t  a b ...`, the layout the plot recipes read back.
    pub fn save(path: impl AsRef<Path>, data: &Array2<NumericData>) -> Result<()> {
        let path = path.as_ref();
        let mut out = String::with_capacity(data.len() * 12);
        for row in data.rows() {
            let mut values = row.iter().map(|value| value.to_string());
            if let Some(first) = values.next() {
                out.push_str(&first);
                let rest = values.collect::<Vec<_>>();
                if !rest.is_empty() {
                    out.push_str("  ");
                    out.push_str(&rest.join(" "));
                }
            }
            out.push('\n');
        }
        std::fs::write(path, out).map_err(|e| PlotError::io(path, e))?;
        info!(path = %path.display(), rows = data.nrows(), "wrote sample table");
        Ok(())
    }
}
