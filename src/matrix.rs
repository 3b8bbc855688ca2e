use crate::error::RelatednessError;
use crate::error::Result;

/// Dense, row-major matrix of `f64`.
///
/// Used both for sample weights (one row per sample,
/// one column per weight vector) and for sweep output.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            data: vec![0.0; nrows * ncols],
        }
    }

    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(RelatednessError::invalid_input(format!(
                    "ragged matrix: row {i} has {} columns, expected {ncols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            nrows: rows.len(),
            ncols,
            data,
        })
    }

    /// A single weight vector as an `n x 1` matrix.
    pub fn from_column(column: &[f64]) -> Self {
        Self {
            nrows: column.len(),
            ncols: 1,
            data: column.to_vec(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.ncols + j]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.nrows).map(|i| self.get(i, j)).collect()
    }

    /// Column means. All zero for an empty matrix.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.ncols];
        if self.nrows == 0 {
            return means;
        }
        for i in 0..self.nrows {
            for (m, &x) in means.iter_mut().zip(self.row(i)) {
                *m += x;
            }
        }
        let n = self.nrows as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }

    /// Subtract each column's mean from that column, in place.
    pub fn centre_columns(&mut self) {
        let means = self.column_means();
        for i in 0..self.nrows {
            for (x, &m) in self.row_mut(i).iter_mut().zip(means.iter()) {
                *x -= m;
            }
        }
    }
}
