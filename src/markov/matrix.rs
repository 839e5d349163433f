//! Dense matrices over exact rationals.

use std::fmt;
use std::ops::{Index, IndexMut, Range};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::MatrixError;
use crate::markov::rational::{to_f64, Probability};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Probability>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Probability::zero(); rows * cols],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::zeros(size, size);
        for i in 0..size {
            m[(i, i)] = Probability::one();
        }
        m
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Probability::one(); rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<Probability>>) -> Result<Self, MatrixError> {
        let cols = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut data = Vec::with_capacity(height * cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != cols {
                return Err(MatrixError::Ragged {
                    row,
                    expected: cols,
                    found: values.len(),
                });
            }
            data.extend(values);
        }
        Ok(Self {
            rows: height,
            cols,
            data,
        })
    }

    /// Integer entries scaled by `1 / denom`.
    pub fn rat_mat(entries: &[&[i64]], denom: i64) -> Result<Self, MatrixError> {
        if denom == 0 {
            return Err(MatrixError::ZeroDenominator);
        }
        let denom = BigInt::from(denom);
        let rows = entries
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&n| Probability::new(BigInt::from(n), denom.clone()))
                    .collect()
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Probability> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out[(c, r)] = self[(r, c)].clone();
            }
        }
        out
    }

    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != other.rows {
            return Err(self.mismatch("mul", other));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let lhs = &self[(r, k)];
                if lhs.is_zero() {
                    continue;
                }
                for c in 0..other.cols {
                    let rhs = &other[(k, c)];
                    if !rhs.is_zero() {
                        out[(r, c)] += lhs * rhs;
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    pub fn scale(&self, factor: &Probability) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }

    /// `self^exponent` by repeated squaring.
    pub fn pow(&self, mut exponent: u32) -> Result<Matrix, MatrixError> {
        self.require_square()?;
        let mut result = Self::identity(self.rows);
        let mut base = self.clone();
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.mul(&base)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.mul(&base)?;
            }
        }
        Ok(result)
    }

    /// Gauss-Jordan elimination over the rationals.
    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        self.require_square()?;
        let n = self.rows;
        let mut left = self.clone();
        let mut right = Self::identity(n);

        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| !left[(r, col)].is_zero())
                .ok_or(MatrixError::Singular)?;
            if pivot != col {
                left.swap_rows(pivot, col);
                right.swap_rows(pivot, col);
            }

            let inv_pivot = left[(col, col)].recip();
            left.scale_row(col, &inv_pivot);
            right.scale_row(col, &inv_pivot);

            for r in 0..n {
                if r == col || left[(r, col)].is_zero() {
                    continue;
                }
                let factor = left[(r, col)].clone();
                left.sub_row_multiple(r, col, &factor);
                right.sub_row_multiple(r, col, &factor);
            }
        }
        Ok(right)
    }

    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix, MatrixError> {
        if rows.end > self.rows || cols.end > self.cols || rows.start > rows.end || cols.start > cols.end {
            return Err(MatrixError::ShapeMismatch {
                op: "submatrix",
                left: self.shape(),
                right: (rows.end, cols.end),
            });
        }
        let mut out = Self::zeros(rows.len(), cols.len());
        for (i, r) in rows.clone().enumerate() {
            for (j, c) in cols.clone().enumerate() {
                out[(i, j)] = self[(r, c)].clone();
            }
        }
        Ok(out)
    }

    /// Entries at the given row and column indices, in that order.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Result<Matrix, MatrixError> {
        if rows.iter().any(|&r| r >= self.rows) || cols.iter().any(|&c| c >= self.cols) {
            return Err(MatrixError::ShapeMismatch {
                op: "select",
                left: self.shape(),
                right: (rows.len(), cols.len()),
            });
        }
        let mut out = Self::zeros(rows.len(), cols.len());
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out[(i, j)] = self[(r, c)].clone();
            }
        }
        Ok(out)
    }

    pub fn column(&self, col: usize) -> Result<Matrix, MatrixError> {
        self.submatrix(0..self.rows, col..col + 1)
    }

    /// `[self | other]`
    pub fn row_join(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.rows != other.rows {
            return Err(self.mismatch("row_join", other));
        }
        let mut out = Self::zeros(self.rows, self.cols + other.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out[(r, c)] = self[(r, c)].clone();
            }
            for c in 0..other.cols {
                out[(r, self.cols + c)] = other[(r, c)].clone();
            }
        }
        Ok(out)
    }

    /// `self` stacked above `other`.
    pub fn col_join(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != other.cols {
            return Err(self.mismatch("col_join", other));
        }
        let mut data = self.data.clone();
        data.extend(other.data.iter().cloned());
        Ok(Matrix {
            rows: self.rows + other.rows,
            cols: self.cols,
            data,
        })
    }

    /// Largest absolute entry-wise difference.
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<Probability, MatrixError> {
        let diff = self.sub(other)?;
        Ok(diff
            .data
            .iter()
            .map(Signed::abs)
            .max()
            .unwrap_or_else(Probability::zero))
    }

    pub fn column_sums(&self) -> Vec<Probability> {
        (0..self.cols)
            .map(|c| (0..self.rows).fold(Probability::zero(), |acc, r| acc + &self[(r, c)]))
            .collect()
    }

    pub fn to_f64_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| to_f64(&self[(r, c)])).collect())
            .collect()
    }

    /// Exact entries rendered as `p/q` strings.
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self[(r, c)].to_string()).collect())
            .collect()
    }

    fn require_square(&self) -> Result<(), MatrixError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    fn mismatch(&self, op: &'static str, other: &Matrix) -> MatrixError {
        MatrixError::ShapeMismatch {
            op,
            left: self.shape(),
            right: other.shape(),
        }
    }

    fn zip_with<F>(&self, other: &Matrix, op: &'static str, f: F) -> Result<Matrix, MatrixError>
    where
        F: Fn(&Probability, &Probability) -> Probability,
    {
        if self.shape() != other.shape() {
            return Err(self.mismatch(op, other));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| f(a, b)).collect(),
        })
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, row: usize, factor: &Probability) {
        for c in 0..self.cols {
            self[(row, c)] *= factor;
        }
    }

    /// row[target] -= factor * row[source]
    fn sub_row_multiple(&mut self, target: usize, source: usize, factor: &Probability) {
        for c in 0..self.cols {
            let delta = &self[(source, c)] * factor;
            self[(target, c)] -= delta;
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Probability;

    fn index(&self, (row, col): (usize, usize)) -> &Probability {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Probability {
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row: Vec<String> = (0..self.cols).map(|c| self[(r, c)].to_string()).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}
