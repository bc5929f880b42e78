//! Dense visit-by-group boolean matrix.
//!
//! Cells live in one row-major buffer allocated up front. Parallel writers
//! get disjoint `&mut` views of that buffer (one row's cells, or a block of
//! whole rows), so there is nothing to lock. The only write is "set to true",
//! which makes the result independent of scheduling order.

use std::ops::Range;

#[cfg(feature = "serde")]
use crate::types::ComorbidError;

/// Boolean grid of `rows` visits by `cols` comorbidity groups.
///
/// # Example
///
/// ```
/// use comorbid_classifier::ClassificationMatrix;
///
/// let mut matrix = ClassificationMatrix::allocate(2, 3);
/// matrix.set(1, 2);
/// matrix.set(1, 2);
///
/// assert!(matrix.get(1, 2));
/// assert!(!matrix.get(0, 2));
/// assert_eq!(matrix.column(2), vec![false, true]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MatrixParts"))]
pub struct ClassificationMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

/// Unchecked wire form of [`ClassificationMatrix`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct MatrixParts {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

#[cfg(feature = "serde")]
impl TryFrom<MatrixParts> for ClassificationMatrix {
    type Error = ComorbidError;

    fn try_from(parts: MatrixParts) -> Result<Self, Self::Error> {
        let MatrixParts { rows, cols, cells } = parts;
        match rows.checked_mul(cols) {
            Some(len) if len == cells.len() => Ok(Self { rows, cols, cells }),
            _ => Err(ComorbidError::InvalidShape(format!(
                "{rows}x{cols} matrix cannot hold {} cells",
                cells.len()
            ))),
        }
    }
}

impl ClassificationMatrix {
    /// Allocates a `rows x cols` matrix with every cell false.
    pub fn allocate(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Returns the number of rows (visits).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns (groups).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns true if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at (`row`, `col`).
    ///
    /// # Panics
    /// Panics if the cell is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.offset(row, col)]
    }

    /// Marks the cell at (`row`, `col`) true. Setting it again is a no-op.
    ///
    /// # Panics
    /// Panics if the cell is out of bounds.
    pub fn set(&mut self, row: usize, col: usize) {
        let offset = self.offset(row, col);
        self.cells[offset] = true;
    }

    /// Returns the cells of one row.
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[self.row_range(row..row + 1)]
    }

    /// Returns the cells of one row for writing.
    pub fn row_mut(&mut self, row: usize) -> &mut [bool] {
        let range = self.row_range(row..row + 1);
        &mut self.cells[range]
    }

    /// Returns the cells of a contiguous block of rows, row-major.
    pub fn rows_mut(&mut self, rows: Range<usize>) -> &mut [bool] {
        let range = self.row_range(rows);
        &mut self.cells[range]
    }

    /// Copies out one column.
    pub fn column(&self, col: usize) -> Vec<bool> {
        assert!(
            col < self.cols,
            "column {col} out of bounds for {} columns",
            self.cols
        );
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    /// Returns the number of true cells.
    pub fn count_true(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    fn row_range(&self, rows: Range<usize>) -> Range<usize> {
        assert!(
            rows.start <= rows.end && rows.end <= self.rows,
            "rows {rows:?} out of bounds for {} rows",
            self.rows
        );
        rows.start * self.cols..rows.end * self.cols
    }
}
