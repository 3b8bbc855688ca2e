//! Products of the branch relatedness matrix with sample weights,
//! computed by sweeping along a forest of trees that changes
//! along the genome.
//!
//! The relatedness of two samples in a window is the summed area
//! (branch length times genomic span) of the branches ancestral
//! to both of them. For a weight matrix `W` with one row per sample,
//! output row `i` of a window is `sum_j relatedness(i, j) * W[j]`.
//! The matrix itself is never formed.

mod engine;
mod error;
mod flags;
mod inspect;
mod matrix;
mod tables;
mod windows;

#[cfg(test)]
mod test_utils;

pub use engine::RelatednessVector;
pub use error::{RelatednessError, Result};
pub use flags::{NodeFlags, SweepOptions};
pub use inspect::StateTable;
pub use matrix::Matrix;
pub use tables::{Edge, EdgeIndexes, EdgeTable, ForestTables, TablesBuilder};
pub use windows::Windows;

#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Node(usize);

impl Node {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn as_index(&self) -> usize {
        self.0
    }

    #[inline(always)]
    fn sentinel() -> Self {
        Self(usize::MAX)
    }

    #[inline(always)]
    fn is_sentinel(&self) -> bool {
        self.0 == usize::MAX
    }

    #[inline(always)]
    fn into_option(self) -> Option<Self> {
        if self.is_sentinel() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<usize> for Node {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Relatedness-weight products over the whole sequence.
///
/// Returns one row per sample and one column per weight vector.
pub fn relatedness_vector(
    tables: &ForestTables,
    samples: &[Node],
    weights: Matrix,
    options: SweepOptions,
) -> Result<Matrix> {
    let windows = Windows::whole_sequence(tables.sequence_length());
    let mut out = RelatednessVector::new(weights, windows, tables, samples, options)?.run()?;
    debug_assert_eq!(out.len(), 1);
    out.pop()
        .ok_or_else(|| RelatednessError::invalid_input("no output window"))
}

/// Relatedness-weight products for each window.
pub fn windowed_relatedness_vector(
    tables: &ForestTables,
    samples: &[Node],
    weights: Matrix,
    windows: &[f64],
    options: SweepOptions,
) -> Result<Vec<Matrix>> {
    let windows = Windows::new(windows.to_vec(), tables.sequence_length())?;
    RelatednessVector::new(weights, windows, tables, samples, options)?.run()
}
