use crate::error::RelatednessError;
use crate::error::Result;

/// Breakpoints of the genomic windows over which output is aggregated.
///
/// Always at least two points, strictly increasing, from `0`
/// to the sequence length.
#[derive(Debug, Clone, PartialEq)]
pub struct Windows(Vec<f64>);

impl Windows {
    pub fn new(breaks: Vec<f64>, sequence_length: f64) -> Result<Self> {
        if breaks.len() < 2 {
            return Err(RelatednessError::invalid_input(
                "Windows array must have at least two breakpoints",
            ));
        }
        // NaN compares as None and is rejected here too
        if let Some(i) = breaks
            .windows(2)
            .position(|w| w[1].partial_cmp(&w[0]) != Some(std::cmp::Ordering::Greater))
        {
            return Err(RelatednessError::invalid_input(format!(
                "Windows array must be strictly increasing: {} then {}",
                breaks[i],
                breaks[i + 1]
            )));
        }
        if breaks[0] != 0.0 || breaks[breaks.len() - 1] != sequence_length {
            return Err(RelatednessError::invalid_input(format!(
                "Windows array must start at 0 and end at the sequence length {sequence_length}"
            )));
        }
        Ok(Self(breaks))
    }

    /// The single window `[0, sequence_length]`.
    pub fn whole_sequence(sequence_length: f64) -> Self {
        Self(vec![0.0, sequence_length])
    }

    pub fn num_windows(&self) -> usize {
        self.0.len() - 1
    }

    pub fn breaks(&self) -> &[f64] {
        &self.0
    }

    /// Right coordinate of window `i`.
    pub fn right(&self, i: usize) -> f64 {
        self.0[i + 1]
    }
}
