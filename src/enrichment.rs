//! Constant-column enrichment: scores each bicluster against per-column
//! background label frequencies with a binomial tail test.

use crate::bicluster::Bicluster;
use crate::collection::BiclusterCollection;
use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;
use statrs::distribution::{Binomial, DiscreteCDF};
use std::error::Error;
use std::fmt;

/// Errors raised while scoring a collection.
#[derive(Debug)]
pub enum EnrichmentError {
    /// A non-empty bicluster has no materialized submatrix; the engine
    /// reads each column's representative label from data row 0.
    MissingData,
    /// A representative value read from a bicluster's data is not part of
    /// the label alphabet.
    LabelNotInAlphabet { value: i64, column: usize },
    /// A bicluster references a column beyond the source matrix.
    ColumnOutOfBounds { column: usize, n_cols: usize },
}

impl fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnrichmentError::MissingData => {
                write!(f, "bicluster has no materialized data to read labels from")
            }
            EnrichmentError::LabelNotInAlphabet { value, column } => write!(
                f,
                "representative value {} in column {} is not in the label alphabet",
                value, column
            ),
            EnrichmentError::ColumnOutOfBounds { column, n_cols } => write!(
                f,
                "column index {} out of bounds for matrix with {} columns",
                column, n_cols
            ),
        }
    }
}

impl Error for EnrichmentError {}

/// Empirical background frequency of each alphabet label in each column of
/// the source matrix. Built once per enrichment pass, then read-only.
///
/// With `missing_correction` the denominator of every column is forced to
/// the total row count, so values outside the alphabet dilute each label's
/// frequency instead of being excluded from the count.
#[derive(Debug, Clone)]
pub struct ColumnFrequencies {
    /// Shape `(n_cols, n_labels)`.
    freqs: Array2<f64>,
    labels: Vec<i64>,
    n_rows: usize,
}

impl ColumnFrequencies {
    pub fn build(matrix: &Array2<f64>, labels: &[i64], missing_correction: bool) -> Self {
        let (n_rows, n_cols) = matrix.dim();
        let mut freqs = Array2::<f64>::zeros((n_cols, labels.len()));

        for col in 0..n_cols {
            let mut counts = vec![0usize; labels.len()];
            let mut in_alphabet = 0usize;
            for row in 0..n_rows {
                let value = matrix[(row, col)];
                if let Some(slot) = labels.iter().position(|&label| label as f64 == value) {
                    counts[slot] += 1;
                    in_alphabet += 1;
                }
            }
            let denominator = if missing_correction { n_rows } else { in_alphabet };
            if denominator != 0 {
                for (slot, &count) in counts.iter().enumerate() {
                    freqs[(col, slot)] = count as f64 / denominator as f64;
                }
            }
        }
        debug!(
            "built column frequency table: {} columns x {} labels, missing_correction={}",
            n_cols,
            labels.len(),
            missing_correction
        );

        ColumnFrequencies {
            freqs,
            labels: labels.to_vec(),
            n_rows,
        }
    }

    /// Total row count of the source matrix (the binomial trial count).
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.freqs.nrows()
    }

    /// Background frequency of `label` in `column`, or `None` if the label
    /// is outside the alphabet or the column outside the matrix.
    pub fn frequency(&self, column: usize, label: i64) -> Option<f64> {
        let slot = self.labels.iter().position(|&l| l == label)?;
        self.freqs.get((column, slot)).copied()
    }
}

/// Joint probability, under per-column independence, that a random row
/// matches this bicluster's representative label in every selected column.
fn joint_probability(
    bicluster: &Bicluster,
    frequencies: &ColumnFrequencies,
) -> Result<f64, EnrichmentError> {
    let data = bicluster.data().ok_or(EnrichmentError::MissingData)?;
    let mut joint = 1.0;
    for (j, &column) in bicluster.cols().iter().enumerate() {
        if column >= frequencies.n_cols() {
            return Err(EnrichmentError::ColumnOutOfBounds {
                column,
                n_cols: frequencies.n_cols(),
            });
        }
        let representative = data[(0, j)] as i64;
        let frequency = frequencies
            .frequency(column, representative)
            .ok_or(EnrichmentError::LabelNotInAlphabet {
                value: representative,
                column,
            })?;
        joint *= frequency;
    }
    Ok(joint)
}

/// Upper binomial tail P(X >= k) for X ~ Binomial(n, p).
///
/// `statrs`'s survival function is P(X > k), so the at-least form is
/// `sf(k - 1)`, with k = 0 pinned to 1.0. A success probability of exactly
/// 0 or 1 is a valid degenerate case, not an error.
fn binomial_tail_at_least(k: u64, n: u64, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    match Binomial::new(p, n) {
        Ok(distribution) => distribution.sf(k - 1),
        // p outside [0, 1] cannot happen for a product of frequencies
        Err(_) => 0.0,
    }
}

impl BiclusterCollection {
    /// Annotate every member with a one-sided enrichment p-value: how
    /// surprising it is, under a per-column independence model with the
    /// given background `labels` alphabet, to see `|rows|` or more rows
    /// matching the bicluster's column-label pattern by chance.
    ///
    /// The frequency table is built fully before any member is scored;
    /// scoring itself runs in parallel, each worker writing only its own
    /// member's p-value.
    pub fn run_constant_freq_column(
        &mut self,
        matrix: &Array2<f64>,
        labels: &[i64],
        missing_correction: bool,
    ) -> Result<(), EnrichmentError> {
        let frequencies = ColumnFrequencies::build(matrix, labels, missing_correction);
        let n_trials = frequencies.n_rows() as u64;
        info!(
            "scoring {} biclusters against {} rows x {} columns",
            self.len(),
            frequencies.n_rows(),
            frequencies.n_cols()
        );

        self.biclusters_mut()
            .par_iter_mut()
            .try_for_each(|bicluster| {
                let observed = bicluster.rows().len() as u64;
                // P(X >= 0) is 1 regardless of the joint probability, so an
                // empty bicluster never needs its data.
                let pvalue = if observed == 0 {
                    1.0
                } else {
                    let joint = joint_probability(bicluster, &frequencies)?;
                    binomial_tail_at_least(observed, n_trials, joint)
                };
                bicluster.set_pvalue(pvalue);
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn label_matrix() -> Array2<f64> {
        array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
    }

    #[test]
    fn test_frequencies_without_correction() {
        let frequencies = ColumnFrequencies::build(&label_matrix(), &[0, 1], false);
        assert_eq!(frequencies.n_rows(), 4);
        assert!((frequencies.frequency(0, 1).unwrap() - 0.75).abs() < 1e-12);
        assert!((frequencies.frequency(0, 0).unwrap() - 0.25).abs() < 1e-12);
        assert!((frequencies.frequency(1, 1).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_frequencies_exclude_out_of_alphabet_values() {
        // column 0 holds a value outside the alphabet
        let matrix = array![[7.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

        // uncorrected: the 7 drops out of numerator and denominator
        let plain = ColumnFrequencies::build(&matrix, &[0, 1], false);
        assert!((plain.frequency(0, 1).unwrap() - 2.0 / 3.0).abs() < 1e-12);

        // corrected: denominator forced to the full row count
        let corrected = ColumnFrequencies::build(&matrix, &[0, 1], true);
        assert!((corrected.frequency(0, 1).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_frequencies_denominator_forcing_scenario() {
        // alphabet [0] only, with correction: col 0 frequency of 0 is 1/4
        let frequencies = ColumnFrequencies::build(&label_matrix(), &[0], true);
        assert!((frequencies.frequency(0, 0).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_absent_label_has_zero_frequency() {
        let matrix = array![[1.0], [1.0]];
        let frequencies = ColumnFrequencies::build(&matrix, &[0, 1], false);
        assert_eq!(frequencies.frequency(0, 0), Some(0.0));
        assert_eq!(frequencies.frequency(0, 1), Some(1.0));
        // unknown label
        assert_eq!(frequencies.frequency(0, 5), None);
    }

    #[test]
    fn test_binomial_tail_boundary_convention() {
        // P(X >= 2) for Binomial(4, 0.75) = 1 - P(0) - P(1)
        let expected = 1.0 - 0.25f64.powi(4) - 4.0 * 0.75 * 0.25f64.powi(3);
        assert!((binomial_tail_at_least(2, 4, 0.75) - expected).abs() < 1e-12);
        // at-least-zero successes is certain
        assert_eq!(binomial_tail_at_least(0, 4, 0.75), 1.0);
        // degenerate probabilities do not raise
        assert_eq!(binomial_tail_at_least(1, 4, 0.0), 0.0);
        assert!((binomial_tail_at_least(4, 4, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let matrix = label_matrix();
        let bicluster = Bicluster::from_indices(vec![0, 1], vec![0]).unwrap();
        let mut collection = BiclusterCollection::new(vec![bicluster]);
        let err = collection
            .run_constant_freq_column(&matrix, &[0, 1], false)
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::MissingData));
    }

    #[test]
    fn test_representative_outside_alphabet_is_an_error() {
        let matrix = array![[9.0, 0.0], [9.0, 0.0]];
        let mut bicluster = Bicluster::from_indices(vec![0, 1], vec![0]).unwrap();
        bicluster.materialize(&matrix).unwrap();
        let mut collection = BiclusterCollection::new(vec![bicluster]);
        let err = collection
            .run_constant_freq_column(&matrix, &[0, 1], false)
            .unwrap_err();
        assert!(matches!(
            err,
            EnrichmentError::LabelNotInAlphabet { value: 9, column: 0 }
        ));
    }

    #[test]
    fn test_zero_row_bicluster_scores_one_without_data() {
        let matrix = label_matrix();
        let empty = Bicluster::from_indices(vec![], vec![0]).unwrap();
        let mut collection = BiclusterCollection::new(vec![empty]);
        collection
            .run_constant_freq_column(&matrix, &[0, 1], false)
            .unwrap();
        assert_eq!(collection.biclusters()[0].pvalue(), Some(1.0));
    }
}
