//! The `Bicluster` value object and its set-theoretic geometry.

use ndarray::Array2;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Errors raised while constructing or materializing a [`Bicluster`].
#[derive(Debug)]
pub enum BiclusterError {
    /// An index appears more than once on the named axis.
    DuplicateIndices { axis: &'static str },
    /// A supplied submatrix does not have shape `(|rows|, |cols|)`.
    DataShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A stored index does not fit inside the source matrix.
    IndexOutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },
}

impl fmt::Display for BiclusterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BiclusterError::DuplicateIndices { axis } => {
                write!(f, "duplicate {} indices", axis)
            }
            BiclusterError::DataShapeMismatch { expected, actual } => write!(
                f,
                "data shape {:?} does not match (|rows|, |cols|) = {:?}",
                actual, expected
            ),
            BiclusterError::IndexOutOfBounds { axis, index, len } => write!(
                f,
                "{} index {} out of bounds for matrix with {} {}s",
                axis, index, len, axis
            ),
        }
    }
}

impl Error for BiclusterError {}

/// Outcome of a strict containment test, see [`Bicluster::contained_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Containment {
    Contained,
    NotContained,
}

impl Containment {
    pub fn is_contained(self) -> bool {
        matches!(self, Containment::Contained)
    }
}

/// A rectangular sub-pattern of a matrix: a subset of row indices paired
/// with a subset of column indices.
///
/// Index sequences are unique per axis and may be canonicalized in place
/// with [`sort`](Bicluster::sort); `pvalue` is the only field mutated after
/// construction (by the enrichment pass or [`set_pvalue`](Bicluster::set_pvalue)).
///
/// # Example
/// ```
/// use biclust::Bicluster;
/// let a = Bicluster::from_indices(vec![0, 2], vec![1, 3]).unwrap();
/// let b = Bicluster::from_indices(vec![2, 0], vec![3, 1]).unwrap();
///
/// assert_eq!(a.area(), 4);
/// assert_eq!(a, b); // equality is order-independent
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Bicluster {
    rows: Vec<usize>,
    cols: Vec<usize>,
    #[serde(skip)]
    data: Option<Array2<f64>>,
    pvalue: Option<f64>,
}

impl Bicluster {
    /// Build from explicit index arrays. Indices must be unique per axis.
    pub fn from_indices(rows: Vec<usize>, cols: Vec<usize>) -> Result<Self, BiclusterError> {
        check_unique(&rows, "row")?;
        check_unique(&cols, "col")?;
        Ok(Bicluster {
            rows,
            cols,
            data: None,
            pvalue: None,
        })
    }

    /// Build from boolean masks over the row and column universes,
    /// selecting the indices where the mask is true.
    pub fn from_masks(row_mask: &[bool], col_mask: &[bool]) -> Self {
        let select = |mask: &[bool]| {
            mask.iter()
                .enumerate()
                .filter_map(|(i, &m)| m.then_some(i))
                .collect::<Vec<_>>()
        };
        // mask positions are unique and ascending, no validation needed
        Bicluster {
            rows: select(row_mask),
            cols: select(col_mask),
            data: None,
            pvalue: None,
        }
    }

    /// Build from index arrays together with a submatrix snapshot. The
    /// snapshot must have shape `(|rows|, |cols|)`, or be empty for an
    /// empty bicluster.
    pub fn with_data(
        rows: Vec<usize>,
        cols: Vec<usize>,
        data: Array2<f64>,
    ) -> Result<Self, BiclusterError> {
        let mut bicluster = Self::from_indices(rows, cols)?;
        let expected = (bicluster.rows.len(), bicluster.cols.len());
        if data.dim() != expected && !(data.is_empty() && bicluster.area() == 0) {
            return Err(BiclusterError::DataShapeMismatch {
                expected,
                actual: data.dim(),
            });
        }
        bicluster.data = Some(data);
        Ok(bicluster)
    }

    /// Snapshot this bicluster's submatrix out of the source matrix,
    /// replacing any previous snapshot. Row `i` / column `j` of the
    /// snapshot correspond to `rows[i]` / `cols[j]` in storage order.
    pub fn materialize(&mut self, matrix: &Array2<f64>) -> Result<(), BiclusterError> {
        let (n_rows, n_cols) = matrix.dim();
        if let Some(&r) = self.rows.iter().find(|&&r| r >= n_rows) {
            return Err(BiclusterError::IndexOutOfBounds {
                axis: "row",
                index: r,
                len: n_rows,
            });
        }
        if let Some(&c) = self.cols.iter().find(|&&c| c >= n_cols) {
            return Err(BiclusterError::IndexOutOfBounds {
                axis: "col",
                index: c,
                len: n_cols,
            });
        }

        let mut data = Array2::<f64>::zeros((self.rows.len(), self.cols.len()));
        for (i, &r) in self.rows.iter().enumerate() {
            for (j, &c) in self.cols.iter().enumerate() {
                data[(i, j)] = matrix[(r, c)];
            }
        }
        self.data = Some(data);
        Ok(())
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    pub fn data(&self) -> Option<&Array2<f64>> {
        self.data.as_ref()
    }

    pub fn pvalue(&self) -> Option<f64> {
        self.pvalue
    }

    pub fn set_pvalue(&mut self, pvalue: f64) {
        self.pvalue = Some(pvalue);
    }

    /// `|rows| * |cols|`, recomputed on demand.
    pub fn area(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// Per-axis set intersection. The result is itself rectangular (not a
    /// cross-product) and carries no snapshot or p-value.
    pub fn intersection(&self, other: &Bicluster) -> Bicluster {
        Bicluster {
            rows: intersect(&self.rows, &other.rows),
            cols: intersect(&self.cols, &other.cols),
            data: None,
            pvalue: None,
        }
    }

    /// Per-axis set union. Carries no snapshot or p-value.
    pub fn union(&self, other: &Bicluster) -> Bicluster {
        Bicluster {
            rows: unite(&self.rows, &other.rows),
            cols: unite(&self.cols, &other.cols),
            data: None,
            pvalue: None,
        }
    }

    /// Overlap coefficient: intersection area over the smaller of the two
    /// areas, in [0, 1]. 1.0 means the smaller bicluster is fully covered
    /// by the larger. Degenerate operands (zero min area) yield 0.0.
    pub fn overlap(&self, other: &Bicluster) -> f64 {
        let min_area = self.area().min(other.area());
        if min_area == 0 {
            return 0.0;
        }
        self.intersection(other).area() as f64 / min_area as f64
    }

    /// Strict proper containment by area: `self` is contained in `other`
    /// iff `self.area() < other.area()` and the intersection area equals
    /// `self.area()`.
    ///
    /// Note this is containment, not equality: two equal-area biclusters
    /// report [`Containment::NotContained`] even when they are identical.
    pub fn contained_in(&self, other: &Bicluster) -> Containment {
        if self.area() < other.area() && self.intersection(other).area() == self.area() {
            Containment::Contained
        } else {
            Containment::NotContained
        }
    }

    /// Canonicalize row and column index sequences into ascending order,
    /// in place.
    pub fn sort(&mut self) {
        self.rows.sort_unstable();
        self.cols.sort_unstable();
    }

    /// Order-independent identity key: the sorted index vectors. Equality,
    /// hashing and deduplication all go through this form so that two
    /// biclusters built from differently-ordered index arrays compare and
    /// hash identically.
    pub(crate) fn canonical_key(&self) -> (Vec<usize>, Vec<usize>) {
        let mut rows = self.rows.clone();
        let mut cols = self.cols.clone();
        rows.sort_unstable();
        cols.sort_unstable();
        (rows, cols)
    }
}

fn check_unique(indices: &[usize], axis: &'static str) -> Result<(), BiclusterError> {
    let set: HashSet<usize> = indices.iter().copied().collect();
    if set.len() != indices.len() {
        return Err(BiclusterError::DuplicateIndices { axis });
    }
    Ok(())
}

fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let b_set: HashSet<usize> = b.iter().copied().collect();
    let mut out: Vec<usize> = a.iter().copied().filter(|i| b_set.contains(i)).collect();
    out.sort_unstable();
    out
}

fn unite(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut set: HashSet<usize> = a.iter().copied().collect();
    set.extend(b.iter().copied());
    let mut out: Vec<usize> = set.into_iter().collect();
    out.sort_unstable();
    out
}

/// Equality compares row-set and col-set membership only; storage order,
/// snapshot data and p-value are ignored.
impl PartialEq for Bicluster {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for Bicluster {}

// Hashing the canonical form keeps the equal-objects-equal-hashes contract
// under arbitrary index orderings.
impl Hash for Bicluster {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl fmt::Display for Bicluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bicluster(rows={:?}, cols={:?})", self.rows, self.cols)
    }
}
