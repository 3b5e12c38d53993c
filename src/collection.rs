//! Aggregate operations over a set of biclusters: deduplication,
//! significance filtering and sorting.

use crate::bicluster::Bicluster;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// Errors raised by aggregate operations on a [`BiclusterCollection`].
#[derive(Debug)]
pub enum CollectionError {
    /// A member has no p-value yet; a significance pass must run before
    /// filtering by p-value.
    MissingPvalue { index: usize },
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CollectionError::MissingPvalue { index } => write!(
                f,
                "bicluster at index {} has no p-value; run a significance pass before filtering",
                index
            ),
        }
    }
}

impl Error for CollectionError {}

/// A list of [`Bicluster`]s. Member order is not meaningful except after an
/// explicit [`sort_by_area`](BiclusterCollection::sort_by_area).
#[derive(Debug, Clone, Default, Serialize)]
pub struct BiclusterCollection {
    biclusters: Vec<Bicluster>,
}

impl BiclusterCollection {
    pub fn new(biclusters: Vec<Bicluster>) -> Self {
        BiclusterCollection { biclusters }
    }

    pub fn biclusters(&self) -> &[Bicluster] {
        &self.biclusters
    }

    pub(crate) fn biclusters_mut(&mut self) -> &mut [Bicluster] {
        &mut self.biclusters
    }

    pub fn push(&mut self, bicluster: Bicluster) {
        self.biclusters.push(bicluster);
    }

    pub fn len(&self) -> usize {
        self.biclusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biclusters.is_empty()
    }

    /// Collapse the member list to unique biclusters, in place, keeping the
    /// first occurrence of each. Uniqueness follows the order-independent
    /// equality contract, so duplicates built from differently-ordered
    /// index arrays are merged.
    pub fn remove_duplicates(&mut self) {
        let mut seen: HashSet<(Vec<usize>, Vec<usize>)> = HashSet::new();
        self.biclusters
            .retain(|bicluster| seen.insert(bicluster.canonical_key()));
    }

    /// Retain only members whose p-value is strictly below `threshold`.
    ///
    /// Errors without mutating anything if any member is unannotated;
    /// filtering before a significance pass is a precondition violation,
    /// not an empty result.
    pub fn remove_bypvalue(&mut self, threshold: f64) -> Result<(), CollectionError> {
        if let Some(index) = self
            .biclusters
            .iter()
            .position(|bicluster| bicluster.pvalue().is_none())
        {
            return Err(CollectionError::MissingPvalue { index });
        }
        self.biclusters
            .retain(|bicluster| bicluster.pvalue().is_some_and(|p| p < threshold));
        Ok(())
    }

    /// Stable sort of the member list by area.
    pub fn sort_by_area(&mut self, descending: bool) {
        if descending {
            self.biclusters.sort_by(|a, b| b.area().cmp(&a.area()));
        } else {
            self.biclusters.sort_by(|a, b| a.area().cmp(&b.area()));
        }
    }
}

impl fmt::Display for BiclusterCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, bicluster) in self.biclusters.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", bicluster)?;
        }
        Ok(())
    }
}
