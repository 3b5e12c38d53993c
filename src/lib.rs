//! Bicluster geometry and enrichment statistics.
//!
//! A [`Bicluster`] is a rectangular sub-pattern of a data matrix: a subset
//! of row indices paired with a subset of column indices, typically
//! produced by an expression-analysis mining step upstream of this crate.
//! [`BiclusterCollection`] aggregates many of them and provides
//! deduplication, p-value filtering, area sorting and the
//! constant-column enrichment pass that annotates each member with a
//! binomial-tail p-value against per-column background label frequencies.
//!
//! Reading matrices, discovering biclusters and reporting results are all
//! external concerns; this crate only consumes a numeric matrix, a label
//! alphabet and index sets.

pub mod bicluster;
pub mod collection;
pub mod enrichment;

pub use bicluster::{Bicluster, BiclusterError, Containment};
pub use collection::{BiclusterCollection, CollectionError};
pub use enrichment::{ColumnFrequencies, EnrichmentError};
