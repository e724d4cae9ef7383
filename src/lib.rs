//! Cloud-pruned Forward/Backward for profile HMM sequence search.
//!
//! Given a profile HMM, a digitised amino-acid sequence, and a rough
//! anchor alignment, this crate decides whether the sequence is a
//! significant match by running the Forward/Backward recurrences over a
//! small, adaptively chosen subset of the DP grid:
//!
//! 1. anti-diagonal cloud sweeps prune low-scoring cells outward from the
//!    anchor ([`align::bounded::cloud_search_forward`] /
//!    [`align::bounded::cloud_search_backward`]);
//! 2. the two clouds are reflected, unioned, and reoriented into row
//!    spans;
//! 3. bounded Forward/Backward re-score exactly the retained cells in a
//!    sparse matrix ([`align::bounded::forward_bounded`] /
//!    [`align::bounded::backward_bounded`]).
//!
//! [`align::bounded::cloud_search`] runs the whole pipeline against a
//! reusable [`align::bounded::Workspace`]. File parsing, result
//! formatting, and prefilter integration live in the binaries that link
//! this crate.

pub mod align;
pub mod error;
pub mod extension_traits;
pub mod log_sum;
pub mod structs;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::CoreError;
