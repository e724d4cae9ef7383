pub mod dp_matrix;
pub mod profile;
pub mod sequence;
pub mod trace;

pub use dp_matrix::{DpMatrixFlat, SpecialMatrix};
pub use profile::Profile;
pub use sequence::Sequence;
pub use trace::{Seed, Trace, TraceState, TraceStep};
