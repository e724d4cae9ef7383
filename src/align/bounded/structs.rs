pub mod bound;
pub mod cloud_matrix;
pub mod dp_matrix_sparse;
pub mod edge_rows;
pub mod params;
pub mod row_bounds;

pub use bound::{Bound, BoundMode, Edgebounds};
pub use cloud_matrix::CloudMatrixLinear;
pub use dp_matrix_sparse::DpMatrixSparse;
pub use edge_rows::EdgeRows;
pub use params::{CancelToken, CloudSearchParams, Pruner, ReorientPolicy, UnionPolicy};
pub use row_bounds::RowBounds;

pub use crate::structs::Seed;
