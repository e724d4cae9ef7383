pub mod structs;

mod batch;
mod bounded_search;
mod cloud_search;
mod pipeline;

pub use batch::{search_batch, BatchHit};
pub use bounded_search::{backward_bounded, forward_bounded};
pub use cloud_search::{cloud_search_backward, cloud_search_forward};
pub use pipeline::{cloud_search, CloudDebug, CloudSearchOutcome, Workspace};

pub use crate::structs::profile::null1_score;
