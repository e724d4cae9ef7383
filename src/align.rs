pub mod bounded;
pub mod forward_backward;
pub mod viterbi;

pub use forward_backward::{backward, forward};
pub use viterbi::{traceback, viterbi};
