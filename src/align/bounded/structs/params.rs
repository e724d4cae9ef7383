use crate::align::bounded::structs::edge_rows::DEFAULT_ROW_CAP;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How the forward and backward clouds are unioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnionPolicy {
    /// Keep every disjoint span.
    Exact,
    /// Collapse each anti-diagonal to a single span.
    #[default]
    Abridged,
}

/// How anti-diagonal bounds are converted to row bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorientPolicy {
    /// One row span per contiguous run of cells (within the gap
    /// tolerance).
    Exact,
    /// One row span from the leftmost to the rightmost cell on the row.
    #[default]
    Abridged,
}

/// Strategy for dropping cells at the trailing edge of each anti-diagonal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pruner {
    /// Trim cells below `diag_max - alpha` from both edges of the
    /// diagonal span.
    #[default]
    XdropEdgeTrim,
    /// Same threshold, but interior failures split the diagonal into
    /// multiple spans.
    XdropBifurcate,
    /// Edge trimming against both the diagonal max and the overall cloud
    /// max. The historical name notwithstanding, overflowing the per-row
    /// span cap bridges and warns; it never aborts.
    DoubleXdropOrDie,
}

/// Cooperative cancellation handle. Clones share the same flag; the search
/// polls it between stages and once per anti-diagonal, and returns
/// `CoreError::Cancelled` with all scratch left reusable.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Tuning knobs for one cloud search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloudSearchParams {
    /// Pruning drop threshold in nats: cells scoring below the running
    /// max by more than this are dropped.
    pub alpha: f32,
    /// Free passes: number of anti-diagonals computed before pruning
    /// starts.
    pub beta: usize,
    /// Safety cap: stop after this many anti-diagonals without the cloud
    /// max improving. Zero disables the cap.
    pub gamma: usize,
    pub pruner: Pruner,
    pub union_policy: UnionPolicy,
    pub reorient_policy: ReorientPolicy,
    /// Maximum column gap bridged when reorienting under the exact
    /// policy.
    pub gap_tolerance: i32,
    /// Spans kept per row before bridging kicks in.
    pub row_cap: usize,
    /// Optional cooperative cancellation handle.
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for CloudSearchParams {
    fn default() -> Self {
        CloudSearchParams {
            alpha: 12.0,
            beta: 5,
            gamma: 0,
            pruner: Pruner::default(),
            union_policy: UnionPolicy::default(),
            reorient_policy: ReorientPolicy::default(),
            gap_tolerance: 0,
            row_cap: DEFAULT_ROW_CAP,
            cancel: None,
        }
    }
}

impl CloudSearchParams {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }
}
