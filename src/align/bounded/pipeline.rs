//! The cloud search pipeline: prune, merge, reorient, then re-score.
//!
//! Stages run strictly in order: forward cloud, backward cloud, reflect +
//! union, reorientation to rows, sparse shaping, bounded Forward, bounded
//! Backward. The cancel token (if any) is polled between stages and once
//! per anti-diagonal inside the sweeps.

use crate::align::bounded::bounded_search::{backward_bounded, forward_bounded};
use crate::align::bounded::cloud_search::{cloud_search_backward, cloud_search_forward};
use crate::align::bounded::structs::bound::Edgebounds;
use crate::align::bounded::structs::cloud_matrix::CloudMatrixLinear;
use crate::align::bounded::structs::dp_matrix_sparse::DpMatrixSparse;
use crate::align::bounded::structs::edge_rows::EdgeRows;
use crate::align::bounded::structs::params::{CloudSearchParams, UnionPolicy};
use crate::align::bounded::structs::row_bounds::RowBounds;
use crate::error::CoreError;
use crate::structs::{Profile, Seed, Sequence};

use tracing::debug;

/// Snapshots of the intermediate edgebound sets, captured when a
/// workspace carries a debug context. Absent by default.
#[derive(Clone, Debug, Default)]
pub struct CloudDebug {
    pub forward_cloud: Edgebounds,
    pub backward_cloud: Edgebounds,
    pub merged_cloud: Edgebounds,
}

/// All scratch one search needs, owned by a worker and reused across
/// successive searches so steady-state runs allocate nothing.
#[derive(Debug, Default)]
pub struct Workspace {
    pub cloud_matrix: CloudMatrixLinear,
    pub forward_bounds: Edgebounds,
    pub backward_bounds: Edgebounds,
    pub merged_bounds: Edgebounds,
    pub edge_rows: EdgeRows,
    pub row_bounds: RowBounds,
    pub forward_matrix: DpMatrixSparse,
    pub backward_matrix: DpMatrixSparse,
    /// Set to `Some` to capture per-stage edgebound snapshots.
    pub debug: Option<CloudDebug>,
}

/// What a completed search hands back. Scores are natural-log odds; NaN
/// or -inf is a legal "no significant match". The borrowed pieces live in
/// the workspace and stay valid until its next search.
#[derive(Debug)]
pub struct CloudSearchOutcome<'w> {
    pub forward_score: f32,
    pub backward_score: f32,
    /// Best cell scores seen by the two cloud sweeps.
    pub cloud_forward_score: f32,
    pub cloud_backward_score: f32,
    /// The merged, row-oriented region that was re-scored.
    pub row_bounds: &'w RowBounds,
    pub forward_matrix: &'w DpMatrixSparse,
    pub backward_matrix: &'w DpMatrixSparse,
    /// The per-row span cap overflowed during reorientation; the region
    /// was bridged rather than truncated.
    pub row_cap_overflow: bool,
}

impl CloudSearchOutcome<'_> {
    /// The dense E/N/J/C/B strip from the bounded Forward pass.
    pub fn specials(&self) -> &[f32] {
        self.forward_matrix.specials.as_slice()
    }
}

/// Run the full cloud-pruned pipeline for one (profile, target, seed)
/// request.
pub fn cloud_search<'w>(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    params: &CloudSearchParams,
    workspace: &'w mut Workspace,
) -> Result<CloudSearchOutcome<'w>, CoreError> {
    let t_len = target.length;
    let p_len = profile.length;
    if t_len == 0 || p_len == 0 {
        return Err(CoreError::InvalidShape(
            "profile and sequence must be non-empty".into(),
        ));
    }
    seed.validate(t_len, p_len)?;

    let cancelled = || {
        if params.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    };

    let cloud_forward_score = cloud_search_forward(
        profile,
        target,
        seed,
        &mut workspace.cloud_matrix,
        params,
        &mut workspace.forward_bounds,
    )?;

    let cloud_backward_score = cloud_search_backward(
        profile,
        target,
        seed,
        &mut workspace.cloud_matrix,
        params,
        &mut workspace.backward_bounds,
    )?;

    if let Some(dbg) = &mut workspace.debug {
        dbg.forward_cloud = workspace.forward_bounds.clone();
        dbg.backward_cloud = workspace.backward_bounds.clone();
    }
    cancelled()?;

    // bring the backward cloud into the row-offset convention, then fuse
    workspace.backward_bounds.reflect()?;
    match params.union_policy {
        UnionPolicy::Exact => Edgebounds::union_into(
            &workspace.forward_bounds,
            &workspace.backward_bounds,
            &mut workspace.merged_bounds,
        )?,
        UnionPolicy::Abridged => Edgebounds::abridged_union_into(
            &workspace.forward_bounds,
            &workspace.backward_bounds,
            &mut workspace.merged_bounds,
        )?,
    }

    if let Some(dbg) = &mut workspace.debug {
        dbg.merged_cloud = workspace.merged_bounds.clone();
    }
    cancelled()?;

    workspace
        .row_bounds
        .rebuild(&workspace.merged_bounds, &mut workspace.edge_rows, params)?;
    cancelled()?;

    workspace
        .forward_matrix
        .reuse(t_len, p_len, &workspace.row_bounds)?;
    workspace
        .backward_matrix
        .reuse(t_len, p_len, &workspace.row_bounds)?;

    let forward_score = forward_bounded(
        profile,
        target,
        &mut workspace.forward_matrix,
        &workspace.row_bounds,
    );
    cancelled()?;

    let backward_score = backward_bounded(
        profile,
        target,
        &mut workspace.backward_matrix,
        &workspace.row_bounds,
    );

    debug!(
        target_name = %target.name,
        profile_name = %profile.name,
        cells = workspace.row_bounds.num_cells(),
        grid = (t_len + 1) * (p_len + 1),
        forward_score = forward_score,
        backward_score = backward_score,
        "cloud search complete"
    );

    Ok(CloudSearchOutcome {
        forward_score,
        backward_score,
        cloud_forward_score,
        cloud_backward_score,
        row_bounds: &workspace.row_bounds,
        forward_matrix: &workspace.forward_matrix,
        backward_matrix: &workspace.backward_matrix,
        row_cap_overflow: workspace.row_bounds.row_cap_overflow,
    })
}
