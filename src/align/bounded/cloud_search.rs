//! Anti-diagonal cloud sweeps.
//!
//! Forward and Backward variants walk the DP grid in anti-diagonal order
//! from a seed anchor, computing Forward-style log-sum recurrences inside
//! an adaptively shrinking window. After each anti-diagonal, cells that
//! score too far below the running maximum are dropped; the spans that
//! survive become the cloud's edgebounds.
//!
//! The sweeps explore a single local alignment pass, so the begin scores
//! feeding the match recurrence come from the N-state chain alone and the
//! end scores from the C-state chain; the full multi-hit special loop is
//! restored by the bounded passes that follow.

use crate::align::bounded::structs::bound::{Bound, BoundMode, Edgebounds};
use crate::align::bounded::structs::cloud_matrix::CloudMatrixLinear;
use crate::align::bounded::structs::params::{CloudSearchParams, Pruner};
use crate::error::CoreError;
use crate::log_sum::log_sum;
use crate::structs::dp_matrix::{DELETE, INSERT, MATCH};
use crate::structs::profile::{
    B2M, D2D, D2M, I2I, I2M, M2D, M2I, M2M, SP_C, SP_E, SP_LOOP, SP_MOVE, SP_N,
};
use crate::structs::{Profile, Seed, Sequence};

#[inline]
fn best_of(matrix: &CloudMatrixLinear, plane: usize, col: usize) -> f32 {
    matrix
        .get(plane, MATCH, col)
        .max(matrix.get(plane, INSERT, col))
        .max(matrix.get(plane, DELETE, col))
}

/// Decide which rows of the just-computed anti-diagonal survive.
///
/// `runs` receives ascending, disjoint `[begin, end)` row ranges. With
/// pruning inactive (still inside the free passes) the whole window
/// survives.
#[allow(clippy::too_many_arguments)]
fn prune_diag(
    matrix: &CloudMatrixLinear,
    plane: usize,
    diag: usize,
    lo: usize,
    hi: usize,
    params: &CloudSearchParams,
    diag_max: f32,
    total_max: f32,
    prune_active: bool,
    runs: &mut Vec<(usize, usize)>,
) {
    runs.clear();
    if !prune_active {
        runs.push((lo, hi));
        return;
    }

    let keep = |row: usize| -> bool {
        let best = best_of(matrix, plane, diag - row);
        match params.pruner {
            Pruner::XdropEdgeTrim | Pruner::XdropBifurcate => best >= diag_max - params.alpha,
            // a second gate against the overall cloud max ends decayed
            // clouds quickly
            Pruner::DoubleXdropOrDie => {
                best >= diag_max - params.alpha && best >= total_max - 2.0 * params.alpha
            }
        }
    };

    match params.pruner {
        Pruner::XdropEdgeTrim | Pruner::DoubleXdropOrDie => {
            let mut begin = lo;
            while begin < hi && !keep(begin) {
                begin += 1;
            }
            let mut end = hi;
            while end > begin && !keep(end - 1) {
                end -= 1;
            }
            if begin < end {
                runs.push((begin, end));
            }
        }
        Pruner::XdropBifurcate => {
            let mut row = lo;
            while row < hi {
                while row < hi && !keep(row) {
                    row += 1;
                }
                let begin = row;
                while row < hi && keep(row) {
                    row += 1;
                }
                if begin < row {
                    runs.push((begin, row));
                }
            }
        }
    }
}

/// Scrub every cell of the plane that was computed (or sits one past the
/// window edge) but did not survive, so later diagonals read -inf there.
fn scrub_pruned(
    matrix: &mut CloudMatrixLinear,
    plane: usize,
    diag: usize,
    lo: usize,
    hi: usize,
    runs: &[(usize, usize)],
) {
    let p_len = matrix.profile_length;
    for row in (lo - 1)..=hi {
        if runs.iter().any(|&(begin, end)| (begin..end).contains(&row)) {
            continue;
        }
        if diag >= row {
            let col = diag - row;
            if col <= p_len {
                matrix.scrub_cell(plane, col);
            }
        }
    }
}

/// Forward cloud sweep from the seed's start anchor.
///
/// Emits anti-diagonal bounds whose offsets are target rows, sorted
/// ascending, and returns the best cell score seen in the cloud.
pub fn cloud_search_forward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut Edgebounds,
) -> Result<f32, CoreError> {
    let t_len = target.length;
    let p_len = profile.length;
    seed.validate(t_len, p_len)?;

    cloud_matrix.reuse(p_len)?;
    bounds.reuse(BoundMode::ByDiag, t_len, p_len);

    let n_loop = profile.special_score(SP_N, SP_LOOP);
    let n_move = profile.special_score(SP_N, SP_MOVE);
    // begin score via the N chain: no residues consumed by J inside one pass
    let begin_score = |row: usize| n_move + row as f32 * n_loop;

    let start_row = seed.target_start;
    let start_col = seed.profile_start;
    let d_start = start_row + start_col;
    let d_end = t_len + p_len;

    cloud_matrix.scrub_plane((d_start + 1) % 3);
    cloud_matrix.scrub_plane((d_start + 2) % 3);

    let mut lb = start_row;
    let mut rb = start_row + 1;
    let mut total_max = f32::NEG_INFINITY;
    let mut stale_diags = 0usize;
    let mut runs: Vec<(usize, usize)> = vec![];

    for diag in d_start..=d_end {
        if params.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let lo = lb.max(diag.saturating_sub(p_len));
        let hi = rb.min(t_len + 1).min(diag - start_col + 1);
        if lo >= hi {
            break;
        }

        let plane_0 = diag % 3;
        let plane_1 = (diag + 2) % 3; // diag - 1
        let plane_2 = (diag + 1) % 3; // diag - 2

        let mut diag_max = f32::NEG_INFINITY;
        for row in lo..hi {
            let col = diag - row;
            let residue = target.residue(row);

            let prev_m =
                cloud_matrix.get(plane_2, MATCH, col - 1) + profile.transition_score(col - 1, M2M);
            let prev_i =
                cloud_matrix.get(plane_2, INSERT, col - 1) + profile.transition_score(col - 1, I2M);
            let prev_d =
                cloud_matrix.get(plane_2, DELETE, col - 1) + profile.transition_score(col - 1, D2M);
            let prev_b = begin_score(row - 1) + profile.transition_score(col - 1, B2M);
            let sum = log_sum(log_sum(prev_m, prev_i), log_sum(prev_b, prev_d));
            let m = sum + profile.match_score(col, residue);
            cloud_matrix.set(plane_0, MATCH, col, m);

            let i = if col == p_len {
                f32::NEG_INFINITY
            } else {
                let prev_m =
                    cloud_matrix.get(plane_1, MATCH, col) + profile.transition_score(col, M2I);
                let prev_i =
                    cloud_matrix.get(plane_1, INSERT, col) + profile.transition_score(col, I2I);
                log_sum(prev_m, prev_i) + profile.insert_score(col, residue)
            };
            cloud_matrix.set(plane_0, INSERT, col, i);

            let prev_m =
                cloud_matrix.get(plane_1, MATCH, col - 1) + profile.transition_score(col - 1, M2D);
            let prev_d =
                cloud_matrix.get(plane_1, DELETE, col - 1) + profile.transition_score(col - 1, D2D);
            let d = log_sum(prev_m, prev_d);
            cloud_matrix.set(plane_0, DELETE, col, d);

            diag_max = diag_max.max(m).max(i).max(d);
        }

        // a diagonal with no viable cell ends the cloud
        if diag_max == f32::NEG_INFINITY {
            break;
        }

        if diag_max > total_max {
            total_max = diag_max;
            stale_diags = 0;
        } else {
            stale_diags += 1;
        }

        let prune_active = diag - d_start >= params.beta;
        prune_diag(
            cloud_matrix,
            plane_0,
            diag,
            lo,
            hi,
            params,
            diag_max,
            total_max,
            prune_active,
            &mut runs,
        );
        scrub_pruned(cloud_matrix, plane_0, diag, lo, hi, &runs);

        if runs.is_empty() {
            break;
        }
        for &(begin, end) in &runs {
            bounds.push(Bound::new(diag as i32, begin as i32, end as i32));
        }

        lb = runs.first().unwrap().0;
        rb = runs.last().unwrap().1 + 1;

        if params.gamma > 0 && stale_diags >= params.gamma {
            break;
        }
    }

    Ok(total_max)
}

/// Backward cloud sweep from the seed's end anchor.
///
/// Emits anti-diagonal bounds whose offsets are profile columns; callers
/// reflect them before unioning with a forward cloud.
pub fn cloud_search_backward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut Edgebounds,
) -> Result<f32, CoreError> {
    let t_len = target.length;
    let p_len = profile.length;
    seed.validate(t_len, p_len)?;

    cloud_matrix.reuse(p_len)?;
    bounds.reuse(BoundMode::ByDiag, t_len, p_len);

    let sc_e = profile.end_score();
    let c_loop = profile.special_score(SP_C, SP_LOOP);
    let c_move = profile.special_score(SP_C, SP_MOVE);
    let e_move = profile.special_score(SP_E, SP_MOVE);
    // end score via the C chain: E -> C, then C loops out the tail
    let end_score = |row: usize| c_move + (t_len - row) as f32 * c_loop + e_move;

    let end_row = seed.target_end;
    let end_col = seed.profile_end;
    let d_start = end_row + end_col;

    cloud_matrix.scrub_plane((d_start + 1) % 3);
    cloud_matrix.scrub_plane((d_start + 2) % 3);

    let mut lb = end_row;
    let mut rb = end_row + 1;
    let mut total_max = f32::NEG_INFINITY;
    let mut stale_diags = 0usize;
    let mut runs: Vec<(usize, usize)> = vec![];

    for diag in (2..=d_start).rev() {
        if params.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let lo = lb.max(1).max(diag.saturating_sub(end_col));
        let hi = rb.min(diag);
        if lo >= hi {
            break;
        }

        let plane_0 = diag % 3;
        let plane_1 = (diag + 1) % 3;
        let plane_2 = (diag + 2) % 3;

        let mut diag_max = f32::NEG_INFINITY;
        for row in lo..hi {
            let col = diag - row;

            let (m, i, d);
            if col == p_len {
                // exit through the final column is free
                m = end_score(row);
                i = f32::NEG_INFINITY;
                d = end_score(row);
            } else {
                let (sc_m, sc_i) = if row < t_len {
                    let next_residue = target.residue(row + 1);
                    (
                        profile.match_score(col + 1, next_residue),
                        profile.insert_score(col, next_residue),
                    )
                } else {
                    (f32::NEG_INFINITY, f32::NEG_INFINITY)
                };

                let m_next = cloud_matrix.get(plane_2, MATCH, col + 1)
                    + profile.transition_score(col, M2M)
                    + sc_m;
                let i_next = cloud_matrix.get(plane_1, INSERT, col)
                    + profile.transition_score(col, M2I)
                    + sc_i;
                let d_next =
                    cloud_matrix.get(plane_1, DELETE, col + 1) + profile.transition_score(col, M2D);
                let e_next = end_score(row) + sc_e;
                m = log_sum(log_sum(m_next, i_next), log_sum(e_next, d_next));

                let m_next = cloud_matrix.get(plane_2, MATCH, col + 1)
                    + profile.transition_score(col, I2M)
                    + sc_m;
                let i_next = cloud_matrix.get(plane_1, INSERT, col)
                    + profile.transition_score(col, I2I)
                    + sc_i;
                i = log_sum(m_next, i_next);

                let m_next = cloud_matrix.get(plane_2, MATCH, col + 1)
                    + profile.transition_score(col, D2M)
                    + sc_m;
                let d_next =
                    cloud_matrix.get(plane_1, DELETE, col + 1) + profile.transition_score(col, D2D);
                d = log_sum(m_next, log_sum(d_next, e_next));
            }

            cloud_matrix.set(plane_0, MATCH, col, m);
            cloud_matrix.set(plane_0, INSERT, col, i);
            cloud_matrix.set(plane_0, DELETE, col, d);

            diag_max = diag_max.max(m).max(i).max(d);
        }

        // a diagonal with no viable cell ends the cloud
        if diag_max == f32::NEG_INFINITY {
            break;
        }

        if diag_max > total_max {
            total_max = diag_max;
            stale_diags = 0;
        } else {
            stale_diags += 1;
        }

        let prune_active = d_start - diag >= params.beta;
        prune_diag(
            cloud_matrix,
            plane_0,
            diag,
            lo,
            hi,
            params,
            diag_max,
            total_max,
            prune_active,
            &mut runs,
        );
        scrub_pruned(cloud_matrix, plane_0, diag, lo, hi, &runs);

        if runs.is_empty() {
            break;
        }
        for &(begin, end) in &runs {
            // offsets recorded as profile columns, mirroring the sweep
            // direction; reflect() recovers the row convention
            bounds.push(Bound::new(
                diag as i32,
                (diag - end + 1) as i32,
                (diag - begin + 1) as i32,
            ));
        }

        lb = runs.first().unwrap().0.saturating_sub(1);
        rb = runs.last().unwrap().1;

        if params.gamma > 0 && stale_diags >= params.gamma {
            break;
        }
    }

    bounds.sort();
    Ok(total_max)
}
