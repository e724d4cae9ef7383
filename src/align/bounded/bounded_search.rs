//! Row-bounded Forward and Backward.
//!
//! The same recurrences as the full-grid algorithms, restricted to the
//! cells enumerated by a row bound set and stored sparsely. Reads from
//! cells outside the bounds see -inf, so paths are confined to the cloud;
//! the special-state strip stays dense and is updated on every row.

use crate::align::bounded::structs::dp_matrix_sparse::DpMatrixSparse;
use crate::align::bounded::structs::row_bounds::RowBounds;
use crate::log_sum::log_sum;
use crate::structs::dp_matrix::{DELETE, INSERT, MATCH};
use crate::structs::profile::{
    B2M, D2D, D2M, I2I, I2M, M2D, M2I, M2M, SP_B, SP_C, SP_E, SP_J, SP_LOOP, SP_MOVE, SP_N,
};
use crate::structs::{Profile, Sequence};

/// Bounded Forward. The matrix must be shaped to `row_bounds` before the
/// call. Returns the log-odds score in nats; -inf means no path through
/// the cloud.
pub fn forward_bounded(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixSparse,
    row_bounds: &RowBounds,
) -> f32 {
    let t_len = target.length;
    let p_len = profile.length;
    let sc_e = profile.end_score();

    matrix.specials.fill(f32::NEG_INFINITY);
    matrix.specials.set(SP_N, 0, 0.0);
    matrix
        .specials
        .set(SP_B, 0, profile.special_score(SP_N, SP_MOVE));

    for row in 1..=t_len {
        let residue = target.residue(row);
        let mut e_acc = f32::NEG_INFINITY;

        for bound in row_bounds.bounds_for_row(row) {
            for col in bound.lb as usize..bound.rb as usize {
                let prev_m = matrix.get(MATCH, row - 1, col - 1)
                    + profile.transition_score(col - 1, M2M);
                let prev_i = matrix.get(INSERT, row - 1, col - 1)
                    + profile.transition_score(col - 1, I2M);
                let prev_d = matrix.get(DELETE, row - 1, col - 1)
                    + profile.transition_score(col - 1, D2M);
                let prev_b = matrix.specials.get(SP_B, row - 1)
                    + profile.transition_score(col - 1, B2M);
                let sum = log_sum(log_sum(prev_m, prev_i), log_sum(prev_b, prev_d));
                let m = sum + profile.match_score(col, residue);
                matrix.set(MATCH, row, col, m);

                let i = if col == p_len {
                    f32::NEG_INFINITY
                } else {
                    let prev_m =
                        matrix.get(MATCH, row - 1, col) + profile.transition_score(col, M2I);
                    let prev_i =
                        matrix.get(INSERT, row - 1, col) + profile.transition_score(col, I2I);
                    log_sum(prev_m, prev_i) + profile.insert_score(col, residue)
                };
                matrix.set(INSERT, row, col, i);

                let prev_m =
                    matrix.get(MATCH, row, col - 1) + profile.transition_score(col - 1, M2D);
                let prev_d =
                    matrix.get(DELETE, row, col - 1) + profile.transition_score(col - 1, D2D);
                let d = log_sum(prev_m, prev_d);
                matrix.set(DELETE, row, col, d);

                // the final column exits to E for free
                e_acc = if col == p_len {
                    log_sum(e_acc, log_sum(m, d))
                } else {
                    log_sum(e_acc, log_sum(m + sc_e, d + sc_e))
                };
            }
        }

        matrix.specials.set(SP_E, row, e_acc);

        let j = log_sum(
            matrix.specials.get(SP_J, row - 1) + profile.special_score(SP_J, SP_LOOP),
            e_acc + profile.special_score(SP_E, SP_LOOP),
        );
        matrix.specials.set(SP_J, row, j);

        let c = log_sum(
            matrix.specials.get(SP_C, row - 1) + profile.special_score(SP_C, SP_LOOP),
            e_acc + profile.special_score(SP_E, SP_MOVE),
        );
        matrix.specials.set(SP_C, row, c);

        let n = matrix.specials.get(SP_N, row - 1) + profile.special_score(SP_N, SP_LOOP);
        matrix.specials.set(SP_N, row, n);

        let b = log_sum(
            n + profile.special_score(SP_N, SP_MOVE),
            j + profile.special_score(SP_J, SP_MOVE),
        );
        matrix.specials.set(SP_B, row, b);
    }

    matrix.specials.get(SP_C, t_len) + profile.special_score(SP_C, SP_MOVE)
}

/// Bounded Backward over the same cell set. Returns `N(0)`, which agrees
/// with the bounded Forward score within log-sum tolerance.
pub fn backward_bounded(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixSparse,
    row_bounds: &RowBounds,
) -> f32 {
    let t_len = target.length;
    let p_len = profile.length;
    let sc_e = profile.end_score();

    matrix.specials.fill(f32::NEG_INFINITY);
    matrix
        .specials
        .set(SP_C, t_len, profile.special_score(SP_C, SP_MOVE));
    matrix.specials.set(
        SP_E,
        t_len,
        matrix.specials.get(SP_C, t_len) + profile.special_score(SP_E, SP_MOVE),
    );

    let e_last = matrix.specials.get(SP_E, t_len);
    for bound in row_bounds.bounds_for_row(t_len).iter().rev() {
        for col in (bound.lb as usize..bound.rb as usize).rev() {
            matrix.set(INSERT, t_len, col, f32::NEG_INFINITY);
            if col == p_len {
                matrix.set(MATCH, t_len, col, e_last);
                matrix.set(DELETE, t_len, col, e_last);
            } else {
                let m = log_sum(
                    e_last + sc_e,
                    matrix.get(DELETE, t_len, col + 1) + profile.transition_score(col, M2D),
                );
                matrix.set(MATCH, t_len, col, m);
                let d = log_sum(
                    e_last + sc_e,
                    matrix.get(DELETE, t_len, col + 1) + profile.transition_score(col, D2D),
                );
                matrix.set(DELETE, t_len, col, d);
            }
        }
    }

    for row in (1..t_len).rev() {
        let next_residue = target.residue(row + 1);

        let mut b = f32::NEG_INFINITY;
        for bound in row_bounds.bounds_for_row(row + 1) {
            for col in bound.lb as usize..bound.rb as usize {
                b = log_sum(
                    b,
                    matrix.get(MATCH, row + 1, col)
                        + profile.transition_score(col - 1, B2M)
                        + profile.match_score(col, next_residue),
                );
            }
        }
        matrix.specials.set(SP_B, row, b);

        let j = log_sum(
            matrix.specials.get(SP_J, row + 1) + profile.special_score(SP_J, SP_LOOP),
            b + profile.special_score(SP_J, SP_MOVE),
        );
        matrix.specials.set(SP_J, row, j);

        let c = matrix.specials.get(SP_C, row + 1) + profile.special_score(SP_C, SP_LOOP);
        matrix.specials.set(SP_C, row, c);

        let e = log_sum(
            j + profile.special_score(SP_E, SP_LOOP),
            c + profile.special_score(SP_E, SP_MOVE),
        );
        matrix.specials.set(SP_E, row, e);

        let n = log_sum(
            matrix.specials.get(SP_N, row + 1) + profile.special_score(SP_N, SP_LOOP),
            b + profile.special_score(SP_N, SP_MOVE),
        );
        matrix.specials.set(SP_N, row, n);

        for bound in row_bounds.bounds_for_row(row).iter().rev() {
            for col in (bound.lb as usize..bound.rb as usize).rev() {
                if col == p_len {
                    matrix.set(MATCH, row, col, e);
                    matrix.set(DELETE, row, col, e);
                    matrix.set(INSERT, row, col, f32::NEG_INFINITY);
                    continue;
                }

                let sc_m = profile.match_score(col + 1, next_residue);
                let sc_i = profile.insert_score(col, next_residue);

                let m_next = matrix.get(MATCH, row + 1, col + 1)
                    + profile.transition_score(col, M2M)
                    + sc_m;
                let i_next =
                    matrix.get(INSERT, row + 1, col) + profile.transition_score(col, M2I) + sc_i;
                let d_next =
                    matrix.get(DELETE, row, col + 1) + profile.transition_score(col, M2D);
                let e_next = e + sc_e;
                matrix.set(
                    MATCH,
                    row,
                    col,
                    log_sum(log_sum(m_next, i_next), log_sum(e_next, d_next)),
                );

                let m_next = matrix.get(MATCH, row + 1, col + 1)
                    + profile.transition_score(col, I2M)
                    + sc_m;
                let i_next =
                    matrix.get(INSERT, row + 1, col) + profile.transition_score(col, I2I) + sc_i;
                matrix.set(INSERT, row, col, log_sum(m_next, i_next));

                let m_next = matrix.get(MATCH, row + 1, col + 1)
                    + profile.transition_score(col, D2M)
                    + sc_m;
                let d_next =
                    matrix.get(DELETE, row, col + 1) + profile.transition_score(col, D2D);
                matrix.set(DELETE, row, col, log_sum(m_next, log_sum(d_next, e_next)));
            }
        }
    }

    let first_residue = target.residue(1);
    let mut b = f32::NEG_INFINITY;
    for bound in row_bounds.bounds_for_row(1) {
        for col in bound.lb as usize..bound.rb as usize {
            b = log_sum(
                b,
                matrix.get(MATCH, 1, col)
                    + profile.transition_score(col - 1, B2M)
                    + profile.match_score(col, first_residue),
            );
        }
    }
    matrix.specials.set(SP_B, 0, b);

    let n = log_sum(
        matrix.specials.get(SP_N, 1) + profile.special_score(SP_N, SP_LOOP),
        b + profile.special_score(SP_N, SP_MOVE),
    );
    matrix.specials.set(SP_N, 0, n);

    n
}
