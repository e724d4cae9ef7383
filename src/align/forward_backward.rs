//! Full-grid Forward and Backward.
//!
//! The reference recurrences that the cloud-pruned pipeline approximates.
//! Quadratic time and memory; used as a baseline by hosts and to pin the
//! bounded implementations in tests.

use crate::error::CoreError;
use crate::log_sum::log_sum;
use crate::structs::dp_matrix::{DELETE, INSERT, MATCH};
use crate::structs::profile::{
    B2M, D2D, D2M, I2I, I2M, M2D, M2I, M2M, SP_B, SP_C, SP_E, SP_J, SP_LOOP, SP_MOVE, SP_N,
};
use crate::structs::{DpMatrixFlat, Profile, Sequence, SpecialMatrix};

fn check_shape(profile: &Profile, target: &Sequence) -> Result<(), CoreError> {
    if profile.length == 0 || target.length == 0 {
        return Err(CoreError::InvalidShape(
            "profile and sequence must be non-empty".into(),
        ));
    }
    Ok(())
}

/// Forward over the whole DP grid. Returns the final log-odds score in
/// nats: `C(target_length) + C_move`.
pub fn forward(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixFlat,
    specials: &mut SpecialMatrix,
) -> Result<f32, CoreError> {
    check_shape(profile, target)?;
    let t_len = target.length;
    let p_len = profile.length;
    matrix.reuse(t_len, p_len)?;
    specials.reuse(t_len)?;

    let sc_e = profile.end_score();

    // S->N with probability 1, then N->B with no N tail
    specials.set(SP_N, 0, 0.0);
    specials.set(SP_B, 0, profile.special_score(SP_N, SP_MOVE));

    for row in 1..=t_len {
        let residue = target.residue(row);
        let mut e_acc = f32::NEG_INFINITY;

        for col in 1..p_len {
            let prev_m = matrix.get(MATCH, row - 1, col - 1) + profile.transition_score(col - 1, M2M);
            let prev_i = matrix.get(INSERT, row - 1, col - 1) + profile.transition_score(col - 1, I2M);
            let prev_d = matrix.get(DELETE, row - 1, col - 1) + profile.transition_score(col - 1, D2M);
            let prev_b = specials.get(SP_B, row - 1) + profile.transition_score(col - 1, B2M);
            let sum = log_sum(log_sum(prev_m, prev_i), log_sum(prev_b, prev_d));
            matrix.set(MATCH, row, col, sum + profile.match_score(col, residue));

            let prev_m = matrix.get(MATCH, row - 1, col) + profile.transition_score(col, M2I);
            let prev_i = matrix.get(INSERT, row - 1, col) + profile.transition_score(col, I2I);
            matrix.set(
                INSERT,
                row,
                col,
                log_sum(prev_m, prev_i) + profile.insert_score(col, residue),
            );

            let prev_m = matrix.get(MATCH, row, col - 1) + profile.transition_score(col - 1, M2D);
            let prev_d = matrix.get(DELETE, row, col - 1) + profile.transition_score(col - 1, D2D);
            matrix.set(DELETE, row, col, log_sum(prev_m, prev_d));

            e_acc = log_sum(
                e_acc,
                log_sum(
                    matrix.get(MATCH, row, col) + sc_e,
                    matrix.get(DELETE, row, col) + sc_e,
                ),
            );
        }

        // final column: no insert state, and E absorbs M and D for free
        let col = p_len;
        let prev_m = matrix.get(MATCH, row - 1, col - 1) + profile.transition_score(col - 1, M2M);
        let prev_i = matrix.get(INSERT, row - 1, col - 1) + profile.transition_score(col - 1, I2M);
        let prev_d = matrix.get(DELETE, row - 1, col - 1) + profile.transition_score(col - 1, D2M);
        let prev_b = specials.get(SP_B, row - 1) + profile.transition_score(col - 1, B2M);
        let sum = log_sum(log_sum(prev_m, prev_i), log_sum(prev_b, prev_d));
        matrix.set(MATCH, row, col, sum + profile.match_score(col, residue));

        let prev_m = matrix.get(MATCH, row, col - 1) + profile.transition_score(col - 1, M2D);
        let prev_d = matrix.get(DELETE, row, col - 1) + profile.transition_score(col - 1, D2D);
        matrix.set(DELETE, row, col, log_sum(prev_m, prev_d));

        e_acc = log_sum(
            e_acc,
            log_sum(matrix.get(MATCH, row, col), matrix.get(DELETE, row, col)),
        );
        specials.set(SP_E, row, e_acc);

        let j = log_sum(
            specials.get(SP_J, row - 1) + profile.special_score(SP_J, SP_LOOP),
            e_acc + profile.special_score(SP_E, SP_LOOP),
        );
        specials.set(SP_J, row, j);

        let c = log_sum(
            specials.get(SP_C, row - 1) + profile.special_score(SP_C, SP_LOOP),
            e_acc + profile.special_score(SP_E, SP_MOVE),
        );
        specials.set(SP_C, row, c);

        let n = specials.get(SP_N, row - 1) + profile.special_score(SP_N, SP_LOOP);
        specials.set(SP_N, row, n);

        let b = log_sum(
            n + profile.special_score(SP_N, SP_MOVE),
            j + profile.special_score(SP_J, SP_MOVE),
        );
        specials.set(SP_B, row, b);
    }

    Ok(specials.get(SP_C, t_len) + profile.special_score(SP_C, SP_MOVE))
}

/// Backward over the whole DP grid. Returns `N(0)`, which matches the
/// Forward score within log-sum tolerance.
pub fn backward(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixFlat,
    specials: &mut SpecialMatrix,
) -> Result<f32, CoreError> {
    check_shape(profile, target)?;
    let t_len = target.length;
    let p_len = profile.length;
    matrix.reuse(t_len, p_len)?;
    specials.reuse(t_len)?;

    let sc_e = profile.end_score();

    specials.set(SP_C, t_len, profile.special_score(SP_C, SP_MOVE));
    specials.set(
        SP_E,
        t_len,
        specials.get(SP_C, t_len) + profile.special_score(SP_E, SP_MOVE),
    );

    matrix.set(MATCH, t_len, p_len, specials.get(SP_E, t_len));
    matrix.set(DELETE, t_len, p_len, specials.get(SP_E, t_len));

    for col in (1..p_len).rev() {
        matrix.set(
            MATCH,
            t_len,
            col,
            log_sum(
                specials.get(SP_E, t_len) + sc_e,
                matrix.get(DELETE, t_len, col + 1) + profile.transition_score(col, M2D),
            ),
        );
        matrix.set(
            DELETE,
            t_len,
            col,
            log_sum(
                specials.get(SP_E, t_len) + sc_e,
                matrix.get(DELETE, t_len, col + 1) + profile.transition_score(col, D2D),
            ),
        );
    }

    for row in (1..t_len).rev() {
        let next_residue = target.residue(row + 1);

        let mut b = f32::NEG_INFINITY;
        for col in 1..=p_len {
            b = log_sum(
                b,
                matrix.get(MATCH, row + 1, col)
                    + profile.transition_score(col - 1, B2M)
                    + profile.match_score(col, next_residue),
            );
        }
        specials.set(SP_B, row, b);

        let j = log_sum(
            specials.get(SP_J, row + 1) + profile.special_score(SP_J, SP_LOOP),
            b + profile.special_score(SP_J, SP_MOVE),
        );
        specials.set(SP_J, row, j);

        let c = specials.get(SP_C, row + 1) + profile.special_score(SP_C, SP_LOOP);
        specials.set(SP_C, row, c);

        let e = log_sum(
            j + profile.special_score(SP_E, SP_LOOP),
            c + profile.special_score(SP_E, SP_MOVE),
        );
        specials.set(SP_E, row, e);

        let n = log_sum(
            specials.get(SP_N, row + 1) + profile.special_score(SP_N, SP_LOOP),
            b + profile.special_score(SP_N, SP_MOVE),
        );
        specials.set(SP_N, row, n);

        matrix.set(MATCH, row, p_len, e);
        matrix.set(DELETE, row, p_len, e);

        for col in (1..p_len).rev() {
            let sc_m = profile.match_score(col + 1, next_residue);
            let sc_i = profile.insert_score(col, next_residue);

            let m_next = matrix.get(MATCH, row + 1, col + 1)
                + profile.transition_score(col, M2M)
                + sc_m;
            let i_next =
                matrix.get(INSERT, row + 1, col) + profile.transition_score(col, M2I) + sc_i;
            let d_next = matrix.get(DELETE, row, col + 1) + profile.transition_score(col, M2D);
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
            let d_next = matrix.get(DELETE, row, col + 1) + profile.transition_score(col, D2D);
            matrix.set(
                DELETE,
                row,
                col,
                log_sum(m_next, log_sum(d_next, e_next)),
            );
        }
    }

    // closing row: only N and B are reachable before the first residue
    let first_residue = target.residue(1);
    let mut b = f32::NEG_INFINITY;
    for col in 1..=p_len {
        b = log_sum(
            b,
            matrix.get(MATCH, 1, col)
                + profile.transition_score(col - 1, B2M)
                + profile.match_score(col, first_residue),
        );
    }
    specials.set(SP_B, 0, b);

    let n = log_sum(
        specials.get(SP_N, 1) + profile.special_score(SP_N, SP_LOOP),
        b + profile.special_score(SP_N, SP_MOVE),
    );
    specials.set(SP_N, 0, n);

    Ok(n)
}
