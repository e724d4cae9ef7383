//! Viterbi and its traceback.
//!
//! The rough optimal-path alignment whose first and last match cells
//! anchor a cloud search. Same grid and transitions as Forward, with max
//! in place of log-sum.

use crate::error::CoreError;
use crate::structs::dp_matrix::{DELETE, INSERT, MATCH};
use crate::structs::profile::{
    B2M, D2D, D2M, I2I, I2M, M2D, M2I, M2M, SP_B, SP_C, SP_E, SP_J, SP_LOOP, SP_MOVE, SP_N,
};
use crate::structs::{DpMatrixFlat, Profile, Sequence, SpecialMatrix, Trace, TraceState};

/// Viterbi over the whole DP grid. Returns the optimal path score in
/// nats; the filled matrices feed [`traceback`].
pub fn viterbi(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixFlat,
    specials: &mut SpecialMatrix,
) -> Result<f32, CoreError> {
    if profile.length == 0 || target.length == 0 {
        return Err(CoreError::InvalidShape(
            "profile and sequence must be non-empty".into(),
        ));
    }
    let t_len = target.length;
    let p_len = profile.length;
    matrix.reuse(t_len, p_len)?;
    specials.reuse(t_len)?;

    let sc_e = profile.end_score();

    specials.set(SP_N, 0, 0.0);
    specials.set(SP_B, 0, profile.special_score(SP_N, SP_MOVE));

    for row in 1..=t_len {
        let residue = target.residue(row);
        let mut e_best = f32::NEG_INFINITY;

        for col in 1..=p_len {
            let prev_m =
                matrix.get(MATCH, row - 1, col - 1) + profile.transition_score(col - 1, M2M);
            let prev_i =
                matrix.get(INSERT, row - 1, col - 1) + profile.transition_score(col - 1, I2M);
            let prev_d =
                matrix.get(DELETE, row - 1, col - 1) + profile.transition_score(col - 1, D2M);
            let prev_b =
                specials.get(SP_B, row - 1) + profile.transition_score(col - 1, B2M);
            let best = prev_m.max(prev_i).max(prev_d).max(prev_b);
            let m = best + profile.match_score(col, residue);
            matrix.set(MATCH, row, col, m);

            if col < p_len {
                let prev_m = matrix.get(MATCH, row - 1, col) + profile.transition_score(col, M2I);
                let prev_i = matrix.get(INSERT, row - 1, col) + profile.transition_score(col, I2I);
                matrix.set(
                    INSERT,
                    row,
                    col,
                    prev_m.max(prev_i) + profile.insert_score(col, residue),
                );
            }

            let prev_m = matrix.get(MATCH, row, col - 1) + profile.transition_score(col - 1, M2D);
            let prev_d = matrix.get(DELETE, row, col - 1) + profile.transition_score(col - 1, D2D);
            matrix.set(DELETE, row, col, prev_m.max(prev_d));

            // E takes match exits everywhere, plus both states at the
            // final column for free
            if col == p_len {
                e_best = e_best.max(m).max(matrix.get(DELETE, row, col));
            } else {
                e_best = e_best.max(m + sc_e);
            }
        }
        specials.set(SP_E, row, e_best);

        let j = (specials.get(SP_J, row - 1) + profile.special_score(SP_J, SP_LOOP))
            .max(e_best + profile.special_score(SP_E, SP_LOOP));
        specials.set(SP_J, row, j);

        let c = (specials.get(SP_C, row - 1) + profile.special_score(SP_C, SP_LOOP))
            .max(e_best + profile.special_score(SP_E, SP_MOVE));
        specials.set(SP_C, row, c);

        let n = specials.get(SP_N, row - 1) + profile.special_score(SP_N, SP_LOOP);
        specials.set(SP_N, row, n);

        let b = (n + profile.special_score(SP_N, SP_MOVE))
            .max(j + profile.special_score(SP_J, SP_MOVE));
        specials.set(SP_B, row, b);
    }

    Ok(specials.get(SP_C, t_len) + profile.special_score(SP_C, SP_MOVE))
}

/// Reconstruct the optimal path from matrices filled by [`viterbi`].
///
/// Predecessors are recovered by exact score equality, which holds
/// because each candidate is recomputed with the same expression that
/// produced it.
pub fn traceback(
    profile: &Profile,
    target: &Sequence,
    matrix: &DpMatrixFlat,
    specials: &SpecialMatrix,
    trace: &mut Trace,
) -> Result<(), CoreError> {
    let t_len = target.length;
    let p_len = profile.length;
    let sc_e = profile.end_score();

    if specials.get(SP_C, t_len) == f32::NEG_INFINITY {
        return Err(CoreError::InvariantViolation(
            "traceback from an unreachable terminal state".into(),
        ));
    }

    *trace = Trace::new(t_len, p_len);
    trace.push(TraceState::Terminal, t_len, 0);

    let mut state = TraceState::Terminal;
    let mut row = t_len;
    let mut col = 0usize;

    while state != TraceState::Start {
        let step = match state {
            TraceState::Terminal => {
                let c = specials.get(SP_C, row);
                if c == specials.get(SP_E, row) + profile.special_score(SP_E, SP_MOVE) {
                    (TraceState::End, row, 0)
                } else {
                    (TraceState::Terminal, row - 1, 0)
                }
            }
            TraceState::End => {
                let e = specials.get(SP_E, row);
                let mut found = None;
                for j in 1..=p_len {
                    let m = matrix.get(MATCH, row, j);
                    if (j == p_len && e == m) || (j < p_len && e == m + sc_e) {
                        found = Some((TraceState::Match, row, j));
                        break;
                    }
                    if j == p_len && e == matrix.get(DELETE, row, j) {
                        found = Some((TraceState::Delete, row, j));
                        break;
                    }
                }
                found.ok_or_else(|| {
                    CoreError::InvariantViolation("end state has no source cell".into())
                })?
            }
            TraceState::Match => {
                let m = matrix.get(MATCH, row, col);
                let residue = target.residue(row);
                let emission = profile.match_score(col, residue);
                let from_b = specials.get(SP_B, row - 1)
                    + profile.transition_score(col - 1, B2M)
                    + emission;
                let from_m = matrix.get(MATCH, row - 1, col - 1)
                    + profile.transition_score(col - 1, M2M)
                    + emission;
                let from_i = matrix.get(INSERT, row - 1, col - 1)
                    + profile.transition_score(col - 1, I2M)
                    + emission;
                let from_d = matrix.get(DELETE, row - 1, col - 1)
                    + profile.transition_score(col - 1, D2M)
                    + emission;
                if m == from_m {
                    (TraceState::Match, row - 1, col - 1)
                } else if m == from_b {
                    (TraceState::Begin, row - 1, 0)
                } else if m == from_i {
                    (TraceState::Insert, row - 1, col - 1)
                } else if m == from_d {
                    (TraceState::Delete, row - 1, col - 1)
                } else {
                    return Err(CoreError::InvariantViolation(format!(
                        "match state ({row}, {col}) has no source"
                    )));
                }
            }
            TraceState::Insert => {
                let i = matrix.get(INSERT, row, col);
                let residue = target.residue(row);
                let emission = profile.insert_score(col, residue);
                let from_m =
                    matrix.get(MATCH, row - 1, col) + profile.transition_score(col, M2I) + emission;
                if i == from_m {
                    (TraceState::Match, row - 1, col)
                } else {
                    (TraceState::Insert, row - 1, col)
                }
            }
            TraceState::Delete => {
                let d = matrix.get(DELETE, row, col);
                let from_m =
                    matrix.get(MATCH, row, col - 1) + profile.transition_score(col - 1, M2D);
                if d == from_m {
                    (TraceState::Match, row, col - 1)
                } else {
                    (TraceState::Delete, row, col - 1)
                }
            }
            TraceState::Begin => {
                let b = specials.get(SP_B, row);
                if b == specials.get(SP_N, row) + profile.special_score(SP_N, SP_MOVE) {
                    (TraceState::New, row, 0)
                } else {
                    (TraceState::Jump, row, 0)
                }
            }
            TraceState::Jump => {
                let j = specials.get(SP_J, row);
                if row > 0
                    && j == specials.get(SP_J, row - 1) + profile.special_score(SP_J, SP_LOOP)
                {
                    (TraceState::Jump, row - 1, 0)
                } else {
                    (TraceState::End, row, 0)
                }
            }
            TraceState::New => {
                if row == 0 {
                    (TraceState::Start, 0, 0)
                } else {
                    (TraceState::New, row - 1, 0)
                }
            }
            TraceState::Start => unreachable!(),
        };

        state = step.0;
        row = step.1;
        col = step.2;
        trace.push(state, row, col);
    }

    trace.steps.reverse();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::forward_backward::forward;
    use crate::structs::Seed;
    use crate::test_fixtures::{ramp_profile, ramp_target};

    #[test]
    fn viterbi_never_exceeds_forward() {
        let profile = ramp_profile(8);
        let target = ramp_target(8);

        let mut matrix = DpMatrixFlat::default();
        let mut specials = SpecialMatrix::default();
        let vit = viterbi(&profile, &target, &mut matrix, &mut specials).unwrap();

        let mut fwd_matrix = DpMatrixFlat::default();
        let mut fwd_specials = SpecialMatrix::default();
        let fwd = forward(&profile, &target, &mut fwd_matrix, &mut fwd_specials).unwrap();

        assert!(vit <= fwd + 1e-3, "viterbi {vit} vs forward {fwd}");
    }

    #[test]
    fn traceback_of_a_perfect_match_follows_the_diagonal() {
        let profile = ramp_profile(6);
        let target = ramp_target(6);

        let mut matrix = DpMatrixFlat::default();
        let mut specials = SpecialMatrix::default();
        viterbi(&profile, &target, &mut matrix, &mut specials).unwrap();

        let mut trace = Trace::default();
        traceback(&profile, &target, &matrix, &specials, &mut trace).unwrap();

        assert_eq!(trace.steps.first().unwrap().state, TraceState::Start);
        assert_eq!(trace.steps.last().unwrap().state, TraceState::Terminal);

        let matches: Vec<(usize, usize)> = trace
            .steps
            .iter()
            .filter(|s| s.state == TraceState::Match)
            .map(|s| (s.target_idx, s.profile_idx))
            .collect();
        assert_eq!(matches, (1..=6).map(|k| (k, k)).collect::<Vec<_>>());
    }

    #[test]
    fn traceback_seeds_the_cloud_pipeline() {
        use crate::align::bounded::{cloud_search, Workspace};
        use crate::align::bounded::structs::CloudSearchParams;

        let profile = ramp_profile(9);
        let target = ramp_target(9);

        let mut matrix = DpMatrixFlat::default();
        let mut specials = SpecialMatrix::default();
        viterbi(&profile, &target, &mut matrix, &mut specials).unwrap();
        let mut trace = Trace::default();
        traceback(&profile, &target, &matrix, &specials, &mut trace).unwrap();

        let seed = Seed::from_trace(&trace).unwrap();
        assert_eq!((seed.target_start, seed.profile_start), (1, 1));
        assert_eq!((seed.target_end, seed.profile_end), (9, 9));

        let mut workspace = Workspace::default();
        let outcome = cloud_search(
            &profile,
            &target,
            &seed,
            &CloudSearchParams::default(),
            &mut workspace,
        )
        .unwrap();
        assert!(outcome.forward_score > 0.0);
    }

    #[test]
    fn unreachable_terminal_state_is_reported() {
        let mut profile = ramp_profile(4);
        // make every entry impossible: no path can reach C
        for trans in profile.transitions.iter_mut() {
            trans[B2M] = f32::NEG_INFINITY;
        }
        let target = ramp_target(4);

        let mut matrix = DpMatrixFlat::default();
        let mut specials = SpecialMatrix::default();
        let score = viterbi(&profile, &target, &mut matrix, &mut specials).unwrap();
        assert_eq!(score, f32::NEG_INFINITY);

        let mut trace = Trace::default();
        assert!(traceback(&profile, &target, &matrix, &specials, &mut trace).is_err());
    }
}
