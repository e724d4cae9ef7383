//! End-to-end pipeline scenarios: seeded clouds, merged bounds, and
//! bounded re-scoring against the full-grid reference.

mod common;

use common::{diagonal_seed, mismatched_target, ramp_profile, ramp_target};

use mmore::align::bounded::structs::{CloudSearchParams, Pruner};
use mmore::align::bounded::{cloud_search, Workspace};
use mmore::align::forward;
use mmore::structs::{DpMatrixFlat, SpecialMatrix};

const TOL: f32 = 5e-2;

#[test]
fn matching_sequence_recovers_the_full_forward_score() {
    // a 5x5 identity-style search: the cloud keeps the whole scoring band
    // and the bounded score lands on the full-grid score
    let profile = ramp_profile(5);
    let target = ramp_target(5);
    let seed = diagonal_seed(5);

    let params = CloudSearchParams {
        alpha: 12.0,
        beta: 5,
        ..CloudSearchParams::default()
    };

    let mut workspace = Workspace::default();
    let outcome = cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

    let mut dense = DpMatrixFlat::default();
    let mut specials = SpecialMatrix::default();
    let full = forward(&profile, &target, &mut dense, &mut specials).unwrap();

    assert!(
        (outcome.forward_score - full).abs() <= TOL,
        "bounded {} vs full {}",
        outcome.forward_score,
        full
    );
    assert!((outcome.forward_score - outcome.backward_score).abs() <= TOL);
    assert!(outcome.forward_score > 0.0);

    // the cloud contains the whole matching diagonal
    let cells: std::collections::HashSet<_> = outcome
        .row_bounds
        .bounds
        .covered_cells()
        .into_iter()
        .collect();
    for k in 1..=5 {
        assert!(cells.contains(&(k, k)));
    }
}

#[test]
fn unrelated_sequence_scores_below_the_null_and_prunes_hard() {
    let profile = ramp_profile(150);
    let target = mismatched_target(150);
    let seed = diagonal_seed(150);

    // the stale-diagonal cap ends decayed sweeps early
    let params = CloudSearchParams {
        pruner: Pruner::DoubleXdropOrDie,
        gamma: 10,
        ..CloudSearchParams::default()
    };

    let mut workspace = Workspace::default();
    let outcome = cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

    // nothing here beats the null background
    assert!(outcome.forward_score < 0.0);
    assert!(outcome.cloud_forward_score < 0.0);
    assert!(!outcome.row_cap_overflow);

    // the sweeps gave up long before covering the grid
    let grid_cells = 150 * 150;
    let cloud_cells = outcome.row_bounds.num_cells();
    assert!(
        cloud_cells * 4 < grid_cells,
        "cloud kept {cloud_cells} of {grid_cells} cells"
    );
}

#[test]
fn immediate_pruning_leaves_a_narrow_band() {
    // alpha=0.1 with no free passes: pruning starts on the first
    // anti-diagonal and the cloud hugs the anchor diagonal
    let profile = ramp_profile(3);
    let target = ramp_target(3);
    let seed = diagonal_seed(3);

    let params = CloudSearchParams {
        alpha: 0.1,
        beta: 0,
        ..CloudSearchParams::default()
    };

    let mut workspace = Workspace::default();
    let outcome = cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

    // row spans of a diagonal-hugging cloud stay a couple of cells wide
    for bound in &outcome.row_bounds.bounds.bounds {
        assert!(
            bound.rb - bound.lb <= 3,
            "row {} kept span [{}, {})",
            bound.id,
            bound.lb,
            bound.rb
        );
    }

    // the matching diagonal survives
    let cells: std::collections::HashSet<_> = outcome
        .row_bounds
        .bounds
        .covered_cells()
        .into_iter()
        .collect();
    for k in 1..=3 {
        assert!(cells.contains(&(k, k)));
    }
    drop(outcome);

    // each anti-diagonal of the raw forward cloud was trimmed hard
    for bound in &workspace.forward_bounds.bounds {
        assert!(
            bound.rb - bound.lb <= 2,
            "diag {} kept {} cells under a 0.1 nat drop",
            bound.id,
            bound.rb - bound.lb
        );
    }
}

#[test]
fn bounded_score_is_bounded_by_the_full_score() {
    for alpha in [0.5, 2.0, 6.0, 1e6] {
        let profile = ramp_profile(10);
        let target = ramp_target(10);
        let seed = diagonal_seed(10);

        let params = CloudSearchParams {
            alpha,
            beta: 0,
            ..CloudSearchParams::default()
        };

        let mut workspace = Workspace::default();
        let outcome =
            cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

        let mut dense = DpMatrixFlat::default();
        let mut specials = SpecialMatrix::default();
        let full = forward(&profile, &target, &mut dense, &mut specials).unwrap();

        assert!(
            outcome.forward_score <= full + TOL,
            "alpha {alpha}: bounded {} vs full {full}",
            outcome.forward_score
        );
    }
}

#[test]
fn forward_and_backward_agree_for_every_pruner() {
    for pruner in [
        Pruner::XdropEdgeTrim,
        Pruner::XdropBifurcate,
        Pruner::DoubleXdropOrDie,
    ] {
        let profile = ramp_profile(12);
        let target = ramp_target(12);
        let seed = diagonal_seed(12);

        let params = CloudSearchParams {
            pruner,
            alpha: 5.0,
            beta: 2,
            ..CloudSearchParams::default()
        };

        let mut workspace = Workspace::default();
        let outcome =
            cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

        assert!(
            (outcome.forward_score - outcome.backward_score).abs() <= TOL,
            "{pruner:?}: fwd {} vs bck {}",
            outcome.forward_score,
            outcome.backward_score
        );
    }
}

#[test]
fn widening_alpha_grows_the_cloud_monotonically() {
    let profile = ramp_profile(14);
    let target = ramp_target(14);
    let seed = diagonal_seed(14);

    let mut previous: Option<std::collections::HashSet<(i32, i32)>> = None;
    for alpha in [1.0, 3.0, 8.0] {
        let params = CloudSearchParams {
            alpha,
            beta: 0,
            ..CloudSearchParams::default()
        };

        let mut workspace = Workspace::default();
        let outcome =
            cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();
        let cells: std::collections::HashSet<_> = outcome
            .row_bounds
            .bounds
            .covered_cells()
            .into_iter()
            .collect();

        if let Some(smaller) = &previous {
            assert!(
                smaller.is_subset(&cells),
                "alpha {alpha} lost cells kept by the tighter run"
            );
        }
        previous = Some(cells);
    }
}

#[test]
fn off_diagonal_seed_still_produces_a_consistent_region() {
    let profile = ramp_profile(10);
    let target = ramp_target(10);

    // anchor offset from the true alignment: the cloud still has to give
    // back a well-formed region
    let seed = mmore::structs::Seed {
        target_name: String::new(),
        target_start: 2,
        target_end: 8,
        profile_start: 3,
        profile_end: 9,
    };

    let params = CloudSearchParams::default();
    let mut workspace = Workspace::default();
    let outcome = cloud_search(&profile, &target, &seed, &params, &mut workspace).unwrap();

    assert!(outcome.row_bounds.valid());
    assert!((outcome.forward_score - outcome.backward_score).abs() <= TOL);
}
