//! Batch driver: fan independent searches out over worker threads.
//!
//! The core search is single-threaded by design; parallelism comes from
//! running independent (profile, seed) requests on separate workers, each
//! owning its own scratch. Workspaces are thread-local and reused across
//! every search a thread performs.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::align::bounded::pipeline::{cloud_search, Workspace};
use crate::align::bounded::structs::params::CloudSearchParams;
use crate::error::CoreError;
use crate::structs::profile::null1_score;
use crate::structs::{Profile, Seed, Sequence};

use rayon::prelude::*;
use thread_local::ThreadLocal;
use tracing::warn;

/// One scored seed from a batch search.
#[derive(Clone, Debug)]
pub struct BatchHit {
    pub profile_name: String,
    pub target_name: String,
    pub forward_score: f32,
    pub backward_score: f32,
    /// Forward score against the null background, in bits.
    pub bit_score: f32,
    pub row_cap_overflow: bool,
}

/// Score every seed of every profile against its named target.
///
/// Each profile (with its seed list) is handed to one worker, mirroring
/// how the aligner pipelines shard their work; the profile is
/// reconfigured per target length, which is why profiles are taken
/// mutably. Seeds whose target is missing or whose anchors are invalid
/// are skipped with a warning; cancellation aborts the whole batch.
pub fn search_batch(
    profiles: &mut [Profile],
    seeds_by_profile: &HashMap<String, Vec<Seed>>,
    targets: &HashMap<String, Sequence>,
    params: &CloudSearchParams,
) -> Result<Vec<BatchHit>, CoreError> {
    let mut work: Vec<(&mut Profile, &Vec<Seed>)> = vec![];
    for profile in profiles.iter_mut() {
        match seeds_by_profile.get(&profile.name) {
            Some(seeds) => work.push((profile, seeds)),
            None => continue,
        }
    }

    let workspaces: ThreadLocal<RefCell<Workspace>> = ThreadLocal::new();

    let hits: Result<Vec<Vec<BatchHit>>, CoreError> = work
        .into_par_iter()
        .map(|(profile, seeds)| {
            let mut workspace = workspaces
                .get_or(|| RefCell::new(Workspace::default()))
                .borrow_mut();

            let mut hits = vec![];
            for seed in seeds {
                let target = match targets.get(&seed.target_name) {
                    Some(target) => target,
                    None => {
                        warn!(target_name = %seed.target_name, "seed names an unknown target");
                        continue;
                    }
                };

                profile.configure_for_target_length(target.length);

                let outcome =
                    match cloud_search(profile, target, seed, params, &mut workspace) {
                        Ok(outcome) => outcome,
                        Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
                        Err(err) => {
                            warn!(
                                target_name = %seed.target_name,
                                profile_name = %profile.name,
                                %err,
                                "skipping seed"
                            );
                            continue;
                        }
                    };

                let bit_score = (outcome.forward_score - null1_score(target.length))
                    / std::f32::consts::LN_2;
                hits.push(BatchHit {
                    profile_name: profile.name.clone(),
                    target_name: seed.target_name.clone(),
                    forward_score: outcome.forward_score,
                    backward_score: outcome.backward_score,
                    bit_score,
                    row_cap_overflow: outcome.row_cap_overflow,
                });
            }
            Ok(hits)
        })
        .collect();

    Ok(hits?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{diagonal_seed, ramp_profile, ramp_target};

    #[test]
    fn batch_scores_every_seed_against_its_target() {
        let mut profiles = vec![ramp_profile(8), ramp_profile(6)];
        profiles[0].name = "fam_a".to_string();
        profiles[1].name = "fam_b".to_string();

        let mut targets = HashMap::new();
        let mut target_a = ramp_target(8);
        target_a.name = "seq_a".to_string();
        targets.insert("seq_a".to_string(), target_a);
        let mut target_b = ramp_target(6);
        target_b.name = "seq_b".to_string();
        targets.insert("seq_b".to_string(), target_b);

        let mut seeds = HashMap::new();
        let mut seed_a = diagonal_seed(8);
        seed_a.target_name = "seq_a".to_string();
        seeds.insert("fam_a".to_string(), vec![seed_a]);
        let mut seed_b = diagonal_seed(6);
        seed_b.target_name = "seq_b".to_string();
        seeds.insert("fam_b".to_string(), vec![seed_b]);

        let hits = search_batch(
            &mut profiles,
            &seeds,
            &targets,
            &CloudSearchParams::default(),
        )
        .unwrap();

        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!(hit.forward_score > 0.0, "{} scored {}", hit.target_name, hit.forward_score);
            assert!(hit.bit_score > 0.0);
        }
    }

    #[test]
    fn unknown_targets_are_skipped_not_fatal() {
        let mut profiles = vec![ramp_profile(8)];
        profiles[0].name = "fam_a".to_string();

        let mut seed = diagonal_seed(8);
        seed.target_name = "missing".to_string();
        let mut seeds = HashMap::new();
        seeds.insert("fam_a".to_string(), vec![seed]);

        let hits = search_batch(
            &mut profiles,
            &seeds,
            &HashMap::new(),
            &CloudSearchParams::default(),
        )
        .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn cancellation_aborts_the_batch() {
        use crate::align::bounded::structs::params::CancelToken;

        let mut profiles = vec![ramp_profile(8)];
        profiles[0].name = "fam_a".to_string();

        let mut targets = HashMap::new();
        let mut target = ramp_target(8);
        target.name = "seq_a".to_string();
        targets.insert("seq_a".to_string(), target);

        let mut seed = diagonal_seed(8);
        seed.target_name = "seq_a".to_string();
        let mut seeds = HashMap::new();
        seeds.insert("fam_a".to_string(), vec![seed]);

        let token = CancelToken::new();
        token.cancel();
        let params = CloudSearchParams {
            cancel: Some(token),
            ..CloudSearchParams::default()
        };

        let result = search_batch(&mut profiles, &seeds, &targets, &params);
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }
}
