//! Shared fixtures for unit tests: small hand-built profiles and targets.

use crate::structs::profile::{B2M, D2D, D2M, I2I, I2M, M2D, M2I, M2M};
use crate::structs::{Profile, Seed, Sequence};

/// A local-mode profile that strongly favors the given consensus residue
/// string: +2.2 nats for the consensus residue at each match position,
/// -1.1 for everything else, with mildly penalized gaps.
pub fn consensus_profile(consensus: &[u8]) -> Profile {
    let length = consensus.len();
    let mut profile = Profile::new("consensus", length);

    let uniform_entry = (2.0 / (length as f32 * (length as f32 + 1.0))).ln();
    for pos in 0..=length {
        let trans = &mut profile.transitions[pos];
        trans[M2M] = -0.05;
        trans[M2I] = -4.0;
        trans[M2D] = -4.5;
        trans[I2M] = -0.6;
        trans[I2I] = -1.2;
        trans[D2M] = -0.4;
        trans[D2D] = -1.4;
        trans[B2M] = uniform_entry;

        if pos > 0 {
            for residue in 0..20u8 {
                profile.match_scores[pos][residue as usize] =
                    if consensus[pos - 1] == residue { 2.2 } else { -1.1 };
                profile.insert_scores[pos][residue as usize] = 0.0;
            }
        }
    }

    profile.configure_multihit_local();
    profile
}

/// The consensus string `0, 1, 2, ... (mod 10)` of the given length.
/// Only the first ten residues appear, so a target drawn from the other
/// ten matches nowhere at all.
pub fn ramp_consensus(len: usize) -> Vec<u8> {
    (0..len as u8).map(|i| i % 10).collect()
}

/// A profile of the given length whose consensus is the residue ramp,
/// configured for a same-length target.
pub fn ramp_profile(len: usize) -> Profile {
    let mut profile = consensus_profile(&ramp_consensus(len));
    profile.configure_for_target_length(len);
    profile
}

/// A target that matches [`ramp_profile`] exactly.
pub fn ramp_target(len: usize) -> Sequence {
    Sequence::from_digital(&ramp_consensus(len)).unwrap()
}

/// A target of the same length that matches nothing in the ramp profile:
/// its residues come from the half of the alphabet the consensus never
/// uses, so every cell lands on the -1.1 score.
pub fn mismatched_target(len: usize) -> Sequence {
    Sequence::from_digital(
        &(0..len as u8).map(|i| 10 + (i % 10)).collect::<Vec<_>>(),
    )
    .unwrap()
}

/// A seed anchored at the corners of the main diagonal.
pub fn diagonal_seed(len: usize) -> Seed {
    Seed {
        target_name: String::new(),
        target_start: 1,
        target_end: len,
        profile_start: 1,
        profile_end: len,
    }
}
