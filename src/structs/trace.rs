use crate::error::CoreError;

use serde::{Deserialize, Serialize};

/// States a traceback step can pass through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceState {
    Match,
    Insert,
    Delete,
    End,
    New,
    Jump,
    Terminal,
    Begin,
    Start,
}

/// One cell of a traceback: a state and its (sequence row, profile column)
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceStep {
    pub state: TraceState,
    pub target_idx: usize,
    pub profile_idx: usize,
}

/// An alignment traceback, e.g. the Viterbi alignment that anchors a cloud
/// search. The cloud stages only ever read its first and last match cells.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    pub target_length: usize,
    pub profile_length: usize,
    pub steps: Vec<TraceStep>,
}

impl Trace {
    pub fn new(target_length: usize, profile_length: usize) -> Self {
        Trace {
            target_length,
            profile_length,
            steps: vec![],
        }
    }

    pub fn push(&mut self, state: TraceState, target_idx: usize, profile_idx: usize) {
        self.steps.push(TraceStep {
            state,
            target_idx,
            profile_idx,
        });
    }

    pub fn first_match(&self) -> Option<&TraceStep> {
        self.steps.iter().find(|s| s.state == TraceState::Match)
    }

    pub fn last_match(&self) -> Option<&TraceStep> {
        self.steps.iter().rev().find(|s| s.state == TraceState::Match)
    }
}

/// The anchor for one cloud search: the first and last match cells of a
/// precomputed rough alignment. The forward cloud sweeps outward from
/// `(target_start, profile_start)`, the backward cloud from
/// `(target_end, profile_end)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub target_name: String,
    pub target_start: usize,
    pub target_end: usize,
    pub profile_start: usize,
    pub profile_end: usize,
}

impl Seed {
    /// Distil a traceback down to its anchor cells.
    pub fn from_trace(trace: &Trace) -> Result<Self, CoreError> {
        let first = trace
            .first_match()
            .ok_or_else(|| CoreError::InvalidShape("trace has no match states".into()))?;
        let last = trace
            .last_match()
            .ok_or_else(|| CoreError::InvalidShape("trace has no match states".into()))?;

        Ok(Seed {
            target_name: String::new(),
            target_start: first.target_idx,
            target_end: last.target_idx,
            profile_start: first.profile_idx,
            profile_end: last.profile_idx,
        })
    }

    /// Check the anchor cells against the DP grid dimensions.
    pub fn validate(
        &self,
        target_length: usize,
        profile_length: usize,
    ) -> Result<(), CoreError> {
        let in_grid = |t: usize, p: usize| {
            (1..=target_length).contains(&t) && (1..=profile_length).contains(&p)
        };
        if !in_grid(self.target_start, self.profile_start)
            || !in_grid(self.target_end, self.profile_end)
        {
            return Err(CoreError::InvalidShape(format!(
                "seed ({}, {})..({}, {}) outside grid [1..{}] x [1..{}]",
                self.target_start,
                self.profile_start,
                self.target_end,
                self.profile_end,
                target_length,
                profile_length,
            )));
        }
        if self.target_end < self.target_start || self.profile_end < self.profile_start {
            return Err(CoreError::InvalidShape(
                "seed end cell precedes start cell".into(),
            ));
        }
        Ok(())
    }
}
