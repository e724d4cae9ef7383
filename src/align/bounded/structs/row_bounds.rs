use crate::align::bounded::structs::bound::{Bound, BoundMode, Edgebounds};
use crate::align::bounded::structs::edge_rows::EdgeRows;
use crate::align::bounded::structs::params::{CloudSearchParams, ReorientPolicy};
use crate::error::CoreError;

use tracing::debug;

/// The merged cloud, reoriented to row spans: the shape that the sparse
/// matrix is built from and that the bounded passes iterate.
#[derive(Clone, Debug, Default)]
pub struct RowBounds {
    /// Row-oriented spans, sorted by `(row, lb)`.
    pub bounds: Edgebounds,
    /// First and last target rows with any cells, inclusive.
    pub target_start: usize,
    pub target_end: usize,
    /// Leftmost and rightmost profile columns with any cells, inclusive.
    pub profile_start: usize,
    pub profile_end: usize,
    /// Set when the per-row span cap overflowed during reorientation and
    /// spans were bridged.
    pub row_cap_overflow: bool,
}

impl RowBounds {
    /// Reorient a merged anti-diagonal cloud into row bounds.
    pub fn new(
        merged: &Edgebounds,
        edge_rows: &mut EdgeRows,
        params: &CloudSearchParams,
    ) -> Result<Self, CoreError> {
        let mut row_bounds = RowBounds::default();
        row_bounds.rebuild(merged, edge_rows, params)?;
        Ok(row_bounds)
    }

    /// Rebuild in place from a merged anti-diagonal cloud, reusing the
    /// row scratch.
    ///
    /// Sweeps the anti-diagonals low to high, folding each one's cells
    /// into the per-row scratch under the configured policy, then
    /// flattens the scratch into a sorted row-oriented list.
    pub fn rebuild(
        &mut self,
        merged: &Edgebounds,
        edge_rows: &mut EdgeRows,
        params: &CloudSearchParams,
    ) -> Result<(), CoreError> {
        if merged.mode != BoundMode::ByDiag {
            return Err(CoreError::InvariantViolation(
                "reorientation expects anti-diagonal edgebounds".into(),
            ));
        }
        merged.validate()?;

        if merged.is_empty() {
            self.bounds
                .reuse(BoundMode::ByRow, merged.target_length, merged.profile_length);
            self.target_start = 0;
            self.target_end = 0;
            self.profile_start = 0;
            self.profile_end = 0;
            self.row_cap_overflow = false;
            return Ok(());
        }

        // rows the cloud touches
        let row_begin = merged.bounds.iter().map(|b| b.lb).min().unwrap() as usize;
        let row_end = merged.bounds.iter().map(|b| b.rb).max().unwrap() as usize;

        edge_rows.reuse(
            merged.target_length,
            merged.profile_length,
            row_begin,
            row_end,
            params.row_cap,
        )?;

        let abridged = params.reorient_policy == ReorientPolicy::Abridged;
        for bound in &merged.bounds {
            edge_rows.integrate_diag(bound, abridged, params.gap_tolerance);
        }

        edge_rows.flatten_into(&mut self.bounds);

        self.target_start = row_begin;
        self.target_end = row_end - 1;
        self.profile_start = self
            .bounds
            .bounds
            .iter()
            .map(|b| b.lb)
            .min()
            .unwrap_or(0) as usize;
        self.profile_end = self
            .bounds
            .bounds
            .iter()
            .map(|b| b.rb - 1)
            .max()
            .unwrap_or(0) as usize;
        self.row_cap_overflow = edge_rows.overflow;

        debug!(
            rows = row_end - row_begin,
            cells = self.num_cells(),
            grid = (merged.target_length + 1) * (merged.profile_length + 1),
            overflow = self.row_cap_overflow,
            "reoriented cloud to row bounds"
        );

        Ok(())
    }

    /// All spans on the given target row.
    pub fn bounds_for_row(&self, row: usize) -> &[Bound] {
        let range = self.bounds.id_range(row as i32);
        &self.bounds.bounds[range]
    }

    pub fn num_cells(&self) -> usize {
        self.bounds.bounds.iter().map(|b| b.len() as usize).sum()
    }

    /// A usable result has at least one span and holds the sort
    /// invariant.
    pub fn valid(&self) -> bool {
        !self.bounds.is_empty() && self.bounds.validate().is_ok()
    }
}
