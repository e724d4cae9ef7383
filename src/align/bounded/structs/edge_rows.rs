use crate::align::bounded::structs::bound::{Bound, BoundMode, Edgebounds};
use crate::error::CoreError;
use crate::extension_traits::VecExt;

use tracing::warn;

/// Default cap on the number of spans kept per row.
pub const DEFAULT_ROW_CAP: usize = 10;

/// Row-keyed scratch used while converting anti-diagonal bounds into
/// row bounds. Each row holds at most `row_cap` spans with O(1) append;
/// going over the cap bridges into the row's last span instead of failing,
/// and latches the `overflow` flag for reporting.
#[derive(Clone, Debug)]
pub struct EdgeRows {
    pub target_length: usize,
    pub profile_length: usize,
    /// Rows covered, as a half-open `[row_begin, row_end)` range.
    pub row_begin: usize,
    pub row_end: usize,
    pub row_cap: usize,
    pub overflow: bool,
    counts: Vec<usize>,
    bounds: Vec<Bound>,
}

impl Default for EdgeRows {
    fn default() -> Self {
        EdgeRows {
            target_length: 0,
            profile_length: 0,
            row_begin: 0,
            row_end: 0,
            row_cap: DEFAULT_ROW_CAP,
            overflow: false,
            counts: vec![],
            bounds: vec![],
        }
    }
}

impl EdgeRows {
    /// Reset the scratch to cover `[row_begin, row_end)` with `row_cap`
    /// spans available per row.
    pub fn reuse(
        &mut self,
        target_length: usize,
        profile_length: usize,
        row_begin: usize,
        row_end: usize,
        row_cap: usize,
    ) -> Result<(), CoreError> {
        debug_assert!(row_begin <= row_end);
        debug_assert!(row_cap > 0);

        let num_rows = row_end - row_begin;
        self.counts.try_resize_default(num_rows)?;
        self.bounds.try_resize_default(num_rows * row_cap)?;
        self.counts.fill(0);

        self.target_length = target_length;
        self.profile_length = profile_length;
        self.row_begin = row_begin;
        self.row_end = row_end;
        self.row_cap = row_cap;
        self.overflow = false;
        Ok(())
    }

    #[inline]
    fn row_index(&self, row: usize) -> usize {
        debug_assert!((self.row_begin..self.row_end).contains(&row));
        row - self.row_begin
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.counts[self.row_index(row)]
    }

    pub fn row_bounds(&self, row: usize) -> &[Bound] {
        let idx = self.row_index(row);
        let start = idx * self.row_cap;
        &self.bounds[start..start + self.counts[idx]]
    }

    fn last_in_row_mut(&mut self, row: usize) -> Option<&mut Bound> {
        let idx = self.row_index(row);
        let count = self.counts[idx];
        if count == 0 {
            return None;
        }
        Some(&mut self.bounds[idx * self.row_cap + count - 1])
    }

    /// Append a span to a row. When the row is at capacity the span is
    /// bridged into the row's last span; the search stays valid (the row
    /// grows a superset of the requested cells) and the overflow is
    /// surfaced as a warning.
    pub fn append(&mut self, row: usize, bound: Bound) {
        let idx = self.row_index(row);
        let count = self.counts[idx];

        if count >= self.row_cap {
            if !self.overflow {
                warn!(
                    row = row,
                    row_cap = self.row_cap,
                    "per-row span cap exceeded; bridging spans"
                );
            }
            self.overflow = true;
            let last = &mut self.bounds[idx * self.row_cap + count - 1];
            last.lb = last.lb.min(bound.lb);
            last.rb = last.rb.max(bound.rb);
            return;
        }

        self.bounds[idx * self.row_cap + count] = bound;
        self.counts[idx] = count + 1;
    }

    /// Fold one anti-diagonal span (offsets-are-rows convention) into the
    /// row scratch.
    ///
    /// Under the exact policy a cell extends the row's last span only when
    /// it is adjacent within `gap_tolerance` columns; otherwise it opens a
    /// new span. The abridged policy always extends, so each row ends up
    /// with a single span from its leftmost to its rightmost cell.
    pub fn integrate_diag(&mut self, bound: &Bound, abridged: bool, gap_tolerance: i32) {
        let diag = bound.id;
        for offset in bound.lb..bound.rb {
            let row = offset;
            let col = diag - row;

            let extend = match self.last_in_row_mut(row as usize) {
                None => false,
                Some(last) => abridged || col <= last.rb + gap_tolerance,
            };

            if extend {
                let last = self.last_in_row_mut(row as usize).unwrap();
                last.rb = last.rb.max(col + 1);
            } else {
                self.append(row as usize, Bound::new(row, col, col + 1));
            }
        }
    }

    /// Flatten the scratch into a sorted row-oriented edgebound list.
    pub fn flatten_into(&self, out: &mut Edgebounds) {
        out.reuse(BoundMode::ByRow, self.target_length, self.profile_length);
        for row in self.row_begin..self.row_end {
            for bound in self.row_bounds(row) {
                out.push(*bound);
            }
        }
        out.sort();
    }
}
