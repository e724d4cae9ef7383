use crate::align::bounded::structs::bound::Bound;
use crate::align::bounded::structs::row_bounds::RowBounds;
use crate::error::CoreError;
use crate::extension_traits::VecExt;
use crate::structs::dp_matrix::NUM_NORMAL_STATES;
use crate::structs::SpecialMatrix;

/// A match/insert/delete matrix that only stores the cells inside a row
/// bound set.
///
/// Layout: spans are laid out row-major in bound order; `row_offsets` maps
/// a target row to its range of spans, `bound_offsets` maps a span to the
/// start of its cells in the flat data, and each cell holds its three
/// states contiguously. Cells outside every span read as -inf and are
/// never written.
///
/// The special-state strip rides along, dense as always, so one matrix
/// holds everything a bounded pass touches.
#[derive(Clone, Debug, Default)]
pub struct DpMatrixSparse {
    pub target_length: usize,
    pub profile_length: usize,
    row_offsets: Vec<usize>,
    bounds: Vec<Bound>,
    bound_offsets: Vec<usize>,
    data: Vec<f32>,
    pub specials: SpecialMatrix,
}

impl DpMatrixSparse {
    pub fn new(
        target_length: usize,
        profile_length: usize,
        row_bounds: &RowBounds,
    ) -> Result<Self, CoreError> {
        let mut matrix = DpMatrixSparse::default();
        matrix.reuse(target_length, profile_length, row_bounds)?;
        Ok(matrix)
    }

    /// Reshape to a new row bound set and scrub every cell to -inf.
    /// Allocations are kept when already big enough.
    pub fn reuse(
        &mut self,
        target_length: usize,
        profile_length: usize,
        row_bounds: &RowBounds,
    ) -> Result<(), CoreError> {
        self.target_length = target_length;
        self.profile_length = profile_length;

        self.bounds.clear();
        self.bounds.extend_from_slice(&row_bounds.bounds.bounds);

        // rows -> span index ranges
        self.row_offsets.try_resize_default(target_length + 2)?;
        let mut bound_idx = 0;
        for row in 0..=(target_length + 1) {
            while bound_idx < self.bounds.len() && (self.bounds[bound_idx].id as usize) < row {
                bound_idx += 1;
            }
            self.row_offsets[row] = bound_idx;
        }

        // spans -> cell data offsets
        self.bound_offsets.try_resize_default(self.bounds.len() + 1)?;
        let mut cell_count = 0;
        for (idx, bound) in self.bounds.iter().enumerate() {
            self.bound_offsets[idx] = cell_count;
            cell_count += bound.len() as usize;
        }
        self.bound_offsets[self.bounds.len()] = cell_count;

        self.data
            .try_resize_default(cell_count * NUM_NORMAL_STATES)?;
        self.data.fill(f32::NEG_INFINITY);

        self.specials.reuse(target_length)?;
        Ok(())
    }

    /// Number of addressable cells.
    pub fn cells(&self) -> usize {
        self.data.len() / NUM_NORMAL_STATES
    }

    /// Flat cell index for `(row, col)`, scanning the row's spans.
    #[inline]
    fn find(&self, row: usize, col: usize) -> Option<usize> {
        if row + 1 >= self.row_offsets.len() {
            return None;
        }
        let begin = self.row_offsets[row];
        let end = self.row_offsets[row + 1];
        for idx in begin..end {
            let bound = &self.bounds[idx];
            if bound.contains(col as i32) {
                return Some(self.bound_offsets[idx] + (col - bound.lb as usize));
            }
        }
        None
    }

    /// Read a cell; cells outside every span are implicitly -inf.
    #[inline]
    pub fn get(&self, state: usize, row: usize, col: usize) -> f32 {
        match self.find(row, col) {
            Some(cell) => self.data[cell * NUM_NORMAL_STATES + state],
            None => f32::NEG_INFINITY,
        }
    }

    /// Write a cell. Writing outside the shape is a bug in the caller.
    #[inline]
    pub fn set(&mut self, state: usize, row: usize, col: usize, value: f32) {
        match self.find(row, col) {
            Some(cell) => self.data[cell * NUM_NORMAL_STATES + state] = value,
            None => debug_assert!(false, "write to unshaped sparse cell ({row}, {col})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::bounded::structs::bound::{BoundMode, Edgebounds};
    use crate::structs::dp_matrix::{DELETE, INSERT, MATCH};

    fn row_bounds(dims: (usize, usize), spans: &[(i32, i32, i32)]) -> RowBounds {
        let mut bounds = Edgebounds::new(BoundMode::ByRow, dims.0, dims.1);
        for &(id, lb, rb) in spans {
            bounds.push(Bound::new(id, lb, rb));
        }
        RowBounds {
            target_start: spans.first().map_or(0, |s| s.0 as usize),
            target_end: spans.last().map_or(0, |s| s.0 as usize),
            bounds,
            ..RowBounds::default()
        }
    }

    #[test]
    fn addressable_cells_match_the_span_sum() {
        let bounds = row_bounds((5, 5), &[(1, 1, 4), (2, 2, 5), (2, 5, 6), (3, 3, 4)]);
        let matrix = DpMatrixSparse::new(5, 5, &bounds).unwrap();
        assert_eq!(matrix.cells(), 3 + 3 + 1 + 1);
    }

    #[test]
    fn cells_roundtrip_all_three_states() {
        let bounds = row_bounds((4, 4), &[(2, 1, 4)]);
        let mut matrix = DpMatrixSparse::new(4, 4, &bounds).unwrap();

        matrix.set(MATCH, 2, 1, 1.0);
        matrix.set(INSERT, 2, 2, 2.0);
        matrix.set(DELETE, 2, 3, 3.0);

        assert_eq!(matrix.get(MATCH, 2, 1), 1.0);
        assert_eq!(matrix.get(INSERT, 2, 2), 2.0);
        assert_eq!(matrix.get(DELETE, 2, 3), 3.0);
        // untouched states in a shaped cell are -inf, not garbage
        assert_eq!(matrix.get(INSERT, 2, 1), f32::NEG_INFINITY);
    }

    #[test]
    fn unshaped_cells_read_as_impossible() {
        let bounds = row_bounds((4, 4), &[(2, 1, 3)]);
        let matrix = DpMatrixSparse::new(4, 4, &bounds).unwrap();
        assert_eq!(matrix.get(MATCH, 2, 3), f32::NEG_INFINITY);
        assert_eq!(matrix.get(MATCH, 1, 1), f32::NEG_INFINITY);
        assert_eq!(matrix.get(MATCH, 4, 4), f32::NEG_INFINITY);
    }

    #[test]
    fn reuse_reshapes_and_scrubs() {
        let first = row_bounds((4, 4), &[(1, 1, 3)]);
        let mut matrix = DpMatrixSparse::new(4, 4, &first).unwrap();
        matrix.set(MATCH, 1, 1, 9.0);

        let second = row_bounds((4, 4), &[(1, 1, 3), (2, 1, 5)]);
        matrix.reuse(4, 4, &second).unwrap();
        assert_eq!(matrix.cells(), 6);
        assert_eq!(matrix.get(MATCH, 1, 1), f32::NEG_INFINITY);
    }

    #[test]
    fn default_matrix_is_empty_but_usable() {
        let matrix = DpMatrixSparse::default();
        assert_eq!(matrix.cells(), 0);
        assert_eq!(matrix.get(MATCH, 0, 0), f32::NEG_INFINITY);
    }
}
