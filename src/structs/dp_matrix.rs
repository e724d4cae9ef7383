use crate::error::CoreError;
use crate::extension_traits::VecExt;
use crate::structs::profile::NUM_SPECIAL_STATES;

/* normal DP states */
pub const MATCH: usize = 0;
pub const INSERT: usize = 1;
pub const DELETE: usize = 2;
pub const NUM_NORMAL_STATES: usize = 3;

/// Absolute tolerance for comparing DP matrices cell by cell.
pub const MATRIX_COMPARE_TOL: f32 = 1e-2;

/// A dense match/insert/delete matrix over the full DP grid, row-major
/// with the three states interleaved per cell.
///
/// Rows are target sequence positions `0..=target_length`, columns are
/// profile positions `0..=profile_length`.
#[derive(Clone, Debug, Default)]
pub struct DpMatrixFlat {
    pub target_length: usize,
    pub profile_length: usize,
    data: Vec<f32>,
}

impl DpMatrixFlat {
    pub fn new(target_length: usize, profile_length: usize) -> Result<Self, CoreError> {
        let mut matrix = DpMatrixFlat::default();
        matrix.reuse(target_length, profile_length)?;
        Ok(matrix)
    }

    /// Resize for a new search and scrub every cell to -inf. Nothing is
    /// preserved; the allocation is kept if it is already big enough.
    pub fn reuse(
        &mut self,
        target_length: usize,
        profile_length: usize,
    ) -> Result<(), CoreError> {
        let cells = (target_length + 1) * (profile_length + 1) * NUM_NORMAL_STATES;
        self.data.try_resize_default(cells)?;
        self.target_length = target_length;
        self.profile_length = profile_length;
        self.fill(f32::NEG_INFINITY);
        Ok(())
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    #[inline]
    fn index(&self, state: usize, row: usize, col: usize) -> usize {
        debug_assert!(state < NUM_NORMAL_STATES);
        debug_assert!(row <= self.target_length);
        debug_assert!(col <= self.profile_length);
        (row * (self.profile_length + 1) + col) * NUM_NORMAL_STATES + state
    }

    #[inline]
    pub fn get(&self, state: usize, row: usize, col: usize) -> f32 {
        self.data[self.index(state, row, col)]
    }

    #[inline]
    pub fn set(&mut self, state: usize, row: usize, col: usize, value: f32) {
        let idx = self.index(state, row, col);
        self.data[idx] = value;
    }

    /// Compare cell-wise within an absolute tolerance. -inf compares equal
    /// to -inf.
    pub fn approx_eq(&self, other: &DpMatrixFlat, tolerance: f32) -> bool {
        self.target_length == other.target_length
            && self.profile_length == other.profile_length
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b || (a - b).abs() <= tolerance)
    }
}

/// The dense E/N/J/C/B strip: one scalar per special state per target row.
/// Always full, even when the normal states are sparse.
#[derive(Clone, Debug, Default)]
pub struct SpecialMatrix {
    pub target_length: usize,
    data: Vec<f32>,
}

impl SpecialMatrix {
    pub fn new(target_length: usize) -> Result<Self, CoreError> {
        let mut matrix = SpecialMatrix::default();
        matrix.reuse(target_length)?;
        Ok(matrix)
    }

    pub fn reuse(&mut self, target_length: usize) -> Result<(), CoreError> {
        self.data
            .try_resize_default(NUM_SPECIAL_STATES * (target_length + 1))?;
        self.target_length = target_length;
        self.fill(f32::NEG_INFINITY);
        Ok(())
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    #[inline]
    pub fn get(&self, state: usize, row: usize) -> f32 {
        debug_assert!(state < NUM_SPECIAL_STATES);
        debug_assert!(row <= self.target_length);
        self.data[state * (self.target_length + 1) + row]
    }

    #[inline]
    pub fn set(&mut self, state: usize, row: usize, value: f32) {
        debug_assert!(state < NUM_SPECIAL_STATES);
        debug_assert!(row <= self.target_length);
        self.data[state * (self.target_length + 1) + row] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::profile::{SP_B, SP_N};

    #[test]
    fn reuse_scrubs_every_cell() {
        let mut matrix = DpMatrixFlat::new(3, 4).unwrap();
        matrix.set(MATCH, 2, 3, 1.5);
        matrix.reuse(4, 4).unwrap();
        assert_eq!(matrix.get(MATCH, 2, 3), f32::NEG_INFINITY);
    }

    #[test]
    fn states_do_not_alias() {
        let mut matrix = DpMatrixFlat::new(2, 2).unwrap();
        matrix.set(MATCH, 1, 1, 1.0);
        matrix.set(INSERT, 1, 1, 2.0);
        matrix.set(DELETE, 1, 1, 3.0);
        assert_eq!(matrix.get(MATCH, 1, 1), 1.0);
        assert_eq!(matrix.get(INSERT, 1, 1), 2.0);
        assert_eq!(matrix.get(DELETE, 1, 1), 3.0);
    }

    #[test]
    fn approx_eq_tolerates_small_differences() {
        let mut a = DpMatrixFlat::new(2, 2).unwrap();
        let mut b = DpMatrixFlat::new(2, 2).unwrap();
        a.set(MATCH, 1, 1, 1.0);
        b.set(MATCH, 1, 1, 1.0 + MATRIX_COMPARE_TOL / 2.0);
        assert!(a.approx_eq(&b, MATRIX_COMPARE_TOL));

        b.set(MATCH, 1, 1, 1.1);
        assert!(!a.approx_eq(&b, MATRIX_COMPARE_TOL));
    }

    #[test]
    fn special_strip_roundtrip() {
        let mut specials = SpecialMatrix::new(5).unwrap();
        specials.set(SP_N, 0, 0.0);
        specials.set(SP_B, 5, -1.25);
        assert_eq!(specials.get(SP_N, 0), 0.0);
        assert_eq!(specials.get(SP_B, 5), -1.25);
        assert_eq!(specials.get(SP_N, 3), f32::NEG_INFINITY);
        assert_eq!(specials.as_slice().len(), 5 * 6);
    }
}
