use crate::error::CoreError;
use crate::extension_traits::VecExt;
use crate::structs::dp_matrix::NUM_NORMAL_STATES;

/// The rolling anti-diagonal scratch for the cloud sweeps: three planes of
/// match/insert/delete scores, indexed by `anti-diagonal mod 3`.
///
/// Cells on an anti-diagonal are addressed by their profile column, which
/// is unique within the diagonal, so each plane is `profile_length + 1`
/// wide. Dependencies only ever reach back two diagonals, which is why
/// three planes suffice.
#[derive(Clone, Debug, Default)]
pub struct CloudMatrixLinear {
    pub profile_length: usize,
    data: Vec<f32>,
}

const NUM_PLANES: usize = 3;

impl CloudMatrixLinear {
    pub fn new(profile_length: usize) -> Result<Self, CoreError> {
        let mut matrix = CloudMatrixLinear::default();
        matrix.reuse(profile_length)?;
        Ok(matrix)
    }

    pub fn reuse(&mut self, profile_length: usize) -> Result<(), CoreError> {
        self.data
            .try_resize_default(NUM_PLANES * NUM_NORMAL_STATES * (profile_length + 1))?;
        self.profile_length = profile_length;
        self.data.fill(f32::NEG_INFINITY);
        Ok(())
    }

    #[inline]
    fn index(&self, plane: usize, state: usize, col: usize) -> usize {
        debug_assert!(plane < NUM_PLANES);
        debug_assert!(state < NUM_NORMAL_STATES);
        debug_assert!(col <= self.profile_length);
        (plane * NUM_NORMAL_STATES + state) * (self.profile_length + 1) + col
    }

    #[inline]
    pub fn get(&self, plane: usize, state: usize, col: usize) -> f32 {
        self.data[self.index(plane, state, col)]
    }

    #[inline]
    pub fn set(&mut self, plane: usize, state: usize, col: usize, value: f32) {
        let idx = self.index(plane, state, col);
        self.data[idx] = value;
    }

    /// Scrub one whole plane back to -inf.
    pub fn scrub_plane(&mut self, plane: usize) {
        for state in 0..NUM_NORMAL_STATES {
            let start = self.index(plane, state, 0);
            self.data[start..start + self.profile_length + 1].fill(f32::NEG_INFINITY);
        }
    }

    /// Scrub a single cell across all three states.
    pub fn scrub_cell(&mut self, plane: usize, col: usize) {
        for state in 0..NUM_NORMAL_STATES {
            self.set(plane, state, col, f32::NEG_INFINITY);
        }
    }
}
