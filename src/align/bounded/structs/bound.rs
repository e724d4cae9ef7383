use crate::error::CoreError;

/// A half-open span `[lb, rb)` of cells on one row or one anti-diagonal.
///
/// What `id`, `lb`, and `rb` index depends on the orientation of the
/// containing [`Edgebounds`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bound {
    pub id: i32,
    pub lb: i32,
    pub rb: i32,
}

impl Bound {
    pub fn new(id: i32, lb: i32, rb: i32) -> Self {
        Bound { id, lb, rb }
    }

    #[inline]
    pub fn len(&self) -> i32 {
        self.rb - self.lb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lb >= self.rb
    }

    #[inline]
    pub fn contains(&self, offset: i32) -> bool {
        (self.lb..self.rb).contains(&offset)
    }
}

/// Storage orientation of an edgebound list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundMode {
    /// `id` is an anti-diagonal `row + col`; `lb`/`rb` span target rows
    /// along it (the forward-cloud convention; a backward cloud spans
    /// profile columns until it is reflected).
    #[default]
    ByDiag,
    /// `id` is a target row; `lb`/`rb` span profile columns.
    ByRow,
}

/// An ordered list of bounds, sorted ascending by `(id, lb)`.
///
/// One component owns and mutates a given list for the duration of one
/// search; everything downstream reads it through `&`.
#[derive(Clone, Debug, Default)]
pub struct Edgebounds {
    pub mode: BoundMode,
    pub target_length: usize,
    pub profile_length: usize,
    pub bounds: Vec<Bound>,
}

impl Edgebounds {
    pub fn new(mode: BoundMode, target_length: usize, profile_length: usize) -> Self {
        Edgebounds {
            mode,
            target_length,
            profile_length,
            bounds: vec![],
        }
    }

    /// Clear for a new search, keeping the allocation.
    pub fn reuse(&mut self, mode: BoundMode, target_length: usize, profile_length: usize) {
        self.mode = mode;
        self.target_length = target_length;
        self.profile_length = profile_length;
        self.bounds.clear();
    }

    pub fn push(&mut self, bound: Bound) {
        self.bounds.push(bound);
    }

    pub fn get(&self, idx: usize) -> &Bound {
        &self.bounds[idx]
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn clear(&mut self) {
        self.bounds.clear();
    }

    pub fn sort(&mut self) {
        self.bounds.sort_unstable_by_key(|b| (b.id, b.lb));
    }

    pub fn is_sorted(&self) -> bool {
        self.bounds
            .windows(2)
            .all(|w| (w[0].id, w[0].lb) <= (w[1].id, w[1].lb))
    }

    /// Index range of all bounds with the given id. Requires the list to
    /// be sorted.
    pub fn id_range(&self, id: i32) -> std::ops::Range<usize> {
        let begin = self.bounds.partition_point(|b| b.id < id);
        let end = self.bounds.partition_point(|b| b.id <= id);
        begin..end
    }

    /// Largest legal id for this orientation.
    fn max_id(&self) -> i32 {
        match self.mode {
            BoundMode::ByDiag => (self.target_length + self.profile_length) as i32,
            BoundMode::ByRow => self.target_length as i32,
        }
    }

    /// Largest legal one-past-the-end offset for this orientation.
    fn max_offset(&self) -> i32 {
        match self.mode {
            BoundMode::ByDiag => (self.target_length + 1) as i32,
            BoundMode::ByRow => (self.profile_length + 1) as i32,
        }
    }

    /// Check the structural invariants: sorted, non-empty spans, ids and
    /// offsets inside the grid.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.is_sorted() {
            return Err(CoreError::InvariantViolation(
                "edgebounds are not sorted by (id, lb)".into(),
            ));
        }
        for bound in &self.bounds {
            if bound.is_empty() {
                return Err(CoreError::InvariantViolation(format!(
                    "empty span {{id: {}, lb: {}, rb: {}}}",
                    bound.id, bound.lb, bound.rb
                )));
            }
            if bound.id < 0 || bound.id > self.max_id() {
                return Err(CoreError::InvariantViolation(format!(
                    "id {} outside [0, {}]",
                    bound.id,
                    self.max_id()
                )));
            }
            if bound.lb < 0 || bound.rb > self.max_offset() {
                return Err(CoreError::InvariantViolation(format!(
                    "span [{}, {}) outside [0, {}]",
                    bound.lb,
                    bound.rb,
                    self.max_offset()
                )));
            }
        }
        Ok(())
    }

    /// Reflect every anti-diagonal span to the opposite offset convention:
    /// offsets-are-rows becomes offsets-are-columns and vice versa.
    ///
    /// For a span `[lb, rb)` on diag `d`, the covered offsets `k` map to
    /// `d - k`, so the reflected span is `[d - rb + 1, d - lb + 1)`. The
    /// operation is its own inverse.
    pub fn reflect(&mut self) -> Result<(), CoreError> {
        if self.mode != BoundMode::ByDiag {
            return Err(CoreError::InvariantViolation(
                "reflect is only defined for anti-diagonal edgebounds".into(),
            ));
        }
        for bound in &mut self.bounds {
            let (lb, rb) = (bound.lb, bound.rb);
            bound.lb = bound.id - rb + 1;
            bound.rb = bound.id - lb + 1;
        }
        // reflection reverses the ordering of spans that share a diagonal
        self.sort();
        Ok(())
    }

    /// Union two sorted edgebound lists into `out`. Bounds that share an
    /// id are merged whenever their spans overlap or touch.
    pub fn union_into(
        a: &Edgebounds,
        b: &Edgebounds,
        out: &mut Edgebounds,
    ) -> Result<(), CoreError> {
        Self::merge_into(a, b, out, false)
    }

    /// Union two sorted edgebound lists, collapsing all spans on each id
    /// down to a single `[min lb, max rb)` span.
    pub fn abridged_union_into(
        a: &Edgebounds,
        b: &Edgebounds,
        out: &mut Edgebounds,
    ) -> Result<(), CoreError> {
        Self::merge_into(a, b, out, true)
    }

    fn merge_into(
        a: &Edgebounds,
        b: &Edgebounds,
        out: &mut Edgebounds,
        abridged: bool,
    ) -> Result<(), CoreError> {
        if a.mode != b.mode {
            return Err(CoreError::InvariantViolation(
                "cannot union edgebounds with different orientations".into(),
            ));
        }
        a.validate()?;
        b.validate()?;

        out.reuse(
            a.mode,
            a.target_length.max(b.target_length),
            a.profile_length.max(b.profile_length),
        );

        let mut scratch: Vec<Bound> = vec![];
        let (mut i, mut j) = (0, 0);

        while i < a.len() || j < b.len() {
            let id = match (a.bounds.get(i), b.bounds.get(j)) {
                (Some(ba), Some(bb)) => ba.id.min(bb.id),
                (Some(ba), None) => ba.id,
                (None, Some(bb)) => bb.id,
                (None, None) => unreachable!(),
            };

            scratch.clear();
            while i < a.len() && a.bounds[i].id == id {
                scratch.push(a.bounds[i]);
                i += 1;
            }
            while j < b.len() && b.bounds[j].id == id {
                scratch.push(b.bounds[j]);
                j += 1;
            }
            scratch.sort_unstable_by_key(|b| b.lb);

            if abridged {
                let lb = scratch.iter().map(|b| b.lb).min().unwrap();
                let rb = scratch.iter().map(|b| b.rb).max().unwrap();
                out.push(Bound::new(id, lb, rb));
                continue;
            }

            let mut current = scratch[0];
            for bound in &scratch[1..] {
                // touching spans count as overlapping
                if bound.lb <= current.rb {
                    current.rb = current.rb.max(bound.rb);
                } else {
                    out.push(current);
                    current = *bound;
                }
            }
            out.push(current);
        }

        Ok(())
    }

    /// Enumerate the grid cells this edgebound list covers, as
    /// `(target row, profile column)` pairs. Anti-diagonal lists are
    /// assumed to use the offsets-are-rows convention.
    pub fn covered_cells(&self) -> Vec<(i32, i32)> {
        let mut cells = vec![];
        for bound in &self.bounds {
            for offset in bound.lb..bound.rb {
                match self.mode {
                    BoundMode::ByDiag => cells.push((offset, bound.id - offset)),
                    BoundMode::ByRow => cells.push((bound.id, offset)),
                }
            }
        }
        cells
    }
}
