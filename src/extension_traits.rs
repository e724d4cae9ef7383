use crate::error::CoreError;

/// An extension trait that adds fallible resizing to Vec.
///
/// The DP scratch buffers are the only allocations in the core that scale
/// with input size, so they are the only place where we bother reporting
/// allocation failure instead of aborting.
pub trait VecExt<T> {
    fn try_resize_default(&mut self, new_len: usize) -> Result<(), CoreError>;
}

impl<T: Clone + Default> VecExt<T> for Vec<T> {
    fn try_resize_default(&mut self, new_len: usize) -> Result<(), CoreError> {
        if new_len > self.capacity() {
            let additional = new_len - self.len();
            self.try_reserve(additional)
                .map_err(|_| CoreError::AllocFailure {
                    bytes: additional * std::mem::size_of::<T>(),
                })?;
        }
        self.resize(new_len, T::default());
        Ok(())
    }
}
