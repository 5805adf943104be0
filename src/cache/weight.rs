use super::key::*;

//
// CacheWeight
//

/// Cache weight.
pub trait CacheWeight {
    /// Cache weight as a byte count.
    ///
    /// It is *not* the amount of memory used, but rather an indicator of *potential* storage
    /// requirements. Its intended use is for comparisons between entries, e.g. by a cache that
    /// evicts by total weight.
    fn cache_weight(&self) -> usize;
}

impl CacheWeight for CacheKey {
    fn cache_weight(&self) -> usize {
        const SELF_SIZE: usize = size_of::<CacheKey>();
        SELF_SIZE + self.as_str().len()
    }
}
