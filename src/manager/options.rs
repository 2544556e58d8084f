/// Numeric capacities of a manager.
///
/// Caches never grow past their configured size (they are halved instead),
/// so generous sizes pay off on long runs; the unique table only uses its
/// capacity as an initial reservation.
#[derive(Debug, Clone, Copy)]
pub struct SddOptions {
    pub(crate) sdd_cache_size: usize,
    pub(crate) hom_cache_size: usize,
    pub(crate) rewrite_cache_size: usize,
    pub(crate) unique_table_capacity: usize,
}

impl Default for SddOptions {
    #[must_use]
    fn default() -> Self {
        SddOptions {
            sdd_cache_size: 1 << 16,
            hom_cache_size: 1 << 16,
            rewrite_cache_size: 1 << 12,
            unique_table_capacity: 1 << 10,
        }
    }
}

impl SddOptions {
    #[must_use]
    pub fn new() -> SddOptions {
        SddOptions::default()
    }

    /// Bound on the diagram operation cache.
    pub fn set_sdd_cache_size(&mut self, size: usize) -> &mut Self {
        self.sdd_cache_size = size;
        self
    }

    /// Bound on the homomorphism evaluation cache.
    pub fn set_hom_cache_size(&mut self, size: usize) -> &mut Self {
        self.hom_cache_size = size;
        self
    }

    /// Bound on the saturation rewriting cache.
    pub fn set_rewrite_cache_size(&mut self, size: usize) -> &mut Self {
        self.rewrite_cache_size = size;
        self
    }

    /// Initial reservation of the unique tables.
    pub fn set_unique_table_capacity(&mut self, capacity: usize) -> &mut Self {
        self.unique_table_capacity = capacity;
        self
    }
}
