use crate::buffer_pool::ReplacementPolicy;

/// Tunables for the handful of knobs this stack exposes. There is no
/// dynamic reload here: a config is handed to `Table::create`/`BTree::create`
/// once and baked into the buffer pool they allocate. Page size is not one of
/// these knobs: every on-disk layout in this crate is computed against the
/// `page_file::PAGE_SIZE` constant, not a runtime value.
#[derive(Debug, Clone, Copy)]
pub struct StorageConfig {
    pub default_pool_capacity: usize,
    pub default_replacement_policy: ReplacementPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_pool_capacity: 100,
            default_replacement_policy: ReplacementPolicy::Fifo,
        }
    }
}
