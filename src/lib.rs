//! A teaching-grade database storage stack: a fixed-size page file, a
//! buffer pool with pluggable page-replacement policies, a record manager
//! that maps records onto pages, and a flat integer-key index.
//!
//! Every public operation returns [`error::Result`]; there is no panic-based
//! error path outside of programmer-error invariants (e.g. a pinned page
//! vanishing out from under a live `PageHandle`).

pub mod buffer_pool;
pub mod config;
pub mod error;
pub mod index;
pub mod page_file;
pub mod record_manager;
pub mod tuple;

pub use config::StorageConfig;
pub use error::{Result, StorageError};
