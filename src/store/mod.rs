//! Storage boundary: where sources and groups come from.
//!
//! Rendering only ever reads through [`SourceStore`] and [`GroupStore`]; the
//! bundled [`MemoryStore`] is enough to drive the whole pipeline.

mod memory;

use std::future::Future;

use thiserror::Error;

use crate::models::{GroupRecord, Source};

pub use memory::{MemoryStore, StoreSnapshot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

pub trait SourceStore {
    fn get_source(&self, id: u64) -> impl Future<Output = Result<Option<Source>, StoreError>>;
}

pub trait GroupStore {
    /// Look a group up by its public token, whatever its enabled flag.
    fn get_group_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<GroupRecord>, StoreError>>;
}
