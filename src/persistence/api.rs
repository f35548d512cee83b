use crate::consensus::{Datum, Term};
use std::io;
use std::path::PathBuf;

/// DatumPersistence stores one record per datum plus the local term. Disk interaction is
/// synchronous: the consensus actor calls into it directly, always before mutating memory.
pub(crate) trait DatumPersistence: Send + 'static {
    /// Every persisted datum, in no particular order.
    fn load_datums(&self) -> Result<Vec<Datum>, PersistenceError>;

    /// Durably store `datum`, overwriting any prior version of the same key.
    fn write(&mut self, datum: &Datum) -> Result<(), PersistenceError>;

    /// Remove the record for `key`. Removing a record that doesn't exist is not an error.
    fn delete(&mut self, key: &str) -> Result<(), PersistenceError>;

    /// The last persisted term, or `None` on a fresh node.
    fn load_term(&self) -> Result<Option<Term>, PersistenceError>;

    fn update_term(&mut self, term: Term) -> Result<(), PersistenceError>;
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum PersistenceError {
    #[error("IO failure on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Corrupt record {path:?}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Record name {0:?} doesn't decode to a datum key")]
    InvalidKey(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}
