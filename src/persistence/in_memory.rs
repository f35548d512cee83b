use crate::consensus::{Datum, Term};
use crate::persistence::api::{DatumPersistence, PersistenceError};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

/// Test double. Clones share state, so a test can keep a handle to inspect (or break) the
/// persistence it handed to an engine.
#[derive(Clone, Default)]
pub(crate) struct InMemoryPersistence {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    datums: HashMap<String, Datum>,
    term: Option<Term>,
    fail_writes: bool,
    fail_term_updates: bool,
}

impl InMemoryPersistence {
    pub(crate) fn new() -> Self {
        InMemoryPersistence::default()
    }

    /// While set, every mutating call fails with an IO error.
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// While set, only `update_term` fails.
    pub(crate) fn fail_term_updates(&self, fail: bool) {
        self.inner.lock().unwrap().fail_term_updates = fail;
    }

    pub(crate) fn get(&self, key: &str) -> Option<Datum> {
        self.inner.lock().unwrap().datums.get(key).cloned()
    }

    pub(crate) fn term(&self) -> Option<Term> {
        self.inner.lock().unwrap().term
    }

    fn check_writable(inner: &Inner) -> Result<(), PersistenceError> {
        if inner.fail_writes {
            return Err(injected_failure());
        }
        Ok(())
    }
}

fn injected_failure() -> PersistenceError {
    PersistenceError::io(
        "in-memory",
        io::Error::new(io::ErrorKind::Other, "injected failure"),
    )
}

impl DatumPersistence for InMemoryPersistence {
    fn load_datums(&self) -> Result<Vec<Datum>, PersistenceError> {
        Ok(self.inner.lock().unwrap().datums.values().cloned().collect())
    }

    fn write(&mut self, datum: &Datum) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        inner.datums.insert(datum.key.clone(), datum.clone());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        inner.datums.remove(key);
        Ok(())
    }

    fn load_term(&self) -> Result<Option<Term>, PersistenceError> {
        Ok(self.inner.lock().unwrap().term)
    }

    fn update_term(&mut self, term: Term) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        if inner.fail_term_updates {
            return Err(injected_failure());
        }
        inner.term = Some(term);
        Ok(())
    }
}
