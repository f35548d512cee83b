use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount a term moves on every applied replicated write. The leader bumps its own term by this
/// much per publish, and followers ratchet toward the leader's term in steps of at most this much.
/// Moving the term forward on writes invalidates stale in-flight elections.
pub(crate) const TERM_RATCHET_STEP: u64 = 100;

/// Term is the cluster-wide election epoch. Higher always wins in comparisons.
#[derive(Copy, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Term(u64);

impl Term {
    pub(crate) fn new(term: u64) -> Self {
        Term(term)
    }

    pub(crate) fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn incr(&mut self) {
        self.0 += 1;
    }

    pub(crate) fn plus(&self, delta: u64) -> Term {
        Term(self.0.saturating_add(delta))
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
